use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod report;

use commands::StatementArgs;

#[derive(Parser)]
#[command(name = "stockopt")]
#[command(about = "Plan a stock sale that stays under a capital gains cap", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Choose which lots to sell for the most value without exceeding the gains cap
    Solve {
        #[command(flatten)]
        args: StatementArgs,

        /// Emit the report as JSON (money in integer micros)
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print holdings totals and the eligible lots, without allocating
    Summary {
        #[command(flatten)]
        args: StatementArgs,

        /// Emit the summary as JSON (money in integer micros)
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Load .env.local if present (dev convenience, e.g. RUST_LOG).
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Solve { args, json } => commands::solve::run(&args, json)?,
        Commands::Summary { args, json } => commands::summary::run(&args, json)?,
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = stockopt_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
