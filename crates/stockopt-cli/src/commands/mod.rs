//! Command handler modules for the stockopt CLI.
//!
//! Shared setup (config layering, flag overrides, statement loading) lives
//! here. Command-specific logic lives in the submodules.

pub mod solve;
pub mod summary;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use std::path::Path;
use stockopt_config::{report_unused_keys, SaleSettings, UnusedKeyPolicy};
use stockopt_statement::{parse_date, parse_statement_file, parse_usd, Entry, EntryFilter};
use tracing::{info, warn};

/// Flags shared by `solve` and `summary`.
#[derive(Args, Debug, Clone)]
pub struct StatementArgs {
    /// Statement CSV export
    #[arg(long)]
    pub input: String,

    /// Layered config paths in merge order (later files override earlier ones)
    #[arg(long = "config")]
    pub config_paths: Vec<String>,

    /// Capital gain limit in USD (e.g. "$3,000"); overrides /sale/gain_cap
    #[arg(long, allow_hyphen_values = true)]
    pub gain: Option<String>,

    /// Minimum holding period in months; overrides /statement/min_age_months
    #[arg(long)]
    pub age: Option<u32>,

    /// Only consider lots from this plan ("" for every plan); overrides /statement/plan
    #[arg(long)]
    pub plan: Option<String>,

    /// Allow sale of capital losses; overrides /statement/allow_loss
    #[arg(long, default_value_t = false)]
    pub loss: bool,

    /// Exclude capital losses; overrides /statement/allow_loss
    #[arg(long, default_value_t = false, conflicts_with = "loss")]
    pub no_loss: bool,

    /// Capital gains tax rate in whole percent; overrides /report/tax_rate_pct
    #[arg(long)]
    pub tax: Option<u32>,

    /// Refinement search budget in nodes; overrides /solver/search_budget
    #[arg(long)]
    pub search_budget: Option<u64>,

    /// Reference date for the holding period (YYYY-MM-DD); defaults to today
    #[arg(long, value_parser = parse_as_of)]
    pub as_of: Option<NaiveDate>,

    /// Fail when the config has keys the planner does not read
    #[arg(long, default_value_t = false)]
    pub strict_config: bool,
}

/// Everything a command needs after setup.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub settings: SaleSettings,
    pub config_hash: String,
    pub as_of: NaiveDate,
    /// Eligible entries, in statement order.
    pub entries: Vec<Entry>,
}

fn parse_as_of(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("invalid date '{s}'. expected YYYY-MM-DD or MM/DD/YYYY"))
}

/// Load config, apply flag overrides, then read and filter the statement.
pub fn prepare(args: &StatementArgs) -> Result<Prepared> {
    let path_refs: Vec<&str> = args.config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = stockopt_config::load_layered_yaml(&path_refs)?;

    let policy = if args.strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let unused = report_unused_keys(&loaded.config_json, policy)?;
    for ptr in &unused.unused_leaf_pointers {
        warn!(pointer = %ptr, "config key is not used");
    }

    let settings = apply_overrides(SaleSettings::from_config_json(&loaded.config_json)?, args)?;
    settings.validate()?;

    let as_of = args
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let all = parse_statement_file(Path::new(&args.input))
        .with_context(|| format!("parsing statement {}", args.input))?;
    let filter = EntryFilter {
        min_age_months: settings.min_age_months,
        plan: Some(settings.plan.clone()),
        allow_loss: settings.allow_loss,
        as_of,
    };
    let entries = filter.apply(&all);
    info!(
        rows = all.len(),
        eligible = entries.len(),
        config_hash = %loaded.config_hash,
        "statement loaded"
    );

    Ok(Prepared {
        settings,
        config_hash: loaded.config_hash,
        as_of,
        entries,
    })
}

fn apply_overrides(mut s: SaleSettings, args: &StatementArgs) -> Result<SaleSettings> {
    if let Some(raw) = &args.gain {
        s.gain_cap = parse_usd(raw).with_context(|| format!("invalid --gain '{raw}'"))?;
    }
    if let Some(age) = args.age {
        s.min_age_months = age;
    }
    if let Some(plan) = &args.plan {
        s.plan = plan.clone();
    }
    if args.loss {
        s.allow_loss = true;
    }
    if args.no_loss {
        s.allow_loss = false;
    }
    if let Some(tax) = args.tax {
        s.tax_rate_pct = tax;
    }
    if let Some(budget) = args.search_budget {
        s.search_budget = budget;
    }
    Ok(s)
}
