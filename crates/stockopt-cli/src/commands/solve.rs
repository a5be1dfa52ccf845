//! `stockopt solve`: recommend the most valuable sale under the gain cap.

use anyhow::{Context, Result};
use stockopt_solver::Allocator;
use stockopt_statement::to_lots;
use tracing::{info, warn};

use super::{prepare, StatementArgs};
use crate::report::{header, render_sale, sale_report};

pub fn run(args: &StatementArgs, json: bool) -> Result<()> {
    let p = prepare(args)?;

    let lots = to_lots(&p.entries);
    let allocation = Allocator::with_search_budget(p.settings.search_budget)
        .solve(&lots, p.settings.gain_cap)
        .context("allocation failed")?;

    if !allocation.within_cap {
        warn!("gains cap cannot be met even after selling every loss lot");
    }
    if !allocation.exact {
        warn!(
            budget = p.settings.search_budget,
            "search budget exhausted; allocation may not be optimal"
        );
    }
    info!(
        lots_sold = allocation.lot_count(),
        exact = allocation.exact,
        "allocation ready"
    );

    let report = sale_report(
        header(&args.input, &p.config_hash, p.as_of, &p.settings),
        &p.entries,
        &allocation,
        p.settings.tax_rate_pct,
    )?;

    if json {
        let out = serde_json::to_string_pretty(&report).context("serialize report json failed")?;
        println!("{out}");
    } else {
        print!("{}", render_sale(&report));
    }
    Ok(())
}
