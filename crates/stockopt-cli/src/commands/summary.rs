//! `stockopt summary`: list the eligible lots without allocating.

use anyhow::{Context, Result};

use super::{prepare, StatementArgs};
use crate::report::{header, render_summary, summary_report};

pub fn run(args: &StatementArgs, json: bool) -> Result<()> {
    let p = prepare(args)?;
    let report = summary_report(
        header(&args.input, &p.config_hash, p.as_of, &p.settings),
        &p.entries,
    )?;

    if json {
        let out = serde_json::to_string_pretty(&report).context("serialize summary json failed")?;
        println!("{out}");
    } else {
        print!("{}", render_summary(&report));
    }
    Ok(())
}
