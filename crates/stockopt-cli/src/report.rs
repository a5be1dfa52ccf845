//! Report assembly and rendering.
//!
//! Money fields are `Micros` and serialize as integer micros in `--json`
//! output. Totals are summed per lot so no rounding happens per sale.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use stockopt_config::SaleSettings;
use stockopt_solver::{allocation_totals, lot_totals, Allocation, Micros};
use stockopt_statement::{format_usd, sort_entries, to_lots, Entry};

/// What the run was asked to do.
#[derive(Debug, Clone, Serialize)]
pub struct Header {
    pub input: String,
    pub config_hash: String,
    pub as_of: NaiveDate,
    pub plan: String,
    pub min_age_months: u32,
    pub gain_cap: Micros,
    pub allow_loss: bool,
}

/// Totals over every eligible share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Holdings {
    pub total_shares: i64,
    pub cost_basis: Micros,
    pub present_value: Micros,
    pub total_gains: Micros,
}

#[derive(Debug, Clone, Serialize)]
pub struct Sale {
    pub lot: usize,
    pub plan: String,
    pub acquired: NaiveDate,
    pub shares: i64,
    pub available: i64,
    pub value: Micros,
    pub gain: Micros,
    pub cost_basis: Micros,
    #[serde(skip)]
    pub line: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SoldTotals {
    pub shares: i64,
    pub value: Micros,
    pub gains: Micros,
    pub cost_basis: Micros,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleReport {
    #[serde(flatten)]
    pub header: Header,
    pub holdings: Holdings,
    pub sales: Vec<Sale>,
    pub sold: SoldTotals,
    pub tax_rate_pct: u32,
    /// `None` when the tax rate is zero.
    pub tax: Option<Micros>,
    pub within_cap: bool,
    pub exact: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    #[serde(flatten)]
    pub header: Header,
    pub holdings: Holdings,
    pub available: Vec<Entry>,
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

fn cost_basis(entry: &Entry, shares: i64) -> Result<Micros> {
    entry
        .issue_price
        .checked_mul_qty(shares)
        .with_context(|| format!("cost basis overflow for lot {}", entry.index))
}

pub fn holdings(entries: &[Entry]) -> Result<Holdings> {
    let totals = lot_totals(&to_lots(entries)).context("portfolio totals")?;
    let mut basis = Micros::ZERO;
    for e in entries {
        basis = basis
            .checked_add(cost_basis(e, e.available)?)
            .context("total cost basis overflow")?;
    }
    Ok(Holdings {
        total_shares: totals.units,
        cost_basis: basis,
        present_value: totals.value,
        total_gains: totals.gain,
    })
}

pub fn header(input: &str, config_hash: &str, as_of: NaiveDate, s: &SaleSettings) -> Header {
    Header {
        input: input.to_string(),
        config_hash: config_hash.to_string(),
        as_of,
        plan: s.plan.clone(),
        min_age_months: s.min_age_months,
        gain_cap: s.gain_cap,
        allow_loss: s.allow_loss,
    }
}

pub fn summary_report(header: Header, entries: &[Entry]) -> Result<SummaryReport> {
    let mut available = entries.to_vec();
    sort_entries(&mut available);
    Ok(SummaryReport {
        header,
        holdings: holdings(entries)?,
        available,
    })
}

pub fn sale_report(
    header: Header,
    entries: &[Entry],
    allocation: &Allocation<usize>,
    tax_rate_pct: u32,
) -> Result<SaleReport> {
    let mut ordered = entries.to_vec();
    sort_entries(&mut ordered);

    let mut sales = Vec::new();
    let mut basis = Micros::ZERO;
    for e in &ordered {
        let n = allocation.units_sold(&e.index);
        if n == 0 {
            continue;
        }
        let lot_basis = cost_basis(e, n)?;
        basis = basis
            .checked_add(lot_basis)
            .context("sold cost basis overflow")?;
        sales.push(Sale {
            lot: e.index,
            plan: e.plan.clone(),
            acquired: e.acquired,
            shares: n,
            available: e.available,
            value: e.price.checked_mul_qty(n).context("sale value overflow")?,
            gain: e.gain.checked_mul_qty(n).context("sale gain overflow")?,
            cost_basis: lot_basis,
            line: e.describe(Some(n)),
        });
    }

    let totals = allocation_totals(&to_lots(entries), allocation).context("sold totals")?;
    let tax = if tax_rate_pct == 0 {
        None
    } else {
        Some(
            totals
                .gain
                .checked_percent(i64::from(tax_rate_pct))
                .context("tax overflow")?,
        )
    };

    Ok(SaleReport {
        header,
        holdings: holdings(entries)?,
        sales,
        sold: SoldTotals {
            shares: totals.units,
            value: totals.value,
            gains: totals.gain,
            cost_basis: basis,
        },
        tax_rate_pct,
        tax,
        within_cap: allocation.within_cap,
        exact: allocation.exact,
    })
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

fn render_header(h: &Header, t: &Holdings) -> String {
    [
        format!("Input file:    {:?}", h.input),
        format!("Config hash:   {}", h.config_hash),
        format!("As of:         {}", h.as_of.format("%Y-%m-%d")),
        format!("Minimum age:   {} months", h.min_age_months),
        format!("Gains cap:     {}", format_usd(h.gain_cap)),
        format!("Allow loss:    {}", h.allow_loss),
        format!("Total shares:  {}", t.total_shares),
        format!("Cost basis:    {}", format_usd(t.cost_basis)),
        format!("Present value: {}", format_usd(t.present_value)),
        format!("Total gains:   {}", format_usd(t.total_gains)),
    ]
    .iter()
    .map(|line| format!("{line}\n"))
    .collect()
}

pub fn render_summary(r: &SummaryReport) -> String {
    let mut out = render_header(&r.header, &r.holdings);
    out.push_str("\nAvailable shares:\n");
    for e in &r.available {
        out.push_str(&format!("{:>2}. {}\n", e.index, e.describe(None)));
    }
    out
}

pub fn render_sale(r: &SaleReport) -> String {
    let mut out = render_header(&r.header, &r.holdings);
    out.push('\n');
    for s in &r.sales {
        out.push_str(&format!("Sell [lot {:>2}]: {}\n", s.lot, s.line));
    }
    out.push_str(&format!(
        "\nSold shares:\t{}\nSold value:\t{}\nSold gains:\t{}\nCost basis:\t{}\n",
        r.sold.shares,
        format_usd(r.sold.value),
        format_usd(r.sold.gains),
        format_usd(r.sold.cost_basis),
    ));
    if let Some(tax) = r.tax {
        out.push_str(&format!(
            "{}% gains tax:\t{}\n",
            r.tax_rate_pct,
            format_usd(tax)
        ));
    }
    if !r.within_cap {
        out.push_str(
            "\nNote: the gains cap is below what the loss lots can offset; \
             only loss lots are sold.\n",
        );
    }
    if !r.exact {
        out.push_str("\nNote: search budget exhausted; a better allocation may exist.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn entry(
        index: usize,
        acquired: (i32, u32, u32),
        available: i64,
        issue: i64,
        price: i64,
    ) -> Entry {
        Entry {
            index,
            plan: "GSU Class C".to_string(),
            acquired: NaiveDate::from_ymd_opt(acquired.0, acquired.1, acquired.2).unwrap(),
            available,
            issue_price: Micros::from_dollars(issue),
            price: Micros::from_dollars(price),
            gain: Micros::from_dollars(price - issue),
        }
    }

    fn entries() -> Vec<Entry> {
        vec![
            entry(2, (2021, 1, 1), 20, 30, 60),
            entry(1, (2019, 1, 1), 10, 50, 60),
        ]
    }

    fn hdr() -> Header {
        header(
            "s.csv",
            "abc",
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            &SaleSettings::default(),
        )
    }

    fn allocation(sold: &[(usize, i64)]) -> Allocation<usize> {
        Allocation {
            sold: sold.iter().copied().collect::<BTreeMap<_, _>>(),
            within_cap: true,
            exact: true,
        }
    }

    #[test]
    fn holdings_sum_every_share() {
        let h = holdings(&entries()).unwrap();
        assert_eq!(h.total_shares, 30);
        assert_eq!(h.cost_basis, Micros::from_dollars(1_100));
        assert_eq!(h.present_value, Micros::from_dollars(1_800));
        assert_eq!(h.total_gains, Micros::from_dollars(700));
    }

    #[test]
    fn sales_follow_report_order_and_tax_truncates() {
        let r = sale_report(hdr(), &entries(), &allocation(&[(1, 10), (2, 1)]), 15).unwrap();
        let lots: Vec<usize> = r.sales.iter().map(|s| s.lot).collect();
        assert_eq!(lots, vec![1, 2]);
        assert_eq!(r.sold.shares, 11);
        assert_eq!(r.sold.value, Micros::from_dollars(660));
        assert_eq!(r.sold.gains, Micros::from_dollars(130));
        assert_eq!(r.sold.cost_basis, Micros::from_dollars(530));
        assert_eq!(r.tax, Some(Micros::from_cents(1_950)));
    }

    #[test]
    fn zero_tax_rate_omits_tax_line() {
        let r = sale_report(hdr(), &entries(), &allocation(&[(1, 1)]), 0).unwrap();
        assert_eq!(r.tax, None);
        assert!(!render_sale(&r).contains("gains tax"));
    }

    #[test]
    fn rendered_sale_lists_lines_and_totals() {
        let r = sale_report(hdr(), &entries(), &allocation(&[(1, 10)]), 20).unwrap();
        let text = render_sale(&r);
        assert!(
            text.contains("Sell [lot  1]:     10 of     10 shares acquired 2019-01-01"),
            "{text}"
        );
        assert!(text.contains("Sold shares:\t10\n"), "{text}");
        assert!(text.contains("Sold gains:\t$100.00\n"), "{text}");
        assert!(text.contains("20% gains tax:\t$20.00\n"), "{text}");
        assert!(!text.contains("Note:"), "{text}");
    }

    #[test]
    fn inexact_and_infeasible_runs_are_flagged() {
        let mut a = allocation(&[]);
        a.within_cap = false;
        a.exact = false;
        let text = render_sale(&sale_report(hdr(), &entries(), &a, 20).unwrap());
        assert!(text.contains("only loss lots are sold"));
        assert!(text.contains("search budget exhausted"));
    }

    #[test]
    fn header_block_is_one_line_per_field() {
        let text = render_header(&hdr(), &holdings(&entries()).unwrap());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 10, "{text}");
        assert_eq!(lines[0], "Input file:    \"s.csv\"");
        assert_eq!(lines[2], "As of:         2024-06-15");
        assert_eq!(lines[9], "Total gains:   $700.00");
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn summary_lists_entries_oldest_first() {
        let text = render_summary(&summary_report(hdr(), &entries()).unwrap());
        let first = text.find(" 1. ").unwrap();
        let second = text.find(" 2. ").unwrap();
        assert!(first < second, "{text}");
        assert!(text.contains("Total shares:  30\n"));
    }
}
