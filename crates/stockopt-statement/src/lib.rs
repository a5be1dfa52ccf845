//! stockopt-statement
//!
//! Gain/loss statement input: CSV rows become [`Entry`] values, an
//! [`EntryFilter`] selects the lots eligible for sale, and each entry maps
//! onto a solver [`Lot`](stockopt_solver::Lot) keyed by its lot number.
//!
//! This crate does no allocation itself; callers hand the filtered lots to
//! `stockopt-solver`.

pub mod currency;
pub mod entry;
pub mod filter;
pub mod ingest_csv;

pub use currency::{format_usd, parse_usd, CurrencyError};
pub use entry::{entry_order, sort_entries, Entry};
pub use filter::EntryFilter;
pub use ingest_csv::{parse_date, parse_statement_file, parse_statement_str, StatementError};

use stockopt_solver::Lot;

/// Solver lots for `entries`, in the same order.
pub fn to_lots(entries: &[Entry]) -> Vec<Lot<usize>> {
    entries.iter().map(Entry::to_lot).collect()
}
