use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stockopt_solver::{Lot, Micros};

use crate::currency::format_usd;

/// One lot row from a gain/loss statement.
///
/// `issue_price` is the per-share cost basis, `price` the per-share sale
/// value and `gain` the per-share capital gain (negative for a loss).
/// `available` is the whole number of shares that can be sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// 1-based lot number, unique within a statement.
    pub index: usize,
    pub plan: String,
    pub acquired: NaiveDate,
    pub available: i64,
    pub issue_price: Micros,
    pub price: Micros,
    pub gain: Micros,
}

impl Entry {
    /// The allocator's view of this entry, keyed by lot number.
    pub fn to_lot(&self) -> Lot<usize> {
        Lot::new(self.index, self.available, self.price, self.gain)
    }

    /// One-line description. `sell = None` describes the whole available
    /// position; `Some(n)` describes a sale of `n` shares.
    pub fn describe(&self, sell: Option<i64>) -> String {
        let n = sell.unwrap_or(self.available);
        let value = self.price.checked_mul_qty(n).map(format_usd);
        let gain = self.gain.checked_mul_qty(n).map(format_usd);
        let overflow = || "overflow".to_string();
        let head = match sell {
            Some(n) => format!("{n:>6} of {:>6} shares", self.available),
            None => format!("{:>6} shares", self.available),
        };
        format!(
            "{head} acquired {} [{}] at {} value {} gain {}",
            self.acquired.format("%Y-%m-%d"),
            self.plan,
            format_usd(self.issue_price),
            value.unwrap_or_else(overflow),
            gain.unwrap_or_else(overflow),
        )
    }
}

/// Report ordering: oldest acquisition first, then lot number.
pub fn entry_order(a: &Entry, b: &Entry) -> Ordering {
    a.acquired
        .cmp(&b.acquired)
        .then(a.index.cmp(&b.index))
}

/// Sort `entries` into report order in place.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(entry_order);
}
