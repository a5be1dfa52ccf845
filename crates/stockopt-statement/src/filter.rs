use chrono::{Months, NaiveDate};
use tracing::debug;

use crate::entry::Entry;

/// Which statement entries are eligible for sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFilter {
    /// Minimum holding period. An entry must be acquired strictly before
    /// `as_of - min_age_months`.
    pub min_age_months: u32,
    /// Plan name to match exactly. `None` or empty matches every plan.
    pub plan: Option<String>,
    /// Keep entries with a per-share loss.
    pub allow_loss: bool,
    /// Reference date for the holding period.
    pub as_of: NaiveDate,
}

impl EntryFilter {
    /// Latest acquisition date (exclusive) that is old enough.
    ///
    /// Month arithmetic clamps to the end of shorter months
    /// (`2024-03-31` minus one month is `2024-02-29`). `None` when the
    /// subtraction leaves the representable date range.
    pub fn cutoff(&self) -> Option<NaiveDate> {
        self.as_of.checked_sub_months(Months::new(self.min_age_months))
    }

    /// Why `entry` is rejected, or `None` when it is eligible.
    pub fn rejection(&self, entry: &Entry) -> Option<&'static str> {
        if entry.available <= 0 {
            return Some("no shares available");
        }
        match self.cutoff() {
            Some(cutoff) if entry.acquired < cutoff => {}
            _ => return Some("held less than the minimum age"),
        }
        if let Some(plan) = self.plan.as_deref().filter(|p| !p.is_empty()) {
            if entry.plan != plan {
                return Some("different plan");
            }
        }
        if !self.allow_loss && entry.gain.is_negative() {
            return Some("loss lot and losses not allowed");
        }
        None
    }

    pub fn keeps(&self, entry: &Entry) -> bool {
        self.rejection(entry).is_none()
    }

    /// Eligible entries, in input order.
    pub fn apply(&self, entries: &[Entry]) -> Vec<Entry> {
        entries
            .iter()
            .filter(|e| match self.rejection(e) {
                None => true,
                Some(reason) => {
                    debug!(lot = e.index, reason, "entry skipped");
                    false
                }
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockopt_solver::Micros;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(index: usize, plan: &str, acquired: NaiveDate, available: i64, gain: i64) -> Entry {
        Entry {
            index,
            plan: plan.to_string(),
            acquired,
            available,
            issue_price: Micros::from_dollars(100),
            price: Micros::from_dollars(100 + gain),
            gain: Micros::from_dollars(gain),
        }
    }

    fn filter() -> EntryFilter {
        EntryFilter {
            min_age_months: 12,
            plan: Some("GSU Class C".to_string()),
            allow_loss: false,
            as_of: date(2024, 6, 15),
        }
    }

    #[test]
    fn age_cutoff_is_strict() {
        let f = filter();
        assert_eq!(f.cutoff(), Some(date(2023, 6, 15)));
        assert!(f.keeps(&entry(1, "GSU Class C", date(2023, 6, 14), 10, 5)));
        assert_eq!(
            f.rejection(&entry(2, "GSU Class C", date(2023, 6, 15), 10, 5)),
            Some("held less than the minimum age")
        );
    }

    #[test]
    fn cutoff_clamps_to_month_end() {
        let f = EntryFilter {
            min_age_months: 1,
            as_of: date(2024, 3, 31),
            ..filter()
        };
        assert_eq!(f.cutoff(), Some(date(2024, 2, 29)));
    }

    #[test]
    fn zero_age_keeps_anything_before_as_of() {
        let f = EntryFilter {
            min_age_months: 0,
            ..filter()
        };
        assert!(f.keeps(&entry(1, "GSU Class C", date(2024, 6, 14), 1, 1)));
        assert!(!f.keeps(&entry(2, "GSU Class C", date(2024, 6, 15), 1, 1)));
    }

    #[test]
    fn plan_must_match_unless_empty() {
        let old = date(2020, 1, 1);
        let e = entry(1, "RSU", old, 10, 5);
        assert_eq!(filter().rejection(&e), Some("different plan"));

        let any = EntryFilter {
            plan: Some(String::new()),
            ..filter()
        };
        assert!(any.keeps(&e));
        let none = EntryFilter {
            plan: None,
            ..filter()
        };
        assert!(none.keeps(&e));
    }

    #[test]
    fn losses_need_allow_loss() {
        let e = entry(1, "GSU Class C", date(2020, 1, 1), 10, -5);
        assert!(!filter().keeps(&e));
        let f = EntryFilter {
            allow_loss: true,
            ..filter()
        };
        assert!(f.keeps(&e));
        // A zero gain is not a loss.
        assert!(filter().keeps(&entry(2, "GSU Class C", date(2020, 1, 1), 10, 0)));
    }

    #[test]
    fn empty_positions_are_dropped() {
        let e = entry(1, "GSU Class C", date(2020, 1, 1), 0, 5);
        assert_eq!(filter().rejection(&e), Some("no shares available"));
    }

    #[test]
    fn apply_preserves_input_order() {
        let old = date(2020, 1, 1);
        let es = vec![
            entry(5, "GSU Class C", old, 1, 1),
            entry(2, "RSU", old, 1, 1),
            entry(9, "GSU Class C", old, 1, 3),
        ];
        let kept: Vec<usize> = filter().apply(&es).iter().map(|e| e.index).collect();
        assert_eq!(kept, vec![5, 9]);
    }
}
