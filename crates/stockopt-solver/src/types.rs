use std::collections::BTreeMap;

use crate::Micros;

/// One sellable lot as seen by the allocator.
///
/// `id` is opaque: the allocator only uses it to key the result.
/// `units` is a whole share count (>= 0).
/// `value_per_unit` is the per-share sale value (>= 0).
/// `gain_per_unit` is the per-share capital gain; negative means a loss.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lot<Id> {
    pub id: Id,
    pub units: i64,
    pub value_per_unit: Micros,
    pub gain_per_unit: Micros,
}

impl<Id> Lot<Id> {
    pub fn new(id: Id, units: i64, value_per_unit: Micros, gain_per_unit: Micros) -> Self {
        Self {
            id,
            units,
            value_per_unit,
            gain_per_unit,
        }
    }

    /// Loss or neutral lots never consume headroom under the gain cap.
    pub fn is_gain_lot(&self) -> bool {
        self.gain_per_unit.is_positive()
    }
}

/// The output of one allocation run.
///
/// `sold`: lot id → units to sell. Only strictly positive counts are stored;
/// a missing id means zero.
/// `within_cap`: false only when the cap is below what selling every loss
/// lot can reach. The allocation is then "all loss/neutral lots, nothing
/// else", the sale whose realized gain is closest to the cap.
/// `exact`: true when the refinement search finished inside its budget, i.e.
/// no feasible allocation has a strictly greater total value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allocation<Id: Ord> {
    pub sold: BTreeMap<Id, i64>,
    pub within_cap: bool,
    pub exact: bool,
}

impl<Id: Ord> Allocation<Id> {
    pub(crate) fn empty() -> Self {
        Self {
            sold: BTreeMap::new(),
            within_cap: true,
            exact: true,
        }
    }

    /// Units chosen for `id` (0 when the lot is not part of the sale).
    pub fn units_sold(&self, id: &Id) -> i64 {
        self.sold.get(id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.sold.is_empty()
    }

    /// Number of lots with a non-zero sale.
    pub fn lot_count(&self) -> usize {
        self.sold.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Id, i64)> {
        self.sold.iter().map(|(id, n)| (id, *n))
    }
}
