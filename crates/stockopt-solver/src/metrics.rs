//! Exact totals over lots and allocations.
//!
//! These are the numbers a report prints. They use checked `i64` micros so a
//! caller's recomputation matches the cap the allocator enforced, to the
//! micro.

use crate::allocator::AllocationError;
use crate::types::{Allocation, Lot};
use crate::Micros;

/// Units, value and realized gain of a set of sales (micros).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocationTotals {
    pub units: i64,
    pub value: Micros,
    pub gain: Micros,
}

impl AllocationTotals {
    fn add_sale(
        &mut self,
        units: i64,
        value: Micros,
        gain: Micros,
    ) -> Result<(), AllocationError> {
        let overflow = |context| AllocationError::Overflow { context };
        self.units = self.units.checked_add(units).ok_or(overflow("total units"))?;
        let v = value.checked_mul_qty(units).ok_or(overflow("sale value"))?;
        let g = gain.checked_mul_qty(units).ok_or(overflow("sale gain"))?;
        self.value = self.value.checked_add(v).ok_or(overflow("total value"))?;
        self.gain = self.gain.checked_add(g).ok_or(overflow("total gain"))?;
        Ok(())
    }
}

/// Totals if every unit of every lot were sold.
///
/// # Errors
///
/// [`AllocationError::Overflow`] when a total does not fit in `i64`.
pub fn lot_totals<Id>(lots: &[Lot<Id>]) -> Result<AllocationTotals, AllocationError> {
    let mut totals = AllocationTotals::default();
    for lot in lots {
        totals.add_sale(lot.units, lot.value_per_unit, lot.gain_per_unit)?;
    }
    Ok(totals)
}

/// Totals of the units chosen by `allocation`.
///
/// Ids in the allocation that are not in `lots` are ignored.
///
/// # Errors
///
/// [`AllocationError::Overflow`] when a total does not fit in `i64`.
pub fn allocation_totals<Id: Ord>(
    lots: &[Lot<Id>],
    allocation: &Allocation<Id>,
) -> Result<AllocationTotals, AllocationError> {
    let mut totals = AllocationTotals::default();
    for lot in lots {
        let units = allocation.units_sold(&lot.id);
        if units > 0 {
            totals.add_sale(units, lot.value_per_unit, lot.gain_per_unit)?;
        }
    }
    Ok(totals)
}
