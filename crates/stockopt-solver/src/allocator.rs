//! stockopt-solver: allocator
//!
//! Chooses how many shares to sell from each lot so that total sale value is
//! as large as possible while total realized gain stays at or below a cap.
//!
//! Responsibilities (pure, no IO, no clock):
//! - Validate lots (non-negative units and value, unique ids, products that
//!   fit in `i64`).
//! - Sell every loss/neutral lot in full; they only add headroom.
//! - Spend the remaining headroom on gain lots in value-per-gain order, then
//!   refine the truncated boundary with a bounded branch-and-bound search.
//! - Return an [`Allocation`] keyed by lot id.
//!
//! Aggregates for reporting (cost basis, tax) are the caller's job; see
//! [`crate::metrics`] for the exact totals the cap was checked against.

use std::collections::BTreeSet;

use tracing::debug;

use crate::metrics::allocation_totals;
use crate::ordering::rank_gain_lots;
use crate::search::{refine, relaxation_bound, value_of, Item};
use crate::types::{Allocation, Lot};
use crate::Micros;

/// Node budget for the refinement search.
pub const DEFAULT_SEARCH_BUDGET: u64 = 1_000_000;

// ─── Error ───────────────────────────────────────────────────────────────────

/// Errors produced during allocation. `index` is the lot's position in the
/// input slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocationError {
    /// A lot has a negative share count.
    NegativeUnits { index: usize, units: i64 },
    /// A lot has a negative per-share sale value.
    NegativeValue { index: usize, value: Micros },
    /// Two lots share an id; the result could not tell them apart.
    DuplicateId { index: usize },
    /// A currency product or sum does not fit in `i64` micros.
    Overflow { context: &'static str },
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeUnits { index, units } => {
                write!(f, "lot #{index}: units must be >= 0, got {units}")
            }
            Self::NegativeValue { index, value } => {
                write!(f, "lot #{index}: value per unit must be >= 0, got {value}")
            }
            Self::DuplicateId { index } => {
                write!(f, "lot #{index}: id already used by an earlier lot")
            }
            Self::Overflow { context } => write!(f, "currency overflow computing {context}"),
        }
    }
}

impl std::error::Error for AllocationError {}

// ─── Allocator ───────────────────────────────────────────────────────────────

/// Single-constraint sale allocator.
///
/// # Algorithm
///
/// 1. Validate every lot.
/// 2. Sell all units of every lot with `gain_per_unit <= 0`.
/// 3. `headroom = max_gain - realized loss/neutral gain`. If it is not
///    positive, stop: no gain lot can be sold.
/// 4. Rank gain lots by `value / gain` descending (ties: input order) and
///    take each in full while it fits; the first lot that does not fit gets
///    `floor(remaining / gain)` units and the walk stops.
/// 5. Run the refinement search from that allocation (see `search.rs`),
///    bounded by `search_budget` nodes.
///
/// The allocator holds no state between calls; the same input always gives
/// the same allocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allocator {
    search_budget: u64,
}

impl Allocator {
    pub fn new() -> Self {
        Self::with_search_budget(DEFAULT_SEARCH_BUDGET)
    }

    /// A budget of 0 disables refinement; the ratio walk is returned as-is.
    pub fn with_search_budget(search_budget: u64) -> Self {
        Self { search_budget }
    }

    /// Allocate a sale of `lots` under `max_gain`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] for invalid lots or currency overflow. A
    /// cap that allows no gain-lot sale is not an error.
    pub fn solve<Id: Ord + Clone>(
        &self,
        lots: &[Lot<Id>],
        max_gain: Micros,
    ) -> Result<Allocation<Id>, AllocationError> {
        validate_lots(lots)?;

        let mut allocation = Allocation::empty();

        // ── 1. Loss / neutral lots: always sold in full ─────────────────────
        let mut realized = Micros::ZERO;
        for lot in lots.iter().filter(|l| l.units > 0 && !l.is_gain_lot()) {
            let lot_gain = lot
                .gain_per_unit
                .checked_mul_qty(lot.units)
                .ok_or(AllocationError::Overflow { context: "lot gain" })?;
            realized = realized.checked_add(lot_gain).ok_or(AllocationError::Overflow {
                context: "realized loss",
            })?;
            allocation.sold.insert(lot.id.clone(), lot.units);
        }

        // ── 2. Headroom ─────────────────────────────────────────────────────
        let headroom = i128::from(max_gain.raw()) - i128::from(realized.raw());
        allocation.within_cap = headroom >= 0;

        let ranked = rank_gain_lots(lots);
        if headroom <= 0 || ranked.is_empty() {
            debug!(
                lots = lots.len(),
                loss_lots = allocation.lot_count(),
                gain_lots = ranked.len(),
                headroom = %headroom,
                "no headroom for gain lots"
            );
            check_totals(lots, &allocation)?;
            return Ok(allocation);
        }

        // ── 3. Ratio walk over gain lots ────────────────────────────────────
        let items: Vec<Item> = ranked
            .iter()
            .map(|&i| Item {
                units: i128::from(lots[i].units),
                value: i128::from(lots[i].value_per_unit.raw()),
                gain: i128::from(lots[i].gain_per_unit.raw()),
            })
            .collect();
        let greedy = ratio_walk(&items, headroom);
        let greedy_value = value_of(&items, &greedy);

        // ── 4. Refinement ───────────────────────────────────────────────────
        let (counts, exact) = if greedy_value >= relaxation_bound(&items, 0, headroom) {
            (greedy, true)
        } else if self.search_budget == 0 {
            (greedy, false)
        } else {
            let outcome = refine(&items, headroom, greedy, self.search_budget);
            debug!(
                greedy_value = %greedy_value,
                refined_value = %outcome.value,
                completed = outcome.completed,
                "refinement search finished"
            );
            (outcome.counts, outcome.completed)
        };
        allocation.exact = exact;

        for (&lot_index, &units) in ranked.iter().zip(&counts) {
            if units > 0 {
                let units = i64::try_from(units).map_err(|_| AllocationError::Overflow {
                    context: "units sold",
                })?;
                allocation.sold.insert(lots[lot_index].id.clone(), units);
            }
        }

        debug!(
            lots = lots.len(),
            gain_lots = ranked.len(),
            sold_lots = allocation.lot_count(),
            headroom = %headroom,
            exact,
            "allocation complete"
        );

        check_totals(lots, &allocation)?;
        Ok(allocation)
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Allocate with the default search budget.
///
/// # Errors
///
/// See [`Allocator::solve`].
pub fn solve<Id: Ord + Clone>(
    lots: &[Lot<Id>],
    max_gain: Micros,
) -> Result<Allocation<Id>, AllocationError> {
    Allocator::new().solve(lots, max_gain)
}

/// Check the per-lot invariants the allocator relies on.
///
/// # Errors
///
/// The first violation found, in input order.
pub fn validate_lots<Id: Ord>(lots: &[Lot<Id>]) -> Result<(), AllocationError> {
    let mut seen: BTreeSet<&Id> = BTreeSet::new();
    for (index, lot) in lots.iter().enumerate() {
        if lot.units < 0 {
            return Err(AllocationError::NegativeUnits {
                index,
                units: lot.units,
            });
        }
        if lot.value_per_unit.is_negative() {
            return Err(AllocationError::NegativeValue {
                index,
                value: lot.value_per_unit,
            });
        }
        if !seen.insert(&lot.id) {
            return Err(AllocationError::DuplicateId { index });
        }
        if lot.value_per_unit.checked_mul_qty(lot.units).is_none()
            || lot.gain_per_unit.checked_mul_qty(lot.units).is_none()
        {
            return Err(AllocationError::Overflow { context: "lot total" });
        }
    }
    Ok(())
}

/// Greedy pass: full lots while they fit, then the largest whole number of
/// units of the first lot that does not.
fn ratio_walk(items: &[Item], headroom: i128) -> Vec<i128> {
    let mut counts = vec![0; items.len()];
    let mut left = headroom;
    for (count, it) in counts.iter_mut().zip(items) {
        let full_gain = it.units * it.gain;
        if full_gain <= left {
            *count = it.units;
            left -= full_gain;
        } else {
            *count = (left / it.gain).clamp(0, it.units);
            break;
        }
    }
    counts
}

/// The caller recomputes totals in `i64` micros; make sure that succeeds.
fn check_totals<Id: Ord>(
    lots: &[Lot<Id>],
    allocation: &Allocation<Id>,
) -> Result<(), AllocationError> {
    allocation_totals(lots, allocation).map(|_| ())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
