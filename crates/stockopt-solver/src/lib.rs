//! stockopt-solver
//!
//! Gain-capped sale allocator:
//! - Lots carry a share count, a per-share sale value and a per-share gain
//! - Loss/neutral lots are always sold in full
//! - Gain lots are rationed in value-per-gain order under the cap
//! - Exact fixed-point money (`Micros`), no floating point
//! - Pure deterministic logic (no IO, no time, no statement/report types)

mod fixedpoint;
mod search;
mod types;

pub mod allocator;
pub mod metrics;
pub mod ordering;

pub use allocator::{solve, validate_lots, AllocationError, Allocator, DEFAULT_SEARCH_BUDGET};
pub use fixedpoint::Micros;
pub use metrics::{allocation_totals, lot_totals, AllocationTotals};
pub use ordering::{cmp_value_per_gain, rank_gain_lots};
pub use types::{Allocation, Lot};

/// Money scale: micros (1e-6).
pub const MICROS_SCALE: i64 = 1_000_000;
