//! Fixed-point money type.
//!
//! Every currency amount the solver touches (per-share sale value, per-share
//! gain, accumulated totals) is a 1e-6 (micros) fixed-point value stored as
//! `i64`. The feasibility check `Σ units * gain <= cap` must hold exactly,
//! so no binary floating point is involved anywhere.
//!
//! `Micros` wraps the raw `i64` so the type system prevents:
//! - Implicit construction from raw `i64` (no `From<i64>` impl).
//! - Mixing money with share counts in arithmetic.
//!
//! # Scale
//!
//! 1 USD = 1_000_000 Micros. Share counts stay plain `i64`.
//!
//! # Arithmetic
//!
//! Only checked operations: `checked_add` / `checked_sub` /
//! `checked_mul_qty` / `checked_percent` return `None` on overflow. There
//! are no operator impls, so every sum states what happens on overflow;
//! for the allocator it is an input error, not something to clamp.

use serde::{Deserialize, Serialize};

use crate::MICROS_SCALE;

/// A fixed-point monetary amount at 1e-6 scale (micros).
///
/// 1 USD = `Micros(1_000_000)`.
///
/// There is intentionally no `From<i64>` implementation; use
/// [`Micros::new`], [`Micros::from_dollars`] or [`Micros::from_cents`].
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Micros(i64);

impl Micros {
    /// Zero monetary amount.
    pub const ZERO: Micros = Micros(0);

    /// Maximum representable value.
    pub const MAX: Micros = Micros(i64::MAX);

    /// Minimum representable value.
    pub const MIN: Micros = Micros(i64::MIN);

    /// Construct a `Micros` from a raw `i64` at 1e-6 scale.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Micros(raw)
    }

    /// Whole dollars. Panics on overflow in const contexts; intended for
    /// literals and tests.
    #[inline]
    pub const fn from_dollars(dollars: i64) -> Self {
        Micros(dollars * MICROS_SCALE)
    }

    /// Whole cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Micros(cents * (MICROS_SCALE / 100))
    }

    /// Extract the underlying raw `i64`.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// `None` on overflow.
    #[inline]
    pub fn checked_add(self, rhs: Micros) -> Option<Micros> {
        self.0.checked_add(rhs.0).map(Micros)
    }

    /// `None` on overflow.
    #[inline]
    pub fn checked_sub(self, rhs: Micros) -> Option<Micros> {
        self.0.checked_sub(rhs.0).map(Micros)
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiply a per-share amount by an integer share quantity.
    ///
    /// Returns `None` if the multiplication overflows `i64`. Callers MUST
    /// handle `None` explicitly.
    #[inline]
    pub fn checked_mul_qty(self, qty: i64) -> Option<Micros> {
        self.0.checked_mul(qty).map(Micros)
    }

    /// Scale by `pct / 100`, truncating toward zero (integer tax math).
    #[inline]
    pub fn checked_percent(self, pct: i64) -> Option<Micros> {
        self.0.checked_mul(pct).map(|v| Micros(v / 100))
    }
}

impl std::fmt::Display for Micros {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dollars = self.0 / MICROS_SCALE;
        let frac = (self.0 % MICROS_SCALE).abs();
        // Between -$1 and $0 the dollar part truncates to 0 and loses the sign.
        if self.0 < 0 && dollars == 0 {
            write!(f, "-{dollars}.{frac:06}")
        } else {
            write!(f, "{dollars}.{frac:06}")
        }
    }
}
