//! Ranking policy for gain lots.
//!
//! Gain lots are walked in descending order of value bought per unit of gain
//! spent (`value_per_unit / gain_per_unit`). The ratio is never computed as a
//! quotient: two lots are compared by cross-multiplying in `i128`, which is
//! exact for any pair of `i64` amounts.
//!
//! # Canonical sort key
//!
//! `(ratio desc, input index asc)`. Equal ratios keep input order, so the
//! ranking is a total order and identical inputs always rank identically.
//! This ordering is internal to the allocator; report ordering (by lot
//! number or acquisition date) belongs to the caller.

use std::cmp::Ordering;

use crate::{Lot, Micros};

/// Compare two `(value, gain)` pairs by `value / gain`, highest ratio first.
///
/// Both gains must be strictly positive; the allocator only ranks gain lots.
pub fn cmp_value_per_gain(a: (Micros, Micros), b: (Micros, Micros)) -> Ordering {
    let (a_value, a_gain) = (i128::from(a.0.raw()), i128::from(a.1.raw()));
    let (b_value, b_gain) = (i128::from(b.0.raw()), i128::from(b.1.raw()));
    debug_assert!(a_gain > 0 && b_gain > 0, "ratio ranking needs positive gains");
    // a_v / a_g > b_v / b_g  <=>  a_v * b_g > b_v * a_g
    (b_value * a_gain).cmp(&(a_value * b_gain))
}

/// Indices of the sellable gain lots (`units > 0`, `gain_per_unit > 0`) in
/// canonical rank order.
pub fn rank_gain_lots<Id>(lots: &[Lot<Id>]) -> Vec<usize> {
    let mut ranked: Vec<usize> = lots
        .iter()
        .enumerate()
        .filter(|(_, lot)| lot.units > 0 && lot.is_gain_lot())
        .map(|(i, _)| i)
        .collect();

    ranked.sort_by(|&i, &j| {
        let (a, b) = (&lots[i], &lots[j]);
        cmp_value_per_gain(
            (a.value_per_unit, a.gain_per_unit),
            (b.value_per_unit, b.gain_per_unit),
        )
        .then(i.cmp(&j))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(id: &str, units: i64, value: i64, gain: i64) -> Lot<String> {
        Lot::new(
            id.to_string(),
            units,
            Micros::from_dollars(value),
            Micros::from_dollars(gain),
        )
    }

    #[test]
    fn higher_ratio_sorts_first() {
        let hi = (Micros::from_dollars(10), Micros::from_dollars(2)); // 5
        let lo = (Micros::from_dollars(9), Micros::from_dollars(3)); // 3
        assert_eq!(cmp_value_per_gain(hi, lo), Ordering::Less);
        assert_eq!(cmp_value_per_gain(lo, hi), Ordering::Greater);
    }

    #[test]
    fn equal_ratios_compare_equal() {
        let a = (Micros::from_dollars(10), Micros::from_dollars(2));
        let b = (Micros::from_dollars(5), Micros::from_dollars(1));
        assert_eq!(cmp_value_per_gain(a, b), Ordering::Equal);
    }

    #[test]
    fn cross_multiplication_does_not_overflow_at_extremes() {
        let a = (Micros::MAX, Micros::new(1));
        let b = (Micros::new(1), Micros::MAX);
        assert_eq!(cmp_value_per_gain(a, b), Ordering::Less);
    }

    #[test]
    fn rank_skips_loss_neutral_and_empty_lots() {
        let lots = vec![
            lot("loss", 10, 5, -1),
            lot("zero_gain", 10, 5, 0),
            lot("empty", 0, 5, 1),
            lot("gain", 10, 5, 1),
        ];
        assert_eq!(rank_gain_lots(&lots), vec![3]);
    }

    #[test]
    fn rank_breaks_ties_by_input_index() {
        let lots = vec![
            lot("c", 1, 4, 2), // ratio 2
            lot("a", 1, 9, 1), // ratio 9
            lot("b", 1, 2, 1), // ratio 2
            lot("d", 1, 6, 3), // ratio 2
        ];
        assert_eq!(rank_gain_lots(&lots), vec![1, 0, 2, 3]);
    }

    #[test]
    fn rank_is_idempotent_under_permutation_of_distinct_ratios() {
        let lots = vec![lot("x", 1, 3, 1), lot("y", 1, 8, 1), lot("z", 1, 5, 1)];
        let ranked: Vec<&str> = rank_gain_lots(&lots)
            .into_iter()
            .map(|i| lots[i].id.as_str())
            .collect();
        assert_eq!(ranked, vec!["y", "z", "x"]);

        let reversed: Vec<Lot<String>> = lots.iter().rev().cloned().collect();
        let ranked_rev: Vec<&str> = rank_gain_lots(&reversed)
            .into_iter()
            .map(|i| reversed[i].id.as_str())
            .collect();
        assert_eq!(ranked, ranked_rev);
    }
}
