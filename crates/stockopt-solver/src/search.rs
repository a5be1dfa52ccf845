//! Branch-and-bound refinement over the ranked gain lots.
//!
//! The ratio walk in the allocator is optimal for the fractional relaxation,
//! but once the boundary lot is truncated there can be integer allocations
//! worth more (a later lot with a smaller per-share gain may still fit in the
//! leftover headroom). This search starts from the greedy allocation as the
//! incumbent and only ever replaces it with a strictly more valuable one.
//!
//! Nodes are expanded depth-first in rank order, unit counts from the largest
//! feasible down to zero. A branch is cut when its value plus the floor of
//! the fractional bound on the remaining lots cannot beat the incumbent.
//! Because lots are in ratio order, that bound never grows as the count of
//! the current lot shrinks, so the first cut ends the loop at that depth.
//!
//! All arithmetic is `i128`: per-lot products were checked to fit `i64` by
//! the allocator, so sums over any realistic lot count cannot overflow.

/// One ranked gain lot, in raw micros.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Item {
    pub units: i128,
    pub value: i128,
    pub gain: i128,
}

pub(crate) struct SearchOutcome {
    pub counts: Vec<i128>,
    pub value: i128,
    pub completed: bool,
}

struct Search<'a> {
    items: &'a [Item],
    budget: u64,
    nodes: u64,
    exhausted: bool,
    counts: Vec<i128>,
    best_counts: Vec<i128>,
    best_value: i128,
}

/// Value of `counts` over `items`.
pub(crate) fn value_of(items: &[Item], counts: &[i128]) -> i128 {
    items.iter().zip(counts).map(|(it, n)| it.value * n).sum()
}

/// Floor of the fractional-relaxation value of `items[from..]` with
/// `headroom` gain left to spend.
pub(crate) fn relaxation_bound(items: &[Item], from: usize, headroom: i128) -> i128 {
    let mut acc = 0;
    let mut left = headroom;
    for it in items.iter().skip(from) {
        if left <= 0 {
            break;
        }
        let full_gain = it.units * it.gain;
        if full_gain <= left {
            acc += it.units * it.value;
            left -= full_gain;
        } else {
            acc += it.value * left / it.gain;
            break;
        }
    }
    acc
}

/// Improve on `incumbent` if possible. `completed` is false when the node
/// budget ran out before the tree was closed.
pub(crate) fn refine(
    items: &[Item],
    headroom: i128,
    incumbent: Vec<i128>,
    budget: u64,
) -> SearchOutcome {
    let best_value = value_of(items, &incumbent);
    let mut search = Search {
        items,
        budget,
        nodes: 0,
        exhausted: false,
        counts: vec![0; items.len()],
        best_counts: incumbent,
        best_value,
    };
    search.descend(0, headroom, 0);

    SearchOutcome {
        counts: search.best_counts,
        value: search.best_value,
        completed: !search.exhausted,
    }
}

impl Search<'_> {
    fn tick(&mut self) -> bool {
        if self.nodes >= self.budget {
            self.exhausted = true;
            return false;
        }
        self.nodes += 1;
        true
    }

    fn descend(&mut self, depth: usize, headroom: i128, value: i128) {
        if !self.tick() {
            return;
        }

        let Some(&item) = self.items.get(depth) else {
            if value > self.best_value {
                self.best_value = value;
                self.best_counts.clone_from(&self.counts);
            }
            return;
        };

        if value + relaxation_bound(self.items, depth, headroom) <= self.best_value {
            return;
        }

        let max_units = item.units.min(headroom / item.gain);
        let mut units = max_units;
        while units >= 0 {
            let left = headroom - units * item.gain;
            let taken = value + units * item.value;
            if taken + relaxation_bound(self.items, depth + 1, left) <= self.best_value {
                break;
            }
            self.counts[depth] = units;
            self.descend(depth + 1, left, taken);
            if self.exhausted || !self.tick() {
                break;
            }
            units -= 1;
        }
        self.counts[depth] = 0;
    }
}
