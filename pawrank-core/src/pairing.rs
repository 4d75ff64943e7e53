/// Pair selection for the voting screen.
///
/// A voter is shown an ordered pair they have never voted on, in either order,
/// drawn uniformly from everything still unseen. The caller passes a fresh
/// view of the voter's history on every call; nothing here is cached.
use std::collections::{BTreeSet, HashSet};

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::types::{ItemId, Pair};

/// Order-insensitive key of a pair.
fn unordered(a: ItemId, b: ItemId) -> Pair {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Every ordered pair `(a, b)` with `a != b` over the distinct `items`.
pub fn all_ordered_pairs(items: &[ItemId]) -> Vec<Pair> {
    let distinct: BTreeSet<ItemId> = items.iter().copied().collect();
    let mut pairs = Vec::with_capacity(distinct.len() * distinct.len().saturating_sub(1));
    for &a in &distinct {
        for &b in &distinct {
            if a != b {
                pairs.push((a, b));
            }
        }
    }
    pairs
}

/// Ordered pairs over `items` whose matchup does not appear in `seen`,
/// regardless of which side each item was shown on.
pub fn unseen_pairs(items: &[ItemId], seen: &[Pair]) -> Vec<Pair> {
    let seen: HashSet<Pair> = seen.iter().map(|&(a, b)| unordered(a, b)).collect();
    all_ordered_pairs(items)
        .into_iter()
        .filter(|&(a, b)| !seen.contains(&unordered(a, b)))
        .collect()
}

/// Draw one unseen ordered pair uniformly at random. `None` once every
/// matchup has been voted on (or there are fewer than two items).
pub fn select_pair(items: &[ItemId], seen: &[Pair], rng: &mut impl Rng) -> Option<Pair> {
    unseen_pairs(items, seen).choose(rng).copied()
}
