/// Pairwise matchup aggregation: vote records -> per-pair win/loss/tie tallies.
use std::collections::BTreeMap;

use tracing::warn;

use crate::types::{ItemId, Outcome, Tally, Vote};

/// One directed edge of the matchup graph, `from`'s record against `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchupEdge {
    pub from: ItemId,
    pub to: ItemId,
    pub tally: Tally,
    /// `tally.wins / tally.total()`.
    pub margin: f64,
}

/// Directed matchup graph. An edge `a -> b` exists iff at least one vote was
/// cast between `a` and `b`; because every vote is counted from both sides,
/// `b -> a` then exists too, carrying the mirrored tally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchupGraph {
    /// `matchups[a][b]` is a's record against b. Every known item has a key,
    /// including items with no votes.
    matchups: BTreeMap<ItemId, BTreeMap<ItemId, Tally>>,
}

/// Fold a vote multiset into a matchup graph. Empty input gives an empty graph.
pub fn aggregate(votes: &[Vote]) -> MatchupGraph {
    MatchupGraph::aggregate(votes)
}

impl MatchupGraph {
    pub fn aggregate(votes: &[Vote]) -> Self {
        let mut matchups: BTreeMap<ItemId, BTreeMap<ItemId, Tally>> = BTreeMap::new();

        for vote in votes {
            if vote.item1 == vote.item2 {
                warn!(item = vote.item1, voter = vote.voter, "skipping vote of an item against itself");
                continue;
            }
            let forward = matchups.entry(vote.item1).or_default().entry(vote.item2).or_default();
            match vote.outcome {
                Outcome::Win1 => forward.wins += 1,
                Outcome::Win2 => forward.losses += 1,
                Outcome::Tie => forward.ties += 1,
            }
            let backward = matchups.entry(vote.item2).or_default().entry(vote.item1).or_default();
            match vote.outcome {
                Outcome::Win1 => backward.losses += 1,
                Outcome::Win2 => backward.wins += 1,
                Outcome::Tie => backward.ties += 1,
            }
        }

        MatchupGraph { matchups }
    }

    /// Add items that may have no votes at all, so they still get ranked.
    pub fn with_items(mut self, items: impl IntoIterator<Item = ItemId>) -> Self {
        for item in items {
            self.matchups.entry(item).or_default();
        }
        self
    }

    /// Every item in the graph, ascending.
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.matchups.keys().copied()
    }

    pub fn item_count(&self) -> usize {
        self.matchups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchups.is_empty()
    }

    pub fn contains_item(&self, item: ItemId) -> bool {
        self.matchups.contains_key(&item)
    }

    /// a's record against b, if they ever met.
    pub fn tally(&self, a: ItemId, b: ItemId) -> Option<Tally> {
        self.matchups.get(&a).and_then(|row| row.get(&b)).copied()
    }

    /// Per-opponent breakdown for one item. Empty for unknown or unplayed items.
    pub fn opponents(&self, item: ItemId) -> BTreeMap<ItemId, Tally> {
        self.matchups.get(&item).cloned().unwrap_or_default()
    }

    /// Sum of an item's record over all opponents.
    pub fn totals(&self, item: ItemId) -> Tally {
        self.matchups
            .get(&item)
            .map(|row| {
                row.values().fold(Tally::default(), |acc, t| Tally {
                    wins: acc.wins + t.wins,
                    losses: acc.losses + t.losses,
                    ties: acc.ties + t.ties,
                })
            })
            .unwrap_or_default()
    }

    /// All directed edges in (from, to) order.
    pub fn edges(&self) -> impl Iterator<Item = MatchupEdge> + '_ {
        self.matchups.iter().flat_map(|(&from, row)| {
            row.iter().filter_map(move |(&to, &tally)| {
                tally.margin().map(|margin| MatchupEdge { from, to, tally, margin })
            })
        })
    }

    /// Edges pointing at `item`: each opponent's record against it.
    pub fn in_edges(&self, item: ItemId) -> impl Iterator<Item = MatchupEdge> + '_ {
        self.matchups
            .get(&item)
            .into_iter()
            .flat_map(move |row| {
                row.iter().filter_map(move |(&from, tally)| {
                    let tally = tally.reversed();
                    tally.margin().map(|margin| MatchupEdge { from, to: item, tally, margin })
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(item1: ItemId, item2: ItemId, outcome: Outcome) -> Vote {
        Vote { item1, item2, outcome, voter: 1, submitted_at: 0 }
    }

    #[test]
    fn test_empty_votes_empty_graph() {
        let g = aggregate(&[]);
        assert!(g.is_empty());
        assert_eq!(g.edges().count(), 0);
    }

    #[test]
    fn test_fold_counts_both_directions() {
        let g = aggregate(&[
            vote(1, 2, Outcome::Win1),
            vote(2, 1, Outcome::Win1),
            vote(1, 2, Outcome::Win1),
            vote(1, 2, Outcome::Tie),
        ]);
        assert_eq!(g.tally(1, 2), Some(Tally { wins: 2, losses: 1, ties: 1 }));
        assert_eq!(g.tally(2, 1), Some(Tally { wins: 1, losses: 2, ties: 1 }));
        assert_eq!(g.tally(1, 3), None);
    }

    #[test]
    fn test_margin_is_win_fraction() {
        let g = aggregate(&[vote(5, 6, Outcome::Win2), vote(5, 6, Outcome::Tie)]);
        let edges: Vec<MatchupEdge> = g.edges().collect();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].from, 5);
        assert_eq!(edges[0].margin, 0.0);
        assert_eq!(edges[1].from, 6);
        assert_eq!(edges[1].margin, 0.5);
    }

    #[test]
    fn test_in_edges_are_opponent_records() {
        let g = aggregate(&[vote(1, 2, Outcome::Win1), vote(3, 2, Outcome::Win2)]);
        let mut into_two: Vec<(ItemId, f64)> = g.in_edges(2).map(|e| (e.from, e.margin)).collect();
        into_two.sort_by_key(|e| e.0);
        assert_eq!(into_two, vec![(1, 1.0), (3, 0.0)]);
        assert_eq!(g.in_edges(42).count(), 0);
    }

    #[test]
    fn test_self_votes_are_skipped() {
        let g = aggregate(&[vote(4, 4, Outcome::Win1)]);
        assert!(g.is_empty());
    }

    #[test]
    fn test_with_items_adds_unplayed() {
        let g = aggregate(&[vote(1, 2, Outcome::Win1)]).with_items([2, 3]);
        assert_eq!(g.items().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(g.opponents(3).is_empty());
        assert_eq!(g.totals(3), Tally::default());
    }

    #[test]
    fn test_totals_sum_opponents() {
        let g = aggregate(&[
            vote(1, 2, Outcome::Win1),
            vote(1, 3, Outcome::Win2),
            vote(3, 1, Outcome::Tie),
        ]);
        assert_eq!(g.totals(1), Tally { wins: 1, losses: 1, ties: 1 });
    }
}
