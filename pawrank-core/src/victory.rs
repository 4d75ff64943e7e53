/// Victory graph: the matchup graph reduced to one winning direction per pair.
///
/// For every pair {a, b} the edge `a -> b` ("a beat b") survives only when a's
/// margin over b is strictly greater than b's margin over a. Exactly equal
/// margins are treated as "no victory" and both directions are dropped, so a
/// dead-even pair can never feed a spurious cycle into the ranking methods.
use std::collections::BTreeMap;

use crate::graph::DiGraph;
use crate::matchup::MatchupGraph;
use crate::types::{IdMap, ItemId};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VictoryEdge {
    pub winner: ItemId,
    pub loser: ItemId,
    /// The winner's margin over the loser.
    pub margin: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VictoryGraph {
    /// Every item of the source matchup graph, ascending, including items
    /// left without any victory edge.
    items: Vec<ItemId>,
    /// Edges in (winner, loser) order.
    edges: Vec<VictoryEdge>,
}

/// Reduce a matchup graph to its victory graph.
pub fn reduce(matchups: &MatchupGraph) -> VictoryGraph {
    VictoryGraph::from_matchups(matchups)
}

impl VictoryGraph {
    pub fn from_matchups(matchups: &MatchupGraph) -> Self {
        let items: Vec<ItemId> = matchups.items().collect();
        let edges = matchups
            .edges()
            .filter(|edge| {
                let reverse_margin = matchups
                    .tally(edge.to, edge.from)
                    .and_then(|t| t.margin())
                    .unwrap_or(0.0);
                edge.margin > reverse_margin
            })
            .map(|edge| VictoryEdge { winner: edge.from, loser: edge.to, margin: edge.margin })
            .collect();
        VictoryGraph { items, edges }
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn edges(&self) -> &[VictoryEdge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Victories minus defeats for every item (Copeland score inputs).
    pub fn win_loss_balance(&self) -> BTreeMap<ItemId, i64> {
        let mut balance: BTreeMap<ItemId, i64> = self.items.iter().map(|&i| (i, 0)).collect();
        for edge in &self.edges {
            *balance.entry(edge.winner).or_default() += 1;
            *balance.entry(edge.loser).or_default() -= 1;
        }
        balance
    }

    /// One intransitive chain `a beat b beat ... beat a`, if any exists.
    pub fn find_cycle(&self) -> Option<Vec<ItemId>> {
        let (id_map, graph) = self.indexed().ok()?;
        graph
            .find_cycle()
            .map(|cycle| cycle.into_iter().map(|idx| id_map.to_id(idx)).collect())
    }

    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    fn indexed(&self) -> crate::error::Result<(IdMap, DiGraph)> {
        let id_map = IdMap::from_ids(&self.items)?;
        let mut graph = DiGraph::with_nodes(id_map.len());
        for edge in &self.edges {
            graph.add_edge(id_map.to_idx(edge.winner)?, id_map.to_idx(edge.loser)?);
        }
        Ok((id_map, graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchup::aggregate;
    use crate::types::{Outcome, Vote};

    fn vote(item1: ItemId, item2: ItemId, outcome: Outcome) -> Vote {
        Vote { item1, item2, outcome, voter: 7, submitted_at: 0 }
    }

    #[test]
    fn test_keeps_only_winning_direction() {
        let g = reduce(&aggregate(&[
            vote(1, 2, Outcome::Win1),
            vote(1, 2, Outcome::Win1),
            vote(2, 1, Outcome::Win1),
        ]));
        assert_eq!(g.edges().len(), 1);
        let edge = g.edges()[0];
        assert_eq!((edge.winner, edge.loser), (1, 2));
        assert!((edge.margin - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_equal_margins_drop_both() {
        let g = reduce(&aggregate(&[
            vote(1, 2, Outcome::Win1),
            vote(1, 2, Outcome::Win2),
            vote(3, 4, Outcome::Tie),
        ]));
        assert!(g.edges().is_empty());
        assert_eq!(g.items(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_balance_counts_victories() {
        let g = reduce(&aggregate(&[
            vote(1, 2, Outcome::Win1),
            vote(1, 3, Outcome::Win1),
            vote(2, 3, Outcome::Win1),
        ]));
        let balance = g.win_loss_balance();
        assert_eq!(balance[&1], 2);
        assert_eq!(balance[&2], 0);
        assert_eq!(balance[&3], -2);
    }

    #[test]
    fn test_find_cycle_on_rock_paper_scissors() {
        let g = reduce(&aggregate(&[
            vote(1, 2, Outcome::Win1),
            vote(2, 3, Outcome::Win1),
            vote(3, 1, Outcome::Win1),
        ]));
        let cycle = g.find_cycle().unwrap();
        assert_eq!(cycle.len(), 3);
        assert!(g.has_cycle());
    }

    #[test]
    fn test_transitive_votes_have_no_cycle() {
        let g = reduce(&aggregate(&[vote(1, 2, Outcome::Win1), vote(2, 3, Outcome::Win1)]));
        assert!(!g.has_cycle());
    }
}
