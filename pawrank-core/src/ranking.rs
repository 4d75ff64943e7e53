/// Ranking methods over the matchup and victory graphs.
///
/// Every method returns tiers best-first. Items inside a tier are tied and
/// listed in ascending id order, so output is deterministic for a fixed vote
/// set. Elo lives in `elo.rs` because it replays raw votes instead.
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{RankError, Result};
use crate::graph::DiGraph;
use crate::matchup::MatchupGraph;
use crate::types::{IdMap, ItemId, RankedItem, RankedOrdering};
use crate::victory::VictoryGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RankingMethod {
    RankedPairs,
    Copeland,
    Elo,
    Minimax,
    WinRatio,
    WinTieRatio,
}

impl RankingMethod {
    pub const ALL: [RankingMethod; 6] = [
        RankingMethod::RankedPairs,
        RankingMethod::Copeland,
        RankingMethod::Elo,
        RankingMethod::Minimax,
        RankingMethod::WinRatio,
        RankingMethod::WinTieRatio,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RankingMethod::RankedPairs => "ranked_pairs",
            RankingMethod::Copeland => "copeland",
            RankingMethod::Elo => "elo",
            RankingMethod::Minimax => "minimax",
            RankingMethod::WinRatio => "win_ratio",
            RankingMethod::WinTieRatio => "win_tie_ratio",
        }
    }
}

impl FromStr for RankingMethod {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self> {
        RankingMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s || m.as_str().replace('_', "-") == s)
            .ok_or_else(|| RankError::UnknownMethod(s.to_string()))
    }
}

impl fmt::Display for RankingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Ranked pairs (Tideman)
// ---------------------------------------------------------------------------

/// Ranked pairs over the victory graph.
///
/// Victories are locked in by descending margin; a victory that would close a
/// cycle with the ones already locked is skipped. The locked graph is then
/// peeled into topological wavefronts, each wavefront one tier.
pub fn ranked_pairs(victory: &VictoryGraph) -> Result<RankedOrdering> {
    let id_map = IdMap::from_ids(victory.items())?;
    let mut candidates = Vec::with_capacity(victory.edges().len());
    for edge in victory.edges() {
        candidates.push((id_map.to_idx(edge.winner)?, id_map.to_idx(edge.loser)?, edge.margin));
    }

    let waves = lock_and_layer(id_map.len(), candidates)?;
    let tiers = waves
        .into_iter()
        .map(|wave| {
            let mut tier: Vec<RankedItem> = wave
                .into_iter()
                .map(|idx| RankedItem { item: id_map.to_id(idx), score: None })
                .collect();
            tier.sort_by_key(|r| r.item);
            tier
        })
        .collect();
    Ok(RankedOrdering::new(tiers))
}

/// Ranked pairs over an explicit margin matrix, flattened to one ordering.
///
/// `margins[i][j]` is how strongly `ids[i]` beat `ids[j]`. Every off-diagonal
/// strictly positive entry is a candidate victory. Items sharing a wavefront
/// come out in the order they appear in `ids`.
pub fn ranked_pairs_from_matrix(ids: &[ItemId], margins: &[Vec<f64>]) -> Result<Vec<ItemId>> {
    if ids.is_empty() && margins.is_empty() {
        return Ok(Vec::new());
    }
    let rows = margins.len();
    if rows != ids.len() || margins.iter().any(|row| row.len() != ids.len()) {
        let cols = margins.iter().map(Vec::len).find(|&c| c != ids.len()).unwrap_or(ids.len());
        return Err(RankError::ShapeMismatch { ids: ids.len(), rows, cols });
    }
    IdMap::from_ids(ids)?;

    let mut candidates = Vec::new();
    for (i, row) in margins.iter().enumerate() {
        for (j, &margin) in row.iter().enumerate() {
            if i != j && margin > 0.0 {
                candidates.push((i, j, margin));
            }
        }
    }

    let waves = lock_and_layer(ids.len(), candidates)?;
    Ok(waves.into_iter().flatten().map(|idx| ids[idx]).collect())
}

/// Lock candidate edges strongest-first, then split the DAG into wavefronts.
///
/// Equal margins are processed in (winner, loser) index order.
fn lock_and_layer(num_nodes: usize, mut candidates: Vec<(usize, usize, f64)>) -> Result<Vec<Vec<usize>>> {
    candidates.sort_by(|a, b| {
        b.2.total_cmp(&a.2)
            .then_with(|| a.0.cmp(&b.0))
            .then_with(|| a.1.cmp(&b.1))
    });

    let mut locked = DiGraph::with_nodes(num_nodes);
    let mut skipped = 0usize;
    for (winner, loser, margin) in candidates {
        if !locked.lock_edge(winner, loser) {
            debug!(winner, loser, margin, "ranked pairs: skipping victory that closes a cycle");
            skipped += 1;
        }
    }
    debug!(locked = locked.edge_count(), skipped, "ranked pairs: edge locking done");

    if let Some(cycle) = locked.find_cycle() {
        return Err(RankError::DegenerateGraph(format!(
            "locked ranked-pairs graph still has a cycle through {} nodes",
            cycle.len()
        )));
    }
    locked.wavefronts()
}

// ---------------------------------------------------------------------------
// Score-based methods
// ---------------------------------------------------------------------------

/// Copeland: victories minus defeats in the victory graph, higher is better.
pub fn copeland(victory: &VictoryGraph) -> RankedOrdering {
    let scores = victory
        .win_loss_balance()
        .into_iter()
        .map(|(item, balance)| (item, balance as f64))
        .collect();
    group_by_score(scores, Ordering::Greater)
}

/// Minimax: rank by the strongest case against each item, lower is better.
///
/// An item's worst case is the largest margin any opponent holds over it. An
/// item with no incoming matchup edge (never played) has a worst case of
/// `-inf` and ranks first.
pub fn minimax(matchups: &MatchupGraph) -> RankedOrdering {
    let scores = matchups
        .items()
        .map(|item| {
            let worst = matchups
                .in_edges(item)
                .map(|e| e.margin)
                .fold(f64::NEG_INFINITY, f64::max);
            (item, worst)
        })
        .collect();
    group_by_score(scores, Ordering::Less)
}

/// Win ratio: total wins / (wins + losses), ties ignored. 0/0 is `+inf`.
pub fn win_ratio(matchups: &MatchupGraph) -> RankedOrdering {
    ratio_ranking(matchups, false)
}

/// Win-tie ratio: (wins + ties) / (wins + ties + losses). 0/0 is `+inf`.
pub fn win_tie_ratio(matchups: &MatchupGraph) -> RankedOrdering {
    ratio_ranking(matchups, true)
}

fn ratio_ranking(matchups: &MatchupGraph, count_ties: bool) -> RankedOrdering {
    let scores = matchups
        .items()
        .map(|item| {
            let totals = matchups.totals(item);
            let good = if count_ties { totals.wins + totals.ties } else { totals.wins };
            let played = good + totals.losses;
            let ratio = if played == 0 {
                f64::INFINITY
            } else {
                f64::from(good) / f64::from(played)
            };
            (item, ratio)
        })
        .collect();
    group_by_score(scores, Ordering::Greater)
}

/// Sort scored items best-first and merge exactly equal scores into tiers.
///
/// `better` says which way is best: `Greater` ranks high scores first,
/// `Less` ranks low scores first.
pub(crate) fn group_by_score(mut scores: Vec<(ItemId, f64)>, better: Ordering) -> RankedOrdering {
    scores.sort_by(|a, b| {
        let by_score = if better == Ordering::Greater {
            b.1.total_cmp(&a.1)
        } else {
            a.1.total_cmp(&b.1)
        };
        by_score.then_with(|| a.0.cmp(&b.0))
    });

    let mut tiers: Vec<Vec<RankedItem>> = Vec::new();
    for (item, score) in scores {
        let entry = RankedItem { item, score: Some(score) };
        match tiers.last_mut() {
            Some(tier) if tier[0].score == Some(score) => tier.push(entry),
            _ => tiers.push(vec![entry]),
        }
    }
    RankedOrdering::new(tiers)
}
