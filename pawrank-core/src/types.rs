use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{RankError, Result};

/// Caller-provided identifier of a ranked item (a dog).
pub type ItemId = i64;

/// Identifier of a voter.
pub type VoterId = i64;

/// Submission time of a vote, seconds since the Unix epoch.
pub type Timestamp = i64;

/// An ordered pair of items to present side by side.
pub type Pair = (ItemId, ItemId);

/// Result of a single pairwise vote, from `item1`'s point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Outcome {
    /// item1 beat item2 (stored as "win").
    Win1,
    /// item2 beat item1 (stored as "loss").
    Win2,
    Tie,
}

impl Outcome {
    /// Storage spelling: "win", "loss" or "tie".
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win1 => "win",
            Outcome::Win2 => "loss",
            Outcome::Tie => "tie",
        }
    }

    /// Score earned by item1: 1 for a win, 0 for a loss, 0.5 for a tie.
    pub fn item1_score(self) -> f64 {
        match self {
            Outcome::Win1 => 1.0,
            Outcome::Win2 => 0.0,
            Outcome::Tie => 0.5,
        }
    }

    /// Build an outcome from the voting form: the id of the winning item, or
    /// `None` for a tie.
    pub fn from_winner(item1: ItemId, item2: ItemId, winner: Option<ItemId>) -> Result<Outcome> {
        if item1 == item2 {
            return Err(RankError::InvalidVote(format!("item {item1} cannot be matched against itself")));
        }
        match winner {
            None => Ok(Outcome::Tie),
            Some(w) if w == item1 => Ok(Outcome::Win1),
            Some(w) if w == item2 => Ok(Outcome::Win2),
            Some(w) => Err(RankError::InvalidVote(format!(
                "winner {w} is neither {item1} nor {item2}"
            ))),
        }
    }
}

impl FromStr for Outcome {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "win" => Ok(Outcome::Win1),
            "loss" => Ok(Outcome::Win2),
            "tie" => Ok(Outcome::Tie),
            other => Err(RankError::MalformedOutcome(other.to_string())),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable vote record.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vote {
    pub item1: ItemId,
    pub item2: ItemId,
    pub outcome: Outcome,
    pub voter: VoterId,
    pub submitted_at: Timestamp,
}

impl Vote {
    /// True if this vote was cast on `a` vs `b`, in either order.
    pub fn involves_pair(&self, a: ItemId, b: ItemId) -> bool {
        (self.item1 == a && self.item2 == b) || (self.item1 == b && self.item2 == a)
    }
}

/// Win/loss/tie counts of one item against one opponent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl Tally {
    pub fn total(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Win fraction among every recorded vote of the pair. `None` when the
    /// pair was never voted on.
    pub fn margin(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(f64::from(self.wins) / f64::from(total)),
        }
    }

    /// The same matchup seen from the opponent's side.
    pub fn reversed(&self) -> Tally {
        Tally { wins: self.losses, losses: self.wins, ties: self.ties }
    }
}

/// Voter demographics used for filtering. Every attribute is optional.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoterProfile {
    pub id: VoterId,
    pub gender_identity: Option<String>,
    pub age: Option<u32>,
    pub education: Option<String>,
    pub location: Option<String>,
    pub dog_ownership: Option<bool>,
    pub affiliation: Option<String>,
}

/// An item in a ranking with the method-specific score it was ranked by.
///
/// `score` is `None` for methods that produce a pure ordering (ranked pairs).
/// Scores may be infinite: an unplayed item has win ratio `+inf` and minimax
/// worst case `-inf`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedItem {
    pub item: ItemId,
    pub score: Option<f64>,
}

/// Output of a ranking method: tiers from best to worst. Items inside a tier
/// are tied and listed in ascending id order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedOrdering {
    pub tiers: Vec<Vec<RankedItem>>,
}

impl RankedOrdering {
    pub fn new(tiers: Vec<Vec<RankedItem>>) -> Self {
        RankedOrdering { tiers }
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Number of ranked items across all tiers.
    pub fn len(&self) -> usize {
        self.tiers.iter().map(Vec::len).sum()
    }

    /// Item ids best-first with ties laid out side by side.
    pub fn flatten(&self) -> Vec<ItemId> {
        self.tiers.iter().flatten().map(|r| r.item).collect()
    }

    /// Item ids grouped by tier.
    pub fn tier_ids(&self) -> Vec<Vec<ItemId>> {
        self.tiers
            .iter()
            .map(|tier| tier.iter().map(|r| r.item).collect())
            .collect()
    }

    /// 0-based tier of `item`, if it is ranked.
    pub fn tier_of(&self, item: ItemId) -> Option<usize> {
        self.tiers.iter().position(|tier| tier.iter().any(|r| r.item == item))
    }
}

/// Maps between caller-provided i64 IDs and internal 0..N indices.
#[derive(Debug, Clone)]
pub(crate) struct IdMap {
    ids: Vec<ItemId>,
    id_to_idx: HashMap<ItemId, usize>,
}

impl IdMap {
    pub fn from_ids(ids: &[ItemId]) -> Result<Self> {
        let mut id_to_idx = HashMap::with_capacity(ids.len());
        for (idx, &id) in ids.iter().enumerate() {
            if id_to_idx.insert(id, idx).is_some() {
                return Err(RankError::DegenerateGraph(format!("duplicate item id {id}")));
            }
        }
        Ok(IdMap { ids: ids.to_vec(), id_to_idx })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn to_idx(&self, id: ItemId) -> Result<usize> {
        self.id_to_idx.get(&id).copied().ok_or(RankError::UnknownItem(id))
    }

    pub fn to_id(&self, idx: usize) -> ItemId {
        self.ids[idx]
    }
}
