/// pawrank-core: Pure-computation ranking engine for pairwise votes.
///
/// Votes ("which dog is cuter?") → matchup tallies → victory graph → ranking.
/// No IO, no database, no HTTP. Storage is reached only through the
/// `VoteStore` trait, injected into `RankingEngine`.
///
/// Items and voters are identified by caller-provided `i64` IDs.
///
/// # Quick start
///
/// ```rust
/// use pawrank_core::{
///     EngineConfig, MemoryVoteStore, Outcome, RankingEngine, RankingMethod, VoteFilters, VoterProfile,
/// };
///
/// let mut store = MemoryVoteStore::with_items([1, 2, 3]);
/// store.add_voter(VoterProfile { id: 7, ..VoterProfile::default() });
/// store.push_vote(1, 2, Outcome::Win1, 7, 0).unwrap();
/// store.push_vote(2, 3, Outcome::Win1, 7, 1).unwrap();
///
/// let engine = RankingEngine::new(store, EngineConfig::default());
/// let ranking = engine
///     .rank_by_method(RankingMethod::RankedPairs, &VoteFilters::default())
///     .unwrap();
///
/// assert_eq!(ranking.flatten(), vec![1, 2, 3]);
/// ```

pub mod constants;
pub mod elo;
pub mod engine;
pub mod error;
pub mod filter;
pub(crate) mod graph;
pub mod matchup;
pub mod pairing;
pub mod ranking;
pub mod store;
pub mod types;
pub mod victory;

// Re-export primary public API at crate root.
pub use elo::{compute_elo, compute_elo_from_raw, expected_score, EloConfig, EloEngine, EloMatch};
pub use engine::{EngineConfig, IntransitivityReport, RankingEngine};
pub use error::{RankError, Result};
pub use filter::{scope_votes, VoteFilters};
pub use matchup::{aggregate, MatchupEdge, MatchupGraph};
pub use pairing::{all_ordered_pairs, select_pair, unseen_pairs};
pub use ranking::{
    copeland, minimax, ranked_pairs, ranked_pairs_from_matrix, win_ratio, win_tie_ratio, RankingMethod,
};
pub use store::{MemoryVoteStore, VoteStore};
pub use types::{
    ItemId, Outcome, Pair, RankedItem, RankedOrdering, Tally, Timestamp, Vote, VoterId, VoterProfile,
};
pub use victory::{reduce, VictoryEdge, VictoryGraph};
