/// Ranking engine orchestrator.
///
/// Owns an injected `VoteStore` and runs the read paths on top of it:
/// store -> filters -> matchup graph -> victory graph -> ranking method, or
/// store -> filters -> Elo replay. All computation is pure; the only IO is the
/// store reads at the start of each call.
use std::collections::{BTreeMap, BTreeSet, HashMap};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, instrument};

use crate::elo::{replay, EloConfig, EloEngine, EloMatch};
use crate::error::{RankError, Result};
use crate::filter::{scope_votes, VoteFilters};
use crate::matchup::MatchupGraph;
use crate::pairing::select_pair;
use crate::ranking::{copeland, minimax, ranked_pairs, win_ratio, win_tie_ratio, RankingMethod};
use crate::store::VoteStore;
use crate::types::{ItemId, Pair, RankedOrdering, Tally, Vote, VoterId, VoterProfile};
use crate::victory::VictoryGraph;

/// Configuration for the ranking engine.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    pub elo: EloConfig,
    /// Seed for Elo replay order and pair selection. `None` draws a fresh
    /// seed from the OS on every call.
    pub seed: Option<u64>,
    /// Rank every stored item, including ones no scoped vote touches.
    pub include_unplayed: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { elo: EloConfig::default(), seed: None, include_unplayed: true }
    }
}

/// How many voters hold at least one intransitive preference cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntransitivityReport {
    /// Voters whose own victory graph contains a cycle.
    pub intransitive: usize,
    pub total_voters: usize,
    /// Voters with no vote left after filtering.
    pub voters_without_votes: usize,
}

pub struct RankingEngine<S> {
    store: S,
    config: EngineConfig,
}

impl<S: VoteStore> RankingEngine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        RankingEngine { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Rank the items in scope with `method`.
    #[instrument(skip_all, fields(method = %method))]
    pub fn rank_by_method(&self, method: RankingMethod, filters: &VoteFilters) -> Result<RankedOrdering> {
        let ordering = match method {
            RankingMethod::RankedPairs => ranked_pairs(&self.victory_graph(filters)?)?,
            RankingMethod::Copeland => copeland(&self.victory_graph(filters)?),
            RankingMethod::Minimax => minimax(&self.matchup_graph(filters)?),
            RankingMethod::WinRatio => win_ratio(&self.matchup_graph(filters)?),
            RankingMethod::WinTieRatio => win_tie_ratio(&self.matchup_graph(filters)?),
            RankingMethod::Elo => self.elo_ordering(filters)?,
        };
        debug!(tiers = ordering.tiers.len(), items = ordering.len(), "ranking done");
        Ok(ordering)
    }

    /// Votes in scope after validating and applying `filters`.
    pub fn scoped_votes(&self, filters: &VoteFilters) -> Result<Vec<Vote>> {
        filters.validate()?;
        if let Some(voter) = filters.voter {
            if self.store.fetch_voter(voter)?.is_none() {
                return Err(RankError::InvalidFilter(format!("voter {voter} does not exist")));
            }
        }
        let raw = self.store.fetch_votes()?;
        let profiles = self.profiles_for(&raw, filters)?;
        let scoped = scope_votes(&raw, filters, &profiles)?;
        debug!(raw = raw.len(), scoped = scoped.len(), "scoped votes");
        Ok(scoped)
    }

    /// Matchup graph of the votes in scope, plus unplayed items when
    /// `include_unplayed` is set.
    pub fn matchup_graph(&self, filters: &VoteFilters) -> Result<MatchupGraph> {
        let votes = self.scoped_votes(filters)?;
        Ok(MatchupGraph::aggregate(&votes).with_items(self.universe(filters)?))
    }

    pub fn victory_graph(&self, filters: &VoteFilters) -> Result<VictoryGraph> {
        Ok(VictoryGraph::from_matchups(&self.matchup_graph(filters)?))
    }

    /// Per-opponent win/loss/tie breakdown for one item over all votes.
    pub fn matchup_summary(&self, item: ItemId) -> Result<BTreeMap<ItemId, Tally>> {
        if !self.store.fetch_all_item_ids()?.contains(&item) {
            return Err(RankError::UnknownItem(item));
        }
        let votes = self.store.fetch_votes()?;
        Ok(MatchupGraph::aggregate(&votes).opponents(item))
    }

    /// Next pair to show `voter`, or `None` once they have voted on every
    /// matchup. Reads the voter's history fresh on each call.
    #[instrument(skip(self))]
    pub fn select_next_pair(&self, voter: VoterId) -> Result<Option<Pair>> {
        if self.store.fetch_voter(voter)?.is_none() {
            return Err(RankError::UnknownVoter(voter));
        }
        let items = self.store.fetch_all_item_ids()?;
        let seen: Vec<Pair> = self
            .store
            .fetch_votes_by_voter(voter)?
            .iter()
            .map(|v| (v.item1, v.item2))
            .collect();
        let pair = select_pair(&items, &seen, &mut self.rng());
        debug!(seen = seen.len(), ?pair, "selected pair");
        Ok(pair)
    }

    /// Count voters whose personal victory graph has a cycle. `filters.voter`
    /// is ignored: every registered voter is checked in turn.
    pub fn intransitivity(&self, filters: &VoteFilters) -> Result<IntransitivityReport> {
        filters.validate()?;
        let voters = self.store.fetch_voter_ids()?;
        let raw = self.store.fetch_votes()?;
        let profiles = self.profiles_for(&raw, filters)?;

        let mut report = IntransitivityReport { total_voters: voters.len(), ..Default::default() };
        for voter in voters {
            let per_voter = VoteFilters { voter: Some(voter), ..filters.clone() };
            let votes = scope_votes(&raw, &per_voter, &profiles)?;
            if votes.is_empty() {
                report.voters_without_votes += 1;
                continue;
            }
            if VictoryGraph::from_matchups(&MatchupGraph::aggregate(&votes)).has_cycle() {
                report.intransitive += 1;
            }
        }
        Ok(report)
    }

    fn elo_ordering(&self, filters: &VoteFilters) -> Result<RankedOrdering> {
        let votes = self.scoped_votes(filters)?;
        let matches: Vec<EloMatch> = votes.iter().map(|v| (v.item1, v.item2, v.outcome)).collect();

        let mut engine = EloEngine::new(self.config.elo);
        for item in self.universe(filters)? {
            engine.ensure_item(item);
        }
        replay(&mut engine, &matches, &mut self.rng());
        Ok(engine.ordering())
    }

    /// Items that must appear in a ranking even without votes.
    fn universe(&self, filters: &VoteFilters) -> Result<Vec<ItemId>> {
        if !self.config.include_unplayed {
            return Ok(Vec::new());
        }
        Ok(self
            .store
            .fetch_all_item_ids()?
            .into_iter()
            .filter(|item| !filters.excluded_items.contains(item))
            .collect())
    }

    fn profiles_for(&self, votes: &[Vote], filters: &VoteFilters) -> Result<HashMap<VoterId, VoterProfile>> {
        let mut profiles = HashMap::new();
        if !filters.needs_profiles() {
            return Ok(profiles);
        }
        let voters: BTreeSet<VoterId> = votes.iter().map(|v| v.voter).collect();
        for voter in voters {
            if let Some(profile) = self.store.fetch_voter(voter)? {
                profiles.insert(voter, profile);
            }
        }
        Ok(profiles)
    }
}
