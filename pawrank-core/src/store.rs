/// The narrow read interface the ranking core needs from vote storage.
///
/// Implementations own all IO. Every call is a fresh read; the core never
/// caches results between calls.
use std::collections::BTreeMap;

use crate::error::{RankError, Result};
use crate::types::{ItemId, Outcome, Timestamp, Vote, VoterId, VoterProfile};

pub trait VoteStore {
    /// The whole vote log, oldest first.
    fn fetch_votes(&self) -> Result<Vec<Vote>>;

    /// Votes cast by one voter, oldest first.
    fn fetch_votes_by_voter(&self, voter: VoterId) -> Result<Vec<Vote>> {
        Ok(self.fetch_votes()?.into_iter().filter(|v| v.voter == voter).collect())
    }

    fn fetch_voter(&self, voter: VoterId) -> Result<Option<VoterProfile>>;

    fn fetch_voter_ids(&self) -> Result<Vec<VoterId>>;

    /// Every rankable item, voted on or not.
    fn fetch_all_item_ids(&self) -> Result<Vec<ItemId>>;
}

impl<S: VoteStore + ?Sized> VoteStore for &S {
    fn fetch_votes(&self) -> Result<Vec<Vote>> {
        (**self).fetch_votes()
    }

    fn fetch_votes_by_voter(&self, voter: VoterId) -> Result<Vec<Vote>> {
        (**self).fetch_votes_by_voter(voter)
    }

    fn fetch_voter(&self, voter: VoterId) -> Result<Option<VoterProfile>> {
        (**self).fetch_voter(voter)
    }

    fn fetch_voter_ids(&self) -> Result<Vec<VoterId>> {
        (**self).fetch_voter_ids()
    }

    fn fetch_all_item_ids(&self) -> Result<Vec<ItemId>> {
        (**self).fetch_all_item_ids()
    }
}

/// In-memory store, for embedding the engine and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryVoteStore {
    items: Vec<ItemId>,
    voters: BTreeMap<VoterId, VoterProfile>,
    votes: Vec<Vote>,
}

impl MemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = ItemId>) -> Self {
        let mut store = Self::new();
        for item in items {
            store.add_item(item);
        }
        store
    }

    pub fn add_item(&mut self, item: ItemId) {
        if !self.items.contains(&item) {
            self.items.push(item);
        }
    }

    pub fn add_voter(&mut self, profile: VoterProfile) {
        self.voters.insert(profile.id, profile);
    }

    /// Append a vote. Both items and the voter must already be known.
    pub fn push_vote(
        &mut self,
        item1: ItemId,
        item2: ItemId,
        outcome: Outcome,
        voter: VoterId,
        submitted_at: Timestamp,
    ) -> Result<()> {
        for item in [item1, item2] {
            if !self.items.contains(&item) {
                return Err(RankError::UnknownItem(item));
            }
        }
        if !self.voters.contains_key(&voter) {
            return Err(RankError::UnknownVoter(voter));
        }
        if item1 == item2 {
            return Err(RankError::InvalidVote(format!("item {item1} cannot be matched against itself")));
        }
        self.votes.push(Vote { item1, item2, outcome, voter, submitted_at });
        Ok(())
    }
}

impl VoteStore for MemoryVoteStore {
    fn fetch_votes(&self) -> Result<Vec<Vote>> {
        Ok(self.votes.clone())
    }

    fn fetch_voter(&self, voter: VoterId) -> Result<Option<VoterProfile>> {
        Ok(self.voters.get(&voter).cloned())
    }

    fn fetch_voter_ids(&self) -> Result<Vec<VoterId>> {
        Ok(self.voters.keys().copied().collect())
    }

    fn fetch_all_item_ids(&self) -> Result<Vec<ItemId>> {
        Ok(self.items.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_vote_checks_references() {
        let mut store = MemoryVoteStore::with_items([1, 2]);
        store.add_voter(VoterProfile { id: 5, ..VoterProfile::default() });
        assert!(store.push_vote(1, 2, Outcome::Win1, 5, 0).is_ok());
        assert!(matches!(store.push_vote(1, 3, Outcome::Win1, 5, 0), Err(RankError::UnknownItem(3))));
        assert!(matches!(store.push_vote(1, 2, Outcome::Win1, 6, 0), Err(RankError::UnknownVoter(6))));
        assert!(matches!(store.push_vote(2, 2, Outcome::Tie, 5, 0), Err(RankError::InvalidVote(_))));
    }

    #[test]
    fn test_votes_by_voter_default_filters_log() {
        let mut store = MemoryVoteStore::with_items([1, 2, 3]);
        store.add_voter(VoterProfile { id: 1, ..VoterProfile::default() });
        store.add_voter(VoterProfile { id: 2, ..VoterProfile::default() });
        store.push_vote(1, 2, Outcome::Win1, 1, 0).unwrap();
        store.push_vote(2, 3, Outcome::Tie, 2, 1).unwrap();
        let by_two = store.fetch_votes_by_voter(2).unwrap();
        assert_eq!(by_two.len(), 1);
        assert_eq!(by_two[0].outcome, Outcome::Tie);
        assert_eq!((&store).fetch_voter_ids().unwrap(), vec![1, 2]);
    }
}
