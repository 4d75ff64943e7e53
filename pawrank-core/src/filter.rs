/// Vote scoping: demographic and voter filters, item exclusion, and the
/// per-voter "first N votes" cap.
///
/// All filters combine with AND; an absent filter imposes nothing. The
/// first-N cap runs last, on whatever survived the other filters, keeping
/// each voter's earliest N votes by submission time (store order breaks
/// timestamp ties).
use std::collections::{BTreeSet, HashMap};

use crate::error::{RankError, Result};
use crate::types::{ItemId, Vote, VoterId, VoterProfile};

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VoteFilters {
    pub education: Option<String>,
    pub location: Option<String>,
    pub gender_identity: Option<String>,
    pub age_min: Option<u32>,
    pub age_max: Option<u32>,
    pub voter: Option<VoterId>,
    pub first_n: Option<usize>,
    pub excluded_items: BTreeSet<ItemId>,
}

impl VoteFilters {
    /// True when any filter needs voter attributes to evaluate.
    pub fn needs_profiles(&self) -> bool {
        self.education.is_some()
            || self.location.is_some()
            || self.gender_identity.is_some()
            || self.age_min.is_some()
            || self.age_max.is_some()
    }

    /// Reject filter values that can never be satisfied meaningfully.
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.age_min, self.age_max) {
            if min > max {
                return Err(RankError::InvalidFilter(format!(
                    "age range is empty: minimum {min} is above maximum {max}"
                )));
            }
        }
        if self.first_n == Some(0) {
            return Err(RankError::InvalidFilter("first_n must be at least 1".to_string()));
        }
        Ok(())
    }

    fn matches_profile(&self, profile: Option<&VoterProfile>) -> bool {
        if !self.needs_profiles() {
            return true;
        }
        let Some(p) = profile else {
            return false;
        };
        fn same(filter: &Option<String>, value: &Option<String>) -> bool {
            match filter {
                None => true,
                Some(f) => value.as_deref() == Some(f.as_str()),
            }
        }
        same(&self.education, &p.education)
            && same(&self.location, &p.location)
            && same(&self.gender_identity, &p.gender_identity)
            && self.age_min.map_or(true, |min| p.age.is_some_and(|age| age >= min))
            && self.age_max.map_or(true, |max| p.age.is_some_and(|age| age <= max))
    }

    fn admits(&self, vote: &Vote, profiles: &HashMap<VoterId, VoterProfile>) -> bool {
        if self.voter.is_some_and(|v| v != vote.voter) {
            return false;
        }
        if self.excluded_items.contains(&vote.item1) || self.excluded_items.contains(&vote.item2) {
            return false;
        }
        self.matches_profile(profiles.get(&vote.voter))
    }
}

/// Apply `filters` to `raw` votes. `profiles` must hold every voter whose
/// attributes a demographic filter needs; a voter missing from it fails any
/// demographic filter. Surviving votes keep their input order.
pub fn scope_votes(
    raw: &[Vote],
    filters: &VoteFilters,
    profiles: &HashMap<VoterId, VoterProfile>,
) -> Result<Vec<Vote>> {
    filters.validate()?;

    let admitted: Vec<Vote> = raw.iter().filter(|v| filters.admits(v, profiles)).copied().collect();

    let Some(n) = filters.first_n else {
        return Ok(admitted);
    };

    let mut by_voter: HashMap<VoterId, Vec<usize>> = HashMap::new();
    for (idx, vote) in admitted.iter().enumerate() {
        by_voter.entry(vote.voter).or_default().push(idx);
    }
    let mut keep = vec![false; admitted.len()];
    for indices in by_voter.values_mut() {
        indices.sort_by_key(|&idx| admitted[idx].submitted_at);
        for &idx in indices.iter().take(n) {
            keep[idx] = true;
        }
    }

    Ok(admitted
        .into_iter()
        .zip(keep)
        .filter_map(|(vote, kept)| kept.then_some(vote))
        .collect())
}
