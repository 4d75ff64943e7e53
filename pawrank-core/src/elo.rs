/// Elo ratings replayed over the raw vote sequence.
///
/// Unlike the graph methods, Elo is path dependent: the same votes in a
/// different order give different ratings. Votes are shuffled before replay
/// with a caller-supplied RNG, so a seeded RNG makes the result reproducible.
use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::{ELO_EXPECTATION_DECIMALS, ELO_K_FACTOR, ELO_SCALE, INITIAL_ELO_RATING};
use crate::error::Result;
use crate::ranking::group_by_score;
use crate::types::{ItemId, Outcome, RankedOrdering};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EloConfig {
    pub k_factor: f64,
    pub initial_rating: f64,
    /// Decimal places the expected score is truncated to.
    pub expectation_decimals: u32,
}

impl Default for EloConfig {
    fn default() -> Self {
        EloConfig {
            k_factor: ELO_K_FACTOR,
            initial_rating: INITIAL_ELO_RATING,
            expectation_decimals: ELO_EXPECTATION_DECIMALS,
        }
    }
}

/// A vote stripped to what Elo needs.
pub type EloMatch = (ItemId, ItemId, Outcome);

/// Expected score of item1 against item2, truncated to `decimals` places.
pub fn expected_score(rating1: f64, rating2: f64, decimals: u32) -> f64 {
    let expected = 1.0 / (1.0 + 10f64.powf((rating2 - rating1) / ELO_SCALE));
    let scale = 10f64.powi(decimals as i32);
    (expected * scale).trunc() / scale
}

pub struct EloEngine {
    config: EloConfig,
    ratings: HashMap<ItemId, f64>,
}

impl EloEngine {
    pub fn new(config: EloConfig) -> Self {
        EloEngine { config, ratings: HashMap::new() }
    }

    /// Current rating, or the initial rating for an item not seen yet.
    pub fn rating(&self, item: ItemId) -> f64 {
        self.ratings.get(&item).copied().unwrap_or(self.config.initial_rating)
    }

    /// Make sure `item` appears in the standings even if it never plays.
    pub fn ensure_item(&mut self, item: ItemId) {
        self.ratings.entry(item).or_insert(self.config.initial_rating);
    }

    /// Apply one vote. Returns the delta added to item1; item2 loses exactly
    /// the same amount.
    pub fn record(&mut self, item1: ItemId, item2: ItemId, outcome: Outcome) -> f64 {
        let rating1 = self.rating(item1);
        let rating2 = self.rating(item2);
        let expected = expected_score(rating1, rating2, self.config.expectation_decimals);
        let delta = self.config.k_factor * (outcome.item1_score() - expected);

        self.ratings.insert(item1, rating1 + delta);
        self.ratings.insert(item2, rating2 - delta);
        delta
    }

    /// All rated items, highest rating first, ties by ascending id.
    pub fn standings(&self) -> Vec<(ItemId, f64)> {
        let mut standings: Vec<(ItemId, f64)> = self.ratings.iter().map(|(&i, &r)| (i, r)).collect();
        standings.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        standings
    }

    /// Standings as tiers; items with bit-identical ratings share a tier.
    pub fn ordering(&self) -> RankedOrdering {
        group_by_score(self.standings(), std::cmp::Ordering::Greater)
    }
}

/// Shuffle `matches` with `rng`, replay them, and return the final standings.
pub fn compute_elo(matches: &[EloMatch], config: EloConfig, rng: &mut impl Rng) -> Vec<(ItemId, f64)> {
    let mut engine = EloEngine::new(config);
    replay(&mut engine, matches, rng);
    engine.standings()
}

/// Same as `compute_elo`, for outcomes still in their stored spelling.
///
/// Every outcome is validated before any rating moves: one malformed record
/// fails the whole computation.
pub fn compute_elo_from_raw(
    matches: &[(ItemId, ItemId, &str)],
    config: EloConfig,
    rng: &mut impl Rng,
) -> Result<Vec<(ItemId, f64)>> {
    let parsed = matches
        .iter()
        .map(|&(a, b, outcome)| Ok((a, b, outcome.parse::<Outcome>()?)))
        .collect::<Result<Vec<EloMatch>>>()?;
    Ok(compute_elo(&parsed, config, rng))
}

pub(crate) fn replay(engine: &mut EloEngine, matches: &[EloMatch], rng: &mut impl Rng) {
    let mut order: Vec<&EloMatch> = matches.iter().collect();
    order.shuffle(rng);
    for &&(item1, item2, outcome) in &order {
        engine.record(item1, item2, outcome);
    }
}
