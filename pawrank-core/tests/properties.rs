use std::collections::BTreeSet;

use pawrank_core::{
    aggregate, ranked_pairs, ranked_pairs_from_matrix, select_pair, EloConfig, EloEngine, EngineConfig, ItemId,
    MemoryVoteStore, Outcome, Pair, RankingEngine, RankingMethod, Vote, VoteFilters, VoterProfile, VictoryGraph,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const ITEMS: i64 = 6;
const VOTERS: i64 = 3;

fn outcome_strategy() -> impl Strategy<Value = Outcome> {
    prop_oneof![Just(Outcome::Win1), Just(Outcome::Win2), Just(Outcome::Tie)]
}

fn votes_strategy() -> impl Strategy<Value = Vec<Vote>> {
    prop::collection::vec((0..ITEMS, 0..ITEMS, outcome_strategy(), 0..VOTERS), 0..40).prop_map(|raw| {
        raw.into_iter()
            .filter(|&(a, b, _, _)| a != b)
            .enumerate()
            .map(|(t, (item1, item2, outcome, voter))| Vote { item1, item2, outcome, voter, submitted_at: t as i64 })
            .collect()
    })
}

fn margin_matrix(n: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(prop::collection::vec(0u32..=100, n), n).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, row)| {
                row.into_iter()
                    .enumerate()
                    .map(|(j, v)| if i == j { 0.0 } else { f64::from(v) / 100.0 })
                    .collect()
            })
            .collect()
    })
}

fn engine_for(votes: &[Vote], seed: u64) -> RankingEngine<MemoryVoteStore> {
    let mut store = MemoryVoteStore::with_items(0..ITEMS);
    for voter in 0..VOTERS {
        store.add_voter(VoterProfile { id: voter, ..VoterProfile::default() });
    }
    for v in votes {
        store.push_vote(v.item1, v.item2, v.outcome, v.voter, v.submitted_at).unwrap();
    }
    RankingEngine::new(store, EngineConfig { seed: Some(seed), ..EngineConfig::default() })
}

proptest! {
    #[test]
    fn prop_matchup_tallies_are_symmetric(votes in votes_strategy()) {
        let graph = aggregate(&votes);
        for a in 0..ITEMS {
            for b in 0..ITEMS {
                match (graph.tally(a, b), graph.tally(b, a)) {
                    (Some(ab), Some(ba)) => {
                        prop_assert_eq!(ab.wins, ba.losses);
                        prop_assert_eq!(ab.ties, ba.ties);
                    }
                    (None, None) => {}
                    (ab, ba) => prop_assert!(false, "one-sided tally {:?} / {:?} for {} vs {}", ab, ba, a, b),
                }
            }
        }
    }

    #[test]
    fn prop_ranking_is_idempotent(votes in votes_strategy(), seed in any::<u64>()) {
        let engine = engine_for(&votes, seed);
        for method in RankingMethod::ALL {
            let first = engine.rank_by_method(method, &VoteFilters::default()).unwrap();
            let second = engine.rank_by_method(method, &VoteFilters::default()).unwrap();
            prop_assert_eq!(first, second, "{} changed between calls", method);
        }
    }

    #[test]
    fn prop_ranking_preserves_item_set(votes in votes_strategy(), seed in any::<u64>()) {
        let engine = engine_for(&votes, seed);
        for method in RankingMethod::ALL {
            let mut ranked = engine.rank_by_method(method, &VoteFilters::default()).unwrap().flatten();
            ranked.sort_unstable();
            prop_assert_eq!(ranked, (0..ITEMS).collect::<Vec<_>>(), "{} lost or duplicated items", method);
        }
    }

    #[test]
    fn prop_ranked_pairs_never_fails_on_any_matrix(matrix in margin_matrix(5)) {
        let ids: Vec<ItemId> = vec![10, 20, 30, 40, 50];
        let order = ranked_pairs_from_matrix(&ids, &matrix).unwrap();
        let seen: BTreeSet<ItemId> = order.iter().copied().collect();
        prop_assert_eq!(order.len(), ids.len());
        prop_assert_eq!(seen.len(), ids.len());
    }

    #[test]
    fn prop_ranked_pairs_over_votes_is_acyclic(votes in votes_strategy()) {
        let victory = VictoryGraph::from_matchups(&aggregate(&votes));
        let ordering = ranked_pairs(&victory).unwrap();
        prop_assert_eq!(ordering.len(), victory.items().len());
    }

    #[test]
    fn prop_highest_margin_is_never_reversed(matrix in margin_matrix(5)) {
        let max = matrix.iter().flatten().copied().fold(0.0_f64, f64::max);
        let at_max: Vec<(usize, usize)> = (0..5)
            .flat_map(|i| (0..5).map(move |j| (i, j)))
            .filter(|&(i, j)| i != j && matrix[i][j] == max)
            .collect();
        prop_assume!(max > 0.0 && at_max.len() == 1);

        let (winner, loser) = at_max[0];
        let ids: Vec<ItemId> = (0..5).collect();
        let order = ranked_pairs_from_matrix(&ids, &matrix).unwrap();
        let pos = |id: usize| order.iter().position(|&x| x == id as ItemId).unwrap();
        prop_assert!(pos(winner) < pos(loser), "{} should precede {} in {:?}", winner, loser, order);
    }

    #[test]
    fn prop_elo_updates_are_zero_sum(
        matches in prop::collection::vec((0..ITEMS, 0..ITEMS, outcome_strategy()), 1..60),
    ) {
        let mut engine = EloEngine::new(EloConfig::default());
        for (a, b, outcome) in matches.into_iter().filter(|&(a, b, _)| a != b) {
            let (before1, before2) = (engine.rating(a), engine.rating(b));
            let delta = engine.record(a, b, outcome);
            prop_assert!((engine.rating(a) - before1 - delta).abs() < 1e-9);
            prop_assert!((engine.rating(b) - before2 + delta).abs() < 1e-9);
        }
        let total: f64 = engine.standings().iter().map(|&(_, r)| r - EloConfig::default().initial_rating).sum();
        prop_assert!(total.abs() < 1e-6);
    }

    #[test]
    fn prop_pair_selection_exhausts_without_repeats(n in 0usize..7, seed in any::<u64>()) {
        let items: Vec<ItemId> = (0..n as i64).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut seen: Vec<Pair> = Vec::new();
        while let Some((a, b)) = select_pair(&items, &seen, &mut rng) {
            prop_assert!(a != b);
            prop_assert!(!seen.iter().any(|&(x, y)| (x, y) == (a, b) || (x, y) == (b, a)));
            seen.push((a, b));
        }
        prop_assert_eq!(seen.len(), n * n.saturating_sub(1) / 2);
    }
}
