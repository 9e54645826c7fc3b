use rand::{rngs::ThreadRng, thread_rng, Rng};
use std::{cmp::Reverse, collections::HashSet};

use crate::{
    algorithms::SelectionStrategy,
    types::{Algorithm, EffectiveValue, SelectionRequest, SelectionResult},
    utils::effective_value,
};

/// Number of randomized rounds before settling for the best set seen.
const KNAPSACK_ITERATIONS: u32 = 1000;

/// Perform coin selection via the knapsack solver.
///
/// Only candidates smaller than the adjusted target (target + minimum change + base fee) take
/// part. Returns the first exact match, or else the smallest set that exceeds the target.
pub fn select_coin_knapsack<R: Rng + ?Sized>(
    request: &SelectionRequest,
    rng: &mut R,
) -> SelectionResult {
    let adjusted_target = request
        .target_value
        .saturating_add(request.min_change_value)
        .saturating_add(request.base_fee());
    let mut smaller_coins = request
        .candidates
        .iter()
        .enumerate()
        .filter(|&(_, group)| group.value() < adjusted_target)
        .map(|(index, group)| (index, effective_value(group, request.target_feerate)))
        .collect::<Vec<_>>();
    smaller_coins.sort_by_key(|&(_, value)| Reverse(value));

    match knap_sack(adjusted_target, &smaller_coins, rng) {
        Some(selected) => {
            let mut selected: Vec<usize> = selected.into_iter().collect();
            selected.sort_unstable();
            SelectionResult::from_selection(request, &selected)
        }
        None => SelectionResult::algorithm_failure(request),
    }
}

fn knap_sack<R: Rng + ?Sized>(
    adjusted_target: u64,
    smaller_coins: &[(usize, EffectiveValue)],
    rng: &mut R,
) -> Option<HashSet<usize>> {
    let mut selected_inputs: HashSet<usize> = HashSet::new();
    let mut accumulated_value: u64 = 0;
    let mut best_set: HashSet<usize> = HashSet::new();
    let mut best_set_value: u64 = u64::MAX;
    for _ in 1..=KNAPSACK_ITERATIONS {
        for pass in 1..=2 {
            for &(index, value) in smaller_coins {
                let toss_result: bool = rng.gen_bool(0.5);
                if (pass == 2 && !selected_inputs.contains(&index)) || (pass == 1 && toss_result) {
                    selected_inputs.insert(index);
                    accumulated_value += value;
                    if accumulated_value == adjusted_target {
                        return Some(selected_inputs);
                    } else if accumulated_value >= adjusted_target {
                        if accumulated_value < best_set_value {
                            best_set_value = accumulated_value;
                            best_set.clone_from(&selected_inputs);
                        }
                        selected_inputs.remove(&index);
                        accumulated_value -= value;
                    }
                }
            }
        }
        accumulated_value = 0;
        selected_inputs.clear();
    }
    if best_set_value == u64::MAX {
        None
    } else {
        Some(best_set)
    }
}

/// [`select_coin_knapsack`] as a cascade strategy.
#[derive(Debug, Clone)]
pub struct Knapsack<R = ThreadRng> {
    rng: R,
}

impl Default for Knapsack<ThreadRng> {
    fn default() -> Self {
        Knapsack { rng: thread_rng() }
    }
}

impl<R: Rng> Knapsack<R> {
    pub fn with_rng(rng: R) -> Self {
        Knapsack { rng }
    }
}

impl<R: Rng> SelectionStrategy for Knapsack<R> {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Knapsack
    }

    fn attempt(&mut self, request: &SelectionRequest) -> SelectionResult {
        select_coin_knapsack(request, &mut self.rng)
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::{
        algorithms::{
            knapsack::select_coin_knapsack, testutils::setup_request, Knapsack, SelectionStrategy,
        },
        types::SelectionOutcome,
        utils::calculate_fee,
    };

    const CENT: u64 = 1_000_000;

    fn test_knapsack_empty_wallet() {
        let request = setup_request(&[], 1000, 0.33);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let result = select_coin_knapsack(&request, &mut rng);
        assert_eq!(result.outcome, SelectionOutcome::AlgorithmFailure);
    }

    fn test_knapsack_selects_both_coins() {
        // Neither 2 nor 1 CENT alone reaches 2.5 CENT, both together do.
        let request = setup_request(&[2 * CENT, CENT], 5 * CENT / 2, 0.56);
        for seed in 0..10 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let result = select_coin_knapsack(&request, &mut rng);
            assert_eq!(result.outcome, SelectionOutcome::Success);
            assert_eq!(result.selected_coins.len(), 2);
            assert!(result.selected_value() >= request.target_value + result.fee);
        }
    }

    fn test_knapsack_prefers_smallest_sufficient_set() {
        // 5 + 2 CENT is the smallest set above 6.5 CENT + min change + fees.
        let values = [20 * CENT, 10 * CENT, 5 * CENT, 2 * CENT, CENT];
        let request = setup_request(&values, 13 * CENT / 2, 0.56);
        let mut strategy = Knapsack::with_rng(ChaCha8Rng::seed_from_u64(3));
        let result = strategy.attempt(&request);
        assert_eq!(result.outcome, SelectionOutcome::Success);
        let mut values: Vec<u64> = result.selected_coins.iter().map(|c| c.value).collect();
        values.sort_unstable();
        assert_eq!(values, vec![2 * CENT, 5 * CENT]);
    }

    fn test_knapsack_ignores_larger_coins() {
        // The only coin that could pay is larger than the adjusted target.
        let target = 10 * CENT;
        let request = setup_request(&[target + 526 + calculate_fee(44, 1.0) + 1], target, 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let result = select_coin_knapsack(&request, &mut rng);
        assert_eq!(result.outcome, SelectionOutcome::AlgorithmFailure);
    }

    #[test]
    fn test_knapsack() {
        test_knapsack_empty_wallet();
        test_knapsack_selects_both_coins();
        test_knapsack_prefers_smallest_sufficient_set();
        test_knapsack_ignores_larger_coins();
    }
}
