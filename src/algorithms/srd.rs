use rand::{rngs::ThreadRng, seq::SliceRandom, thread_rng, Rng};

use crate::{
    algorithms::SelectionStrategy,
    types::{Algorithm, SelectionRequest, SelectionResult, Weight},
    utils::calculate_fee,
};

/// Performs coin selection using a single random draw.
///
/// Candidates are drawn in random order until they pay for the target, a change output of at
/// least `min_change_value`, and the fee of the whole transaction. If the wallet cannot afford the
/// change output, everything drawn is spent without change as long as the target and fee are
/// covered.
pub fn select_coin_srd<R: Rng + ?Sized>(
    request: &SelectionRequest,
    rng: &mut R,
) -> SelectionResult {
    // In output we need to specify the indexes of the inputs in the given order
    // So keep track of the indexes when randomizing the vec
    let mut randomized_inputs: Vec<_> = request.candidates.iter().enumerate().collect();
    randomized_inputs.shuffle(rng);

    let mut accumulated_value: u64 = 0;
    let mut accumulated_weight: Weight = 0;
    let mut selected_inputs = Vec::new();

    for (index, group) in randomized_inputs {
        selected_inputs.push(index);
        accumulated_value = accumulated_value.saturating_add(group.value());
        accumulated_weight = accumulated_weight.saturating_add(group.weight());

        let estimated_fee = calculate_fee(
            request
                .base_weight
                .saturating_add(accumulated_weight)
                .saturating_add(request.output_drain_weight),
            request.target_feerate,
        );
        let required = request
            .target_value
            .saturating_add(request.min_change_value)
            .saturating_add(estimated_fee);
        if accumulated_value >= required {
            return SelectionResult::from_selection(request, &selected_inputs);
        }
    }

    let changeless_fee = calculate_fee(
        request.base_weight.saturating_add(accumulated_weight),
        request.target_feerate,
    );
    let required = request.target_value.saturating_add(changeless_fee);
    if !selected_inputs.is_empty() && accumulated_value >= required {
        return SelectionResult::from_selection(request, &selected_inputs);
    }

    SelectionResult::algorithm_failure(request)
}

/// [`select_coin_srd`] as a cascade strategy.
#[derive(Debug, Clone)]
pub struct SingleRandomDraw<R = ThreadRng> {
    rng: R,
}

impl Default for SingleRandomDraw<ThreadRng> {
    fn default() -> Self {
        SingleRandomDraw { rng: thread_rng() }
    }
}

impl<R: Rng> SingleRandomDraw<R> {
    pub fn with_rng(rng: R) -> Self {
        SingleRandomDraw { rng }
    }
}

impl<R: Rng> SelectionStrategy for SingleRandomDraw<R> {
    fn algorithm(&self) -> Algorithm {
        Algorithm::SingleRandomDraw
    }

    fn attempt(&mut self, request: &SelectionRequest) -> SelectionResult {
        select_coin_srd(request, &mut self.rng)
    }
}
