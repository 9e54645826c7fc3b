use rand::{rngs::ThreadRng, thread_rng, Rng};

use crate::{
    algorithms::SelectionStrategy,
    types::{Algorithm, CandidateGroup, MatchParameters, SelectionRequest, SelectionResult},
    utils::effective_value,
};

/// Upper bound on the number of nodes explored before giving up.
const BNB_TRIES: u32 = 1_000_000;

/// Perform coin selection via Branch And Bound.
///
/// Looks for a subset whose effective value lands between the target plus base fee and that
/// amount plus the cost of change, so no change output is needed. Fails when no such subset is
/// found within the iteration budget.
pub fn select_coin_bnb<R: Rng + ?Sized>(
    request: &SelectionRequest,
    rng: &mut R,
) -> SelectionResult {
    let mut selected_inputs: Vec<usize> = vec![];

    // Variable is mutable for decrement of bnb_tries for every iteration of fn bnb
    let mut bnb_tries: u32 = BNB_TRIES;

    let match_parameters = MatchParameters {
        target_for_match: request.target_value.saturating_add(request.base_fee()),
        match_range: request.cost_of_change(),
        target_feerate: request.target_feerate,
    };

    let mut sorted_inputs: Vec<(usize, &CandidateGroup)> =
        request.candidates.iter().enumerate().collect();
    sorted_inputs.sort_by_key(|(_, group)| std::cmp::Reverse(group.value()));

    match bnb(
        &sorted_inputs,
        &mut selected_inputs,
        0,
        0,
        &mut bnb_tries,
        rng,
        &match_parameters,
    ) {
        Some(selected) => SelectionResult::from_selection(request, &selected),
        None => SelectionResult::algorithm_failure(request),
    }
}

/// Returns `None` if no solution is found in this branch.
fn bnb<R: Rng + ?Sized>(
    inputs_in_desc_value: &[(usize, &CandidateGroup)],
    selected_inputs: &mut Vec<usize>,
    acc_eff_value: u64,
    depth: usize,
    bnb_tries: &mut u32,
    rng: &mut R,
    match_parameters: &MatchParameters,
) -> Option<Vec<usize>> {
    let upper_bound = match_parameters
        .target_for_match
        .saturating_add(match_parameters.match_range);
    if acc_eff_value > upper_bound {
        return None;
    }
    if acc_eff_value >= match_parameters.target_for_match {
        return Some(selected_inputs.to_vec());
    }

    // Capping the number of iterations on the computation
    if *bnb_tries == 0 || depth >= inputs_in_desc_value.len() {
        return None;
    }
    *bnb_tries -= 1;

    let (index, group) = inputs_in_desc_value[depth];
    let with_value =
        acc_eff_value.saturating_add(effective_value(group, match_parameters.target_feerate));

    if rng.gen_bool(0.5) {
        // first include then omit
        selected_inputs.push(index);
        if let Some(found) = bnb(
            inputs_in_desc_value,
            selected_inputs,
            with_value,
            depth + 1,
            bnb_tries,
            rng,
            match_parameters,
        ) {
            return Some(found);
        }
        selected_inputs.pop();
        bnb(
            inputs_in_desc_value,
            selected_inputs,
            acc_eff_value,
            depth + 1,
            bnb_tries,
            rng,
            match_parameters,
        )
    } else {
        if let Some(found) = bnb(
            inputs_in_desc_value,
            selected_inputs,
            acc_eff_value,
            depth + 1,
            bnb_tries,
            rng,
            match_parameters,
        ) {
            return Some(found);
        }
        selected_inputs.push(index);
        let with_this = bnb(
            inputs_in_desc_value,
            selected_inputs,
            with_value,
            depth + 1,
            bnb_tries,
            rng,
            match_parameters,
        );
        if with_this.is_none() {
            selected_inputs.pop();
        }
        with_this
    }
}

/// [`select_coin_bnb`] as a cascade strategy.
#[derive(Debug, Clone)]
pub struct BranchAndBound<R = ThreadRng> {
    rng: R,
}

impl Default for BranchAndBound<ThreadRng> {
    fn default() -> Self {
        BranchAndBound { rng: thread_rng() }
    }
}

impl<R: Rng> BranchAndBound<R> {
    pub fn with_rng(rng: R) -> Self {
        BranchAndBound { rng }
    }
}

impl<R: Rng> SelectionStrategy for BranchAndBound<R> {
    fn algorithm(&self) -> Algorithm {
        Algorithm::BranchAndBound
    }

    fn attempt(&mut self, request: &SelectionRequest) -> SelectionResult {
        select_coin_bnb(request, &mut self.rng)
    }
}
