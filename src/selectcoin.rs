use std::fmt;

use crate::algorithms::{BranchAndBound, Knapsack, SelectionStrategy, SingleRandomDraw};
use crate::types::{Algorithm, SelectionRequest, SelectionResult, MAX_MONEY};

/// Tag recorded when no strategy produced a selection.
pub const FAILED_ALGORITHM: &str = "failed";

/// A [`SelectionResult`] together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// `None` when validation rejected the request or every strategy failed.
    pub algorithm: Option<Algorithm>,
    pub result: SelectionResult,
}

impl Selection {
    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm.map_or(FAILED_ALGORITHM, |algorithm| algorithm.as_str())
    }
}

/// Checks a request against the candidate totals before any strategy runs.
///
/// Returns the failing result, or `None` if the request may proceed.
pub fn validate_request(request: &SelectionRequest) -> Option<SelectionResult> {
    if request.target_value == 0 || request.target_value > MAX_MONEY {
        return Some(SelectionResult::invalid_target(request));
    }
    if request.total_value() < request.target_value {
        return Some(SelectionResult::insufficient_funds(request));
    }
    let required = i64::try_from(request.target_value.saturating_add(request.base_fee()))
        .unwrap_or(i64::MAX);
    if request.total_effective_value() < required {
        return Some(SelectionResult::insufficient_funds_after_fees(request));
    }
    None
}

/// Runs selection strategies in priority order and keeps the first success.
///
/// The default cascade is branch and bound, then knapsack, then single random draw. The cascade
/// does not compare solutions across strategies: a worse selection from an earlier strategy wins
/// over a better one a later strategy might have found.
pub struct CoinSelector {
    strategies: Vec<Box<dyn SelectionStrategy>>,
}

impl Default for CoinSelector {
    fn default() -> Self {
        CoinSelector::with_strategies(vec![
            Box::new(BranchAndBound::default()),
            Box::new(Knapsack::default()),
            Box::new(SingleRandomDraw::default()),
        ])
    }
}

impl fmt::Debug for CoinSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.algorithm()))
            .finish()
    }
}

impl CoinSelector {
    pub fn with_strategies(strategies: Vec<Box<dyn SelectionStrategy>>) -> Self {
        CoinSelector { strategies }
    }

    pub fn select(&mut self, request: &SelectionRequest) -> Selection {
        if let Some(result) = validate_request(request) {
            return Selection {
                algorithm: None,
                result,
            };
        }

        for strategy in self.strategies.iter_mut() {
            let algorithm = strategy.algorithm();
            let result = strategy.attempt(request);
            if result.is_success() {
                log::debug!(
                    "{} selected {} coins for target {} sats",
                    algorithm,
                    result.selected_coins.len(),
                    request.target_value
                );
                return Selection {
                    algorithm: Some(algorithm),
                    result,
                };
            }
            log::debug!("{} found no selection ({:?})", algorithm, result.outcome);
        }

        log::warn!(
            "Every strategy failed for target {} sats over {} candidates",
            request.target_value,
            request.candidates.len()
        );
        Selection {
            algorithm: None,
            result: SelectionResult::algorithm_failure(request),
        }
    }
}
