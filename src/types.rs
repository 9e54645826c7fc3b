use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::{calculate_fee, signed_effective_value};

/// Largest amount of satoshis that can ever exist.
pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

pub type EffectiveValue = u64;
pub type Weight = u32;

/// Stable identifier of a [`Coin`], unique within one [`UtxoPool`](crate::pool::UtxoPool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CoinId(pub u64);

impl fmt::Display for CoinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "coin#{}", self.0)
    }
}

/// A spendable output held by the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coin {
    pub id: CoinId,
    /// Value in satoshis.
    pub value: u64,
    /// Weight this coin adds to a transaction when spent as an input.
    pub input_weight: Weight,
}

/// A [`CandidateGroup`] represents an input candidate for coin selection. This can either be a
/// single coin, or a group of coins that must be spent together.
///
/// Groups handed to the selection strategies are snapshots; the pool keeps the authoritative copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateGroup {
    coins: Vec<Coin>,
}

impl CandidateGroup {
    /// Returns `None` for an empty set of coins, groups are never empty.
    pub fn new(coins: Vec<Coin>) -> Option<Self> {
        if coins.is_empty() {
            None
        } else {
            Some(CandidateGroup { coins })
        }
    }

    pub fn single(coin: Coin) -> Self {
        CandidateGroup { coins: vec![coin] }
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    /// Total value of the coins in this group.
    pub fn value(&self) -> u64 {
        self.coins.iter().map(|coin| coin.value).sum()
    }

    /// Total input weight of spending every coin in this group.
    pub fn weight(&self) -> Weight {
        self.coins
            .iter()
            .fold(0, |total: Weight, coin| total.saturating_add(coin.input_weight))
    }

    pub fn input_count(&self) -> usize {
        self.coins.len()
    }
}

/// A payment waiting to be included in the next withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPayment {
    /// Value in satoshis.
    pub amount: u64,
    /// Weight of the output paying this amount.
    pub weight: Weight,
}

/// Everything a selection strategy needs to know about one withdrawal.
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    pub candidates: Vec<CandidateGroup>,
    /// The value we need to select.
    pub target_value: u64,
    /// The feerate we should try and achieve in sats per weight unit.
    pub target_feerate: f32,
    /// The feerate we expect to pay when the wallet eventually spends its coins.
    pub long_term_feerate: f32,
    /// Weight of spending the change output in the future.
    pub input_drain_weight: Weight,
    /// Additional weight if we include the change output.
    pub output_drain_weight: Weight,
    /// The weight of the template transaction, including fixed fields and outputs.
    pub base_weight: Weight,
    /// Minimum value allowed for a change output. Anything smaller goes to fees.
    pub min_change_value: u64,
}

impl SelectionRequest {
    /// Sum of every candidate's value.
    pub fn total_value(&self) -> u64 {
        self.candidates.iter().map(CandidateGroup::value).sum()
    }

    /// Sum of every candidate's value minus the fee of spending it at the target feerate.
    ///
    /// Candidates that cost more to spend than they are worth pull the total down.
    pub fn total_effective_value(&self) -> i64 {
        self.candidates
            .iter()
            .map(|group| signed_effective_value(group.value(), group.weight(), self.target_feerate))
            .fold(0, i64::saturating_add)
    }

    /// Fee for the template transaction alone.
    pub fn base_fee(&self) -> u64 {
        calculate_fee(self.base_weight, self.target_feerate)
    }

    /// Fee of creating a change output now plus spending it later.
    pub fn cost_of_change(&self) -> u64 {
        calculate_fee(self.output_drain_weight, self.target_feerate)
            .saturating_add(calculate_fee(self.input_drain_weight, self.long_term_feerate))
    }
}

/// How a selection attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    Success,
    InvalidTarget,
    InsufficientFunds,
    InsufficientFundsAfterFees,
    AlgorithmFailure,
}

/// The result of a selection attempt.
///
/// `selected_coins` is non-empty exactly when `outcome` is [`SelectionOutcome::Success`], and then
/// their total value covers `target_value + fee`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionResult {
    pub outcome: SelectionOutcome,
    pub selected_coins: Vec<Coin>,
    /// Value of the change output, zero when the excess is left to fees.
    pub change_value: u64,
    pub fee: u64,
}

impl SelectionResult {
    fn failure(outcome: SelectionOutcome) -> Self {
        SelectionResult {
            outcome,
            selected_coins: Vec::new(),
            change_value: 0,
            fee: 0,
        }
    }

    pub fn invalid_target(request: &SelectionRequest) -> Self {
        log::warn!(
            "Rejecting withdrawal: target {} sats is outside (0, {}]",
            request.target_value,
            MAX_MONEY
        );
        Self::failure(SelectionOutcome::InvalidTarget)
    }

    pub fn insufficient_funds(request: &SelectionRequest) -> Self {
        log::warn!(
            "Insufficient funds: target {} sats, {} sats available in {} candidates",
            request.target_value,
            request.total_value(),
            request.candidates.len()
        );
        Self::failure(SelectionOutcome::InsufficientFunds)
    }

    pub fn insufficient_funds_after_fees(request: &SelectionRequest) -> Self {
        log::warn!(
            "Insufficient funds after fees: target {} sats + base fee {} sats, \
             effective value {} sats at {} sat/wu",
            request.target_value,
            request.base_fee(),
            request.total_effective_value(),
            request.target_feerate
        );
        Self::failure(SelectionOutcome::InsufficientFundsAfterFees)
    }

    pub fn algorithm_failure(request: &SelectionRequest) -> Self {
        log::debug!(
            "No selection found for target {} sats over {} candidates",
            request.target_value,
            request.candidates.len()
        );
        Self::failure(SelectionOutcome::AlgorithmFailure)
    }

    /// Settles fee and change for the candidate groups at `selected_inputs`.
    ///
    /// A change output is added when what is left after paying for it is at least
    /// `min_change_value`; otherwise the excess goes to fees. Returns an
    /// [`SelectionOutcome::AlgorithmFailure`] if the selection does not cover the target and fee.
    pub fn from_selection(request: &SelectionRequest, selected_inputs: &[usize]) -> Self {
        let selected_coins: Vec<Coin> = selected_inputs
            .iter()
            .filter_map(|&index| request.candidates.get(index))
            .flat_map(|group| group.coins().iter().copied())
            .collect();

        let selected_value: u64 = selected_coins.iter().map(|coin| coin.value).sum();
        let weight_without_change = selected_coins
            .iter()
            .fold(request.base_weight, |total, coin| total.saturating_add(coin.input_weight));

        let fee_without_change = calculate_fee(weight_without_change, request.target_feerate);
        if selected_coins.is_empty()
            || selected_value < request.target_value.saturating_add(fee_without_change)
        {
            return Self::algorithm_failure(request);
        }

        let fee_with_change = calculate_fee(
            weight_without_change.saturating_add(request.output_drain_weight),
            request.target_feerate,
        );
        let required_with_change = request.target_value.saturating_add(fee_with_change);
        let (change_value, fee) = match selected_value.checked_sub(required_with_change) {
            Some(change) if change > 0 && change >= request.min_change_value => {
                (change, fee_with_change)
            }
            _ => (0, fee_without_change),
        };

        SelectionResult {
            outcome: SelectionOutcome::Success,
            selected_coins,
            change_value,
            fee,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == SelectionOutcome::Success
    }

    pub fn selected_value(&self) -> u64 {
        self.selected_coins.iter().map(|coin| coin.value).sum()
    }

    pub fn input_weight(&self) -> Weight {
        self.selected_coins
            .iter()
            .fold(0, |total: Weight, coin| total.saturating_add(coin.input_weight))
    }
}

/// Identifies the strategy that produced a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Algorithm {
    BranchAndBound,
    Knapsack,
    SingleRandomDraw,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::BranchAndBound => "bnb",
            Algorithm::Knapsack => "knapsack",
            Algorithm::SingleRandomDraw => "srd",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Struct for three arguments : target_for_match, match_range and target_feerate
///
/// Wrapped in a struct or else input for fn bnb takes too many arguments - 9/7
/// Leading to usage of stack instead of registers - https://users.rust-lang.org/t/avoiding-too-many-arguments-passing-to-a-function/103581
#[derive(Debug)]
pub struct MatchParameters {
    pub(crate) target_for_match: u64,
    pub(crate) match_range: u64,
    pub(crate) target_feerate: f32,
}
