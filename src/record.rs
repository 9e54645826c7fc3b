//! Audit records of withdrawals.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::{
    pool::UtxoPool,
    selectcoin::FAILED_ALGORITHM,
    types::{Algorithm, SelectionOutcome},
};

/// What a successful withdrawal spent and paid.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendDetails {
    pub algorithm: Algorithm,
    pub fee: u64,
    pub realized_feerate: Option<f32>,
    pub selected_input_values: Vec<u64>,
    /// Inputs that cost more to spend at the target feerate than they are worth.
    pub negative_effective_value_input_count: usize,
    /// Payment outputs plus the change output, if any.
    pub output_count: usize,
    pub change_amount: Option<u64>,
    pub waste_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WithdrawalOutcome {
    Spent(SpendDetails),
    /// Nothing was spent; carries why.
    Failed(SelectionOutcome),
}

/// One withdrawal attempt, successful or not.
///
/// `balance` and `cost_to_empty_at_long_term_feerate` describe the pool as it was when the
/// withdrawal was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRecord {
    /// Withdrawal attempt number within a simulation, zero outside one.
    pub id: usize,
    pub target_amount: u64,
    pub target_feerate: f32,
    pub utxo_count_before: usize,
    pub utxo_count_after: usize,
    pub cost_to_empty_at_long_term_feerate: f64,
    pub balance: u64,
    pub outcome: WithdrawalOutcome,
}

impl SimulationRecord {
    pub fn spend(&self) -> Option<&SpendDetails> {
        match &self.outcome {
            WithdrawalOutcome::Spent(details) => Some(details),
            WithdrawalOutcome::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, WithdrawalOutcome::Failed(_))
    }

    /// `"bnb"`, `"knapsack"`, `"srd"` or `"failed"`.
    pub fn algorithm(&self) -> &'static str {
        self.spend()
            .map_or(FAILED_ALGORITHM, |details| details.algorithm.as_str())
    }

    pub fn fee(&self) -> Option<u64> {
        self.spend().map(|details| details.fee)
    }

    pub fn realized_feerate(&self) -> Option<f32> {
        self.spend().and_then(|details| details.realized_feerate)
    }

    pub fn input_count(&self) -> Option<usize> {
        self.spend().map(|details| details.selected_input_values.len())
    }

    pub fn negative_effective_value_input_count(&self) -> Option<usize> {
        self.spend()
            .map(|details| details.negative_effective_value_input_count)
    }

    pub fn output_count(&self) -> Option<usize> {
        self.spend().map(|details| details.output_count)
    }

    pub fn change_amount(&self) -> Option<u64> {
        self.spend().and_then(|details| details.change_amount)
    }

    pub fn waste_score(&self) -> Option<f64> {
        self.spend().map(|details| details.waste_score)
    }

    /// Empty for failed withdrawals.
    pub fn selected_input_values(&self) -> &[u64] {
        self.spend()
            .map(|details| details.selected_input_values.as_slice())
            .unwrap_or(&[])
    }
}

impl Serialize for SimulationRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("SimulationRecord", 16)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("target_amount", &self.target_amount)?;
        state.serialize_field("fee", &self.fee())?;
        state.serialize_field("target_feerate", &self.target_feerate)?;
        state.serialize_field("realized_feerate", &self.realized_feerate())?;
        state.serialize_field("algorithm", self.algorithm())?;
        state.serialize_field("input_count", &self.input_count())?;
        state.serialize_field(
            "negative_effective_value_input_count",
            &self.negative_effective_value_input_count(),
        )?;
        state.serialize_field("output_count", &self.output_count())?;
        state.serialize_field("change_amount", &self.change_amount())?;
        state.serialize_field("utxo_count_before", &self.utxo_count_before)?;
        state.serialize_field("utxo_count_after", &self.utxo_count_after)?;
        state.serialize_field(
            "cost_to_empty_at_long_term_feerate",
            &self.cost_to_empty_at_long_term_feerate,
        )?;
        state.serialize_field("balance", &self.balance)?;
        state.serialize_field("waste_score", &self.waste_score())?;
        state.serialize_field("selected_input_values", self.selected_input_values())?;
        state.end()
    }
}

/// Assembles the record of one withdrawal.
///
/// Started before the pool is touched so the "before" figures are captured, then finished with
/// either [`failed`](Self::failed) or [`spent`](Self::spent).
#[derive(Debug)]
pub struct SimulationRecorder {
    target_amount: u64,
    target_feerate: f32,
    utxo_count_before: usize,
    cost_to_empty: f64,
    balance: u64,
}

impl SimulationRecorder {
    pub fn begin(
        pool: &UtxoPool,
        target_amount: u64,
        target_feerate: f32,
        long_term_feerate: f32,
    ) -> Self {
        SimulationRecorder {
            target_amount,
            target_feerate,
            utxo_count_before: pool.len(),
            cost_to_empty: pool.cost_to_empty_at_rate(long_term_feerate),
            balance: pool.balance(),
        }
    }

    fn finish(self, utxo_count_after: usize, outcome: WithdrawalOutcome) -> SimulationRecord {
        SimulationRecord {
            id: 0,
            target_amount: self.target_amount,
            target_feerate: self.target_feerate,
            utxo_count_before: self.utxo_count_before,
            utxo_count_after,
            cost_to_empty_at_long_term_feerate: self.cost_to_empty,
            balance: self.balance,
            outcome,
        }
    }

    /// The pool was left untouched.
    pub fn failed(self, reason: SelectionOutcome) -> SimulationRecord {
        let utxo_count_after = self.utxo_count_before;
        self.finish(utxo_count_after, WithdrawalOutcome::Failed(reason))
    }

    pub fn spent(self, pool_after: &UtxoPool, details: SpendDetails) -> SimulationRecord {
        self.finish(pool_after.len(), WithdrawalOutcome::Spent(details))
    }
}
