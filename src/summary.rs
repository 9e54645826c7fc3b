//! Running aggregates over a simulation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{pool::UtxoPool, record::SimulationRecord};

/// Running min, max, mean and sample standard deviation of a series.
///
/// Uses Welford's update so the series itself is never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: u64,
    min: u64,
    max: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn push(&mut self, sample: u64) {
        if self.count == 0 {
            self.min = sample;
            self.max = sample;
        } else {
            self.min = self.min.min(sample);
            self.max = self.max.max(sample);
        }
        self.count += 1;
        let delta = sample as f64 - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (sample as f64 - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.mean * self.count as f64
    }

    pub fn min(&self) -> Option<u64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<u64> {
        (self.count > 0).then_some(self.max)
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Sample standard deviation; needs at least two samples.
    pub fn std_dev(&self) -> Option<f64> {
        (self.count > 1).then(|| (self.m2 / (self.count - 1) as f64).sqrt())
    }
}

impl Serialize for RunningStats {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("RunningStats", 5)?;
        state.serialize_field("count", &self.count)?;
        state.serialize_field("min", &self.min())?;
        state.serialize_field("max", &self.max())?;
        state.serialize_field("mean", &self.mean())?;
        state.serialize_field("std_dev", &self.std_dev())?;
        state.end()
    }
}

/// Aggregate view of every deposit and withdrawal of a simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub deposit_count: usize,
    /// Successful withdrawals.
    pub withdraw_count: usize,
    pub failed_withdraw_count: usize,
    /// Withdrawals per algorithm tag, `"failed"` included.
    pub algorithm_usage: BTreeMap<&'static str, usize>,
    pub current_balance: u64,
    pub current_utxo_count: usize,
    pub inputs_spent_count: usize,
    pub negative_effective_value_inputs_count: usize,
    pub created_change_outputs_count: usize,
    pub changeless_transaction_count: usize,
    pub change_values: RunningStats,
    pub input_set_sizes: RunningStats,
    pub total_fees: u64,
    pub cost_to_empty_at_long_term_feerate: f64,
}

impl SimulationSummary {
    /// Mean fee over successful withdrawals.
    pub fn mean_fee(&self) -> Option<f64> {
        (self.withdraw_count > 0).then(|| self.total_fees as f64 / self.withdraw_count as f64)
    }

    /// Fees paid so far plus what emptying the wallet would still cost.
    pub fn total_cost(&self) -> f64 {
        self.total_fees as f64 + self.cost_to_empty_at_long_term_feerate
    }

    pub fn update_deposit(&mut self, pool: &UtxoPool, long_term_feerate: f32) {
        self.deposit_count += 1;
        self.observe_pool(pool, long_term_feerate);
    }

    /// Folds in one withdrawal record; `pool` is the pool after the withdrawal.
    pub fn update_withdrawal(
        &mut self,
        record: &SimulationRecord,
        pool: &UtxoPool,
        long_term_feerate: f32,
    ) {
        *self.algorithm_usage.entry(record.algorithm()).or_insert(0) += 1;
        self.observe_pool(pool, long_term_feerate);

        let details = match record.spend() {
            Some(details) => details,
            None => {
                self.failed_withdraw_count += 1;
                return;
            }
        };

        self.withdraw_count += 1;
        self.total_fees += details.fee;
        self.negative_effective_value_inputs_count +=
            details.negative_effective_value_input_count;

        let input_count = details.selected_input_values.len();
        self.inputs_spent_count += input_count;
        self.input_set_sizes.push(input_count as u64);

        match details.change_amount {
            Some(change) => {
                self.created_change_outputs_count += 1;
                self.change_values.push(change);
            }
            None => self.changeless_transaction_count += 1,
        }
    }

    fn observe_pool(&mut self, pool: &UtxoPool, long_term_feerate: f32) {
        self.current_balance = pool.balance();
        self.current_utxo_count = pool.len();
        self.cost_to_empty_at_long_term_feerate = pool.cost_to_empty_at_rate(long_term_feerate);
    }
}
