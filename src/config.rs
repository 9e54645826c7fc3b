use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, SimulationError},
    types::MAX_MONEY,
    weight::{SEGWIT_INPUT_WEIGHT, SEGWIT_OUTPUT_WEIGHT},
};

/// What happens to pending payments after a withdrawal fails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPolicy {
    /// Keep them and batch them into the next withdrawal.
    RollForward,
    /// Discard them.
    #[default]
    Drop,
}

/// Tunables of a simulated wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Feerate in sat/wu the wallet expects to pay when it eventually spends its coins.
    pub long_term_feerate: f32,
    /// Smallest change output worth creating, in sats.
    pub min_change_value: u64,
    /// Weight of spending a change output later.
    pub input_drain_weight: u32,
    /// Weight of adding a change output now.
    pub output_drain_weight: u32,
    pub payment_policy: PaymentPolicy,
    /// Take a summary snapshot every this many withdrawals. Zero disables snapshots.
    pub summary_interval: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            long_term_feerate: 10.0,
            min_change_value: 526,
            input_drain_weight: SEGWIT_INPUT_WEIGHT,
            output_drain_weight: SEGWIT_OUTPUT_WEIGHT,
            payment_policy: PaymentPolicy::default(),
            summary_interval: 500,
        }
    }
}

impl SimulationConfig {
    /// Parses a JSON document; missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.long_term_feerate.is_finite() || self.long_term_feerate < 0.0 {
            return Err(SimulationError::InvalidConfig(format!(
                "long_term_feerate must be finite and non-negative, got {}",
                self.long_term_feerate
            )));
        }
        if self.min_change_value > MAX_MONEY {
            return Err(SimulationError::InvalidConfig(format!(
                "min_change_value must not exceed {} sats, got {}",
                MAX_MONEY, self.min_change_value
            )));
        }
        if self.output_drain_weight == 0 {
            return Err(SimulationError::InvalidConfig(
                "output_drain_weight must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
