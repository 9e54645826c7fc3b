//! Economic scoring of a finished selection.
//!
//! Waste compares what a selection costs now against what the same coins would cost to spend at
//! the long-term feerate, plus the price of the change output (or of not having one).

use crate::{
    types::{SelectionResult, Weight},
    utils::calculate_fee,
    weight::{SEGWIT_INPUT_WEIGHT, SEGWIT_OUTPUT_WEIGHT},
};

/// Weight of the final transaction: selected inputs on top of the template, plus the change
/// output when there is one.
pub fn transaction_weight(result: &SelectionResult, base_weight: Weight) -> Weight {
    let change_weight = if result.change_value > 0 {
        SEGWIT_OUTPUT_WEIGHT
    } else {
        0
    };
    result
        .input_weight()
        .saturating_add(base_weight)
        .saturating_add(change_weight)
}

/// Scores of one selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WasteReport {
    pub total_weight: Weight,
    pub fee: u64,
    pub input_waste: f64,
    pub change_waste: f64,
    pub waste_score: f64,
    /// `None` for a weightless transaction.
    pub realized_feerate: Option<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct WasteCalculator {
    pub target_feerate: f32,
    pub long_term_feerate: f32,
}

impl WasteCalculator {
    pub fn new(target_feerate: f32, long_term_feerate: f32) -> Self {
        WasteCalculator {
            target_feerate,
            long_term_feerate,
        }
    }

    /// Fee of creating a change output now and spending it at the long-term feerate.
    pub fn cost_of_change(&self) -> f64 {
        self.long_term_feerate as f64 * SEGWIT_INPUT_WEIGHT as f64
            + self.target_feerate as f64 * SEGWIT_OUTPUT_WEIGHT as f64
    }

    /// Scores a successful `result` for a transaction of `total_weight`.
    pub fn score(&self, result: &SelectionResult, total_weight: Weight) -> WasteReport {
        let fee = calculate_fee(total_weight, self.target_feerate);
        let input_waste = result.input_weight() as f64
            * (self.target_feerate as f64 - self.long_term_feerate as f64);

        // Without change the selection pays for its whole value minus the fee.
        let change_waste = if result.change_value > 0 {
            self.cost_of_change()
        } else {
            result.selected_value() as f64 - fee as f64
        };

        let realized_feerate = if total_weight == 0 {
            None
        } else {
            Some(fee as f32 / total_weight as f32)
        };

        WasteReport {
            total_weight,
            fee,
            input_waste,
            change_waste,
            waste_score: input_waste + change_waste,
            realized_feerate,
        }
    }
}
