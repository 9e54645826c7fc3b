//! Deposits and withdrawals against one simulated wallet.

use std::collections::HashSet;

use crate::{
    config::SimulationConfig,
    error::{Result, SimulationError},
    pool::UtxoPool,
    record::{SimulationRecord, SimulationRecorder, SpendDetails},
    selectcoin::CoinSelector,
    types::{CoinId, PendingPayment, SelectionRequest, MAX_MONEY},
    utils::{calculate_fee, sat_per_wu_from_btc_per_kwu, signed_effective_value},
    waste::{transaction_weight, WasteCalculator},
    weight::base_transaction_weight,
};

/// A wallet holding a [`UtxoPool`] and the cascade used to spend from it.
#[derive(Debug)]
pub struct Wallet {
    pool: UtxoPool,
    selector: CoinSelector,
    config: SimulationConfig,
}

impl Wallet {
    /// A wallet with the default branch and bound, knapsack, single random draw cascade.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Self::with_selector(config, CoinSelector::default())
    }

    pub fn with_selector(config: SimulationConfig, selector: CoinSelector) -> Result<Self> {
        config.validate()?;
        Ok(Wallet {
            pool: UtxoPool::new(),
            selector,
            config,
        })
    }

    pub fn pool(&self) -> &UtxoPool {
        &self.pool
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn deposit(&mut self, amount: u64) -> Result<CoinId> {
        if amount > MAX_MONEY {
            return Err(SimulationError::AmountOutOfRange(amount));
        }
        Ok(self.pool.deposit(amount))
    }

    /// Pays `payments` in one transaction at a feerate quoted in BTC per 1000 weight units.
    ///
    /// A withdrawal that cannot be funded is not an error: it comes back as a failed record and
    /// leaves the pool as it was. Errors are reserved for malformed input.
    pub fn withdraw(
        &mut self,
        payments: &[PendingPayment],
        fee_rate_per_kwu: f32,
    ) -> Result<SimulationRecord> {
        if !fee_rate_per_kwu.is_finite() || fee_rate_per_kwu < 0.0 {
            return Err(SimulationError::InvalidFeeRate(fee_rate_per_kwu));
        }
        self.withdraw_at_feerate(payments, sat_per_wu_from_btc_per_kwu(fee_rate_per_kwu))
    }

    /// Same as [`withdraw`](Self::withdraw) with the feerate already in sat/wu.
    ///
    /// Feerates at which the transaction template alone would cost more than
    /// [`MAX_MONEY`] are rejected.
    pub fn withdraw_at_feerate(
        &mut self,
        payments: &[PendingPayment],
        target_feerate: f32,
    ) -> Result<SimulationRecord> {
        if !target_feerate.is_finite() || target_feerate < 0.0 {
            return Err(SimulationError::InvalidFeeRate(target_feerate));
        }

        let target_value = payments
            .iter()
            .try_fold(0u64, |total, payment| total.checked_add(payment.amount))
            .ok_or(SimulationError::PaymentTotalOverflow)?;
        let output_weight_total = payments
            .iter()
            .try_fold(0u32, |total, payment| total.checked_add(payment.weight))
            .ok_or(SimulationError::PaymentTotalOverflow)?;
        let base_weight = base_transaction_weight(payments.len(), output_weight_total)
            .ok_or(SimulationError::PaymentTotalOverflow)?;
        if calculate_fee(base_weight, target_feerate) > MAX_MONEY {
            return Err(SimulationError::InvalidFeeRate(target_feerate));
        }

        let long_term_feerate = self.config.long_term_feerate;
        let recorder =
            SimulationRecorder::begin(&self.pool, target_value, target_feerate, long_term_feerate);

        let request = SelectionRequest {
            candidates: self.pool.candidates(),
            target_value,
            target_feerate,
            long_term_feerate,
            input_drain_weight: self.config.input_drain_weight,
            output_drain_weight: self.config.output_drain_weight,
            base_weight,
            min_change_value: self.config.min_change_value,
        };

        let selection = self.selector.select(&request);
        let algorithm = match selection.algorithm {
            Some(algorithm) if selection.result.is_success() => algorithm,
            _ => return Ok(recorder.failed(selection.result.outcome)),
        };
        let result = selection.result;

        let total_weight = transaction_weight(&result, base_weight);
        let report =
            WasteCalculator::new(target_feerate, long_term_feerate).score(&result, total_weight);

        let spent_ids: HashSet<CoinId> =
            result.selected_coins.iter().map(|coin| coin.id).collect();
        let change_coins = if result.change_value > 0 {
            vec![self.pool.mint(result.change_value)]
        } else {
            Vec::new()
        };
        self.pool.replace(&spent_ids, change_coins);

        let change_amount = (result.change_value > 0).then_some(result.change_value);
        let negative_effective_value_input_count = result
            .selected_coins
            .iter()
            .filter(|coin| {
                signed_effective_value(coin.value, coin.input_weight, target_feerate) < 0
            })
            .count();
        let details = SpendDetails {
            algorithm,
            fee: report.fee,
            realized_feerate: report.realized_feerate,
            selected_input_values: result.selected_coins.iter().map(|coin| coin.value).collect(),
            negative_effective_value_input_count,
            output_count: payments.len() + usize::from(change_amount.is_some()),
            change_amount,
            waste_score: report.waste_score,
        };

        log::info!(
            "Withdrew {} sats via {}: {} inputs, fee {} sats, change {} sats, waste {}",
            target_value,
            algorithm,
            details.selected_input_values.len(),
            details.fee,
            result.change_value,
            details.waste_score
        );

        Ok(recorder.spent(&self.pool, details))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        algorithms::SelectionStrategy,
        record::WithdrawalOutcome,
        selectcoin::test::StubStrategy,
        types::{Algorithm, SelectionOutcome},
        weight::SEGWIT_OUTPUT_WEIGHT,
    };

    fn payment(amount: u64) -> PendingPayment {
        PendingPayment {
            amount,
            weight: SEGWIT_OUTPUT_WEIGHT,
        }
    }

    fn setup_config(long_term_feerate: f32) -> SimulationConfig {
        SimulationConfig {
            long_term_feerate,
            ..Default::default()
        }
    }

    fn setup_wallet(values: &[u64], strategies: Vec<Box<dyn SelectionStrategy>>) -> Wallet {
        let selector = CoinSelector::with_strategies(strategies);
        let mut wallet = Wallet::with_selector(setup_config(5.0), selector).unwrap();
        for &value in values {
            wallet.deposit(value).unwrap();
        }
        wallet
    }

    /// A wallet whose only strategy always picks the candidates at `pick`.
    fn setup_picking_wallet(values: &[u64], algorithm: Algorithm, pick: Vec<usize>) -> Wallet {
        setup_wallet(values, vec![stub(algorithm, Some(pick))])
    }

    fn stub(algorithm: Algorithm, pick: Option<Vec<usize>>) -> Box<dyn SelectionStrategy> {
        Box::new(StubStrategy::new(algorithm, pick).0)
    }

    fn coin_ids(wallet: &Wallet) -> Vec<CoinId> {
        wallet
            .pool()
            .candidates()
            .iter()
            .map(|group| group.coins()[0].id)
            .collect()
    }

    #[test]
    fn test_zero_target_leaves_pool_untouched() {
        let mut wallet =
            setup_picking_wallet(&[100_000, 50_000], Algorithm::BranchAndBound, vec![0]);
        let before = wallet.pool().candidates();

        let record = wallet.withdraw_at_feerate(&[payment(0)], 10.0).unwrap();
        assert_eq!(record.algorithm(), "failed");
        assert_eq!(
            record.outcome,
            WithdrawalOutcome::Failed(SelectionOutcome::InvalidTarget)
        );
        assert_eq!(wallet.pool().candidates(), before);

        let record = wallet.withdraw_at_feerate(&[], 10.0).unwrap();
        assert!(record.is_failed());
        assert_eq!(wallet.pool().candidates(), before);
    }

    #[test]
    fn test_insufficient_balance_fails() {
        let mut wallet =
            setup_picking_wallet(&[100_000, 50_000], Algorithm::SingleRandomDraw, vec![0, 1]);
        let record = wallet.withdraw_at_feerate(&[payment(150_001)], 1.0).unwrap();
        assert_eq!(record.algorithm(), "failed");
        assert_eq!(record.utxo_count_after, record.utxo_count_before);
        assert_eq!(record.fee(), None);
        assert_eq!(record.waste_score(), None);
        assert_eq!(wallet.pool().balance(), 150_000);
    }

    #[test]
    fn test_waste_scenario_with_fixed_selection() {
        let mut wallet =
            setup_picking_wallet(&[100_000, 50_000], Algorithm::Knapsack, vec![0, 1]);

        let record = wallet.withdraw_at_feerate(&[payment(120_000)], 10.0).unwrap();

        // base 44 + inputs 136 + change 31 = 211 wu at 10 sat/wu
        assert_eq!(record.algorithm(), "knapsack");
        assert_eq!(record.fee(), Some(2110));
        assert_eq!(record.change_amount(), Some(150_000 - 120_000 - 2110));
        assert_eq!(record.realized_feerate(), Some(10.0));
        // input waste 136 * (10 - 5) + change waste 5 * 68 + 10 * 31
        assert_eq!(record.waste_score(), Some(680.0 + 650.0));
        assert_eq!(record.output_count(), Some(2));
        assert_eq!(record.negative_effective_value_input_count(), Some(0));
        assert_eq!(record.selected_input_values(), &[100_000, 50_000]);
        assert_eq!(record.utxo_count_before, 2);
        assert_eq!(record.utxo_count_after, 1);
        assert_eq!(record.balance, 150_000);
        assert_eq!(record.cost_to_empty_at_long_term_feerate, 2.0 * 68.0 * 5.0);
        assert_eq!(wallet.pool().balance(), 27_890);
    }

    #[test]
    fn test_pool_consistency_after_withdrawal() {
        let mut wallet = setup_picking_wallet(
            &[100_000, 50_000, 20_000],
            Algorithm::BranchAndBound,
            vec![0, 2],
        );
        let before = coin_ids(&wallet);

        let record = wallet.withdraw_at_feerate(&[payment(60_000)], 2.0).unwrap();
        assert_eq!(record.algorithm(), "bnb");

        let after = coin_ids(&wallet);
        assert!(!after.contains(&before[0]));
        assert!(!after.contains(&before[2]));
        assert!(after.contains(&before[1]));
        assert_eq!(after.len(), 2);
        let change_id = after[1];
        assert!(before.iter().all(|&id| id < change_id));
        assert_eq!(
            wallet.pool().coin(change_id).map(|c| c.value),
            record.change_amount()
        );

        // Ids stay fresh after the change coin too.
        let next = wallet.deposit(1).unwrap();
        assert!(next > change_id);
    }

    #[test]
    fn test_changeless_withdrawal() {
        let mut wallet = setup_picking_wallet(&[60_500], Algorithm::BranchAndBound, vec![0]);
        let record = wallet.withdraw_at_feerate(&[payment(60_000)], 2.0).unwrap();
        // 44 + 68 = 112 wu, excess below the minimum change value goes to fees
        assert_eq!(record.change_amount(), None);
        assert_eq!(record.fee(), Some(224));
        assert_eq!(record.output_count(), Some(1));
        assert_eq!(
            record.waste_score(),
            Some(68.0 * (2.0 - 5.0) + (60_500.0 - 224.0))
        );
        assert!(wallet.pool().is_empty());
    }

    #[test]
    fn test_changeless_waste_is_exact_for_large_coins() {
        let mut wallet =
            setup_picking_wallet(&[20_000_001], Algorithm::BranchAndBound, vec![0]);
        // Change of 20_000_001 - 19_999_600 - 143 = 258 is below the minimum.
        let record = wallet.withdraw_at_feerate(&[payment(19_999_600)], 1.0).unwrap();
        assert_eq!(record.change_amount(), None);
        assert_eq!(record.fee(), Some(112));
        // 68 * (1 - 5) + (20_000_001 - 112)
        assert_eq!(record.waste_score(), Some(19_999_617.0));
    }

    #[test]
    fn test_negative_effective_value_inputs_counted() {
        let mut wallet =
            setup_picking_wallet(&[100_000, 300], Algorithm::SingleRandomDraw, vec![0, 1]);
        let record = wallet.withdraw_at_feerate(&[payment(50_000)], 10.0).unwrap();
        assert_eq!(record.algorithm(), "srd");
        assert_eq!(record.negative_effective_value_input_count(), Some(1));
    }

    #[test]
    fn test_btc_per_kwu_feerate_is_converted() {
        let mut wallet = setup_picking_wallet(&[100_000], Algorithm::BranchAndBound, vec![0]);
        let record = wallet.withdraw(&[payment(10_000)], 0.0001).unwrap();
        assert_eq!(record.target_feerate, 10.0);
        // 44 + 68 + 31 = 143 wu at 10 sat/wu
        assert_eq!(record.fee(), Some(1430));
        assert_eq!(record.realized_feerate(), Some(10.0));
    }

    #[test]
    fn test_rejects_malformed_input() {
        let mut wallet = setup_wallet(&[100_000], Vec::new());
        assert!(matches!(
            wallet.withdraw(&[payment(1)], f32::NAN),
            Err(SimulationError::InvalidFeeRate(_))
        ));
        assert!(matches!(
            wallet.withdraw(&[payment(1)], -1.0),
            Err(SimulationError::InvalidFeeRate(_))
        ));
        assert!(matches!(
            wallet.withdraw_at_feerate(&[payment(u64::MAX), payment(1)], 1.0),
            Err(SimulationError::PaymentTotalOverflow)
        ));
        assert!(matches!(
            wallet.deposit(MAX_MONEY + 1),
            Err(SimulationError::AmountOutOfRange(_))
        ));
        assert_eq!(wallet.pool().len(), 1);
    }

    #[test]
    fn test_rejects_feerate_beyond_money_supply() {
        let mut wallet =
            setup_picking_wallet(&[100_000, 50_000], Algorithm::BranchAndBound, vec![0]);
        assert!(matches!(
            wallet.withdraw_at_feerate(&[payment(1_000)], 1e18),
            Err(SimulationError::InvalidFeeRate(_))
        ));
        assert_eq!(wallet.pool().balance(), 150_000);

        // High but representable feerates fail the withdrawal instead.
        let record = wallet.withdraw_at_feerate(&[payment(1_000)], 1e12).unwrap();
        assert_eq!(
            record.outcome,
            WithdrawalOutcome::Failed(SelectionOutcome::InsufficientFundsAfterFees)
        );
        assert_eq!(wallet.pool().len(), 2);
    }

    #[test]
    fn test_rejects_overweight_payments() {
        let mut wallet = setup_picking_wallet(&[100_000], Algorithm::BranchAndBound, vec![0]);
        let heavy = PendingPayment {
            amount: 1_000,
            weight: u32::MAX,
        };
        assert!(matches!(
            wallet.withdraw_at_feerate(&[heavy], 1.0),
            Err(SimulationError::PaymentTotalOverflow)
        ));
        assert!(matches!(
            wallet.withdraw_at_feerate(&[payment(1_000), heavy], 1.0),
            Err(SimulationError::PaymentTotalOverflow)
        ));
        assert_eq!(wallet.pool().balance(), 100_000);
    }

    #[test]
    fn test_default_cascade_end_to_end() {
        let mut wallet = Wallet::new(SimulationConfig::default()).unwrap();
        for value in [5_000_000, 2_000_000, 1_000_000, 500_000, 250_000, 120_000] {
            wallet.deposit(value).unwrap();
        }
        let balance_before = wallet.pool().balance();

        let record = wallet.withdraw(&[payment(1_500_000)], 0.0002).unwrap();
        assert!(!record.is_failed());
        assert_eq!(record.target_feerate, 20.0);
        let fee = record.fee().unwrap();
        let spent: u64 = record.selected_input_values().iter().sum();
        assert!(spent >= 1_500_000 + fee);
        assert_eq!(
            wallet.pool().balance(),
            balance_before - spent + record.change_amount().unwrap_or(0)
        );
    }
}
