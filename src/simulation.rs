//! Replays a scenario of deposits and withdrawals against one wallet.

use serde::{Deserialize, Serialize};

use crate::{
    config::{PaymentPolicy, SimulationConfig},
    error::Result,
    record::SimulationRecord,
    selectcoin::CoinSelector,
    summary::SimulationSummary,
    types::PendingPayment,
    wallet::Wallet,
    weight::SEGWIT_OUTPUT_WEIGHT,
};

/// One line of a scenario.
///
/// A positive `amount` is a deposit of that many sats. Zero or negative is a payment of `-amount`
/// sats at `fee_rate_per_kvb` BTC per 1000 weight units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEntry {
    pub amount: i64,
    pub fee_rate_per_kvb: f32,
}

impl ScenarioEntry {
    pub fn deposit(amount: u64) -> Self {
        ScenarioEntry {
            amount: amount as i64,
            fee_rate_per_kvb: 0.0,
        }
    }

    pub fn payment(amount: u64, fee_rate_per_kvb: f32) -> Self {
        ScenarioEntry {
            amount: -(amount as i64),
            fee_rate_per_kvb,
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Default)]
pub struct SimulationReport {
    pub records: Vec<SimulationRecord>,
    /// Taken every `summary_interval` withdrawals.
    pub snapshots: Vec<SimulationSummary>,
    pub summary: SimulationSummary,
}

#[derive(Debug)]
pub struct Simulation {
    wallet: Wallet,
    pending: Vec<PendingPayment>,
    withdraw_attempts: usize,
    summary: SimulationSummary,
    snapshots: Vec<SimulationSummary>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Ok(Self::with_wallet(Wallet::new(config)?))
    }

    pub fn with_selector(config: SimulationConfig, selector: CoinSelector) -> Result<Self> {
        Ok(Self::with_wallet(Wallet::with_selector(config, selector)?))
    }

    fn with_wallet(wallet: Wallet) -> Self {
        Simulation {
            wallet,
            pending: Vec::new(),
            withdraw_attempts: 0,
            summary: SimulationSummary::default(),
            snapshots: Vec::new(),
        }
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn summary(&self) -> &SimulationSummary {
        &self.summary
    }

    /// Payments still waiting to be made.
    pub fn pending(&self) -> &[PendingPayment] {
        &self.pending
    }

    /// Applies one entry. Returns the record for a withdrawal, `None` for a deposit.
    pub fn process(&mut self, entry: ScenarioEntry) -> Result<Option<SimulationRecord>> {
        let long_term_feerate = self.wallet.config().long_term_feerate;

        if entry.amount > 0 {
            self.wallet.deposit(entry.amount.unsigned_abs())?;
            self.summary.update_deposit(self.wallet.pool(), long_term_feerate);
            return Ok(None);
        }

        self.pending.push(PendingPayment {
            amount: entry.amount.unsigned_abs(),
            weight: SEGWIT_OUTPUT_WEIGHT,
        });
        let withdrawal = self.wallet.withdraw(&self.pending, entry.fee_rate_per_kvb);
        let mut record = match withdrawal {
            Ok(record) => record,
            Err(err) => {
                // A rejected payment never joins the queue.
                self.pending.pop();
                return Err(err);
            }
        };

        self.withdraw_attempts += 1;
        record.id = self.withdraw_attempts;

        match self.wallet.config().payment_policy {
            PaymentPolicy::RollForward if record.is_failed() => {
                log::debug!(
                    "Withdrawal {} failed, rolling {} payments forward",
                    record.id,
                    self.pending.len()
                );
            }
            _ => self.pending.clear(),
        }

        self.summary
            .update_withdrawal(&record, self.wallet.pool(), long_term_feerate);

        let interval = self.wallet.config().summary_interval;
        if interval > 0 && self.withdraw_attempts % interval == 0 {
            self.snapshots.push(self.summary.clone());
        }

        Ok(Some(record))
    }

    /// Processes every entry in order and returns what the run produced.
    pub fn run<I>(mut self, entries: I) -> Result<SimulationReport>
    where
        I: IntoIterator<Item = ScenarioEntry>,
    {
        let mut records = Vec::new();
        for entry in entries {
            if let Some(record) = self.process(entry)? {
                records.push(record);
            }
        }

        log::info!(
            "Simulation finished: {} deposits, {} withdrawals, {} failed",
            self.summary.deposit_count,
            self.summary.withdraw_count,
            self.summary.failed_withdraw_count
        );

        Ok(SimulationReport {
            records,
            snapshots: self.snapshots,
            summary: self.summary,
        })
    }
}
