//! A UTXO wallet simulator built on cascading coin selection.
//!
//! A [`Wallet`] holds a [`UtxoPool`]. Each withdrawal is offered to branch and bound, knapsack
//! and single random draw in turn; the first selection found is scored for waste, applied to the
//! pool, and described by a [`SimulationRecord`]. [`Simulation`] replays whole scenarios and
//! keeps a running [`SimulationSummary`].

pub mod algorithms;
pub mod config;
pub mod error;
pub mod pool;
pub mod record;
pub mod selectcoin;
pub mod simulation;
pub mod summary;
pub mod types;
pub mod utils;
pub mod wallet;
pub mod waste;
pub mod weight;

pub use algorithms::{
    select_coin_bnb, select_coin_knapsack, select_coin_srd, BranchAndBound, Knapsack,
    SelectionStrategy, SingleRandomDraw,
};
pub use config::{PaymentPolicy, SimulationConfig};
pub use error::{Result, SimulationError};
pub use pool::UtxoPool;
pub use record::{SimulationRecord, SimulationRecorder, SpendDetails, WithdrawalOutcome};
pub use selectcoin::{CoinSelector, Selection};
pub use simulation::{ScenarioEntry, Simulation, SimulationReport};
pub use summary::{RunningStats, SimulationSummary};
pub use types::{
    Algorithm, CandidateGroup, Coin, CoinId, PendingPayment, SelectionOutcome, SelectionRequest,
    SelectionResult, MAX_MONEY,
};
pub use wallet::Wallet;
pub use waste::{WasteCalculator, WasteReport};
pub use weight::{SEGWIT_INPUT_WEIGHT, SEGWIT_OUTPUT_WEIGHT};
