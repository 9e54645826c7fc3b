use thiserror::Error;

/// Input the simulator refuses to act on.
///
/// Amounts above [`MAX_MONEY`](crate::types::MAX_MONEY) are out of range.
///
/// Selection failures are not errors; they are reported in the
/// [`SimulationRecord`](crate::record::SimulationRecord).
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("amount of {0} sats exceeds the money supply")]
    AmountOutOfRange(u64),

    #[error("pending payments overflow their total amount or weight")]
    PaymentTotalOverflow,

    #[error("feerate {0} is not a finite, non-negative number")]
    InvalidFeeRate(f32),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("could not parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
