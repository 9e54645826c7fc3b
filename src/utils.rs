use crate::types::{CandidateGroup, EffectiveValue, Weight};

const SATS_PER_BTC: f64 = 100_000_000.0;
const WEIGHT_UNITS_PER_KWU: f64 = 1_000.0;

/// Converts a feerate quoted in BTC per 1000 weight units into satoshis per weight unit.
#[inline]
pub fn sat_per_wu_from_btc_per_kwu(fee_rate_per_kwu: f32) -> f32 {
    (fee_rate_per_kwu as f64 * SATS_PER_BTC / WEIGHT_UNITS_PER_KWU) as f32
}

/// Fee in whole sats, rounded up. Saturates at `u64::MAX`.
#[inline]
pub fn calculate_fee(weight: Weight, rate: f32) -> u64 {
    (weight as f64 * rate as f64).ceil() as u64
}

/// Returns the effective value of the `CandidateGroup`, which is the actual value minus the
/// estimated fee, floored at zero.
#[inline]
pub fn effective_value(group: &CandidateGroup, feerate: f32) -> EffectiveValue {
    group
        .value()
        .saturating_sub(calculate_fee(group.weight(), feerate))
}

/// Signed counterpart of [`effective_value`] for a single input.
#[inline]
pub fn signed_effective_value(value: u64, weight: Weight, feerate: f32) -> i64 {
    let value = i64::try_from(value).unwrap_or(i64::MAX);
    let fee = i64::try_from(calculate_fee(weight, feerate)).unwrap_or(i64::MAX);
    value.saturating_sub(fee)
}
