//! Serialized transaction weight model.
//!
//! Everything here is a pure function of counts and weights. Callers convert the result into a
//! fee with [`calculate_fee`](crate::utils::calculate_fee).

/// Weight contributed by one input spending a segwit v1 output.
pub const SEGWIT_INPUT_WEIGHT: u32 = 68;

/// Weight contributed by one segwit v1 output.
pub const SEGWIT_OUTPUT_WEIGHT: u32 = 31;

/// `nVersion` + `nLockTime`.
const TX_FIXED_OVERHEAD: u32 = 4 + 4;

/// Scale applied to the output count field.
const OUTPUT_COUNT_SCALE: u32 = 4;

/// Length in bytes of the compact-size encoding of `n`.
#[inline]
pub fn varint_weight(n: u64) -> u32 {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Weight of a transaction template with `output_count` outputs and no inputs yet.
///
/// The input count varint is always sized for zero inputs; input weights are added on top by the
/// caller once a selection exists. Returns `None` if the weight does not fit in a `u32`.
pub fn base_transaction_weight(output_count: usize, output_weight_total: u32) -> Option<u32> {
    let output_count_weight = OUTPUT_COUNT_SCALE * varint_weight(output_count as u64);
    (TX_FIXED_OVERHEAD + varint_weight(0) + output_count_weight).checked_add(output_weight_total)
}
