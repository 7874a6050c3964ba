
//! Lossy rounding and the weighted model update.

use crate::cfg::MAX_MODEL_VALUE;


/// Strip the `round` least significant noise bits.
#[inline]
pub fn round_fwd(value: u32, round: u32) -> u32 {
    value >> round
}

/// Expand a rounded value back to its original scale.
#[inline]
pub fn round_inv(value: u32, round: u32) -> u32 {
    value << round
}


/// Weighted average of the current model and the data:
/// `(model * model_value + data * (16 - model_value)) / 16`,
/// truncating. The data is rounded and re-expanded first because the
/// decompressor only ever sees the rounded value.
///
/// Fast path for fields of up to 16 bits, the products fit in 32 bits.
#[inline]
pub fn update_model16(data: u32, model: u32, model_value: u32, round: u32) -> u16 {
    let weighted_data = round_inv(round_fwd(data, round), round) * (MAX_MODEL_VALUE - model_value);
    let weighted_model = model * model_value;

    ((weighted_model + weighted_data) / MAX_MODEL_VALUE) as u16
}


/// Like [`update_model16`], for full 32-bit fields.
/// The products can exceed 32 bits, so the sum is formed in 64 bits.
#[inline]
pub fn update_model32(data: u32, model: u32, model_value: u32, round: u32) -> u32 {
    let weighted_data = u64::from(round_inv(round_fwd(data, round), round))
        * u64::from(MAX_MODEL_VALUE - model_value);
    let weighted_model = u64::from(model) * u64::from(model_value);

    ((weighted_model + weighted_data) / u64::from(MAX_MODEL_VALUE)) as u32
}
