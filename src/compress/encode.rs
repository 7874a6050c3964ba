
//! Code-word generation: the signed-to-positive mapping, the Rice and
//! Golomb generators, and the per-field encoder with its outlier escapes.

use crate::cfg::CmpMode;
use crate::compress::bitstream::BitWriter;
use crate::compress::model::round_fwd;
use crate::error::{Error, ErrorFlags, Result};
use crate::math::{floor_log_2, is_a_pow_of_2};


/// Fold a signed residual (in two's complement over `max_data_bits`)
/// into the non-negative range: `0, -1, 1, -2, …` becomes `0, 1, 2, 3, …`.
/// Bits above `max_data_bits` are ignored. Bijective over the field width.
#[inline]
pub(crate) fn map_to_pos(value: u32, max_data_bits: u32) -> u32 {
    debug_assert!(max_data_bits >= 1 && max_data_bits <= 32);

    let mask = u32::MAX >> (32 - max_data_bits);
    let value = value & mask;

    if value >> (max_data_bits - 1) != 0 {
        // negative in the field width: sign-extend, then fold onto odd numbers
        let extended = value | !mask;
        extended.wrapping_neg().wrapping_mul(2).wrapping_sub(1)
    } else {
        value.wrapping_mul(2)
    }
}


/// Rice code word for `value` with a power-of-two parameter `m`:
/// a unary quotient (ones, terminated by a zero) followed by the
/// `log2_m`-bit remainder. Returns `(code_word, length_in_bits)`.
/// The caller keeps `value` small enough for a 32-bit code word.
#[inline]
pub(crate) fn rice_code_word(value: u32, m: u32, log2_m: u32) -> (u32, u32) {
    let quotient = value >> log2_m;
    let quotient_code = (1u32.wrapping_shl(quotient)).wrapping_sub(1);

    let remainder = value & (m - 1);
    let remainder_len = log2_m + 1; // the +1 terminates the unary run

    // a shift operand of 32 can only occur with a zero quotient code,
    // the masked shift keeps that case defined
    let code_word = quotient_code.wrapping_shl(remainder_len & 0x1f) | remainder;
    (code_word, remainder_len + quotient)
}


/// Golomb code word for `value` with a general parameter `m >= 1`.
/// The first `cutoff` values use `log2_m + 1` bits, every later group
/// of `m` values one bit more. Returns `(code_word, length_in_bits)`.
#[inline]
pub(crate) fn golomb_code_word(value: u32, m: u32, log2_m: u32) -> (u32, u32) {
    let reg_mask = 0x1f;

    let mut len = log2_m + 1; // code-word length in group 0
    let cutoff = (2u32.wrapping_shl(log2_m & reg_mask)).wrapping_sub(m); // members in group 0

    if value < cutoff {
        (value, len)
    }
    else {
        let group = (value - cutoff) / m;
        let remainder = (value - cutoff) - group * m;

        let group_code = (1u32.wrapping_shl(group & reg_mask)).wrapping_sub(1);
        let base = cutoff << 1;

        let code_word = group_code
            .wrapping_shl((len + 1) & reg_mask)
            .wrapping_add(base + remainder);

        len += 1 + group;
        (code_word, len)
    }
}


/// How code words are generated for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CodeWordKind {
    /// Power-of-two parameter, fast path.
    Rice,

    /// General parameter.
    Golomb,
}

/// How outliers above the spillover threshold are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EscapeKind {
    /// Code word zero is reserved as the escape symbol,
    /// the outlier follows unencoded in `max_data_bits` bits.
    Zero,

    /// A family of escape symbols, one per payload width step of two bits.
    Multi,

    /// No coding at all, every value is stored in `cmp_par` bits.
    Stuff,
}


/// Everything needed to encode the values of one record field.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EncoderSetup {
    pub(crate) cmp_par: u32,
    pub(crate) log2_par: u32,
    pub(crate) spill: u32,
    pub(crate) round: u32,
    pub(crate) max_data_bits: u32,
    pub(crate) code_word_kind: CodeWordKind,
    pub(crate) escape: EscapeKind,
}

impl EncoderSetup {

    /// A setup for one field, with the escape mechanism of the
    /// compression mode. Raw mode configures no encoder at all.
    pub fn new(cmp_par: u32, spill: u32, round: u32, max_data_bits: u32, mode: CmpMode)
        -> Result<Self>
    {
        debug_assert!(max_data_bits <= 32);

        let log2_par = floor_log_2(cmp_par)
            .ok_or(Error::config(ErrorFlags::CMP_PAR))?;

        let escape =
            if mode.uses_zero_escape() { EscapeKind::Zero }
            else if mode.uses_multi_escape() { EscapeKind::Multi }
            else { return Err(Error::config(ErrorFlags::CMP_MODE)); };

        let code_word_kind =
            if is_a_pow_of_2(cmp_par) { CodeWordKind::Rice }
            else { CodeWordKind::Golomb };

        Ok(EncoderSetup { cmp_par, log2_par, spill, round, max_data_bits, code_word_kind, escape })
    }

    /// A setup that stores every value unencoded in `cmp_par` bits.
    #[allow(dead_code)] // constructed by the decoder tests, decoded in decompress
    pub fn stuff(cmp_par: u32, round: u32) -> Self {
        EncoderSetup {
            cmp_par, log2_par: 0, spill: 0, round,
            max_data_bits: cmp_par,
            code_word_kind: CodeWordKind::Rice, // never used
            escape: EscapeKind::Stuff,
        }
    }

    #[inline]
    fn code_word(&self, value: u32) -> (u32, u32) {
        match self.code_word_kind {
            CodeWordKind::Rice => rice_code_word(value, self.cmp_par, self.log2_par),
            CodeWordKind::Golomb => golomb_code_word(value, self.cmp_par, self.log2_par),
        }
    }

    #[inline]
    fn put_code_word(&self, value: u32, stream: &mut BitWriter<'_>) -> Result<u32> {
        let (code_word, len) = self.code_word(value);
        stream.put_bits(code_word, len)
    }

    /// Round both operands, subtract the model from the data, fold the
    /// residual and append its code word, escaping outliers according
    /// to the configured mechanism.
    ///
    /// Fails with `HighValue` when the rounded data or model does not
    /// fit into `max_data_bits`, leaving the stream untouched.
    pub fn encode(&self, data: u32, model: u32, stream: &mut BitWriter<'_>) -> Result<u32> {
        let data = round_fwd(data, self.round);
        let model = round_fwd(model, self.round);

        let overflow_mask = !(u32::MAX >> (32 - self.max_data_bits) as u32 % 32);
        if self.max_data_bits < 32 && (data & overflow_mask != 0 || model & overflow_mask != 0) {
            log::debug!("data or model value wider than the {} bits the field allows", self.max_data_bits);
            return Err(Error::HighValue);
        }

        match self.escape {
            EscapeKind::Zero => {
                let mapped = map_to_pos(data.wrapping_sub(model), self.max_data_bits);

                // every regular value is shifted up by one,
                // freeing code word zero as the escape symbol
                if mapped < self.spill - 1 {
                    return self.put_code_word(mapped.wrapping_add(1), stream);
                }

                self.put_code_word(0, stream)?;
                stream.put_bits(mapped.wrapping_add(1), self.max_data_bits)
            }

            EscapeKind::Multi => {
                let mapped = map_to_pos(data.wrapping_sub(model), self.max_data_bits);

                if mapped < self.spill {
                    return self.put_code_word(mapped, stream);
                }

                // the escape symbol encodes the payload width:
                // spill + 0 is followed by 2 bits, spill + 1 by 4 bits, …
                let unencoded = mapped - self.spill;
                let sym_offset =
                    if unencoded == 0 { 0 }
                    else { (31 - unencoded.leading_zeros()) >> 1 };

                let unencoded_len = (sym_offset + 1) << 1;

                self.put_code_word(self.spill + sym_offset, stream)?;
                stream.put_bits(unencoded, unencoded_len)
            }

            EscapeKind::Stuff => stream.put_bits(data, self.max_data_bits),
        }
    }
}
