
//! The software decompressor: reverses the predictive entropy coding
//! of a compression entity back into the original record bytes.
//!
//! Everything needed to decode travels in the entity header, except the
//! model buffer of model-mode entities, which the caller provides just
//! like on the compression side.

use crate::cfg::{CmpCfg, ModelBuffers};
use crate::compress::encode::{CodeWordKind, EncoderSetup, EscapeKind};
use crate::compress::model::{round_fwd, round_inv, update_model16, update_model32};
use crate::compress::{imagette_max_bits, record_field_setups};
use crate::data::records::{
    Background, FFx, FFxEfx, FFxEfxNcobEcob, FFxNcob, LFx, LFxEfx,
    LFxEfxNcobEcob, LFxNcob, Offset, Record, SFx, SFxEfx, SFxEfxNcobEcob,
    SFxNcob, Smearing,
};
use crate::data::{DataType, MULTI_ENTRY_HDR_SIZE};
use crate::entity::CmpEntity;
use crate::error::{Error, ErrorFlags, Result, UnitResult};


/// Decompress the payload of an entity into the original input bytes
/// (packed big-endian records, multi-entry header included).
///
/// Model-mode entities need the same model buffer that drove the
/// compression; the updated model can be reproduced along the way, so
/// a chain of entities decompresses with one evolving model buffer.
pub fn decompress(entity: &CmpEntity, mut model: ModelBuffers<'_>) -> Result<Vec<u8>> {
    let cfg = entity.read_header()?;
    let payload = entity.data()?;
    let original_size = entity.original_size() as usize;

    if cfg.cmp_mode.is_raw() {
        if payload.len() < original_size {
            return Err(Error::BadEntity("payload shorter than the original size"));
        }
        return Ok(payload[.. original_size].to_vec());
    }

    if cfg.cmp_mode.is_model() {
        match model.model_bytes() {
            None => {
                log::debug!("model-mode entity needs the model buffer of the compression");
                return Err(Error::config(ErrorFlags::CMP_MODE));
            }
            Some(bytes) if bytes.len() != original_size => {
                return Err(Error::BadEntity("model buffer length contradicts the original size"));
            }
            Some(_) => {}
        }

        if let Some(updated_len) = model.updated_len() {
            if updated_len != original_size {
                return Err(Error::BadEntity("updated-model buffer length contradicts the original size"));
            }
        }
    }

    if cfg.data_type.is_imagette() {
        return decode_imagette(&cfg, payload, model);
    }

    let setups = record_field_setups(&cfg)?;

    match cfg.data_type {
        DataType::SFx => decode_records::<SFx>(&cfg, &setups, payload, model),
        DataType::SFxEfx => decode_records::<SFxEfx>(&cfg, &setups, payload, model),
        DataType::SFxNcob => decode_records::<SFxNcob>(&cfg, &setups, payload, model),
        DataType::SFxEfxNcobEcob => decode_records::<SFxEfxNcobEcob>(&cfg, &setups, payload, model),

        DataType::FFx => decode_records::<FFx>(&cfg, &setups, payload, model),
        DataType::FFxEfx => decode_records::<FFxEfx>(&cfg, &setups, payload, model),
        DataType::FFxNcob => decode_records::<FFxNcob>(&cfg, &setups, payload, model),
        DataType::FFxEfxNcobEcob => decode_records::<FFxEfxNcobEcob>(&cfg, &setups, payload, model),

        DataType::LFx => decode_records::<LFx>(&cfg, &setups, payload, model),
        DataType::LFxEfx => decode_records::<LFxEfx>(&cfg, &setups, payload, model),
        DataType::LFxNcob => decode_records::<LFxNcob>(&cfg, &setups, payload, model),
        DataType::LFxEfxNcobEcob => decode_records::<LFxEfxNcobEcob>(&cfg, &setups, payload, model),

        DataType::Offset => decode_records::<Offset>(&cfg, &setups, payload, model),
        DataType::Background => decode_records::<Background>(&cfg, &setups, payload, model),
        DataType::Smearing => decode_records::<Smearing>(&cfg, &setups, payload, model),

        _ => Err(Error::BadEntity("data product type cannot be decompressed")),
    }
}


fn decode_imagette(cfg: &CmpCfg<'_>, payload: &[u8], mut model_bufs: ModelBuffers<'_>) -> Result<Vec<u8>> {
    let setup = EncoderSetup::new(
        cfg.golomb_par, cfg.spill, cfg.round,
        imagette_max_bits(cfg), cfg.cmp_mode,
    )?;

    let samples = cfg.samples() as usize;
    let model_mode = cfg.cmp_mode.is_model();

    let mut reader = BitReader::new(payload, 0);
    let mut output = Vec::with_capacity(samples * 2);

    let mut model: u32 = match model_bufs.model_bytes() {
        Some(bytes) if model_mode && samples > 0 =>
            u32::from(u16::from_be_bytes([bytes[0], bytes[1]])),
        _ => 0,
    };

    for index in 0 .. samples {
        let rounded = decode_value(&setup, model, &mut reader)?;
        let data = round_inv(rounded, cfg.round);
        output.extend_from_slice(&(data as u16).to_be_bytes());

        if model_mode {
            let next_model = match model_bufs.model_bytes() {
                Some(bytes) if index + 1 < samples =>
                    u32::from(u16::from_be_bytes([bytes[index * 2 + 2], bytes[index * 2 + 3]])),
                _ => 0,
            };

            if let Some(updated) = model_bufs.updated_bytes() {
                let new_model = update_model16(data, model, cfg.model_value, cfg.round);
                updated[index * 2 .. index * 2 + 2].copy_from_slice(&new_model.to_be_bytes());
            }

            model = next_model;
        }
        else {
            model = data;
        }
    }

    Ok(output)
}


fn decode_records<R: Record>(
    cfg: &CmpCfg<'_>, setups: &[EncoderSetup],
    payload: &[u8], mut model_bufs: ModelBuffers<'_>,
) -> Result<Vec<u8>>
{
    debug_assert_eq!(setups.len(), R::FIELD_COUNT);

    let hdr = MULTI_ENTRY_HDR_SIZE as usize;
    if payload.len() < hdr {
        return Err(Error::BadEntity("payload shorter than the multi-entry header"));
    }

    let samples = cfg.samples() as usize;
    let model_mode = cfg.cmp_mode.is_model();

    let mut output = Vec::with_capacity(hdr + samples * R::BYTE_SIZE);
    output.extend_from_slice(&payload[.. hdr]);

    if let Some(updated) = model_bufs.updated_bytes() {
        updated[.. hdr].copy_from_slice(&payload[.. hdr]);
    }

    let mut reader = BitReader::new(payload, MULTI_ENTRY_HDR_SIZE * 8);

    let mut model: R = match model_bufs.model_bytes() {
        Some(bytes) if model_mode && samples > 0 => R::read(&mut &bytes[hdr ..])?,
        _ => R::default(),
    };

    for index in 0 .. samples {
        let mut record = R::default();
        for (field, setup) in setups.iter().enumerate() {
            let rounded = decode_value(setup, model.field(field), &mut reader)?;
            record.set_field(field, round_inv(rounded, cfg.round));
        }
        record.write(&mut output)?;

        let next_model = match model_bufs.model_bytes() {
            Some(bytes) if model_mode && index + 1 < samples =>
                Some(R::read(&mut &bytes[hdr + (index + 1) * R::BYTE_SIZE ..])?),
            _ => None,
        };

        if model_mode {
            if let Some(updated) = model_bufs.updated_bytes() {
                let mut new_model = R::default();
                for field in 0 .. R::FIELD_COUNT {
                    new_model.set_field(field, update_model32(
                        record.field(field), model.field(field), cfg.model_value, cfg.round));
                }

                let offset = hdr + index * R::BYTE_SIZE;
                new_model.write(&mut &mut updated[offset .. offset + R::BYTE_SIZE])?;
            }
        }

        model = match next_model {
            Some(next) => next,
            None if model_mode => R::default(),
            None => record,
        };
    }

    Ok(output)
}


/// Read one value: decode the (possibly escaped) mapped residual,
/// un-fold it and add the rounded model. Returns the rounded data value.
fn decode_value(setup: &EncoderSetup, model: u32, reader: &mut BitReader<'_>) -> Result<u32> {
    let mapped = match setup.escape {
        EscapeKind::Zero => {
            let symbol = read_code_word(setup, reader)?;
            if symbol == 0 {
                // escaped: the outlier follows unencoded, still offset by one
                reader.take(setup.max_data_bits)?.wrapping_sub(1)
            } else {
                symbol - 1
            }
        }

        EscapeKind::Multi => {
            let symbol = read_code_word(setup, reader)?;
            if symbol < setup.spill {
                symbol
            } else {
                let unencoded_len = (symbol - setup.spill + 1) << 1;
                if unencoded_len > 32 {
                    return Err(Error::BadEntity("corrupt escape symbol"));
                }
                setup.spill.wrapping_add(reader.take(unencoded_len)?)
            }
        }

        EscapeKind::Stuff => {
            return reader.take(setup.max_data_bits);
        }
    };

    let mask = u32::MAX >> (32 - setup.max_data_bits);
    let residual = unmap_to_signed(mapped);

    Ok(round_fwd(model, setup.round).wrapping_add(residual) & mask)
}


/// Inverse of the zig-zag fold: even numbers are non-negative
/// residuals, odd numbers negative ones.
#[inline]
fn unmap_to_signed(mapped: u32) -> u32 {
    if mapped & 1 == 0 { mapped >> 1 }
    else { (mapped >> 1).wrapping_add(1).wrapping_neg() }
}


fn read_code_word(setup: &EncoderSetup, reader: &mut BitReader<'_>) -> Result<u32> {
    let window = reader.peek32();

    let decoded = match setup.code_word_kind {
        CodeWordKind::Rice => decode_rice(window, setup.cmp_par, setup.log2_par),
        CodeWordKind::Golomb => decode_golomb(window, setup.cmp_par, setup.log2_par),
    };

    let (value, len) = decoded.ok_or(Error::BadEntity("corrupt code word"))?;
    reader.skip(len)?;
    Ok(value)
}


/// Decode a Rice code word from the window (first bit at bit 31):
/// a unary run of ones, a terminating zero, `log2_m` remainder bits.
fn decode_rice(window: u32, m: u32, log2_m: u32) -> Option<(u32, u32)> {
    let quotient = window.leading_ones();
    let len = quotient + 1 + log2_m;
    if len > 32 { return None; }

    let remainder =
        if log2_m == 0 { 0 }
        else { (window >> (32 - len)) & (m - 1) };

    Some((quotient * m + remainder, len))
}


/// Decode a Golomb code word from the window (first bit at bit 31).
///
/// Group 0 code words are `log2_m + 1` bits holding the value itself.
/// Later code words are a unary group run followed by a base-aligned
/// tail whose top bit may extend the apparent run by one, which the
/// base comparison resolves.
fn decode_golomb(window: u32, m: u32, log2_m: u32) -> Option<(u32, u32)> {
    let cutoff = (2u32 << log2_m) - m;
    let base = cutoff << 1;

    let head = window >> (32 - (log2_m + 1));
    if head < cutoff {
        return Some((head, log2_m + 1));
    }

    let run = window.leading_ones();
    let tail_len = log2_m + 2;

    if run + tail_len <= 32 {
        let tail = (window << run) >> (32 - tail_len);
        if tail >= base {
            return Some((cutoff + run * m + (tail - base), run + tail_len));
        }
    }

    // the run's last one belongs to the tail
    if run == 0 || run - 1 + tail_len > 32 { return None; }
    let tail = (window << (run - 1)) >> (32 - tail_len);
    if tail < base { return None; }

    Some((cutoff + (run - 1) * m + (tail - base), run - 1 + tail_len))
}


/// Reads big-endian bit fields from a byte buffer, zero-padding
/// lookahead past the end while never consuming beyond it.
struct BitReader<'b> {
    bytes: &'b [u8],
    position_bits: u32,
}

impl<'b> BitReader<'b> {

    fn new(bytes: &'b [u8], start_bits: u32) -> Self {
        BitReader { bytes, position_bits: start_bits }
    }

    /// The next 32 bits, first bit at bit 31. Bits past the end read as zero.
    fn peek32(&self) -> u32 {
        let byte = (self.position_bits / 8) as usize;
        let bit = self.position_bits % 8;

        let mut window: u64 = 0;
        for offset in 0 .. 5 {
            let value = self.bytes.get(byte + offset).copied().unwrap_or(0);
            window = window << 8 | u64::from(value);
        }

        (window >> (8 - bit)) as u32
    }

    /// Advance by `n_bits`, which must not pass the end of the buffer.
    fn skip(&mut self, n_bits: u32) -> UnitResult {
        let end = self.position_bits.checked_add(n_bits)
            .ok_or(Error::BadEntity("bit-stream ended early"))?;

        if end as usize > self.bytes.len() * 8 {
            return Err(Error::BadEntity("bit-stream ended early"));
        }

        self.position_bits = end;
        Ok(())
    }

    /// Consume and return the next `n_bits` (up to 32).
    fn take(&mut self, n_bits: u32) -> Result<u32> {
        debug_assert!(n_bits <= 32);
        if n_bits == 0 { return Ok(0); }

        let value = self.peek32() >> (32 - n_bits);
        self.skip(n_bits)?;
        Ok(value)
    }
}
