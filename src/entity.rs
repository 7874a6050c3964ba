
//! The compression entity: a self-describing container prefixing every
//! compressed payload with the parameters needed for blind decompression.
//!
//! All multi-byte fields are big-endian. A 32-byte generic header is
//! followed by a type-dependent parameter block (none in raw mode) and
//! the payload. Field accessors are generated from one offset/width
//! table so the wire layout exists in exactly one place.

use crate::cfg::{CmpCfg, CmpMode};
use crate::data::max_used_bits::MaxUsedBits;
use crate::data::DataType;
use crate::error::{Error, Result, UnitResult};
use crate::math::bits_to_4byte;

use bit_field::BitField;


/// Size of the generic entity header in bytes.
pub const GENERIC_HEADER_SIZE: u32 = 32;

/// Total header size of a non-raw imagette entity.
pub const IMAGETTE_HEADER_SIZE: u32 = GENERIC_HEADER_SIZE + 3;

/// Total header size of a non-raw adaptive imagette entity.
pub const IMAGETTE_ADAPTIVE_HEADER_SIZE: u32 = GENERIC_HEADER_SIZE + 9;

/// Total header size of a non-raw non-imagette entity.
pub const NON_IMAGETTE_HEADER_SIZE: u32 = GENERIC_HEADER_SIZE + 30;

/// Largest on-wire entity size, limited by the 24-bit size field.
pub const CMP_ENTITY_MAX_SIZE: u32 = 0x00ff_ffff;

/// The raw-mode flag inside the data-type word.
const RAW_BIT_IN_DATA_TYPE: usize = 15;

/// The largest header of any entity class. Entities are always
/// allocated at least this large so every field stays addressable.
pub(crate) fn max_header_size() -> u32 { NON_IMAGETTE_HEADER_SIZE }


/// Header size of an entity of this type. Raw entities carry only the
/// generic header, the input needs no decoding parameters.
pub fn header_size(data_type: DataType, raw: bool) -> u32 {
    if raw { GENERIC_HEADER_SIZE }
    else if data_type.is_adaptive_imagette() { IMAGETTE_ADAPTIVE_HEADER_SIZE }
    else if data_type.is_imagette() { IMAGETTE_HEADER_SIZE }
    else { NON_IMAGETTE_HEADER_SIZE }
}


/// Generates a getter/setter pair from one row of the header layout
/// table. Values wider than the on-wire field are rejected, never
/// silently truncated; getters outside a short buffer read as zero.
macro_rules! header_field {
    ( $(#[$doc:meta])* $getter:ident, $setter:ident, u8, $offset:expr ) => {
        $(#[$doc])*
        pub fn $getter(&self) -> u8 { self.read_be($offset, 1) as u8 }

        /// Sets the field read by the sibling getter.
        pub fn $setter(&mut self, value: u32) -> UnitResult {
            if value > u8::MAX as u32 {
                return Err(Error::BadEntity(concat!(stringify!($getter), " exceeds 8 bits")));
            }
            self.write_be($offset, 1, value as u64)
        }
    };

    ( $(#[$doc:meta])* $getter:ident, $setter:ident, u16, $offset:expr ) => {
        $(#[$doc])*
        pub fn $getter(&self) -> u16 { self.read_be($offset, 2) as u16 }

        /// Sets the field read by the sibling getter.
        pub fn $setter(&mut self, value: u32) -> UnitResult {
            if value > u16::MAX as u32 {
                return Err(Error::BadEntity(concat!(stringify!($getter), " exceeds 16 bits")));
            }
            self.write_be($offset, 2, value as u64)
        }
    };

    ( $(#[$doc:meta])* $getter:ident, $setter:ident, u24, $offset:expr ) => {
        $(#[$doc])*
        pub fn $getter(&self) -> u32 { self.read_be($offset, 3) as u32 }

        /// Sets the field read by the sibling getter.
        pub fn $setter(&mut self, value: u32) -> UnitResult {
            if value > 0x00ff_ffff {
                return Err(Error::BadEntity(concat!(stringify!($getter), " exceeds 24 bits")));
            }
            self.write_be($offset, 3, value as u64)
        }
    };

    ( $(#[$doc:meta])* $getter:ident, $setter:ident, u32, $offset:expr ) => {
        $(#[$doc])*
        pub fn $getter(&self) -> u32 { self.read_be($offset, 4) as u32 }

        /// Sets the field read by the sibling getter.
        pub fn $setter(&mut self, value: u32) -> UnitResult {
            self.write_be($offset, 4, value as u64)
        }
    };

    ( $(#[$doc:meta])* $getter:ident, $setter:ident, u48, $offset:expr ) => {
        $(#[$doc])*
        pub fn $getter(&self) -> u64 { self.read_be($offset, 6) }

        /// Sets the field read by the sibling getter.
        pub fn $setter(&mut self, value: u64) -> UnitResult {
            if value > 0xffff_ffff_ffff {
                return Err(Error::BadEntity(concat!(stringify!($getter), " exceeds 48 bits")));
            }
            self.write_be($offset, 6, value)
        }
    };
}


/// An owned compression entity.
///
/// Starts out empty after [`CmpEntity::create`], becomes header-complete
/// through the setters or [`CmpEntity::build`], and is sealed once the
/// payload is stored. Setters are not meant to run on a sealed entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmpEntity {
    bytes: Vec<u8>,
}

impl CmpEntity {

    /// Allocate an entity for `payload_bytes` of compressed data,
    /// zero the header, and set the size and data-type fields.
    pub fn create(data_type: DataType, raw: bool, payload_bytes: u32) -> Result<Self> {
        let header = header_size(data_type, raw);

        if payload_bytes > CMP_ENTITY_MAX_SIZE
            || header + payload_bytes > CMP_ENTITY_MAX_SIZE {
            return Err(Error::BadEntity("payload does not fit the 24-bit size field"));
        }

        let entity_size = header + payload_bytes;
        let allocated = entity_size.max(max_header_size());

        let mut entity = CmpEntity { bytes: vec![0; allocated as usize] };
        entity.set_size(entity_size)?;
        entity.set_data_type(data_type, raw);
        Ok(entity)
    }

    /// Wrap received bytes, checking the generic header for consistency.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < GENERIC_HEADER_SIZE as usize {
            return Err(Error::BadEntity("shorter than the generic header"));
        }

        let entity = CmpEntity { bytes };
        let data_type = entity.data_type()?;

        if (entity.size() as usize) > entity.bytes.len() {
            return Err(Error::BadEntity("size field exceeds the received bytes"));
        }

        if entity.size() < header_size(data_type, entity.raw_bit()) {
            return Err(Error::BadEntity("size field smaller than the header"));
        }

        Ok(entity)
    }

    /// The on-wire image of this entity.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[.. self.size() as usize]
    }

    header_field! {
        /// The application software version that produced this entity.
        version_id, set_version_id, u32, 0
    }

    header_field! {
        /// Total entity size in bytes, header plus payload.
        size, set_size, u24, 4
    }

    header_field! {
        /// Byte count of the uncompressed input.
        original_size, set_original_size, u24, 7
    }

    header_field! {
        /// Compression start time, coarse and fine clock combined.
        start_timestamp, set_start_timestamp, u48, 10
    }

    header_field! {
        /// Coarse clock part of the start timestamp.
        coarse_start_time, set_coarse_start_time, u32, 10
    }

    header_field! {
        /// Fine clock part of the start timestamp.
        fine_start_time, set_fine_start_time, u16, 14
    }

    header_field! {
        /// Compression end time, coarse and fine clock combined.
        end_timestamp, set_end_timestamp, u48, 16
    }

    header_field! {
        /// Coarse clock part of the end timestamp.
        coarse_end_time, set_coarse_end_time, u32, 16
    }

    header_field! {
        /// Fine clock part of the end timestamp.
        fine_end_time, set_fine_end_time, u16, 20
    }

    header_field! {
        /// The compression mode the data was compressed with.
        cmp_mode_used, set_cmp_mode_used, u8, 24
    }

    header_field! {
        /// The model weighting value the data was compressed with.
        model_value_used, set_model_value_used, u8, 25
    }

    header_field! {
        /// Identifies the model used for model-mode compression.
        model_id, set_model_id, u16, 26
    }

    header_field! {
        /// How often the model was updated since its creation.
        model_counter, set_model_counter, u8, 28
    }

    header_field! {
        /// Version of the maximum-used-bits table in effect.
        max_used_bits_version, set_max_used_bits_version, u8, 29
    }

    header_field! {
        /// The lossy rounding parameter the data was compressed with.
        lossy_cmp_par_used, set_lossy_cmp_par_used, u16, 30
    }

    // (adaptive) imagette parameter block

    header_field! {
        /// Spillover threshold of the imagette field.
        ima_spill, set_ima_spill, u16, 32
    }

    header_field! {
        /// Golomb parameter of the imagette field.
        ima_golomb_par, set_ima_golomb_par, u8, 34
    }

    header_field! {
        /// First alternative spillover threshold.
        ima_ap1_spill, set_ima_ap1_spill, u16, 35
    }

    header_field! {
        /// First alternative Golomb parameter.
        ima_ap1_golomb_par, set_ima_ap1_golomb_par, u8, 37
    }

    header_field! {
        /// Second alternative spillover threshold.
        ima_ap2_spill, set_ima_ap2_spill, u16, 38
    }

    header_field! {
        /// Second alternative Golomb parameter.
        ima_ap2_golomb_par, set_ima_ap2_golomb_par, u8, 40
    }

    /// The data product type stored in this entity.
    pub fn data_type(&self) -> Result<DataType> {
        DataType::from_id(self.read_be(22, 2) as u16 & 0x7fff)
    }

    /// Whether the payload is the uncompressed input.
    pub fn raw_bit(&self) -> bool {
        (self.read_be(22, 2) as u16).get_bit(RAW_BIT_IN_DATA_TYPE)
    }

    /// Set the data product type and the raw flag.
    pub fn set_data_type(&mut self, data_type: DataType, raw: bool) {
        let mut word = data_type.id();
        word.set_bit(RAW_BIT_IN_DATA_TYPE, raw);

        // the type word is always within the generic header
        let written = self.write_be(22, 2, u64::from(word));
        debug_assert!(written.is_ok());
    }

    /// Spillover threshold of a non-imagette parameter slot (1 to 6).
    pub fn non_ima_spill(&self, slot: u32) -> u32 {
        debug_assert!((1..=6).contains(&slot));
        self.read_be(32 + (slot as usize - 1) * 5, 3) as u32
    }

    /// Set the spillover threshold of a non-imagette parameter slot (1 to 6).
    pub fn set_non_ima_spill(&mut self, slot: u32, value: u32) -> UnitResult {
        debug_assert!((1..=6).contains(&slot));
        if value > 0x00ff_ffff {
            return Err(Error::BadEntity("non-imagette spillover exceeds 24 bits"));
        }
        self.write_be(32 + (slot as usize - 1) * 5, 3, u64::from(value))
    }

    /// Compression parameter of a non-imagette parameter slot (1 to 6).
    pub fn non_ima_cmp_par(&self, slot: u32) -> u32 {
        debug_assert!((1..=6).contains(&slot));
        self.read_be(35 + (slot as usize - 1) * 5, 2) as u32
    }

    /// Set the compression parameter of a non-imagette parameter slot (1 to 6).
    pub fn set_non_ima_cmp_par(&mut self, slot: u32, value: u32) -> UnitResult {
        debug_assert!((1..=6).contains(&slot));
        if value > u32::from(u16::MAX) {
            return Err(Error::BadEntity("non-imagette compression parameter exceeds 16 bits"));
        }
        self.write_be(35 + (slot as usize - 1) * 5, 2, u64::from(value))
    }

    /// Header size of this entity, derived from its type and raw flag.
    pub fn current_header_size(&self) -> Result<u32> {
        Ok(header_size(self.data_type()?, self.raw_bit()))
    }

    /// Size of the compressed payload in bytes.
    pub fn data_size(&self) -> u32 {
        match self.current_header_size() {
            Ok(header) if header <= self.size() => self.size() - header,
            _ => 0,
        }
    }

    /// The compressed payload.
    pub fn data(&self) -> Result<&[u8]> {
        let header = self.current_header_size()? as usize;
        let size = self.size() as usize;
        self.bytes.get(header .. size)
            .ok_or(Error::BadEntity("payload range outside the entity"))
    }

    /// Store the compressed payload, sealing the entity.
    /// The payload must not exceed the size fixed at creation.
    pub fn set_data(&mut self, payload: &[u8]) -> UnitResult {
        let header = self.current_header_size()? as usize;

        if payload.len() > self.data_size() as usize {
            return Err(Error::BadEntity("payload larger than the created entity"));
        }

        self.bytes[header .. header + payload.len()].copy_from_slice(payload);
        Ok(())
    }

    /// One-shot constructor: create the entity and transcribe the whole
    /// configuration and the compressed bit length into the header.
    /// The payload is stored separately with [`CmpEntity::set_data`].
    pub fn build(
        version_id: u32,
        start_timestamp: u64, end_timestamp: u64,
        model_id: u16, model_counter: u8,
        cfg: &CmpCfg<'_>, cmp_size_bits: u32,
    ) -> Result<Self>
    {
        let raw = cfg.cmp_mode.is_raw();
        let original_size = cfg.data_type.data_size(cfg.samples())
            .ok_or(Error::BadEntity("input size exceeds the 24-bit original-size field"))?;

        let mut entity = Self::create(cfg.data_type, raw, bits_to_4byte(cmp_size_bits))?;

        entity.set_version_id(version_id)?;
        entity.set_start_timestamp(start_timestamp)?;
        entity.set_end_timestamp(end_timestamp)?;
        entity.set_model_id(u32::from(model_id))?;
        entity.set_model_counter(u32::from(model_counter))?;

        entity.set_original_size(original_size)?;
        entity.set_cmp_mode_used(u32::from(cfg.cmp_mode.id()))?;
        entity.set_model_value_used(cfg.model_value)?;
        entity.set_max_used_bits_version(u32::from(cfg.max_used_bits.version))?;
        entity.set_lossy_cmp_par_used(cfg.round)?;

        // raw entities need no decoding parameters
        if !raw {
            if cfg.data_type.is_imagette() {
                entity.set_ima_spill(cfg.spill)?;
                entity.set_ima_golomb_par(cfg.golomb_par)?;

                if cfg.data_type.is_adaptive_imagette() {
                    entity.set_ima_ap1_spill(cfg.ap1_spill)?;
                    entity.set_ima_ap1_golomb_par(cfg.ap1_golomb_par)?;
                    entity.set_ima_ap2_spill(cfg.ap2_spill)?;
                    entity.set_ima_ap2_golomb_par(cfg.ap2_golomb_par)?;
                }
            }
            else {
                for (slot, (cmp_par, spill)) in non_ima_slot_values(cfg).iter().enumerate() {
                    entity.set_non_ima_cmp_par(slot as u32 + 1, *cmp_par)?;
                    entity.set_non_ima_spill(slot as u32 + 1, *spill)?;
                }
            }
        }

        Ok(entity)
    }

    /// Reconstruct a configuration sufficient to decompress this
    /// entity, cross-checking the header for consistency.
    pub fn read_header(&self) -> Result<CmpCfg<'static>> {
        let data_type = self.data_type()?;
        let cmp_mode = CmpMode::from_id(self.cmp_mode_used())?;

        if self.raw_bit() != cmp_mode.is_raw() {
            return Err(Error::BadEntity("raw flag contradicts the compression mode"));
        }

        let samples = data_type.samples_from_size(self.original_size())?;
        let table = MaxUsedBits::from_version(self.max_used_bits_version())?;

        let mut cfg = CmpCfg::new(
            data_type, cmp_mode,
            u32::from(self.model_value_used()),
            u32::from(self.lossy_cmp_par_used()),
        )?;

        cfg = cfg.with_max_used_bits(table)?;
        cfg.samples = samples;
        cfg.buffer_length = samples;

        if !cmp_mode.is_raw() {
            if data_type.is_imagette() {
                cfg.golomb_par = u32::from(self.ima_golomb_par());
                cfg.spill = u32::from(self.ima_spill());

                if data_type.is_adaptive_imagette() {
                    cfg.ap1_golomb_par = u32::from(self.ima_ap1_golomb_par());
                    cfg.ap1_spill = u32::from(self.ima_ap1_spill());
                    cfg.ap2_golomb_par = u32::from(self.ima_ap2_golomb_par());
                    cfg.ap2_spill = u32::from(self.ima_ap2_spill());
                }
            }
            else if data_type.is_aux() {
                cfg.cmp_par_mean = self.non_ima_cmp_par(1);
                cfg.spill_mean = self.non_ima_spill(1);
                cfg.cmp_par_variance = self.non_ima_cmp_par(2);
                cfg.spill_variance = self.non_ima_spill(2);
                cfg.cmp_par_pixels_error = self.non_ima_cmp_par(3);
                cfg.spill_pixels_error = self.non_ima_spill(3);
            }
            else {
                cfg.cmp_par_exp_flags = self.non_ima_cmp_par(1);
                cfg.spill_exp_flags = self.non_ima_spill(1);
                cfg.cmp_par_fx = self.non_ima_cmp_par(2);
                cfg.spill_fx = self.non_ima_spill(2);
                cfg.cmp_par_ncob = self.non_ima_cmp_par(3);
                cfg.spill_ncob = self.non_ima_spill(3);
                cfg.cmp_par_efx = self.non_ima_cmp_par(4);
                cfg.spill_efx = self.non_ima_spill(4);
                cfg.cmp_par_ecob = self.non_ima_cmp_par(5);
                cfg.spill_ecob = self.non_ima_spill(5);
                cfg.cmp_par_fx_cob_variance = self.non_ima_cmp_par(6);
                cfg.spill_fx_cob_variance = self.non_ima_spill(6);
            }
        }

        Ok(cfg)
    }

    /// Big-endian read of `count` bytes. Fields outside a short
    /// buffer read as zero.
    fn read_be(&self, offset: usize, count: usize) -> u64 {
        match self.bytes.get(offset .. offset + count) {
            None => 0,
            Some(bytes) => bytes.iter().fold(0, |word, &byte| word << 8 | u64::from(byte)),
        }
    }

    /// Big-endian write of the low `count` bytes of `value`.
    fn write_be(&mut self, offset: usize, count: usize, value: u64) -> UnitResult {
        let bytes = self.bytes.get_mut(offset .. offset + count)
            .ok_or(Error::BadEntity("field outside the entity"))?;

        for (index, byte) in bytes.iter_mut().enumerate() {
            *byte = (value >> (8 * (count - 1 - index))) as u8;
        }

        Ok(())
    }
}


/// The six non-imagette parameter slots of a configuration, in wire
/// order: `(cmp_par, spill)` for exposure flags or mean, flux or
/// variance, centre of brightness or outlier pixels, extended flux,
/// extended centre of brightness, and flux/COB variance.
fn non_ima_slot_values(cfg: &CmpCfg<'_>) -> [(u32, u32); 6] {
    if cfg.data_type.is_aux() {
        [
            (cfg.cmp_par_mean, cfg.spill_mean),
            (cfg.cmp_par_variance, cfg.spill_variance),
            (cfg.cmp_par_pixels_error, cfg.spill_pixels_error),
            (0, 0), (0, 0), (0, 0),
        ]
    }
    else {
        [
            (cfg.cmp_par_exp_flags, cfg.spill_exp_flags),
            (cfg.cmp_par_fx, cfg.spill_fx),
            (cfg.cmp_par_ncob, cfg.spill_ncob),
            (cfg.cmp_par_efx, cfg.spill_efx),
            (cfg.cmp_par_ecob, cfg.spill_ecob),
            (cfg.cmp_par_fx_cob_variance, cfg.spill_fx_cob_variance),
        ]
    }
}
