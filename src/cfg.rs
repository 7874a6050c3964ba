
//! Compression configuration: modes, parameter pairs, data buffers,
//! and the validation that runs before any output is written.

use crate::data::max_used_bits::MaxUsedBits;
use crate::data::DataType;
use crate::error::{Error, ErrorFlags, Result, UnitResult};
use crate::math::floor_log_2;


/// Marks a compression parameter that is not needed
/// for the selected data type or mode.
pub const CMP_PAR_UNUSED: u32 = 0;

/// The denominator of the model weighting equation,
/// and the largest valid `model_value`.
pub const MAX_MODEL_VALUE: u32 = 16;

/// Largest lossy rounding parameter of the software compressor.
pub const MAX_ICU_ROUND: u32 = 3;

/// Largest lossy rounding parameter the hardware compressor accepts.
pub const MAX_RDCU_ROUND: u32 = 2;

/// Valid Golomb parameter range for imagette compression.
/// The upper bound keeps configurations hardware-compatible.
pub const MIN_IMA_GOLOMB_PAR: u32 = 1;
pub const MAX_IMA_GOLOMB_PAR: u32 = 63;

/// Smallest valid spillover threshold (0 and 1 cannot escape anything).
pub const MIN_IMA_SPILL: u32 = 2;

/// Valid compression parameter range for the non-imagette fields.
/// The entity header stores these parameters in 16 bits.
pub const MIN_NON_IMA_GOLOMB_PAR: u32 = 1;
pub const MAX_NON_IMA_GOLOMB_PAR: u32 = u16::MAX as u32;
pub const MIN_NON_IMA_SPILL: u32 = 2;

/// Code-word length limits of the two compressor implementations.
const MAX_CW_BITS_RDCU: u32 = 16;
const MAX_CW_BITS_ICU: u32 = 32;


/// Selects the prediction and the outlier strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CmpMode {
    /// No compression, the payload is the input verbatim.
    Raw = 0,

    /// Model prediction with the zero-escape outlier mechanism.
    ModelZero = 1,

    /// 1d-differencing prediction with the zero-escape outlier mechanism.
    DiffZero = 2,

    /// Model prediction with the multi-escape outlier mechanism.
    ModelMulti = 3,

    /// 1d-differencing prediction with the multi-escape outlier mechanism.
    DiffMulti = 4,
}

impl CmpMode {

    /// The mode id stored in the entity header.
    #[inline]
    pub fn id(self) -> u8 { self as u8 }

    /// Look up a mode by the id stored in an entity header.
    pub fn from_id(id: u8) -> Result<Self> {
        use CmpMode::*;
        Ok(match id {
            0 => Raw, 1 => ModelZero, 2 => DiffZero,
            3 => ModelMulti, 4 => DiffMulti,
            _ => return Err(Error::BadEntity("unknown compression mode id")),
        })
    }

    /// Whether a model buffer drives the prediction.
    pub fn is_model(self) -> bool {
        matches!(self, CmpMode::ModelZero | CmpMode::ModelMulti)
    }

    /// Whether the previous sample drives the prediction.
    pub fn is_diff(self) -> bool {
        matches!(self, CmpMode::DiffZero | CmpMode::DiffMulti)
    }

    /// Whether this is the uncompressed pass-through mode.
    pub fn is_raw(self) -> bool {
        self == CmpMode::Raw
    }

    /// Whether outliers are escaped through the reserved zero code word.
    pub fn uses_zero_escape(self) -> bool {
        matches!(self, CmpMode::ModelZero | CmpMode::DiffZero)
    }

    /// Whether outliers are escaped through the escape code-word family.
    pub fn uses_multi_escape(self) -> bool {
        matches!(self, CmpMode::ModelMulti | CmpMode::DiffMulti)
    }
}


/// The highest valid spillover threshold for a compression parameter,
/// given the code-word length limit of the target compressor.
fn max_spill(golomb_par: u32, max_cw_bits: u32) -> u32 {
    let log2_par = match floor_log_2(golomb_par) {
        Some(log) => log,
        None => return 0, // golomb_par of 0 cannot spill at all
    };

    // a parameter this wide leaves no room for any code word
    if log2_par > max_cw_bits - 2 { return 0; }

    let cutoff = ((2u64 << log2_par) - u64::from(golomb_par)) as u32;
    let max_escape_sym_offset = max_cw_bits / 2 - 1;

    (max_cw_bits - 1 - log2_par) * golomb_par + cutoff - max_escape_sym_offset - 1
}

/// The highest spillover threshold the hardware imagette compressor
/// accepts for this Golomb parameter (16-bit code words).
pub fn ima_max_spill(golomb_par: u32) -> u32 {
    max_spill(golomb_par, MAX_CW_BITS_RDCU)
}

/// The highest spillover threshold the software compressor accepts
/// for this compression parameter (32-bit code words).
pub fn icu_max_spill(cmp_par: u32) -> u32 {
    max_spill(cmp_par, MAX_CW_BITS_ICU)
}


/// The model buffers of a compression. The updated model may alias the
/// current model for an in-place update; the borrow rules make every
/// other overlap unrepresentable.
#[derive(Debug)]
pub enum ModelBuffers<'a> {
    /// No model compression.
    None,

    /// Read the model from one buffer, optionally store the
    /// updated model in another.
    Separate {
        model: &'a [u8],
        updated: Option<&'a mut [u8]>,
    },

    /// One buffer serves as model input and updated-model output.
    InPlace(&'a mut [u8]),
}

impl<'a> ModelBuffers<'a> {

    /// The current model bytes, if any model was provided.
    pub(crate) fn model_bytes(&self) -> Option<&[u8]> {
        match self {
            ModelBuffers::None => None,
            ModelBuffers::Separate { model, .. } => Some(model),
            ModelBuffers::InPlace(bytes) => Some(bytes),
        }
    }

    /// The updated-model bytes, if an updated model has to be written.
    pub(crate) fn updated_bytes(&mut self) -> Option<&mut [u8]> {
        match self {
            ModelBuffers::None => None,
            ModelBuffers::Separate { updated, .. } => updated.as_deref_mut(),
            ModelBuffers::InPlace(bytes) => Some(bytes),
        }
    }

    /// Length of the updated-model buffer, if one is attached.
    pub(crate) fn updated_len(&self) -> Option<usize> {
        match self {
            ModelBuffers::None => None,
            ModelBuffers::Separate { updated, .. } => updated.as_ref().map(|bytes| bytes.len()),
            ModelBuffers::InPlace(bytes) => Some(bytes.len()),
        }
    }
}


/// The complete configuration of one compression run.
///
/// Construct with [`CmpCfg::new`], attach the data with
/// [`CmpCfg::buffers`], select the type-specific parameters with
/// [`CmpCfg::imagette`], [`CmpCfg::fx_cob`] or [`CmpCfg::aux`],
/// then call [`crate::compress::compress`]. A configuration drives
/// exactly one compression and is discarded afterwards.
#[derive(Debug)]
pub struct CmpCfg<'a> {
    /// The data product type of the input.
    pub data_type: DataType,

    /// Prediction and outlier strategy.
    pub cmp_mode: CmpMode,

    /// Model weighting numerator, `0..=16` (denominator is 16).
    pub model_value: u32,

    /// Lossy rounding shift, `0..=3`. Zero is lossless.
    pub round: u32,

    /// Golomb parameter for imagette data.
    pub golomb_par: u32,
    /// Spillover threshold for imagette data.
    pub spill: u32,

    /// First alternative parameter pair, size estimation only.
    pub ap1_golomb_par: u32,
    pub ap1_spill: u32,

    /// Second alternative parameter pair, size estimation only.
    pub ap2_golomb_par: u32,
    pub ap2_spill: u32,

    /// Per-field parameters of the flux/COB record families.
    pub cmp_par_exp_flags: u32,
    pub spill_exp_flags: u32,
    pub cmp_par_fx: u32,
    pub spill_fx: u32,
    pub cmp_par_ncob: u32,
    pub spill_ncob: u32,
    pub cmp_par_efx: u32,
    pub spill_efx: u32,
    pub cmp_par_ecob: u32,
    pub spill_ecob: u32,
    pub cmp_par_fx_cob_variance: u32,
    pub spill_fx_cob_variance: u32,

    /// Per-field parameters of the auxiliary science types.
    pub cmp_par_mean: u32,
    pub spill_mean: u32,
    pub cmp_par_variance: u32,
    pub spill_variance: u32,
    pub cmp_par_pixels_error: u32,
    pub spill_pixels_error: u32,

    /// The field-width table in effect. Read-only for the whole run.
    pub max_used_bits: &'a MaxUsedBits,

    pub(crate) input: &'a [u8],
    pub(crate) samples: u32,
    pub(crate) model: ModelBuffers<'a>,
    pub(crate) output: Option<&'a mut [u8]>,
    pub(crate) buffer_length: u32,
}

impl<'a> CmpCfg<'a> {

    /// Create a configuration with the general parameters set and
    /// all buffers empty. Starts out with the safe field-width table.
    pub fn new(
        data_type: DataType, cmp_mode: CmpMode,
        model_value: u32, round: u32,
    ) -> Result<Self>
    {
        let cfg = CmpCfg {
            data_type, cmp_mode, model_value, round,

            golomb_par: CMP_PAR_UNUSED, spill: CMP_PAR_UNUSED,
            ap1_golomb_par: CMP_PAR_UNUSED, ap1_spill: CMP_PAR_UNUSED,
            ap2_golomb_par: CMP_PAR_UNUSED, ap2_spill: CMP_PAR_UNUSED,

            cmp_par_exp_flags: CMP_PAR_UNUSED, spill_exp_flags: CMP_PAR_UNUSED,
            cmp_par_fx: CMP_PAR_UNUSED, spill_fx: CMP_PAR_UNUSED,
            cmp_par_ncob: CMP_PAR_UNUSED, spill_ncob: CMP_PAR_UNUSED,
            cmp_par_efx: CMP_PAR_UNUSED, spill_efx: CMP_PAR_UNUSED,
            cmp_par_ecob: CMP_PAR_UNUSED, spill_ecob: CMP_PAR_UNUSED,
            cmp_par_fx_cob_variance: CMP_PAR_UNUSED, spill_fx_cob_variance: CMP_PAR_UNUSED,

            cmp_par_mean: CMP_PAR_UNUSED, spill_mean: CMP_PAR_UNUSED,
            cmp_par_variance: CMP_PAR_UNUSED, spill_variance: CMP_PAR_UNUSED,
            cmp_par_pixels_error: CMP_PAR_UNUSED, spill_pixels_error: CMP_PAR_UNUSED,

            max_used_bits: &crate::data::max_used_bits::MAX_USED_BITS_SAFE,

            input: &[], samples: 0,
            model: ModelBuffers::None,
            output: None, buffer_length: 0,
        };

        cfg.validate_general()?;
        Ok(cfg)
    }

    /// Exchange the field-width table. The table must come from the
    /// registry (or match one of its versions) for decompression to work.
    pub fn with_max_used_bits(mut self, table: &'a MaxUsedBits) -> Result<Self> {
        table.validate()?;
        self.max_used_bits = table;
        Ok(self)
    }

    /// Attach the data buffers.
    ///
    /// All buffers hold the packed big-endian wire layout of the data
    /// type, non-imagette buffers starting with the 12-byte multi-entry
    /// header. `samples` counts records; `buffer_length` is the output
    /// capacity in the same record units. Pass no output buffer to run
    /// the compression as a size estimate only.
    ///
    /// Returns the output capacity in bytes.
    pub fn buffers(
        &mut self,
        input: &'a [u8], samples: u32,
        model: ModelBuffers<'a>,
        output: Option<&'a mut [u8]>, buffer_length: u32,
    ) -> Result<u32>
    {
        self.input = input;
        self.samples = samples;
        self.model = model;
        self.output = output;
        self.buffer_length = buffer_length;

        self.validate_buffers()?;

        let capacity = self.data_type.data_size(buffer_length)
            .ok_or(Error::config(ErrorFlags::SMALL_BUFFER))?;

        Ok(capacity)
    }

    /// Set the imagette parameters: the primary Golomb/spillover pair
    /// and the two alternative pairs of the adaptive imagette types
    /// (pass [`CMP_PAR_UNUSED`] pairs for non-adaptive types).
    pub fn imagette(
        &mut self,
        golomb_par: u32, spill: u32,
        ap1_golomb_par: u32, ap1_spill: u32,
        ap2_golomb_par: u32, ap2_spill: u32,
    ) -> UnitResult
    {
        self.golomb_par = golomb_par;
        self.spill = spill;
        self.ap1_golomb_par = ap1_golomb_par;
        self.ap1_spill = ap1_spill;
        self.ap2_golomb_par = ap2_golomb_par;
        self.ap2_spill = ap2_spill;

        self.validate_imagette_pars()
    }

    /// Set the mission default imagette parameters for the selected
    /// compression mode.
    pub fn imagette_default(&mut self) -> UnitResult {
        if self.cmp_mode.is_model() {
            self.imagette(4, 48, 3, 35, 5, 60)
        } else {
            self.imagette(7, 60, 6, 48, 8, 72)
        }
    }

    /// Set the per-field parameters of the flux/COB record families.
    /// Fields the selected data type does not carry may stay
    /// [`CMP_PAR_UNUSED`].
    #[allow(clippy::too_many_arguments)] // mirrors the twelve-register parameter block
    pub fn fx_cob(
        &mut self,
        cmp_par_exp_flags: u32, spill_exp_flags: u32,
        cmp_par_fx: u32, spill_fx: u32,
        cmp_par_ncob: u32, spill_ncob: u32,
        cmp_par_efx: u32, spill_efx: u32,
        cmp_par_ecob: u32, spill_ecob: u32,
        cmp_par_fx_cob_variance: u32, spill_fx_cob_variance: u32,
    ) -> UnitResult
    {
        self.cmp_par_exp_flags = cmp_par_exp_flags;
        self.spill_exp_flags = spill_exp_flags;
        self.cmp_par_fx = cmp_par_fx;
        self.spill_fx = spill_fx;
        self.cmp_par_ncob = cmp_par_ncob;
        self.spill_ncob = spill_ncob;
        self.cmp_par_efx = cmp_par_efx;
        self.spill_efx = spill_efx;
        self.cmp_par_ecob = cmp_par_ecob;
        self.spill_ecob = spill_ecob;
        self.cmp_par_fx_cob_variance = cmp_par_fx_cob_variance;
        self.spill_fx_cob_variance = spill_fx_cob_variance;

        self.validate_fx_cob_pars()
    }

    /// Set the per-field parameters of the auxiliary science types.
    pub fn aux(
        &mut self,
        cmp_par_mean: u32, spill_mean: u32,
        cmp_par_variance: u32, spill_variance: u32,
        cmp_par_pixels_error: u32, spill_pixels_error: u32,
    ) -> UnitResult
    {
        self.cmp_par_mean = cmp_par_mean;
        self.spill_mean = spill_mean;
        self.cmp_par_variance = cmp_par_variance;
        self.spill_variance = spill_variance;
        self.cmp_par_pixels_error = cmp_par_pixels_error;
        self.spill_pixels_error = spill_pixels_error;

        self.validate_aux_pars()
    }

    /// Number of records to compress.
    pub fn samples(&self) -> u32 { self.samples }

    /// Output capacity in record units.
    pub fn buffer_length(&self) -> u32 { self.buffer_length }

    /// Check the complete configuration, collecting every failed rule
    /// into the error register flags.
    pub fn validate(&self) -> UnitResult {
        let mut flags = ErrorFlags::empty();

        for result in [
            self.validate_general(),
            self.validate_buffers(),
            self.validate_type_pars(),
            self.max_used_bits.validate(),
        ] {
            if let Err(Error::InvalidConfig(failed)) = result {
                flags.insert(failed);
            }
        }

        if flags.is_empty() { Ok(()) }
        else { Err(Error::InvalidConfig(flags)) }
    }

    fn validate_general(&self) -> UnitResult {
        let mut flags = ErrorFlags::empty();

        if !self.data_type.is_compressible() {
            log::debug!("data type {:?} is not supported by the software compressor", self.data_type);
            flags.insert(ErrorFlags::CMP_MODE);
        }

        if self.model_value > MAX_MODEL_VALUE {
            log::debug!("model_value {} exceeds the largest supported value {}",
                self.model_value, MAX_MODEL_VALUE);
            flags.insert(ErrorFlags::MODEL_VALUE);
        }

        if self.round > MAX_ICU_ROUND {
            log::debug!("lossy rounding parameter {} exceeds the largest supported value {}",
                self.round, MAX_ICU_ROUND);
            flags.insert(ErrorFlags::CMP_MODE);
        }

        if flags.is_empty() { Ok(()) } else { Err(Error::InvalidConfig(flags)) }
    }

    fn validate_buffers(&self) -> UnitResult {
        let mut flags = ErrorFlags::empty();

        let data_size = self.data_type.data_size(self.samples);
        match data_size {
            None => flags.insert(ErrorFlags::SMALL_BUFFER),
            Some(bytes) => {
                if self.input.len() != bytes as usize && self.samples != 0 {
                    log::debug!("input buffer holds {} bytes but {} records of {:?} need {}",
                        self.input.len(), self.samples, self.data_type, bytes);
                    flags.insert(ErrorFlags::SMALL_BUFFER);
                }

                if let Some(model) = self.model.model_bytes() {
                    if model.len() != bytes as usize && self.samples != 0 {
                        log::debug!("model buffer length does not match the input layout");
                        flags.insert(ErrorFlags::SMALL_BUFFER);
                    }
                }

                if let Some(updated_len) = self.model.updated_len() {
                    if updated_len != bytes as usize && self.samples != 0 {
                        log::debug!("updated-model buffer length does not match the input layout");
                        flags.insert(ErrorFlags::SMALL_BUFFER);
                    }
                }
            }
        }

        if self.cmp_mode.is_model() && self.model.model_bytes().is_none() {
            log::debug!("model compression mode selected without a model buffer");
            flags.insert(ErrorFlags::CMP_MODE);
        }

        match self.data_type.data_size(self.buffer_length) {
            None => flags.insert(ErrorFlags::SMALL_BUFFER),
            Some(capacity) => {
                if capacity > crate::entity::CMP_ENTITY_MAX_SIZE
                    || capacity + crate::entity::max_header_size() > crate::entity::CMP_ENTITY_MAX_SIZE
                {
                    log::debug!("compressed buffer of {} bytes cannot fit in a compression entity", capacity);
                    flags.insert(ErrorFlags::SMALL_BUFFER);
                }

                if let Some(output) = &self.output {
                    if self.buffer_length == 0 && self.samples != 0 {
                        log::debug!("output buffer attached but buffer_length is zero");
                        flags.insert(ErrorFlags::SMALL_BUFFER);
                    }

                    if output.len() < capacity as usize {
                        log::debug!("output buffer holds {} bytes, buffer_length asks for {}",
                            output.len(), capacity);
                        flags.insert(ErrorFlags::SMALL_BUFFER);
                    }
                }
            }
        }

        if flags.is_empty() { Ok(()) } else { Err(Error::InvalidConfig(flags)) }
    }

    /// Parameter checks of the selected data type.
    /// Raw mode encodes nothing, so no pair rules apply.
    fn validate_type_pars(&self) -> UnitResult {
        if self.cmp_mode.is_raw() { return Ok(()); }

        if self.data_type.is_imagette() { self.validate_imagette_pars() }
        else if self.data_type.is_fx_cob() { self.validate_fx_cob_pars() }
        else if self.data_type.is_aux() { self.validate_aux_pars() }
        else { Ok(()) } // unsupported types are already rejected by the general check
    }

    fn validate_imagette_pars(&self) -> UnitResult {
        let mut flags = ErrorFlags::empty();

        if golomb_spill_pair_is_invalid(
            self.golomb_par, self.spill,
            MIN_IMA_GOLOMB_PAR, MAX_IMA_GOLOMB_PAR, MAX_CW_BITS_ICU,
            "imagette",
        ) { flags.insert(ErrorFlags::CMP_PAR); }

        // the alternative pairs feed the hardware size estimator,
        // so they must satisfy the 16-bit code-word limit
        if self.data_type.is_adaptive_imagette() {
            if golomb_spill_pair_is_invalid(
                self.ap1_golomb_par, self.ap1_spill,
                MIN_IMA_GOLOMB_PAR, MAX_IMA_GOLOMB_PAR, MAX_CW_BITS_RDCU,
                "adaptive 1 imagette",
            ) { flags.insert(ErrorFlags::AP1_CMP_PAR); }

            if golomb_spill_pair_is_invalid(
                self.ap2_golomb_par, self.ap2_spill,
                MIN_IMA_GOLOMB_PAR, MAX_IMA_GOLOMB_PAR, MAX_CW_BITS_RDCU,
                "adaptive 2 imagette",
            ) { flags.insert(ErrorFlags::AP2_CMP_PAR); }
        }

        if flags.is_empty() { Ok(()) } else { Err(Error::InvalidConfig(flags)) }
    }

    fn validate_fx_cob_pars(&self) -> UnitResult {
        let needed = FxCobFields::of(self.data_type);
        let mut invalid = false;

        if needed.exp_flags {
            invalid |= non_ima_pair_is_invalid(self.cmp_par_exp_flags, self.spill_exp_flags, "exposure flags");
        }
        if needed.fx {
            invalid |= non_ima_pair_is_invalid(self.cmp_par_fx, self.spill_fx, "flux");
        }
        if needed.ncob {
            invalid |= non_ima_pair_is_invalid(self.cmp_par_ncob, self.spill_ncob, "centre of brightness");
        }
        if needed.efx {
            invalid |= non_ima_pair_is_invalid(self.cmp_par_efx, self.spill_efx, "extended flux");
        }
        if needed.ecob {
            invalid |= non_ima_pair_is_invalid(self.cmp_par_ecob, self.spill_ecob, "extended centre of brightness");
        }
        if needed.fx_cob_variance {
            invalid |= non_ima_pair_is_invalid(self.cmp_par_fx_cob_variance, self.spill_fx_cob_variance, "flux/COB variance");
        }

        if invalid { Err(Error::config(ErrorFlags::CMP_PAR)) } else { Ok(()) }
    }

    fn validate_aux_pars(&self) -> UnitResult {
        let mut invalid =
            non_ima_pair_is_invalid(self.cmp_par_mean, self.spill_mean, "mean")
            | non_ima_pair_is_invalid(self.cmp_par_variance, self.spill_variance, "variance");

        if self.data_type != DataType::Offset {
            invalid |= non_ima_pair_is_invalid(
                self.cmp_par_pixels_error, self.spill_pixels_error, "outlier pixels");
        }

        if invalid { Err(Error::config(ErrorFlags::CMP_PAR)) } else { Ok(()) }
    }
}


/// Which per-field parameter pairs a flux/COB data type needs.
pub(crate) struct FxCobFields {
    pub exp_flags: bool,
    pub fx: bool,
    pub ncob: bool,
    pub efx: bool,
    pub ecob: bool,
    pub fx_cob_variance: bool,
}

impl FxCobFields {
    pub fn of(data_type: DataType) -> Self {
        use DataType::*;

        let fx = true;
        let exp_flags = matches!(data_type,
            SFx | SFxEfx | SFxNcob | SFxEfxNcobEcob | LFx | LFxEfx | LFxNcob | LFxEfxNcobEcob);
        let ncob = matches!(data_type,
            SFxNcob | SFxEfxNcobEcob | LFxNcob | LFxEfxNcobEcob | FFxNcob | FFxEfxNcobEcob);
        let efx = matches!(data_type,
            SFxEfx | SFxEfxNcobEcob | LFxEfx | LFxEfxNcobEcob | FFxEfx | FFxEfxNcobEcob);
        let ecob = matches!(data_type, SFxEfxNcobEcob | LFxEfxNcobEcob | FFxEfxNcobEcob);
        let fx_cob_variance = matches!(data_type, LFx | LFxEfx | LFxNcob | LFxEfxNcobEcob);

        FxCobFields { exp_flags, fx, ncob, efx, ecob, fx_cob_variance }
    }
}


fn golomb_spill_pair_is_invalid(
    golomb_par: u32, spill: u32,
    min_par: u32, max_par: u32, max_cw_bits: u32,
    name: &str,
) -> bool {
    let mut invalid = false;

    if golomb_par < min_par || golomb_par > max_par {
        log::debug!("{} compression parameter {} outside [{}, {}]",
            name, golomb_par, min_par, max_par);
        invalid = true;
    }

    if spill < MIN_IMA_SPILL || spill > max_spill(golomb_par, max_cw_bits) {
        log::debug!("{} spillover threshold {} outside [{}, {}]",
            name, spill, MIN_IMA_SPILL, max_spill(golomb_par, max_cw_bits));
        invalid = true;
    }

    invalid
}

fn non_ima_pair_is_invalid(cmp_par: u32, spill: u32, name: &str) -> bool {
    let mut invalid = false;

    if cmp_par < MIN_NON_IMA_GOLOMB_PAR || cmp_par > MAX_NON_IMA_GOLOMB_PAR {
        log::debug!("{} compression parameter {} outside [{}, {}]",
            name, cmp_par, MIN_NON_IMA_GOLOMB_PAR, MAX_NON_IMA_GOLOMB_PAR);
        invalid = true;
    }

    if spill < MIN_NON_IMA_SPILL || spill > icu_max_spill(cmp_par) {
        log::debug!("{} spillover threshold {} outside [{}, {}]",
            name, spill, MIN_NON_IMA_SPILL, icu_max_spill(cmp_par));
        invalid = true;
    }

    invalid
}
