
//! The versioned table of maximum used bits per data product field.
//!
//! The table bounds the width of every encoded field: it sizes the
//! escape-symbol payloads and rejects oversized input up front. The
//! version byte travels in the entity header so a decoder can resolve
//! the same table.

use crate::error::{Error, ErrorFlags, Result, UnitResult};


/// Maximum number of bits needed to represent the highest possible
/// value of each data product field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxUsedBits {
    /// Identifies this table in the entity header.
    pub version: u8,

    pub nc_imagette: u32,
    pub sat_imagette: u32,
    pub fc_imagette: u32,

    pub s_exp_flags: u32,
    pub s_fx: u32,
    pub s_efx: u32,
    pub s_ncob: u32,
    pub s_ecob: u32,

    pub f_fx: u32,
    pub f_efx: u32,
    pub f_ncob: u32,
    pub f_ecob: u32,

    pub l_exp_flags: u32,
    pub l_fx: u32,
    pub l_fx_variance: u32,
    pub l_efx: u32,
    pub l_ncob: u32,
    pub l_ecob: u32,
    pub l_cob_variance: u32,

    pub nc_offset_mean: u32,
    pub nc_offset_variance: u32,
    pub nc_background_mean: u32,
    pub nc_background_variance: u32,
    pub nc_background_outlier_pixels: u32,

    pub smearing_mean: u32,
    pub smearing_variance_mean: u32,
    pub smearing_outlier_pixels: u32,
}


/// The safe table: every field may use the full width of its
/// record slot. Compressing with it never raises a high-value error.
pub const MAX_USED_BITS_SAFE: MaxUsedBits = MaxUsedBits {
    version: 0,

    nc_imagette: 16,
    sat_imagette: 16,
    fc_imagette: 16,

    s_exp_flags: 8,
    s_fx: 32,
    s_efx: 32,
    s_ncob: 32,
    s_ecob: 32,

    f_fx: 32,
    f_efx: 32,
    f_ncob: 32,
    f_ecob: 32,

    l_exp_flags: 32,
    l_fx: 32,
    l_fx_variance: 32,
    l_efx: 32,
    l_ncob: 32,
    l_ecob: 32,
    l_cob_variance: 32,

    nc_offset_mean: 32,
    nc_offset_variance: 32,
    nc_background_mean: 32,
    nc_background_variance: 32,
    nc_background_outlier_pixels: 32,

    smearing_mean: 32,
    smearing_variance_mean: 32,
    smearing_outlier_pixels: 32,
};


/// The flight-tuned table: widths reduced to what the instrument
/// pipeline actually produces, buying shorter escape payloads.
pub const MAX_USED_BITS_V1: MaxUsedBits = MaxUsedBits {
    version: 1,

    nc_imagette: 16,
    sat_imagette: 16,
    fc_imagette: 16,

    s_exp_flags: 2,
    s_fx: 21,
    s_efx: 24,
    s_ncob: 20,
    s_ecob: 32,

    f_fx: 24,
    f_efx: 32,
    f_ncob: 24,
    f_ecob: 32,

    l_exp_flags: 24,
    l_fx: 21,
    l_fx_variance: 32,
    l_efx: 24,
    l_ncob: 20,
    l_ecob: 32,
    l_cob_variance: 25,

    nc_offset_mean: 32,
    nc_offset_variance: 32,
    nc_background_mean: 32,
    nc_background_variance: 32,
    nc_background_outlier_pixels: 16,

    smearing_mean: 32,
    smearing_variance_mean: 16,
    smearing_outlier_pixels: 16,
};


impl MaxUsedBits {

    /// Resolve the table registered under a version byte,
    /// as found in an entity header.
    pub fn from_version(version: u8) -> Result<&'static MaxUsedBits> {
        match version {
            0 => Ok(&MAX_USED_BITS_SAFE),
            1 => Ok(&MAX_USED_BITS_V1),
            _ => Err(Error::BadEntity("unknown max-used-bits table version")),
        }
    }

    /// Check that no entry exceeds 32 bits or is zero.
    pub fn validate(&self) -> UnitResult {
        let all = [
            self.nc_imagette, self.sat_imagette, self.fc_imagette,
            self.s_exp_flags, self.s_fx, self.s_efx, self.s_ncob, self.s_ecob,
            self.f_fx, self.f_efx, self.f_ncob, self.f_ecob,
            self.l_exp_flags, self.l_fx, self.l_fx_variance, self.l_efx,
            self.l_ncob, self.l_ecob, self.l_cob_variance,
            self.nc_offset_mean, self.nc_offset_variance,
            self.nc_background_mean, self.nc_background_variance,
            self.nc_background_outlier_pixels,
            self.smearing_mean, self.smearing_variance_mean,
            self.smearing_outlier_pixels,
        ];

        if all.iter().any(|&bits| bits == 0 || bits > 32) {
            log::debug!("a max-used-bits entry is zero or wider than 32 bits");
            return Err(Error::config(ErrorFlags::CMP_PAR));
        }

        Ok(())
    }
}
