
//! The closed set of science data product types and their record layouts.

pub mod records;
pub mod max_used_bits;

use crate::error::{Error, Result};


/// Number of bytes of the multi-entry packet header that precedes the
/// records of every non-imagette data product. It is passed through
/// uncompressed and never interpreted.
pub const MULTI_ENTRY_HDR_SIZE: u32 = 12;


/// A compression data product type. The discriminant is the
/// on-wire type id stored in the entity header (raw flag excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum DataType {
    /// Normal-camera imagette, one `u16` pixel sample per record.
    Imagette = 1,

    /// Imagette with two alternative parameter pairs for size estimation.
    ImagetteAdaptive = 2,

    /// Saturated-star imagette.
    SatImagette = 3,

    /// Saturated-star imagette, adaptive variant.
    SatImagetteAdaptive = 4,

    /// Auxiliary offset data (mean, variance).
    Offset = 5,

    /// Auxiliary background data (mean, variance, outlier pixel count).
    Background = 6,

    /// Auxiliary smearing data (mean, variance of the mean, outlier pixel count).
    Smearing = 7,

    /// Short-cadence normal flux.
    SFx = 8,

    /// Short-cadence normal and extended flux.
    SFxEfx = 9,

    /// Short-cadence flux with normal centre of brightness.
    SFxNcob = 10,

    /// Short-cadence flux, full form.
    SFxEfxNcobEcob = 11,

    /// Long-cadence flux with variance.
    LFx = 12,

    /// Long-cadence flux, extended flux and variance.
    LFxEfx = 13,

    /// Long-cadence flux with centre of brightness and variances.
    LFxNcob = 14,

    /// Long-cadence flux, full form.
    LFxEfxNcobEcob = 15,

    /// Fast-cadence flux.
    FFx = 16,

    /// Fast-cadence normal and extended flux.
    FFxEfx = 17,

    /// Fast-cadence flux with centre of brightness.
    FFxNcob = 18,

    /// Fast-cadence flux, full form.
    FFxEfxNcobEcob = 19,

    /// Fast-camera imagette.
    FCamImagette = 20,

    /// Fast-camera imagette, adaptive variant.
    FCamImagetteAdaptive = 21,

    /// Fast-camera offset data. Recognised in entity headers,
    /// not supported by the software compressor.
    FCamOffset = 22,

    /// Fast-camera background data. Recognised in entity headers,
    /// not supported by the software compressor.
    FCamBackground = 23,
}

impl DataType {

    /// The on-wire type id (bits 0 to 14 of the data-type word).
    #[inline]
    pub fn id(self) -> u16 { self as u16 }

    /// Look up a type by its on-wire id.
    pub fn from_id(id: u16) -> Result<Self> {
        use DataType::*;

        Ok(match id {
            1 => Imagette, 2 => ImagetteAdaptive,
            3 => SatImagette, 4 => SatImagetteAdaptive,
            5 => Offset, 6 => Background, 7 => Smearing,
            8 => SFx, 9 => SFxEfx, 10 => SFxNcob, 11 => SFxEfxNcobEcob,
            12 => LFx, 13 => LFxEfx, 14 => LFxNcob, 15 => LFxEfxNcobEcob,
            16 => FFx, 17 => FFxEfx, 18 => FFxNcob, 19 => FFxEfxNcobEcob,
            20 => FCamImagette, 21 => FCamImagetteAdaptive,
            22 => FCamOffset, 23 => FCamBackground,
            _ => return Err(Error::BadEntity("unknown data product type id")),
        })
    }

    /// True for all imagette flavours.
    pub fn is_imagette(self) -> bool {
        use DataType::*;
        matches!(self,
            Imagette | ImagetteAdaptive | SatImagette | SatImagetteAdaptive
            | FCamImagette | FCamImagetteAdaptive
        )
    }

    /// True for the imagette flavours that carry the two
    /// alternative parameter pairs.
    pub fn is_adaptive_imagette(self) -> bool {
        use DataType::*;
        matches!(self, ImagetteAdaptive | SatImagetteAdaptive | FCamImagetteAdaptive)
    }

    /// True for the flux and centre-of-brightness record families.
    pub fn is_fx_cob(self) -> bool {
        use DataType::*;
        matches!(self,
            SFx | SFxEfx | SFxNcob | SFxEfxNcobEcob
            | LFx | LFxEfx | LFxNcob | LFxEfxNcobEcob
            | FFx | FFxEfx | FFxNcob | FFxEfxNcobEcob
        )
    }

    /// True for the auxiliary science types (offset, background, smearing).
    pub fn is_aux(self) -> bool {
        use DataType::*;
        matches!(self, Offset | Background | Smearing)
    }

    /// True if the software compressor implements this type.
    pub fn is_compressible(self) -> bool {
        use DataType::*;
        !matches!(self, FCamOffset | FCamBackground)
    }

    /// Whether the data of this type starts with the multi-entry packet header.
    pub fn has_multi_entry_hdr(self) -> bool {
        !self.is_imagette()
    }

    /// Size of one record in bytes (packed wire layout).
    pub fn sample_size(self) -> u32 {
        use DataType::*;
        match self {
            Imagette | ImagetteAdaptive | SatImagette | SatImagetteAdaptive
            | FCamImagette | FCamImagetteAdaptive => 2,

            SFx => 5, SFxEfx => 9, SFxNcob => 13, SFxEfxNcobEcob => 25,
            FFx => 4, FFxEfx => 8, FFxNcob => 12, FFxEfxNcobEcob => 24,
            LFx => 12, LFxEfx => 16, LFxNcob => 28, LFxEfxNcobEcob => 40,

            Offset => 8, Background => 12, Smearing => 12,
            FCamOffset => 8, FCamBackground => 12,
        }
    }

    /// Number of bytes a data buffer of `samples` records occupies,
    /// including the multi-entry header for non-imagette types.
    /// `None` on arithmetic overflow.
    pub fn data_size(self, samples: u32) -> Option<u32> {
        let records = u64::from(samples) * u64::from(self.sample_size());
        let header = if self.has_multi_entry_hdr() { u64::from(MULTI_ENTRY_HDR_SIZE) } else { 0 };
        let total = records + header;

        if total > u64::from(u32::MAX) { None }
        else { Some(total as u32) }
    }

    /// Inverse of [`Self::data_size`]: the record count stored in
    /// `bytes` bytes, rejecting sizes that are no whole number of records.
    pub fn samples_from_size(self, bytes: u32) -> Result<u32> {
        let header = if self.has_multi_entry_hdr() { MULTI_ENTRY_HDR_SIZE } else { 0 };
        let record_bytes = bytes.checked_sub(header)
            .ok_or(Error::BadEntity("original size smaller than the multi-entry header"))?;

        if record_bytes % self.sample_size() != 0 {
            return Err(Error::BadEntity("original size is no whole number of records"));
        }

        Ok(record_bytes / self.sample_size())
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wire_ids_round_trip(){
        for id in 1..=23 {
            let data_type = DataType::from_id(id).expect("known id");
            assert_eq!(data_type.id(), id);
        }

        assert!(DataType::from_id(0).is_err());
        assert!(DataType::from_id(24).is_err());
        assert!(DataType::from_id(0x7fff).is_err());
    }

    #[test]
    fn sizes(){
        assert_eq!(DataType::Imagette.data_size(6), Some(12));
        assert_eq!(DataType::SFx.data_size(4), Some(4 * 5 + 12));
        assert_eq!(DataType::Smearing.data_size(0), Some(12));
        assert_eq!(DataType::LFxEfxNcobEcob.data_size(u32::MAX), None);

        assert_eq!(DataType::Imagette.samples_from_size(12), Ok(6));
        assert_eq!(DataType::SFx.samples_from_size(32), Ok(4));
        assert!(DataType::SFx.samples_from_size(33).is_err());
        assert!(DataType::SFx.samples_from_size(4).is_err());
    }

    #[test]
    fn classification(){
        assert!(DataType::SatImagetteAdaptive.is_imagette());
        assert!(DataType::SatImagetteAdaptive.is_adaptive_imagette());
        assert!(!DataType::FCamImagette.is_adaptive_imagette());
        assert!(DataType::LFxNcob.is_fx_cob());
        assert!(DataType::Smearing.is_aux());
        assert!(!DataType::FCamOffset.is_compressible());
        assert!(DataType::Offset.has_multi_entry_hdr());
        assert!(!DataType::FCamImagetteAdaptive.has_multi_entry_hdr());
    }
}
