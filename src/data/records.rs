
//! Packed record layouts of the non-imagette data products.
//!
//! Records are stored big-endian on the wire; the same layout is used
//! for the input, model and updated-model buffers. Fields are addressed
//! by index so the compression loop stays generic over the record type.

use std::io::{Read, Write};

use lebe::prelude::*;

use crate::error::{Result, UnitResult};


/// A fixed-layout science data record.
pub(crate) trait Record: Copy + Clone + Default {

    /// Packed size of one record in bytes.
    const BYTE_SIZE: usize;

    /// Number of encoded fields per record.
    const FIELD_COUNT: usize;

    /// Parse one record from big-endian bytes.
    fn read(read: &mut impl Read) -> Result<Self>;

    /// Append this record as big-endian bytes.
    fn write(&self, write: &mut impl Write) -> UnitResult;

    /// The value of the field at `index`, widened to `u32`.
    fn field(&self, index: usize) -> u32;

    /// Overwrite the field at `index`, truncating to the field width.
    fn set_field(&mut self, index: usize, value: u32);
}


macro_rules! define_record {
    (
        $(#[$attribute:meta])*
        $name:ident { $($field:ident : $kind:ident),+ $(,)? }
    ) => {
        $(#[$attribute])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name {
            $( pub $field: $kind, )+
        }

        impl Record for $name {
            const BYTE_SIZE: usize = 0 $( + std::mem::size_of::<$kind>() )+;
            const FIELD_COUNT: usize = [ $( stringify!($field) ),+ ].len();

            fn read(read: &mut impl Read) -> Result<Self> {
                Ok($name { $( $field: $kind::read_from_big_endian(read)?, )+ })
            }

            fn write(&self, write: &mut impl Write) -> UnitResult {
                $( write.write_as_big_endian(&self.$field)?; )+
                Ok(())
            }

            fn field(&self, index: usize) -> u32 {
                [ $( self.$field as u32 ),+ ][index]
            }

            fn set_field(&mut self, index: usize, value: u32) {
                let mut current = 0;
                $(
                    if index == current { self.$field = value as $kind; return; }
                    current += 1;
                )+

                let _ = current;
                panic!("record has no field index {}", index);
            }
        }
    };
}


define_record! {
    /// Short-cadence normal flux.
    SFx { exp_flags: u8, fx: u32 }
}

define_record! {
    /// Short-cadence normal and extended flux.
    SFxEfx { exp_flags: u8, fx: u32, efx: u32 }
}

define_record! {
    /// Short-cadence flux with normal centre of brightness.
    SFxNcob { exp_flags: u8, fx: u32, ncob_x: u32, ncob_y: u32 }
}

define_record! {
    /// Short-cadence flux, full form.
    SFxEfxNcobEcob {
        exp_flags: u8, fx: u32, ncob_x: u32, ncob_y: u32,
        efx: u32, ecob_x: u32, ecob_y: u32,
    }
}

define_record! {
    /// Fast-cadence flux. No exposure flags on the fast cadence.
    FFx { fx: u32 }
}

define_record! {
    /// Fast-cadence normal and extended flux.
    FFxEfx { fx: u32, efx: u32 }
}

define_record! {
    /// Fast-cadence flux with centre of brightness.
    FFxNcob { fx: u32, ncob_x: u32, ncob_y: u32 }
}

define_record! {
    /// Fast-cadence flux, full form.
    FFxEfxNcobEcob {
        fx: u32, ncob_x: u32, ncob_y: u32,
        efx: u32, ecob_x: u32, ecob_y: u32,
    }
}

define_record! {
    /// Long-cadence flux with variance. Exposure flags are 32 bits wide
    /// on the long cadence.
    LFx { exp_flags: u32, fx: u32, fx_variance: u32 }
}

define_record! {
    /// Long-cadence flux, extended flux and variance.
    LFxEfx { exp_flags: u32, fx: u32, efx: u32, fx_variance: u32 }
}

define_record! {
    /// Long-cadence flux with centre of brightness and variances.
    LFxNcob {
        exp_flags: u32, fx: u32, ncob_x: u32, ncob_y: u32,
        fx_variance: u32, cob_x_variance: u32, cob_y_variance: u32,
    }
}

define_record! {
    /// Long-cadence flux, full form.
    LFxEfxNcobEcob {
        exp_flags: u32, fx: u32, ncob_x: u32, ncob_y: u32,
        efx: u32, ecob_x: u32, ecob_y: u32,
        fx_variance: u32, cob_x_variance: u32, cob_y_variance: u32,
    }
}

define_record! {
    /// Auxiliary offset data.
    Offset { mean: u32, variance: u32 }
}

define_record! {
    /// Auxiliary background data.
    Background { mean: u32, variance: u32, outlier_pixels: u32 }
}

define_record! {
    /// Auxiliary smearing data.
    Smearing { mean: u32, variance_mean: u32, outlier_pixels: u32 }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::data::DataType;

    #[test]
    fn packed_sizes_match_data_types(){
        assert_eq!(SFx::BYTE_SIZE as u32, DataType::SFx.sample_size());
        assert_eq!(SFxEfx::BYTE_SIZE as u32, DataType::SFxEfx.sample_size());
        assert_eq!(SFxNcob::BYTE_SIZE as u32, DataType::SFxNcob.sample_size());
        assert_eq!(SFxEfxNcobEcob::BYTE_SIZE as u32, DataType::SFxEfxNcobEcob.sample_size());
        assert_eq!(FFx::BYTE_SIZE as u32, DataType::FFx.sample_size());
        assert_eq!(FFxEfx::BYTE_SIZE as u32, DataType::FFxEfx.sample_size());
        assert_eq!(FFxNcob::BYTE_SIZE as u32, DataType::FFxNcob.sample_size());
        assert_eq!(FFxEfxNcobEcob::BYTE_SIZE as u32, DataType::FFxEfxNcobEcob.sample_size());
        assert_eq!(LFx::BYTE_SIZE as u32, DataType::LFx.sample_size());
        assert_eq!(LFxEfx::BYTE_SIZE as u32, DataType::LFxEfx.sample_size());
        assert_eq!(LFxNcob::BYTE_SIZE as u32, DataType::LFxNcob.sample_size());
        assert_eq!(LFxEfxNcobEcob::BYTE_SIZE as u32, DataType::LFxEfxNcobEcob.sample_size());
        assert_eq!(Offset::BYTE_SIZE as u32, DataType::Offset.sample_size());
        assert_eq!(Background::BYTE_SIZE as u32, DataType::Background.sample_size());
        assert_eq!(Smearing::BYTE_SIZE as u32, DataType::Smearing.sample_size());
    }

    #[test]
    fn big_endian_round_trip(){
        let record = SFxNcob { exp_flags: 0xa5, fx: 0x0102_0304, ncob_x: 7, ncob_y: 0xffff_ffff };

        let mut bytes = Vec::new();
        record.write(&mut bytes).expect("write to vec");
        assert_eq!(bytes, [0xa5, 0x01, 0x02, 0x03, 0x04, 0, 0, 0, 7, 0xff, 0xff, 0xff, 0xff]);

        let read_back = SFxNcob::read(&mut bytes.as_slice()).expect("read back");
        assert_eq!(read_back, record);
    }

    #[test]
    fn indexed_field_access(){
        let mut record = Smearing::default();
        record.set_field(0, 100);
        record.set_field(1, 200);
        record.set_field(2, 300);

        assert_eq!(record.field(0), 100);
        assert_eq!(record.field(1), 200);
        assert_eq!(record.field(2), 300);
        assert_eq!(record, Smearing { mean: 100, variance_mean: 200, outlier_pixels: 300 });

        let mut short = SFx::default();
        short.set_field(0, 0x1ff); // truncated to the u8 field
        assert_eq!(short.field(0), 0xff);
    }

    #[test]
    fn truncated_input_is_rejected(){
        let bytes = [0u8; 4]; // one byte short of an s_fx record
        assert!(SFx::read(&mut bytes.as_slice()).is_err());
    }
}
