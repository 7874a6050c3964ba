
//! Error type of this crate, and the compressor error register.

use bit_field::BitField;


/// Specialized result type for all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A `Result` that carries no value on success.
pub type UnitResult = Result<()>;


/// An error that occurred while validating a configuration,
/// encoding a bit-stream, or accessing a compression entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {

    /// One or more configuration rules failed.
    /// The contained flags mirror the compressor error register,
    /// so recorded headers stay comparable across software and hardware runs.
    InvalidConfig(ErrorFlags),

    /// The compressed data buffer is too small to hold the whole bit-stream.
    /// Retry with a larger `buffer_length`; the output written so far is invalid.
    SmallBuffer,

    /// A data or model value requires more bits
    /// than the maximum-used-bits table allows for its field.
    HighValue,

    /// A compression entity field was rejected by a width or consistency rule.
    BadEntity(&'static str),
}

impl Error {

    /// A configuration error with the given register flags set.
    pub(crate) fn config(flags: ErrorFlags) -> Self {
        Error::InvalidConfig(flags)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidConfig(flags) => write!(formatter, "invalid configuration ({})", flags),
            Error::SmallBuffer => write!(formatter, "compressed data buffer is too small"),
            Error::HighValue => write!(formatter, "value wider than the maximum-used-bits table allows"),
            Error::BadEntity(message) => write!(formatter, "compression entity rejected: {}", message),
        }
    }
}

impl std::error::Error for Error {}

/// Enable using the `?` operator on buffer reads and writes.
/// Buffer bounds are validated up front, so a failed read always means
/// the data ended early.
impl From<std::io::Error> for Error {
    fn from(_: std::io::Error) -> Self {
        Error::BadEntity("unexpected end of data")
    }
}


/// The error bits of the compressor error register.
/// Bits 6 to 9 are produced by the hardware compressor only
/// and are never set by this library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorFlags(u16);

impl ErrorFlags {

    /// The length of the compressed data buffer is too small.
    pub const SMALL_BUFFER: ErrorFlags = ErrorFlags(1 << 0);

    /// The compression mode or a mode-level parameter is not set correctly.
    pub const CMP_MODE: ErrorFlags = ErrorFlags(1 << 1);

    /// The model weighting value is not set correctly.
    pub const MODEL_VALUE: ErrorFlags = ErrorFlags(1 << 2);

    /// A spillover/compression parameter combination is not set correctly.
    pub const CMP_PAR: ErrorFlags = ErrorFlags(1 << 3);

    /// The first adaptive spillover/compression parameter pair is not set correctly.
    pub const AP1_CMP_PAR: ErrorFlags = ErrorFlags(1 << 4);

    /// The second adaptive spillover/compression parameter pair is not set correctly.
    pub const AP2_CMP_PAR: ErrorFlags = ErrorFlags(1 << 5);

    /// Multi-bit memory error (hardware compression only).
    pub const MULTI_BIT: ErrorFlags = ErrorFlags(1 << 6);

    /// Bus master received a "slave busy" status (hardware compression only).
    pub const SLAVE_BUSY: ErrorFlags = ErrorFlags(1 << 7);

    /// Bus master received a "slave blocked" status (hardware compression only).
    pub const SLAVE_BLOCKED: ErrorFlags = ErrorFlags(1 << 8);

    /// Bus master received an "invalid address" status (hardware compression only).
    pub const INVALID_ADDRESS: ErrorFlags = ErrorFlags(1 << 9);

    /// No error bit set.
    pub fn empty() -> Self { ErrorFlags(0) }

    /// The raw register word.
    pub fn bits(self) -> u16 { self.0 }

    /// Reconstruct from a raw register word. Unused high bits are discarded.
    pub fn from_bits(bits: u16) -> Self { ErrorFlags(bits & 0x03ff) }

    /// True if no rule failed.
    pub fn is_empty(self) -> bool { self.0 == 0 }

    /// True if all bits of `other` are set in `self`.
    pub fn contains(self, other: ErrorFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set all bits of `other`.
    pub fn insert(&mut self, other: ErrorFlags) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for ErrorFlags {
    type Output = ErrorFlags;
    fn bitor(self, other: ErrorFlags) -> ErrorFlags { ErrorFlags(self.0 | other.0) }
}

impl std::fmt::Display for ErrorFlags {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const NAMES: [&str; 10] = [
            "small-buffer", "cmp-mode", "model-value", "cmp-par",
            "ap1-cmp-par", "ap2-cmp-par", "multi-bit", "slave-busy",
            "slave-blocked", "invalid-address",
        ];

        let mut first = true;
        for (index, name) in NAMES.iter().enumerate() {
            if self.0.get_bit(index) {
                if !first { write!(formatter, "|")?; }
                write!(formatter, "{}", name)?;
                first = false;
            }
        }

        if first { write!(formatter, "none")?; }
        Ok(())
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flag_register_layout(){
        assert_eq!(ErrorFlags::SMALL_BUFFER.bits(), 0x0001);
        assert_eq!(ErrorFlags::AP2_CMP_PAR.bits(), 0x0020);
        assert_eq!(ErrorFlags::INVALID_ADDRESS.bits(), 0x0200);

        let flags = ErrorFlags::CMP_MODE | ErrorFlags::CMP_PAR;
        assert!(flags.contains(ErrorFlags::CMP_MODE));
        assert!(!flags.contains(ErrorFlags::MODEL_VALUE));
        assert_eq!(flags.bits(), 0x000a);
        assert_eq!(ErrorFlags::from_bits(flags.bits()), flags);
    }

    #[test]
    fn flag_names(){
        let flags = ErrorFlags::SMALL_BUFFER | ErrorFlags::MODEL_VALUE;
        assert_eq!(format!("{}", flags), "small-buffer|model-value");
        assert_eq!(format!("{}", ErrorFlags::empty()), "none");
    }
}
