
//! Compress PLATO science data with a predictive Golomb/Rice entropy
//! coder and wrap the result in a self-describing compression entity.
//!
//! To compress, create a [`cfg::CmpCfg`] with the mode and general
//! parameters, attach the data buffers, set the type-specific parameter
//! pairs, and run [`compress::compress`]. Wrap the result with
//! [`entity::CmpEntity::build`]. An entity decompresses back through
//! [`decompress::decompress`], guided only by its header (plus the
//! model buffer in model mode).
//!
//! The core is synchronous and single-threaded; it reads an input
//! buffer and fills an output buffer, nothing else.

#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused_extern_crates,
    unused,

    missing_copy_implementations,
    missing_debug_implementations,

    clippy::all,
)]

#![forbid(unsafe_code)]

pub mod error;
pub mod math;
pub mod data;
pub mod cfg;
pub mod compress;
pub mod entity;
pub mod decompress;


/// Re-exports of all types commonly required for
/// simple compression and decompression.
pub mod prelude {

    // main exports
    pub use crate::compress::{compress, adaptive_size_estimates};
    pub use crate::decompress::decompress;
    pub use crate::entity::CmpEntity;

    // configuration types
    pub use crate::cfg::{CmpCfg, CmpMode, ModelBuffers, CMP_PAR_UNUSED};
    pub use crate::data::max_used_bits::{MaxUsedBits, MAX_USED_BITS_SAFE, MAX_USED_BITS_V1};
    pub use crate::data::DataType;

    pub use crate::error::{Error, ErrorFlags, Result, UnitResult};
}
