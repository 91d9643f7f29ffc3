#![no_std]

//! Point-data core - element types, numeric limits and storage configuration
//!
//! This crate defines what a point-data matrix may store and how storage
//! choices are named, without owning any matrix buffers. Storage
//! implementations live in the `pointdata` crate.

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod error;
pub mod format;
pub mod numeric;
pub mod traits;
pub mod validation;

pub use error::*;
pub use format::*;
pub use numeric::{
    check_range, in_range, is_lossless_cast, safe_numeric_cast, type_name,
    unchecked_numeric_cast, CastProof, NumericLimits,
};
pub use traits::*;
pub use validation::*;

/// 16-bit brain floating point element type
pub use half::bf16;
