//! Matrix element type constraints
//!
//! This module defines the trait that constrains what types can be stored in
//! a point-data matrix and ties each one to its [`ElementType`] identifier.

use half::bf16;

use crate::format::ElementType;
use crate::numeric::NumericLimits;

/// Trait for types that can be stored as matrix elements
///
/// Implemented for exactly the eleven supported numeric types, so
/// `T::element_type()` is a total compile-time mapping. Elements are plain
/// old data so buffers can be reinterpreted as bytes for persistence.
pub trait MatrixElement:
    NumericLimits
    + Copy
    + PartialEq
    + PartialOrd
    + Default
    + core::fmt::Debug
    + Send
    + Sync
    + bytemuck::Pod
    + 'static
{
    /// Identifier of this element type
    fn element_type() -> ElementType;

    /// Get the size in bytes of this element type
    fn size_bytes() -> usize {
        core::mem::size_of::<Self>()
    }

    /// Convert from f64 (`as` semantics, saturating for integers)
    fn from_f64(value: f64) -> Self;

    /// Convert to f64 for generic operations
    fn to_f64(self) -> f64;

    /// Convert from i128 (`as` semantics, wrapping for integers)
    fn from_i128(value: i128) -> Self;

    /// Convert to i128; exact for integers, truncating for floats
    fn to_i128(self) -> i128;

    /// Whether this value equals the implicit sparse value
    #[inline]
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

macro_rules! impl_primitive_element {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl MatrixElement for $t {
                fn element_type() -> ElementType {
                    ElementType::$variant
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $t
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_i128(value: i128) -> Self {
                    value as $t
                }

                #[inline]
                fn to_i128(self) -> i128 {
                    self as i128
                }
            }
        )*
    };
}

impl_primitive_element!(
    f32 => Float32,
    f64 => Float64,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
);

impl MatrixElement for bf16 {
    fn element_type() -> ElementType {
        ElementType::Bfloat16
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        bf16::from_f64(value)
    }

    #[inline]
    fn to_f64(self) -> f64 {
        bf16::to_f64(self)
    }

    #[inline]
    fn from_i128(value: i128) -> Self {
        bf16::from_f64(value as f64)
    }

    #[inline]
    fn to_i128(self) -> i128 {
        bf16::to_f64(self) as i128
    }
}
