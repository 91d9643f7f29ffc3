//! Numeric limits and range-checked conversions between element types
//!
//! Every element type carries a [`NumericLimits`] description, including the
//! 16-bit brain float which has no `core` counterpart. Conversions first try
//! a compile-time proof that the target range contains the source range and
//! fall back to checking the actual value.

use half::bf16;

use crate::{CoreError, MatrixElement, Result};

/// Range and representation description of a numeric element type
pub trait NumericLimits: Copy {
    /// Most negative finite value
    const LOWEST: Self;
    /// Largest finite value
    const MAX: Self;
    /// Smallest positive normal value (1 for integers)
    const MIN_POSITIVE: Self;
    /// Difference between 1 and the next representable value (0 for integers)
    const EPSILON: Self;
    const INFINITY: Option<Self>;
    const QUIET_NAN: Option<Self>;
    const IS_INTEGER: bool;
    const IS_SIGNED: bool;
    /// Storage width in bits
    const BITS: u32;
    /// Mantissa digits for floats, value bits for integers
    const DIGITS: u32;
    /// Ordering of float ranges: bf16 < f32 < f64. Zero for integers.
    const RANGE_RANK: u8;
}

macro_rules! impl_integer_limits {
    ($($t:ty),* $(,)?) => {
        $(
            impl NumericLimits for $t {
                const LOWEST: Self = <$t>::MIN;
                const MAX: Self = <$t>::MAX;
                const MIN_POSITIVE: Self = 1;
                const EPSILON: Self = 0;
                const INFINITY: Option<Self> = None;
                const QUIET_NAN: Option<Self> = None;
                const IS_INTEGER: bool = true;
                const IS_SIGNED: bool = <$t>::MIN != 0;
                const BITS: u32 = <$t>::BITS;
                const DIGITS: u32 = if <$t>::MIN != 0 { <$t>::BITS - 1 } else { <$t>::BITS };
                const RANGE_RANK: u8 = 0;
            }
        )*
    };
}

impl_integer_limits!(i8, i16, i32, i64, u8, u16, u32, u64);

impl NumericLimits for f32 {
    const LOWEST: Self = f32::MIN;
    const MAX: Self = f32::MAX;
    const MIN_POSITIVE: Self = f32::MIN_POSITIVE;
    const EPSILON: Self = f32::EPSILON;
    const INFINITY: Option<Self> = Some(f32::INFINITY);
    const QUIET_NAN: Option<Self> = Some(f32::NAN);
    const IS_INTEGER: bool = false;
    const IS_SIGNED: bool = true;
    const BITS: u32 = 32;
    const DIGITS: u32 = f32::MANTISSA_DIGITS;
    const RANGE_RANK: u8 = 1;
}

impl NumericLimits for f64 {
    const LOWEST: Self = f64::MIN;
    const MAX: Self = f64::MAX;
    const MIN_POSITIVE: Self = f64::MIN_POSITIVE;
    const EPSILON: Self = f64::EPSILON;
    const INFINITY: Option<Self> = Some(f64::INFINITY);
    const QUIET_NAN: Option<Self> = Some(f64::NAN);
    const IS_INTEGER: bool = false;
    const IS_SIGNED: bool = true;
    const BITS: u32 = 64;
    const DIGITS: u32 = f64::MANTISSA_DIGITS;
    const RANGE_RANK: u8 = 2;
}

// Encodings: lowest 0xff7f, max 0x7f7f, min positive 0x0080, epsilon 0x3c00,
// infinity 0x7f80, quiet NaN 0x7fc0.
impl NumericLimits for bf16 {
    const LOWEST: Self = bf16::from_bits(0xff7f);
    const MAX: Self = bf16::from_bits(0x7f7f);
    const MIN_POSITIVE: Self = bf16::from_bits(0x0080);
    const EPSILON: Self = bf16::from_bits(0x3c00);
    const INFINITY: Option<Self> = Some(bf16::from_bits(0x7f80));
    const QUIET_NAN: Option<Self> = Some(bf16::from_bits(0x7fc0));
    const IS_INTEGER: bool = false;
    const IS_SIGNED: bool = true;
    const BITS: u32 = 16;
    const DIGITS: u32 = 8;
    const RANGE_RANK: u8 = 0;
}

/// Stable identifier of an element type
pub fn type_name<T: MatrixElement>() -> &'static str {
    T::element_type().name()
}

/// Whether every value of `U` is inside the range of `T`
///
/// Float targets contain every integer range and every float range of equal
/// or lower rank. Integer targets never contain a float range.
pub const fn is_lossless_cast<T: NumericLimits, U: NumericLimits>() -> bool {
    if !T::IS_INTEGER {
        U::IS_INTEGER || T::RANGE_RANK >= U::RANGE_RANK
    } else if !U::IS_INTEGER {
        false
    } else if T::IS_SIGNED == U::IS_SIGNED {
        T::BITS >= U::BITS
    } else if T::IS_SIGNED {
        T::BITS > U::BITS
    } else {
        false
    }
}

/// Compile-time cast proof for a (target, source) pair
pub struct CastProof<T, U>(core::marker::PhantomData<(T, U)>);

impl<T: NumericLimits, U: NumericLimits> CastProof<T, U> {
    pub const LOSSLESS: bool = is_lossless_cast::<T, U>();
}

/// Convert without any range check
///
/// Integer sources wrap like `as`; float sources saturate into integer
/// targets and round into narrower float targets.
#[inline]
pub fn unchecked_numeric_cast<T: MatrixElement, U: MatrixElement>(value: U) -> T {
    if U::IS_INTEGER {
        T::from_i128(value.to_i128())
    } else {
        T::from_f64(value.to_f64())
    }
}

/// Check that `value` lies inside the finite range of `T`
///
/// Non-finite floats pass when `T` is a float. Fractional floats are
/// compared after truncation toward zero when `T` is an integer.
pub fn check_range<T: MatrixElement, U: MatrixElement>(value: U) -> Result<()> {
    let fits = if U::IS_INTEGER {
        let v = value.to_i128();
        if T::IS_INTEGER {
            v >= T::LOWEST.to_i128() && v <= T::MAX.to_i128()
        } else {
            let v = v as f64;
            v >= T::LOWEST.to_f64() && v <= T::MAX.to_f64()
        }
    } else {
        let v = value.to_f64();
        if T::IS_INTEGER {
            // `as i128` saturates, far outside every integer element range
            v.is_finite() && {
                let t = v.trunc() as i128;
                t >= T::LOWEST.to_i128() && t <= T::MAX.to_i128()
            }
        } else {
            !v.is_finite() || (v >= T::LOWEST.to_f64() && v <= T::MAX.to_f64())
        }
    };

    if fits {
        Ok(())
    } else {
        Err(CoreError::OutOfRange)
    }
}

/// Convert `value` to `T`, failing when it does not fit
///
/// When the target range provably contains the source range the cast is
/// unconditional. Otherwise the actual value is checked, in every build.
#[inline]
pub fn safe_numeric_cast<T: MatrixElement, U: MatrixElement>(value: U) -> Result<T> {
    if !CastProof::<T, U>::LOSSLESS {
        check_range::<T, U>(value)?;
    }
    Ok(unchecked_numeric_cast(value))
}

/// Whether the closed interval `[min, max]` of `U` values fits in `T`
pub fn in_range<T: MatrixElement, U: MatrixElement>(min: U, max: U) -> bool {
    CastProof::<T, U>::LOSSLESS
        || (check_range::<T, U>(min).is_ok() && check_range::<T, U>(max).is_ok())
}
