//! Shape and buffer bounds validation
//!
//! Pure arithmetic checks on matrix shapes and buffer lengths, with
//! overflow protection. No buffers are touched.

use crate::CoreError;

/// Number of cells in a `rows x cols` matrix
pub const fn cell_count(rows: usize, cols: usize) -> Result<usize, CoreError> {
    match rows.checked_mul(cols) {
        Some(count) => Ok(count),
        None => Err(CoreError::LengthMismatch),
    }
}

/// Validate that a dense buffer holds exactly `rows * cols` values
pub const fn validate_dense_len(rows: usize, cols: usize, len: usize) -> Result<(), CoreError> {
    match cell_count(rows, cols) {
        Ok(count) if count == len => Ok(()),
        _ => Err(CoreError::LengthMismatch),
    }
}

/// Row count of a row-major buffer with `cols` columns
///
/// A zero column count is only valid for an empty buffer.
pub const fn rows_from_len(len: usize, cols: usize) -> Result<usize, CoreError> {
    if cols == 0 {
        return if len == 0 {
            Ok(0)
        } else {
            Err(CoreError::LengthMismatch)
        };
    }
    if len % cols != 0 {
        return Err(CoreError::LengthMismatch);
    }
    Ok(len / cols)
}

/// Number of `T` values held by `byte_len` bytes
pub const fn element_count<T>(byte_len: usize) -> Result<usize, CoreError> {
    let element_size = core::mem::size_of::<T>();
    if element_size == 0 || byte_len % element_size != 0 {
        return Err(CoreError::LengthMismatch);
    }
    Ok(byte_len / element_size)
}

/// Validate that every index is below `bound`
pub fn validate_indices(indices: &[usize], bound: usize) -> Result<(), CoreError> {
    if indices.iter().all(|&i| i < bound) {
        Ok(())
    } else {
        Err(CoreError::IndexOutOfBounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_dense_len() {
        assert_eq!(validate_dense_len(4, 3, 12), Ok(()));
        assert_eq!(validate_dense_len(0, 3, 0), Ok(()));
        assert_eq!(validate_dense_len(4, 3, 11), Err(CoreError::LengthMismatch));
        assert_eq!(
            validate_dense_len(usize::MAX, 2, 0),
            Err(CoreError::LengthMismatch)
        );
    }

    #[test]
    fn test_rows_from_len() {
        assert_eq!(rows_from_len(12, 3), Ok(4));
        assert_eq!(rows_from_len(0, 0), Ok(0));
        assert_eq!(rows_from_len(5, 0), Err(CoreError::LengthMismatch));
        assert_eq!(rows_from_len(10, 3), Err(CoreError::LengthMismatch));
    }

    #[test]
    fn test_element_count() {
        assert_eq!(element_count::<u32>(16), Ok(4));
        assert_eq!(element_count::<u64>(24), Ok(3));
        assert_eq!(element_count::<u32>(15), Err(CoreError::LengthMismatch));
        assert_eq!(element_count::<()>(0), Err(CoreError::LengthMismatch));
    }

    #[test]
    fn test_validate_indices() {
        assert_eq!(validate_indices(&[0, 2, 1], 3), Ok(()));
        assert_eq!(validate_indices(&[], 0), Ok(()));
        assert_eq!(validate_indices(&[3], 3), Err(CoreError::IndexOutOfBounds));
    }
}
