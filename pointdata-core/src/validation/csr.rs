//! Compressed sparse row layout validation

use crate::{CoreError, SparseIndex};

/// Validate a CSR structure against a `rows x cols` shape
///
/// Checks that `row_pointers` has `rows + 1` entries, starts at zero, never
/// decreases and ends at `col_indices.len()`, that every row's column
/// indices are strictly ascending and below `cols`, and that `values_len`
/// equals the stored count.
pub fn validate_csr_layout<I: SparseIndex>(
    rows: usize,
    cols: usize,
    row_pointers: &[I],
    col_indices: &[I],
    values_len: usize,
) -> Result<(), CoreError> {
    if row_pointers.len() != rows.checked_add(1).ok_or(CoreError::InvalidRowPointers)? {
        return Err(CoreError::InvalidRowPointers);
    }
    if row_pointers[0].to_usize() != 0 || row_pointers[rows].to_usize() != col_indices.len() {
        return Err(CoreError::InvalidRowPointers);
    }
    if values_len != col_indices.len() {
        return Err(CoreError::LengthMismatch);
    }

    for window in row_pointers.windows(2) {
        let (start, end) = (window[0].to_usize(), window[1].to_usize());
        if start > end || end > col_indices.len() {
            return Err(CoreError::InvalidRowPointers);
        }
        let row = &col_indices[start..end];
        if row.iter().any(|c| c.to_usize() >= cols) {
            return Err(CoreError::InvalidColumnIndices);
        }
        if row.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(CoreError::InvalidColumnIndices);
        }
    }

    Ok(())
}
