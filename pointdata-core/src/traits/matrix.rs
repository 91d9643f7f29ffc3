//! Core matrix abstraction traits
//!
//! Both storage layouts implement [`PointMatrix`]. Mutable point access is a
//! separate capability, [`MatrixMut`], which compressed storage does not
//! provide.

use super::element::MatrixElement;
use crate::{CoreError, Result};

/// Read access shared by every matrix storage layout
pub trait PointMatrix {
    /// The element type stored in this matrix
    type Element: MatrixElement;

    /// Number of rows (points)
    fn rows(&self) -> usize;

    /// Number of columns (dimensions)
    fn cols(&self) -> usize;

    /// Get matrix dimensions as (rows, cols)
    fn dimensions(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    /// Number of explicitly stored values
    fn nnz(&self) -> usize;

    /// Get the value at a position
    ///
    /// Returns the implicit default for unstored cells and `None` only
    /// when the position is out of bounds.
    fn get(&self, row: usize, col: usize) -> Option<Self::Element>;

    /// Heap bytes held by the matrix buffers
    fn bytes(&self) -> usize;
}

/// Mutable point access
pub trait MatrixMut: PointMatrix {
    /// Get a mutable reference to the value at a position
    fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Self::Element>;

    /// Overwrite the value at a position
    fn set(&mut self, row: usize, col: usize, value: Self::Element) -> Result<()> {
        let slot = self
            .get_mut(row, col)
            .ok_or(CoreError::IndexOutOfBounds)?;
        *slot = value;
        Ok(())
    }
}
