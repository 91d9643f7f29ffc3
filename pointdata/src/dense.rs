//! Dense row-major matrix storage

use std::ops::{Index, IndexMut};

use pointdata_core::{
    cell_count, rows_from_len, safe_numeric_cast, validate_dense_len, validate_indices, CoreError,
    MatrixElement, MatrixMut, PointMatrix, ProgressSink, SparseIndex,
};
use rayon::prelude::*;

use crate::csr::CsrMatrix;
use crate::error::Result;
use crate::visit::{for_each_index, Axis, Coverage, ExtractElements, Strategy, VisitElements};

/// Row-major matrix storing every cell
///
/// `values.len() == rows * cols` holds after every operation. Reshaping
/// builds the new buffer first and swaps it in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DenseMatrix<T> {
    rows: usize,
    cols: usize,
    values: Vec<T>,
}

impl<T: MatrixElement> DenseMatrix<T> {
    /// Create a default-filled matrix
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        Self::filled(rows, cols, T::default())
    }

    /// Create a matrix with every cell set to `value`
    ///
    /// Fails with `LengthMismatch` when `rows * cols` overflows.
    pub fn filled(rows: usize, cols: usize, value: T) -> Result<Self> {
        let len = cell_count(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            values: vec![value; len],
        })
    }

    /// Take ownership of a row-major buffer
    pub fn from_vec(rows: usize, cols: usize, values: Vec<T>) -> Result<Self> {
        validate_dense_len(rows, cols, values.len())?;
        Ok(Self { rows, cols, values })
    }

    /// Densify a CSR matrix
    pub fn from_csr<I: SparseIndex>(csr: &CsrMatrix<T, I>) -> Result<Self> {
        let mut dense = Self::new(csr.rows(), csr.cols())?;
        if dense.cols == 0 {
            return Ok(dense);
        }
        dense
            .values
            .par_chunks_mut(csr.cols())
            .enumerate()
            .for_each(|(row, out)| {
                let (cols, values) = csr.row_entries(row);
                for (col, &value) in cols.iter().zip(values) {
                    out[col.to_usize()] = value;
                }
            });
        Ok(dense)
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    /// Get a value without bounds checking
    ///
    /// # Safety
    ///
    /// `row < self.rows()` and `col < self.cols()` must hold.
    #[inline]
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        // SAFETY: the caller guarantees row < rows and col < cols, so
        // row * cols + col < rows * cols == values.len()
        *self.values.get_unchecked(row * self.cols + col)
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    /// Reallocate as a default-filled `rows x cols` matrix
    pub fn resize(&mut self, rows: usize, cols: usize) -> Result<()> {
        let len = cell_count(rows, cols)?;
        let values = vec![T::default(); len];
        *self = Self { rows, cols, values };
        Ok(())
    }

    /// Reset to a default-filled `rows x cols` matrix
    pub fn clear_data(&mut self, rows: usize, cols: usize) -> Result<()> {
        self.resize(rows, cols)
    }

    /// Replace the buffer, taking the row count from `values.len() / cols`
    pub fn set_data(&mut self, values: Vec<T>, cols: usize) -> Result<()> {
        let rows = rows_from_len(values.len(), cols)?;
        *self = Self { rows, cols, values };
        Ok(())
    }

    /// Replace the buffer with converted values of another element type
    ///
    /// Every value is range-checked; on failure the matrix is unchanged.
    pub fn convert_data<U: MatrixElement>(&mut self, source: &[U], cols: usize) -> Result<()> {
        let rows = rows_from_len(source.len(), cols)?;
        let values = source
            .par_iter()
            .map(|&value| safe_numeric_cast::<T, U>(value))
            .collect::<core::result::Result<Vec<T>, CoreError>>()?;
        *self = Self { rows, cols, values };
        Ok(())
    }

    fn visit_axes<F>(
        &self,
        rows: Axis<'_>,
        cols: Axis<'_>,
        coverage: Coverage,
        strategy: Strategy,
        f: &F,
        progress: Option<&mut dyn ProgressSink>,
    ) where
        F: Fn(usize, usize, T) + Sync + Send,
    {
        match strategy {
            Strategy::Sequential | Strategy::RowParallel => {
                let parallel = strategy == Strategy::RowParallel;
                for_each_index(rows, parallel, progress, |row| {
                    for position in 0..cols.len() {
                        let col = cols.at(position);
                        // SAFETY: both axes were validated against the shape
                        let value = unsafe { self.get_unchecked(row, col) };
                        if coverage.includes(&value) {
                            f(row, col, value);
                        }
                    }
                });
            }
            Strategy::ColumnParallel => {
                for_each_index(cols, true, progress, |col| {
                    for position in 0..rows.len() {
                        let row = rows.at(position);
                        // SAFETY: both axes were validated against the shape
                        let value = unsafe { self.get_unchecked(row, col) };
                        if coverage.includes(&value) {
                            f(row, col, value);
                        }
                    }
                });
            }
        }
    }
}

impl<T: MatrixElement> PointMatrix for DenseMatrix<T> {
    type Element = T;

    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn nnz(&self) -> usize {
        self.values.len()
    }

    fn get(&self, row: usize, col: usize) -> Option<T> {
        self.offset(row, col).map(|i| self.values[i])
    }

    fn bytes(&self) -> usize {
        std::mem::size_of_val(self.values.as_slice())
    }
}

impl<T: MatrixElement> MatrixMut for DenseMatrix<T> {
    fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        let i = self.offset(row, col)?;
        Some(&mut self.values[i])
    }
}

impl<T: MatrixElement> Index<(usize, usize)> for DenseMatrix<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        match self.offset(row, col) {
            Some(i) => &self.values[i],
            None => panic!(
                "index ({row}, {col}) out of bounds for {}x{} matrix",
                self.rows, self.cols
            ),
        }
    }
}

impl<T: MatrixElement> IndexMut<(usize, usize)> for DenseMatrix<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        match self.offset(row, col) {
            Some(i) => &mut self.values[i],
            None => panic!(
                "index ({row}, {col}) out of bounds for {}x{} matrix",
                self.rows, self.cols
            ),
        }
    }
}

impl<T: MatrixElement> VisitElements for DenseMatrix<T> {
    fn visit<F>(
        &self,
        coverage: Coverage,
        strategy: Strategy,
        f: F,
        progress: Option<&mut dyn ProgressSink>,
    ) where
        F: Fn(usize, usize, T) + Sync + Send,
    {
        let (rows, cols) = (Axis::All(self.rows), Axis::All(self.cols));
        self.visit_axes(rows, cols, coverage, strategy, &f, progress);
    }

    fn visit_rows<F>(
        &self,
        rows: &[usize],
        coverage: Coverage,
        strategy: Strategy,
        f: F,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<()>
    where
        F: Fn(usize, usize, T) + Sync + Send,
    {
        validate_indices(rows, self.rows)?;
        let cols = Axis::All(self.cols);
        self.visit_axes(Axis::Subset(rows), cols, coverage, strategy, &f, progress);
        Ok(())
    }

    fn visit_block<F>(
        &self,
        rows: &[usize],
        cols: &[usize],
        coverage: Coverage,
        strategy: Strategy,
        f: F,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<()>
    where
        F: Fn(usize, usize, T) + Sync + Send,
    {
        validate_indices(rows, self.rows)?;
        validate_indices(cols, self.cols)?;
        self.visit_axes(
            Axis::Subset(rows),
            Axis::Subset(cols),
            coverage,
            strategy,
            &f,
            progress,
        );
        Ok(())
    }
}

impl<T: MatrixElement> ExtractElements for DenseMatrix<T> {
    #[inline]
    fn cell(&self, row: usize, col: usize) -> T {
        self[(row, col)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatrixError;
    use pointdata_core::CountingProgress;
    use std::sync::Mutex;

    fn sample() -> DenseMatrix<f32> {
        DenseMatrix::from_vec(
            4,
            3,
            vec![1.0, 0.0, 3.0, 0.0, 5.0, 0.0, 7.0, 0.0, 9.0, 0.0, 0.0, 0.0],
        )
        .unwrap()
    }

    fn collect<M, F>(visit: F) -> Vec<(usize, usize, M)>
    where
        M: Send + PartialOrd,
        F: FnOnce(&(dyn Fn(usize, usize, M) + Sync + Send)),
    {
        let seen = Mutex::new(Vec::new());
        visit(&|r, c, v| seen.lock().unwrap().push((r, c, v)));
        let mut seen = seen.into_inner().unwrap();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        seen
    }

    #[test]
    fn test_overflowing_shape_is_rejected() {
        let rows = usize::MAX / 2 + 1;
        assert!(matches!(
            DenseMatrix::<f32>::new(rows, 2),
            Err(MatrixError::Core(CoreError::LengthMismatch))
        ));
        assert!(DenseMatrix::<u8>::filled(usize::MAX, 3, 1).is_err());

        let mut m = sample();
        assert!(m.resize(rows, 2).is_err());
        assert_eq!(m, sample());
    }

    #[test]
    fn test_construction() {
        let m = DenseMatrix::<i16>::filled(2, 3, 7).unwrap();
        assert_eq!(m.dimensions(), (2, 3));
        assert_eq!(m.values(), &[7; 6]);
        assert_eq!(m.bytes(), 12);
        assert_eq!(
            DenseMatrix::<u8>::from_vec(2, 2, vec![1, 2, 3]).unwrap_err().to_string(),
            CoreError::LengthMismatch.to_string()
        );
    }

    #[test]
    fn test_point_access() {
        let mut m = sample();
        assert_eq!(m.get(1, 1), Some(5.0));
        assert_eq!(m.get(4, 0), None);
        assert_eq!(m.get(0, 3), None);
        m.set(3, 2, -1.0).unwrap();
        assert_eq!(m[(3, 2)], -1.0);
        m[(0, 0)] = 2.0;
        assert_eq!(unsafe { m.get_unchecked(0, 0) }, 2.0);
        assert!(m.set(9, 9, 0.0).is_err());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_index_panics_outside_shape() {
        let m = sample();
        let _ = m[(0, 3)];
    }

    #[test]
    fn test_set_data_round_trip() {
        let mut m = DenseMatrix::<u32>::default();
        let data: Vec<u32> = (0..12).collect();
        m.set_data(data.clone(), 4).unwrap();
        assert_eq!(m.dimensions(), (3, 4));
        for row in 0..3 {
            for col in 0..4 {
                assert_eq!(m.get(row, col), Some(data[row * 4 + col]));
            }
        }
        assert!(m.set_data(vec![1, 2, 3], 2).is_err());
        assert_eq!(m.dimensions(), (3, 4));
    }

    #[test]
    fn test_resize_and_clear() {
        let mut m = sample();
        m.resize(2, 5).unwrap();
        assert_eq!(m.dimensions(), (2, 5));
        assert_eq!(m.values().len(), 10);
        m.clear_data(0, 0).unwrap();
        assert_eq!(m.nnz(), 0);
    }

    #[test]
    fn test_convert_data_checks_range() {
        let mut m = DenseMatrix::<u8>::new(1, 1).unwrap();
        m.convert_data(&[1.0f64, 2.0, 255.0, 4.0], 2).unwrap();
        assert_eq!(m.values(), &[1, 2, 255, 4]);

        let err = m.convert_data(&[1.0f64, 256.0], 2);
        assert!(err.is_err());
        assert_eq!(m.values(), &[1, 2, 255, 4]);
    }

    #[test]
    fn test_dense_visit_counts_every_cell() {
        let m = sample();
        for strategy in [
            Strategy::Sequential,
            Strategy::RowParallel,
            Strategy::ColumnParallel,
        ] {
            let seen = collect(|f| m.visit(Coverage::Dense, strategy, f, None));
            assert_eq!(seen.len(), 12);
            assert_eq!(seen[4], (1, 1, 5.0));
        }
    }

    #[test]
    fn test_sparse_visit_skips_defaults() {
        let m = sample();
        let expected = vec![
            (0, 0, 1.0),
            (0, 2, 3.0),
            (1, 1, 5.0),
            (2, 0, 7.0),
            (2, 2, 9.0),
        ];
        for strategy in [
            Strategy::Sequential,
            Strategy::RowParallel,
            Strategy::ColumnParallel,
        ] {
            let seen = collect(|f| m.visit(Coverage::Sparse, strategy, f, None));
            assert_eq!(seen, expected);
        }
    }

    #[test]
    fn test_visit_rows_and_block() {
        let m = sample();
        let seen = collect(|f| {
            m.visit_rows(&[2, 0], Coverage::Sparse, Strategy::RowParallel, f, None)
                .unwrap()
        });
        assert_eq!(seen, vec![(0, 0, 1.0), (0, 2, 3.0), (2, 0, 7.0), (2, 2, 9.0)]);

        let seen = collect(|f| {
            m.visit_block(&[1, 2], &[1], Coverage::Dense, Strategy::ColumnParallel, f, None)
                .unwrap()
        });
        assert_eq!(seen, vec![(1, 1, 5.0), (2, 1, 0.0)]);
    }

    #[test]
    fn test_invalid_rows_visit_nothing() {
        let m = sample();
        let seen = collect(|f| {
            assert!(m
                .visit_rows(&[0, 4], Coverage::Dense, Strategy::Sequential, f, None)
                .is_err());
            assert!(m
                .visit_block(&[0], &[3], Coverage::Dense, Strategy::Sequential, f, None)
                .is_err());
        });
        assert!(seen.is_empty());
    }

    #[test]
    fn test_visit_reports_progress() {
        let m = sample();
        let mut rows = CountingProgress::new();
        m.visit(Coverage::Dense, Strategy::RowParallel, |_, _, _| {}, Some(&mut rows));
        assert_eq!(rows.subtasks, 4);
        assert!(rows.is_complete());

        let mut cols = CountingProgress::new();
        m.visit(Coverage::Dense, Strategy::ColumnParallel, |_, _, _| {}, Some(&mut cols));
        assert_eq!(cols.subtasks, 3);
        assert!(cols.is_complete());
    }

    #[test]
    fn test_extraction() {
        let m = sample();
        assert_eq!(m.extract_column(1, None).unwrap(), vec![0.0, 5.0, 0.0, 0.0]);
        assert!(m.extract_column(3, None).is_err());

        let pairs = m.extract_column_pair(0, 2, Some(&[2, 0]), None).unwrap();
        assert_eq!(pairs, vec![(7.0, 9.0), (1.0, 3.0)]);

        let mut out = vec![0i32; 4];
        m.populate_columns(&[2, 1], Some(&[1, 2]), &mut out, None)
            .unwrap();
        assert_eq!(out, vec![0, 5, 9, 0]);

        let mut short = vec![0f64; 3];
        assert!(m.populate_columns(&[0], None, &mut short, None).is_err());
    }
}
