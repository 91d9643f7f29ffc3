//! Compressed sparse row matrix storage
//!
//! Only explicitly stored cells are kept. Every other cell reads as the
//! sparse value, `T::default()`. The structure is fixed once constructed:
//! there is no mutable point access, and [`CsrMatrix::resize`] starts from an
//! empty structure.

use std::ops::Index;

use pointdata_core::{
    validate_csr_layout, validate_indices, CoreError, MatrixElement, PointMatrix, ProgressSink,
    SparseIndex,
};
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::dense::DenseMatrix;
use crate::error::Result;
use crate::visit::{for_each_index, Axis, Coverage, ExtractElements, Strategy, VisitElements};

/// Compressed sparse row matrix
///
/// `row_pointers` has `rows + 1` entries and the stored cells of row `r`
/// occupy `row_pointers[r]..row_pointers[r + 1]` of `col_indices` and
/// `values`, sorted by column.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T, I = u32> {
    rows: usize,
    cols: usize,
    row_pointers: Vec<I>,
    col_indices: Vec<I>,
    values: Vec<T>,
    sparse_value: T,
}

impl<T: MatrixElement, I: SparseIndex> Default for CsrMatrix<T, I> {
    fn default() -> Self {
        Self {
            rows: 0,
            cols: 0,
            row_pointers: vec![I::default()],
            col_indices: Vec::new(),
            values: Vec::new(),
            sparse_value: T::default(),
        }
    }
}

impl<T: MatrixElement, I: SparseIndex> CsrMatrix<T, I> {
    /// Create a matrix with no stored cells
    ///
    /// Fails with `LengthMismatch` when the row pointer count overflows.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let pointers = rows.checked_add(1).ok_or(CoreError::LengthMismatch)?;
        Ok(Self {
            rows,
            cols,
            row_pointers: vec![I::default(); pointers],
            col_indices: Vec::new(),
            values: Vec::new(),
            sparse_value: T::default(),
        })
    }

    /// Build from explicit structure and values, validating the layout
    pub fn from_parts(
        rows: usize,
        cols: usize,
        row_pointers: Vec<I>,
        col_indices: Vec<I>,
        values: Vec<T>,
    ) -> Result<Self> {
        validate_csr_layout(rows, cols, &row_pointers, &col_indices, values.len())?;
        let matrix = Self {
            rows,
            cols,
            row_pointers,
            col_indices,
            values,
            sparse_value: T::default(),
        };
        debug!(
            rows,
            cols,
            nnz = matrix.nnz(),
            bytes = matrix.bytes(),
            "built CSR matrix"
        );
        Ok(matrix)
    }

    /// Build from explicit structure with default-filled values
    pub fn from_structure(
        rows: usize,
        cols: usize,
        row_pointers: Vec<I>,
        col_indices: Vec<I>,
    ) -> Result<Self> {
        let values = vec![T::default(); col_indices.len()];
        Self::from_parts(rows, cols, row_pointers, col_indices, values)
    }

    /// Compress a dense matrix, storing every non-default cell
    ///
    /// Fails with `IndexOutOfBounds` when the column count or the stored
    /// count does not fit the index type.
    pub fn from_dense(dense: &DenseMatrix<T>) -> Result<Self> {
        let (rows, cols) = dense.dimensions();
        if cols == 0 {
            return Self::new(rows, 0);
        }
        I::from_usize(cols - 1).ok_or(CoreError::IndexOutOfBounds)?;

        let counts: Vec<usize> = dense
            .values()
            .par_chunks(cols)
            .map(|row| row.iter().filter(|v| !v.is_default()).count())
            .collect();

        let mut row_pointers = Vec::with_capacity(rows + 1);
        let mut total = 0usize;
        row_pointers.push(I::default());
        for &count in &counts {
            total += count;
            row_pointers.push(I::from_usize(total).ok_or(CoreError::IndexOutOfBounds)?);
        }

        let mut col_indices = vec![I::default(); total];
        let mut values = vec![T::default(); total];
        let mut col_rest = col_indices.as_mut_slice();
        let mut value_rest = values.as_mut_slice();
        let mut row_slots = Vec::with_capacity(rows);
        for &count in &counts {
            let (cols_head, cols_tail) = std::mem::take(&mut col_rest).split_at_mut(count);
            let (values_head, values_tail) = std::mem::take(&mut value_rest).split_at_mut(count);
            col_rest = cols_tail;
            value_rest = values_tail;
            row_slots.push((cols_head, values_head));
        }

        row_slots
            .into_par_iter()
            .zip(dense.values().par_chunks(cols))
            .for_each(|((col_out, value_out), row)| {
                let stored = row
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| !v.is_default());
                for ((col, &value), (c, v)) in stored.zip(col_out.iter_mut().zip(value_out)) {
                    // Fits: col < cols and cols - 1 was checked above
                    *c = I::from_usize(col).unwrap_or_default();
                    *v = value;
                }
            });

        Self::from_parts(rows, cols, row_pointers, col_indices, values)
    }

    /// Reallocate as an empty `rows x cols` matrix with room for `nnz` cells
    pub fn resize(&mut self, rows: usize, cols: usize, nnz: usize) -> Result<()> {
        let mut matrix = Self::new(rows, cols)?;
        matrix.col_indices.reserve(nnz);
        matrix.values.reserve(nnz);
        *self = matrix;
        Ok(())
    }

    pub fn row_pointers(&self) -> &[I] {
        &self.row_pointers
    }

    pub fn col_indices(&self) -> &[I] {
        &self.col_indices
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Value of every unstored cell
    pub fn sparse_value(&self) -> T {
        self.sparse_value
    }

    /// Decompose into `(rows, cols, row_pointers, col_indices, values)`
    pub fn into_parts(self) -> (usize, usize, Vec<I>, Vec<I>, Vec<T>) {
        (
            self.rows,
            self.cols,
            self.row_pointers,
            self.col_indices,
            self.values,
        )
    }

    /// Stored column indices and values of one row
    ///
    /// Panics when `row >= rows`.
    #[inline]
    pub fn row_entries(&self, row: usize) -> (&[I], &[T]) {
        let start = self.row_pointers[row].to_usize();
        let end = self.row_pointers[row + 1].to_usize();
        (&self.col_indices[start..end], &self.values[start..end])
    }

    /// Storage position of `(row, col)`, by binary search within the row
    #[inline]
    fn position(&self, row: usize, col: usize) -> Option<usize> {
        let key = I::from_usize(col)?;
        let start = self.row_pointers[row].to_usize();
        let (cols, _) = self.row_entries(row);
        cols.binary_search(&key).ok().map(|i| start + i)
    }

    /// Value at an in-bounds row, stored or sparse
    #[inline]
    fn value(&self, row: usize, col: usize) -> T {
        self.position(row, col)
            .map_or(self.sparse_value, |i| self.values[i])
    }

    /// Whether column-parallel visitation beats the row-based path
    ///
    /// Column-parallel traversal pays a binary search per cell, so it only
    /// pays off while each worker's share of all cells stays below the
    /// stored count. Zero workers never qualify.
    pub fn column_parallel_is_faster(&self, workers: usize) -> bool {
        if workers == 0 {
            return false;
        }
        self.rows.saturating_mul(self.cols) / workers < self.nnz()
    }

    /// Visit one whole row, merging stored cells with the sparse value
    fn visit_full_row<F>(&self, row: usize, coverage: Coverage, f: &F)
    where
        F: Fn(usize, usize, T) + Sync + Send,
    {
        let (cols, values) = self.row_entries(row);
        match coverage {
            Coverage::Sparse => {
                for (col, &value) in cols.iter().zip(values) {
                    f(row, col.to_usize(), value);
                }
            }
            Coverage::Dense => {
                let mut next = 0;
                for (col, &value) in cols.iter().zip(values) {
                    let col = col.to_usize();
                    for gap in next..col {
                        f(row, gap, self.sparse_value);
                    }
                    f(row, col, value);
                    next = col + 1;
                }
                for gap in next..self.cols {
                    f(row, gap, self.sparse_value);
                }
            }
        }
    }

    /// Visit one cell by lookup; sparse coverage skips unstored cells
    #[inline]
    fn visit_cell<F>(&self, row: usize, col: usize, coverage: Coverage, f: &F)
    where
        F: Fn(usize, usize, T) + Sync + Send,
    {
        match self.position(row, col) {
            Some(i) => f(row, col, self.values[i]),
            None if coverage == Coverage::Dense => f(row, col, self.sparse_value),
            None => {}
        }
    }

    /// Row-based or column-parallel traversal of whole rows
    fn visit_row_axis<F>(
        &self,
        rows: Axis<'_>,
        coverage: Coverage,
        strategy: Strategy,
        f: &F,
        progress: Option<&mut dyn ProgressSink>,
    ) where
        F: Fn(usize, usize, T) + Sync + Send,
    {
        let parallel = match strategy {
            Strategy::Sequential => false,
            Strategy::RowParallel => true,
            Strategy::ColumnParallel => {
                let workers = rayon::current_num_threads();
                if self.column_parallel_is_faster(workers) {
                    for_each_index(Axis::All(self.cols), true, progress, |col| {
                        for position in 0..rows.len() {
                            self.visit_cell(rows.at(position), col, coverage, f);
                        }
                    });
                    return;
                }
                trace!(
                    workers,
                    nnz = self.nnz(),
                    "column-parallel visit not worth it, using rows"
                );
                true
            }
        };
        for_each_index(rows, parallel, progress, |row| {
            self.visit_full_row(row, coverage, f)
        });
    }
}

impl<T: MatrixElement, I: SparseIndex> PointMatrix for CsrMatrix<T, I> {
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
        (row < self.rows && col < self.cols).then(|| self.value(row, col))
    }

    fn bytes(&self) -> usize {
        std::mem::size_of_val(self.row_pointers.as_slice())
            + std::mem::size_of_val(self.col_indices.as_slice())
            + std::mem::size_of_val(self.values.as_slice())
    }
}

impl<T: MatrixElement, I: SparseIndex> Index<(usize, usize)> for CsrMatrix<T, I> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        match self.position(row, col) {
            Some(i) => &self.values[i],
            None => &self.sparse_value,
        }
    }
}

impl<T: MatrixElement, I: SparseIndex> VisitElements for CsrMatrix<T, I> {
    fn visit<F>(
        &self,
        coverage: Coverage,
        strategy: Strategy,
        f: F,
        progress: Option<&mut dyn ProgressSink>,
    ) where
        F: Fn(usize, usize, T) + Sync + Send,
    {
        self.visit_row_axis(Axis::All(self.rows), coverage, strategy, &f, progress);
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
        self.visit_row_axis(Axis::Subset(rows), coverage, strategy, &f, progress);
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
        let (rows, cols) = (Axis::Subset(rows), Axis::Subset(cols));

        match strategy {
            Strategy::Sequential | Strategy::RowParallel => {
                let parallel = strategy == Strategy::RowParallel;
                for_each_index(rows, parallel, progress, |row| {
                    for position in 0..cols.len() {
                        self.visit_cell(row, cols.at(position), coverage, &f);
                    }
                });
            }
            Strategy::ColumnParallel => {
                for_each_index(cols, true, progress, |col| {
                    for position in 0..rows.len() {
                        self.visit_cell(rows.at(position), col, coverage, &f);
                    }
                });
            }
        }
        Ok(())
    }
}

impl<T: MatrixElement, I: SparseIndex> ExtractElements for CsrMatrix<T, I> {
    #[inline]
    fn cell(&self, row: usize, col: usize) -> T {
        self.value(row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatrixError;
    use crate::config::ExecutionConfig;
    use pointdata_core::CountingProgress;
    use std::sync::Mutex;

    fn sample_dense() -> DenseMatrix<f32> {
        DenseMatrix::from_vec(
            4,
            3,
            vec![1.0, 0.0, 3.0, 0.0, 5.0, 0.0, 7.0, 0.0, 9.0, 0.0, 0.0, 0.0],
        )
        .unwrap()
    }

    fn sample() -> CsrMatrix<f32> {
        CsrMatrix::from_dense(&sample_dense()).unwrap()
    }

    fn ordered<F>(visit: F) -> Vec<(usize, usize, f32)>
    where
        F: FnOnce(&(dyn Fn(usize, usize, f32) + Sync + Send)),
    {
        let seen = Mutex::new(Vec::new());
        visit(&|r, c, v| seen.lock().unwrap().push((r, c, v)));
        seen.into_inner().unwrap()
    }

    fn sorted<F>(visit: F) -> Vec<(usize, usize, f32)>
    where
        F: FnOnce(&(dyn Fn(usize, usize, f32) + Sync + Send)),
    {
        let mut seen = ordered(visit);
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        seen
    }

    #[test]
    fn test_from_dense_layout() {
        let m = sample();
        assert_eq!(m.dimensions(), (4, 3));
        assert_eq!(m.nnz(), 5);
        assert_eq!(m.row_pointers(), &[0, 2, 3, 5, 5]);
        assert_eq!(m.col_indices(), &[0, 2, 1, 0, 2]);
        assert_eq!(m.values(), &[1.0, 3.0, 5.0, 7.0, 9.0]);
        assert_eq!(m.bytes(), 5 * 4 + 5 * 4 + 5 * 4);
    }

    #[test]
    fn test_point_access() {
        let m = sample();
        assert_eq!(m.get(0, 2), Some(3.0));
        assert_eq!(m.get(0, 1), Some(0.0));
        assert_eq!(m.get(3, 0), Some(0.0));
        assert_eq!(m.get(4, 0), None);
        assert_eq!(m.get(0, 3), None);
        assert_eq!(m[(2, 2)], 9.0);
        assert_eq!(m[(1, 0)], m.sparse_value());
    }

    #[test]
    fn test_from_parts_validation() {
        let ok = CsrMatrix::<i32, u32>::from_parts(2, 3, vec![0, 1, 2], vec![2, 0], vec![4, -4]);
        assert_eq!(ok.unwrap().get(1, 0), Some(-4));

        let unsorted = CsrMatrix::<i32, u32>::from_parts(1, 3, vec![0, 2], vec![2, 0], vec![1, 2]);
        assert!(unsorted.is_err());

        let short = CsrMatrix::<i32, u32>::from_parts(1, 3, vec![0, 2], vec![0, 2], vec![1]);
        assert!(short.is_err());
    }

    #[test]
    fn test_from_structure_defaults_values() {
        let m = CsrMatrix::<u16, u64>::from_structure(2, 2, vec![0, 1, 2], vec![1, 0]).unwrap();
        assert_eq!(m.nnz(), 2);
        assert_eq!(m.values(), &[0, 0]);
    }

    #[test]
    fn test_resize_clears_structure() {
        let mut m = sample();
        m.resize(10, 7, 16).unwrap();
        assert_eq!(m.dimensions(), (10, 7));
        assert_eq!(m.nnz(), 0);
        assert_eq!(m.row_pointers().len(), 11);
        assert_eq!(m.get(9, 6), Some(0.0));
    }

    #[test]
    fn test_overflowing_row_count_is_rejected() {
        assert!(matches!(
            CsrMatrix::<f32, u32>::new(usize::MAX, 1),
            Err(MatrixError::Core(CoreError::LengthMismatch))
        ));
        let mut m = sample();
        assert!(m.resize(usize::MAX, 4, 0).is_err());
        assert_eq!(m, sample());
    }

    #[test]
    fn test_column_parallel_heuristic() {
        let m = sample();
        assert!(!m.column_parallel_is_faster(0));
        assert!(!m.column_parallel_is_faster(1));
        assert!(!m.column_parallel_is_faster(2));
        assert!(m.column_parallel_is_faster(3));
        assert!(!CsrMatrix::<f32, u32>::new(0, 0).unwrap().column_parallel_is_faster(4));
    }

    #[test]
    fn test_dense_row_merge_order() {
        let m = sample();
        let seen = ordered(|f| m.visit(Coverage::Dense, Strategy::Sequential, f, None));
        let expected: Vec<_> = (0..4)
            .flat_map(|r| (0..3).map(move |c| (r, c)))
            .map(|(r, c)| (r, c, sample_dense()[(r, c)]))
            .collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_strategies_agree() {
        let m = sample();
        for coverage in [Coverage::Dense, Coverage::Sparse] {
            let reference = sorted(|f| m.visit(coverage, Strategy::Sequential, f, None));
            let expected_len = if coverage == Coverage::Dense { 12 } else { 5 };
            assert_eq!(reference.len(), expected_len);
            for strategy in [Strategy::RowParallel, Strategy::ColumnParallel] {
                assert_eq!(sorted(|f| m.visit(coverage, strategy, f, None)), reference);
            }
        }
    }

    #[test]
    fn test_column_parallel_fallback_progress() {
        let m = sample();

        let mut narrow = CountingProgress::new();
        ExecutionConfig::with_workers(1)
            .install(|| {
                m.visit(Coverage::Sparse, Strategy::ColumnParallel, |_, _, _| {}, Some(&mut narrow))
            })
            .unwrap();
        assert_eq!(narrow.subtasks, 4);
        assert!(narrow.is_complete());

        let mut wide = CountingProgress::new();
        ExecutionConfig::with_workers(4)
            .install(|| {
                m.visit(Coverage::Sparse, Strategy::ColumnParallel, |_, _, _| {}, Some(&mut wide))
            })
            .unwrap();
        assert_eq!(wide.subtasks, 3);
        assert!(wide.is_complete());
    }

    #[test]
    fn test_visit_rows_subset() {
        let m = sample();
        for strategy in [
            Strategy::Sequential,
            Strategy::RowParallel,
            Strategy::ColumnParallel,
        ] {
            let seen = sorted(|f| {
                m.visit_rows(&[3, 1], Coverage::Dense, strategy, f, None)
                    .unwrap()
            });
            assert_eq!(seen.len(), 6);
            assert_eq!(seen[1], (1, 1, 5.0));
        }
        assert!(m
            .visit_rows(&[4], Coverage::Dense, Strategy::Sequential, |_, _, _| {}, None)
            .is_err());
    }

    #[test]
    fn test_block_visit_skips_misses() {
        let m = sample();
        for strategy in [
            Strategy::Sequential,
            Strategy::RowParallel,
            Strategy::ColumnParallel,
        ] {
            let sparse = sorted(|f| {
                m.visit_block(&[0, 1], &[1, 2], Coverage::Sparse, strategy, f, None)
                    .unwrap()
            });
            assert_eq!(sparse, vec![(0, 2, 3.0), (1, 1, 5.0)]);

            let dense = sorted(|f| {
                m.visit_block(&[0, 1], &[1, 2], Coverage::Dense, strategy, f, None)
                    .unwrap()
            });
            assert_eq!(dense.len(), 4);
        }
    }

    #[test]
    fn test_extraction_matches_dense() {
        let dense = sample_dense();
        let csr = sample();
        assert_eq!(csr.extract_column(1, None).unwrap(), vec![0.0, 5.0, 0.0, 0.0]);
        assert_eq!(
            csr.extract_column(1, None).unwrap(),
            dense.extract_column(1, None).unwrap()
        );
        assert_eq!(
            csr.extract_column_pair(0, 2, None, None).unwrap(),
            dense.extract_column_pair(0, 2, None, None).unwrap()
        );

        let mut a = vec![0f64; 6];
        let mut b = vec![0f64; 6];
        csr.populate_columns(&[2, 0], Some(&[2, 0, 3]), &mut a, None)
            .unwrap();
        dense
            .populate_columns(&[2, 0], Some(&[2, 0, 3]), &mut b, None)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a, vec![9.0, 7.0, 3.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_dense_round_trip() {
        let dense = sample_dense();
        assert_eq!(DenseMatrix::from_csr(&sample()).unwrap(), dense);
        let empty = CsrMatrix::<f32, u32>::from_dense(&DenseMatrix::new(3, 0).unwrap()).unwrap();
        assert_eq!(empty.dimensions(), (3, 0));
        assert_eq!(empty.nnz(), 0);
    }
}
