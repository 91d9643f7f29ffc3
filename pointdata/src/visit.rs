//! Element visitation and bulk extraction
//!
//! Visitation is parameterised on two axes: [`Coverage`] selects whether
//! default-valued cells are visited and [`Strategy`] selects how work is
//! split across rayon workers. Both storage layouts implement
//! [`VisitElements`] and [`ExtractElements`].

use pointdata_core::{
    unchecked_numeric_cast, validate_indices, CoreError, MatrixElement, PointMatrix,
    ProgressSink,
};
use rayon::prelude::*;

use crate::error::Result;
use crate::progress::with_progress;

/// Which cells a visitation reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Coverage {
    /// Every cell, with the default value for unstored cells
    #[default]
    Dense,
    /// Only cells whose value differs from the default
    Sparse,
}

/// How visitation work is split across workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    /// Caller thread only
    #[default]
    Sequential,
    /// Each worker owns whole rows
    RowParallel,
    /// Each worker owns whole columns
    ColumnParallel,
}

impl Coverage {
    /// Whether a cell holding `value` is visited
    #[inline]
    pub fn includes<T: MatrixElement>(self, value: &T) -> bool {
        match self {
            Coverage::Dense => true,
            Coverage::Sparse => !value.is_default(),
        }
    }
}

/// Index set along one matrix axis
#[derive(Debug, Clone, Copy)]
pub(crate) enum Axis<'a> {
    /// `0..n`
    All(usize),
    /// Caller-supplied indices, already validated
    Subset(&'a [usize]),
}

impl Axis<'_> {
    #[inline]
    pub(crate) fn len(self) -> usize {
        match self {
            Axis::All(n) => n,
            Axis::Subset(indices) => indices.len(),
        }
    }

    #[inline]
    pub(crate) fn at(self, position: usize) -> usize {
        match self {
            Axis::All(_) => position,
            Axis::Subset(indices) => indices[position],
        }
    }
}

/// Run `visit` for every index of `axis`, one progress subtask per index
pub(crate) fn for_each_index<V>(
    axis: Axis<'_>,
    parallel: bool,
    progress: Option<&mut dyn ProgressSink>,
    visit: V,
) where
    V: Fn(usize) + Sync + Send,
{
    let count = axis.len();
    with_progress(progress, count, |reporter| {
        let step = |position: usize| {
            visit(axis.at(position));
            reporter.finished(position);
        };
        if parallel {
            (0..count).into_par_iter().for_each(step);
        } else {
            (0..count).for_each(step);
        }
    });
}

/// Per-element visitation
///
/// The callback receives `(row, col, value)` and may run on any worker, so
/// it must be `Fn + Sync + Send`. Every requested cell is passed exactly
/// once under every strategy; only the order differs.
///
/// Progress subtasks are rows, except for column-parallel visitation where
/// they are columns.
pub trait VisitElements: PointMatrix {
    /// Visit the whole matrix
    fn visit<F>(
        &self,
        coverage: Coverage,
        strategy: Strategy,
        f: F,
        progress: Option<&mut dyn ProgressSink>,
    ) where
        F: Fn(usize, usize, Self::Element) + Sync + Send;

    /// Visit the given rows, in order, across all columns
    ///
    /// Fails with `IndexOutOfBounds` before visiting anything when a row is
    /// out of range.
    fn visit_rows<F>(
        &self,
        rows: &[usize],
        coverage: Coverage,
        strategy: Strategy,
        f: F,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<()>
    where
        F: Fn(usize, usize, Self::Element) + Sync + Send;

    /// Visit the cells at the intersection of `rows` and `cols`
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
        F: Fn(usize, usize, Self::Element) + Sync + Send;
}

/// Bulk column extraction
///
/// These paths read cells directly instead of going through a visitor
/// callback. Row indices select points, column indices select dimensions.
pub trait ExtractElements: PointMatrix + Sync {
    /// Value at a position already validated against the shape
    fn cell(&self, row: usize, col: usize) -> Self::Element;

    /// Copy one column into a new buffer
    fn extract_column(
        &self,
        col: usize,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<Vec<Self::Element>> {
        validate_indices(&[col], self.cols())?;
        let rows = self.rows();
        Ok(with_progress(progress, rows, |reporter| {
            (0..rows)
                .into_par_iter()
                .map(|row| {
                    let value = self.cell(row, col);
                    reporter.finished(row);
                    value
                })
                .collect()
        }))
    }

    /// Pair two columns, for all rows or for the given rows in order
    fn extract_column_pair(
        &self,
        col_a: usize,
        col_b: usize,
        rows: Option<&[usize]>,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<Vec<(Self::Element, Self::Element)>> {
        validate_indices(&[col_a, col_b], self.cols())?;
        let pair = |row: usize| (self.cell(row, col_a), self.cell(row, col_b));

        match rows {
            None => {
                let count = self.rows();
                Ok(with_progress(progress, count, |reporter| {
                    (0..count)
                        .into_par_iter()
                        .map(|row| {
                            let value = pair(row);
                            reporter.finished(row);
                            value
                        })
                        .collect()
                }))
            }
            Some(rows) => {
                validate_indices(rows, self.rows())?;
                Ok(with_progress(progress, rows.len(), |reporter| {
                    rows.par_iter()
                        .enumerate()
                        .map(|(i, &row)| {
                            let value = pair(row);
                            reporter.finished(i);
                            value
                        })
                        .collect()
                }))
            }
        }
    }

    /// Fill `out` row-major with the requested columns of the requested rows
    ///
    /// Output row `i` holds the values of source row `rows[i]` (or `i` when
    /// `rows` is `None`) at columns `cols[0..]`, converted to `O`.
    fn populate_columns<O: MatrixElement>(
        &self,
        cols: &[usize],
        rows: Option<&[usize]>,
        out: &mut [O],
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<()> {
        validate_indices(cols, self.cols())?;
        if let Some(rows) = rows {
            validate_indices(rows, self.rows())?;
        }
        let row_count = rows.map_or(self.rows(), <[usize]>::len);
        if out.len() != row_count * cols.len() {
            return Err(CoreError::LengthMismatch.into());
        }
        if cols.is_empty() {
            return Ok(());
        }

        with_progress(progress, row_count, |reporter| {
            out.par_chunks_mut(cols.len())
                .enumerate()
                .for_each(|(i, chunk)| {
                    let row = rows.map_or(i, |rows| rows[i]);
                    for (slot, &col) in chunk.iter_mut().zip(cols) {
                        *slot = unchecked_numeric_cast(self.cell(row, col));
                    }
                    reporter.finished(i);
                });
        });
        Ok(())
    }
}
