//! Runtime-selected matrix storage
//!
//! [`MatrixVariant`] owns exactly one dense or CSR matrix of one supported
//! element type. Every whole-matrix operation resolves the active case with
//! a single exhaustive match and then runs fully monomorphised code, so
//! there is no per-element dispatch.

use half::bf16;
use pointdata_core::{
    case_at, case_index, cell_count, safe_numeric_cast, Configuration, CoreError,
    ElementType, MatrixElement, MatrixMut, PointMatrix, ProgressSink, StorageKind,
};
use tracing::{debug, warn};

use crate::csr::CsrMatrix;
use crate::dense::DenseMatrix;
use crate::error::{MatrixError, Result};
use crate::visit::{Coverage, ExtractElements, Strategy, VisitElements};

/// One matrix of any supported (storage, element) case
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixVariant {
    DenseFloat32(DenseMatrix<f32>),
    DenseFloat64(DenseMatrix<f64>),
    DenseBfloat16(DenseMatrix<bf16>),
    DenseInt8(DenseMatrix<i8>),
    DenseInt16(DenseMatrix<i16>),
    DenseInt32(DenseMatrix<i32>),
    DenseInt64(DenseMatrix<i64>),
    DenseUint8(DenseMatrix<u8>),
    DenseUint16(DenseMatrix<u16>),
    DenseUint32(DenseMatrix<u32>),
    DenseUint64(DenseMatrix<u64>),
    CsrFloat32(CsrMatrix<f32>),
    CsrFloat64(CsrMatrix<f64>),
    CsrBfloat16(CsrMatrix<bf16>),
    CsrInt8(CsrMatrix<i8>),
    CsrInt16(CsrMatrix<i16>),
    CsrInt32(CsrMatrix<i32>),
    CsrInt64(CsrMatrix<i64>),
    CsrUint8(CsrMatrix<u8>),
    CsrUint16(CsrMatrix<u16>),
    CsrUint32(CsrMatrix<u32>),
    CsrUint64(CsrMatrix<u64>),
}

/// Match the active case, binding the payload to `$m` in every arm
macro_rules! dispatch {
    ($value:expr, $m:ident => $body:expr) => {
        dispatch!($value, dense $m => $body, csr $m => $body)
    };
    ($value:expr, dense $d:ident => $dense:expr, csr $c:ident => $csr:expr) => {
        match $value {
            MatrixVariant::DenseFloat32($d) => $dense,
            MatrixVariant::DenseFloat64($d) => $dense,
            MatrixVariant::DenseBfloat16($d) => $dense,
            MatrixVariant::DenseInt8($d) => $dense,
            MatrixVariant::DenseInt16($d) => $dense,
            MatrixVariant::DenseInt32($d) => $dense,
            MatrixVariant::DenseInt64($d) => $dense,
            MatrixVariant::DenseUint8($d) => $dense,
            MatrixVariant::DenseUint16($d) => $dense,
            MatrixVariant::DenseUint32($d) => $dense,
            MatrixVariant::DenseUint64($d) => $dense,
            MatrixVariant::CsrFloat32($c) => $csr,
            MatrixVariant::CsrFloat64($c) => $csr,
            MatrixVariant::CsrBfloat16($c) => $csr,
            MatrixVariant::CsrInt8($c) => $csr,
            MatrixVariant::CsrInt16($c) => $csr,
            MatrixVariant::CsrInt32($c) => $csr,
            MatrixVariant::CsrInt64($c) => $csr,
            MatrixVariant::CsrUint8($c) => $csr,
            MatrixVariant::CsrUint16($c) => $csr,
            MatrixVariant::CsrUint32($c) => $csr,
            MatrixVariant::CsrUint64($c) => $csr,
        }
    };
}

pub(crate) use dispatch;

/// Element types that have a case in [`MatrixVariant`]
pub trait VariantElement: MatrixElement {
    fn wrap_dense(matrix: DenseMatrix<Self>) -> MatrixVariant;
    fn wrap_csr(matrix: CsrMatrix<Self>) -> MatrixVariant;
    fn dense_of(variant: &MatrixVariant) -> Option<&DenseMatrix<Self>>;
    fn csr_of(variant: &MatrixVariant) -> Option<&CsrMatrix<Self>>;
}

macro_rules! impl_variant_element {
    ($($t:ty => $dense:ident, $csr:ident);* $(;)?) => {
        $(
            impl VariantElement for $t {
                fn wrap_dense(matrix: DenseMatrix<Self>) -> MatrixVariant {
                    MatrixVariant::$dense(matrix)
                }

                fn wrap_csr(matrix: CsrMatrix<Self>) -> MatrixVariant {
                    MatrixVariant::$csr(matrix)
                }

                fn dense_of(variant: &MatrixVariant) -> Option<&DenseMatrix<Self>> {
                    match variant {
                        MatrixVariant::$dense(m) => Some(m),
                        _ => None,
                    }
                }

                fn csr_of(variant: &MatrixVariant) -> Option<&CsrMatrix<Self>> {
                    match variant {
                        MatrixVariant::$csr(m) => Some(m),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_variant_element!(
    f32 => DenseFloat32, CsrFloat32;
    f64 => DenseFloat64, CsrFloat64;
    bf16 => DenseBfloat16, CsrBfloat16;
    i8 => DenseInt8, CsrInt8;
    i16 => DenseInt16, CsrInt16;
    i32 => DenseInt32, CsrInt32;
    i64 => DenseInt64, CsrInt64;
    u8 => DenseUint8, CsrUint8;
    u16 => DenseUint16, CsrUint16;
    u32 => DenseUint32, CsrUint32;
    u64 => DenseUint64, CsrUint64;
);

/// Operation generic over the element type, selected at runtime
pub trait ElementTypeOp {
    type Output;

    fn call<T: VariantElement>(self) -> Self::Output;
}

/// Run `op` with the Rust type named by `element`
pub fn with_element_type<O: ElementTypeOp>(element: ElementType, op: O) -> O::Output {
    match element {
        ElementType::Float32 => op.call::<f32>(),
        ElementType::Float64 => op.call::<f64>(),
        ElementType::Bfloat16 => op.call::<bf16>(),
        ElementType::Int8 => op.call::<i8>(),
        ElementType::Int16 => op.call::<i16>(),
        ElementType::Int32 => op.call::<i32>(),
        ElementType::Int64 => op.call::<i64>(),
        ElementType::Uint8 => op.call::<u8>(),
        ElementType::Uint16 => op.call::<u16>(),
        ElementType::Uint32 => op.call::<u32>(),
        ElementType::Uint64 => op.call::<u64>(),
    }
}

/// Operation generic over the concrete matrix type of the active case
pub trait ElementVisitor {
    type Output;

    fn visit<M>(self, matrix: &M) -> Self::Output
    where
        M: VisitElements + ExtractElements,
        M::Element: VariantElement;
}

struct EmptyCase(StorageKind);

impl ElementTypeOp for EmptyCase {
    type Output = MatrixVariant;

    fn call<T: VariantElement>(self) -> MatrixVariant {
        match self.0 {
            StorageKind::Dense => T::wrap_dense(DenseMatrix::default()),
            StorageKind::Csr => T::wrap_csr(CsrMatrix::default()),
        }
    }
}

fn element_of<M: PointMatrix>(_: &M) -> ElementType {
    M::Element::element_type()
}

fn csr_from_converted<T, U>(source: &[U], cols: usize) -> Result<CsrMatrix<T>>
where
    T: MatrixElement,
    U: MatrixElement,
{
    let mut dense = DenseMatrix::<T>::default();
    dense.convert_data(source, cols)?;
    CsrMatrix::from_dense(&dense)
}

impl Default for MatrixVariant {
    fn default() -> Self {
        MatrixVariant::DenseFloat32(DenseMatrix::default())
    }
}

impl MatrixVariant {
    /// Empty payload of the given case
    pub fn empty(storage: StorageKind, element: ElementType) -> Self {
        with_element_type(element, EmptyCase(storage))
    }

    pub fn storage_kind(&self) -> StorageKind {
        dispatch!(self, dense _m => StorageKind::Dense, csr _m => StorageKind::Csr)
    }

    pub fn element_type(&self) -> ElementType {
        dispatch!(self, m => element_of(m))
    }

    /// Names of the active case
    pub fn configuration(&self) -> Configuration {
        Configuration::from_kinds(self.storage_kind(), self.element_type())
    }

    /// Flat index of the active case, see [`pointdata_core::case_index`]
    pub fn case_index(&self) -> usize {
        case_index(self.storage_kind(), self.element_type())
    }

    /// Switch to the case at `index`
    ///
    /// The payload is replaced by an empty one only when the case changes.
    /// Returns `false` and keeps the current state for an unknown index.
    pub fn set_case_index(&mut self, index: usize) -> bool {
        let Some((storage, element)) = case_at(index) else {
            return false;
        };
        if index != self.case_index() {
            debug!(
                from = %self.configuration(),
                to = %Configuration::from_kinds(storage, element),
                "switching matrix case"
            );
            *self = Self::empty(storage, element);
        }
        true
    }

    /// Switch to the case named by `configuration`
    ///
    /// Returns `false` and keeps the current state when no case matches.
    pub fn set_configuration(&mut self, configuration: &Configuration) -> bool {
        match configuration.resolve() {
            Ok((storage, element)) => self.set_case_index(case_index(storage, element)),
            Err(err) => {
                warn!(%configuration, %err, "configuration matches no matrix case");
                false
            }
        }
    }

    /// Typed view of a dense payload
    pub fn as_dense<T: VariantElement>(&self) -> Option<&DenseMatrix<T>> {
        T::dense_of(self)
    }

    /// Typed view of a CSR payload
    pub fn as_csr<T: VariantElement>(&self) -> Option<&CsrMatrix<T>> {
        T::csr_of(self)
    }

    /// Replace the payload with a dense matrix of `T`
    ///
    /// Always switches to the dense case of `T`. The row count is
    /// `values.len() / cols`.
    pub fn set_data<T: VariantElement>(&mut self, values: Vec<T>, cols: usize) -> Result<()> {
        let mut dense = DenseMatrix::default();
        dense.set_data(values, cols)?;
        *self = T::wrap_dense(dense);
        Ok(())
    }

    /// Replace the payload with a CSR matrix of `T`
    pub fn set_csr_data<T: VariantElement>(
        &mut self,
        rows: usize,
        cols: usize,
        row_pointers: Vec<u32>,
        col_indices: Vec<u32>,
        values: Vec<T>,
    ) -> Result<()> {
        let csr = CsrMatrix::from_parts(rows, cols, row_pointers, col_indices, values)?;
        *self = T::wrap_csr(csr);
        Ok(())
    }

    /// Fill the active case from a row-major buffer of another type
    ///
    /// Values are range-checked against the active element type; CSR cases
    /// store the non-default cells. On failure the payload is unchanged.
    pub fn convert_data<U: MatrixElement>(&mut self, source: &[U], cols: usize) -> Result<()> {
        dispatch!(self,
            dense m => m.convert_data(source, cols),
            csr m => {
                *m = csr_from_converted(source, cols)?;
                Ok(())
            }
        )
    }

    /// Reset the active case to a default-filled `rows x cols` matrix
    pub fn clear_data(&mut self, rows: usize, cols: usize) -> Result<()> {
        dispatch!(self,
            dense m => m.clear_data(rows, cols),
            csr m => m.resize(rows, cols, 0)
        )
    }

    pub fn rows(&self) -> usize {
        dispatch!(self, m => m.rows())
    }

    pub fn cols(&self) -> usize {
        dispatch!(self, m => m.cols())
    }

    pub fn nnz(&self) -> usize {
        dispatch!(self, m => m.nnz())
    }

    /// Heap bytes held by the active payload
    pub fn bytes(&self) -> usize {
        dispatch!(self, m => m.bytes())
    }

    /// Reshape a dense payload; CSR structure cannot be reshaped in place
    pub fn resize(&mut self, rows: usize, cols: usize) -> Result<()> {
        dispatch!(self,
            dense m => m.resize(rows, cols),
            csr _m => Err(MatrixError::unsupported("resize", StorageKind::Csr.name()))
        )
    }

    /// Reshape with a stored-value reservation, for either storage
    pub fn resize_sparse(&mut self, rows: usize, cols: usize, nnz: usize) -> Result<()> {
        dispatch!(self,
            dense m => m.resize(rows, cols),
            csr m => m.resize(rows, cols, nnz)
        )
    }

    /// Value at `(row, col)` widened to f64
    pub fn value_at(&self, row: usize, col: usize) -> Result<f64> {
        dispatch!(self, m => m
            .get(row, col)
            .map(MatrixElement::to_f64)
            .ok_or(MatrixError::Core(CoreError::IndexOutOfBounds)))
    }

    /// Value at a flat row-major index
    pub fn value_at_index(&self, index: usize) -> Result<f64> {
        let cols = self.cols();
        if cols == 0 {
            return Err(CoreError::IndexOutOfBounds.into());
        }
        self.value_at(index / cols, index % cols)
    }

    /// Overwrite one dense cell, range-checked against the element type
    pub fn set_value_at(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        dispatch!(self,
            dense m => {
                let value = safe_numeric_cast(value)?;
                m.set(row, col, value)?;
                Ok(())
            },
            csr _m => Err(MatrixError::unsupported("set_value_at", StorageKind::Csr.name()))
        )
    }

    /// Run a visitor against the concrete payload
    pub fn visit_elements<V: ElementVisitor>(&self, visitor: V) -> V::Output {
        dispatch!(self, m => visitor.visit(m))
    }

    /// Visit the whole matrix with values widened to f64
    pub fn visit_f64<F>(
        &self,
        coverage: Coverage,
        strategy: Strategy,
        f: F,
        progress: Option<&mut dyn ProgressSink>,
    ) where
        F: Fn(usize, usize, f64) + Sync + Send,
    {
        dispatch!(self, m => m.visit(coverage, strategy, |r, c, v| f(r, c, v.to_f64()), progress))
    }

    /// Visit the given rows with values widened to f64
    pub fn visit_rows_f64<F>(
        &self,
        rows: &[usize],
        coverage: Coverage,
        strategy: Strategy,
        f: F,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<()>
    where
        F: Fn(usize, usize, f64) + Sync + Send,
    {
        dispatch!(self, m => {
            m.visit_rows(rows, coverage, strategy, |r, c, v| f(r, c, v.to_f64()), progress)
        })
    }

    /// Visit a row and column block with values widened to f64
    pub fn visit_block_f64<F>(
        &self,
        rows: &[usize],
        cols: &[usize],
        coverage: Coverage,
        strategy: Strategy,
        f: F,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<()>
    where
        F: Fn(usize, usize, f64) + Sync + Send,
    {
        dispatch!(self, m => {
            m.visit_block(rows, cols, coverage, strategy, |r, c, v| f(r, c, v.to_f64()), progress)
        })
    }

    /// One column as f32
    pub fn extract_column(
        &self,
        col: usize,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<Vec<f32>> {
        let mut out = vec![0f32; self.rows()];
        self.populate_columns(&[col], None, &mut out, progress)?;
        Ok(out)
    }

    /// Two columns as f32 pairs, for all rows or the given rows
    pub fn extract_column_pair(
        &self,
        col_a: usize,
        col_b: usize,
        rows: Option<&[usize]>,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<Vec<[f32; 2]>> {
        let count = rows.map_or(self.rows(), <[usize]>::len);
        let mut flat = vec![0f32; count * 2];
        self.populate_columns(&[col_a, col_b], rows, &mut flat, progress)?;
        Ok(flat.chunks_exact(2).map(|p| [p[0], p[1]]).collect())
    }

    /// Fill `out` row-major with the requested columns, converted to `O`
    pub fn populate_columns<O: MatrixElement>(
        &self,
        cols: &[usize],
        rows: Option<&[usize]>,
        out: &mut [O],
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<()> {
        dispatch!(self, m => m.populate_columns(cols, rows, out, progress))
    }

    /// Element-wise conversion of the whole payload to `T`, same storage
    pub fn to_dense_values<T: MatrixElement>(&self) -> Result<Vec<T>> {
        let cols = self.cols();
        let mut out = vec![T::default(); cell_count(self.rows(), cols)?];
        let all: Vec<usize> = (0..cols).collect();
        dispatch!(self, m => m.populate_columns(&all, None, &mut out, None))?;
        Ok(out)
    }
}
