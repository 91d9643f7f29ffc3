//! Element type selection when storing loader data
//!
//! A loader hands over a typed buffer plus a [`StorageConfiguration`]. The
//! selection either names a concrete element type, keeps the source type,
//! or asks for the narrowest type that can hold the data.

use pointdata_core::{
    in_range, safe_numeric_cast, unchecked_numeric_cast, ElementSelection, ElementType,
    MatrixElement, StorageConfiguration, StorageKind,
};
use tracing::{debug, warn};

use crate::csr::CsrMatrix;
use crate::dense::DenseMatrix;
use crate::error::{MatrixError, Result};
use crate::variant::{with_element_type, ElementTypeOp, MatrixVariant, VariantElement};

use ElementType::*;

const SIGNED_CANDIDATES: [ElementType; 3] = [Int8, Int16, Int32];
const SIGNED_CANDIDATES_BF16: [ElementType; 4] = [Int8, Int16, Bfloat16, Int32];
const UNSIGNED_CANDIDATES: [ElementType; 6] = [Uint8, Uint16, Uint32, Float32, Uint64, Float64];
const UNSIGNED_CANDIDATES_BF16: [ElementType; 7] =
    [Uint8, Uint16, Bfloat16, Uint32, Float32, Uint64, Float64];
const FLOAT_CANDIDATES: [ElementType; 2] = [Float32, Float64];
const FLOAT_CANDIDATES_BF16: [ElementType; 3] = [Bfloat16, Float32, Float64];

/// Smallest and largest value, ignoring NaN
fn min_max<T: MatrixElement>(values: &[T]) -> Option<(T, T)> {
    values
        .iter()
        .copied()
        .filter(|v| !v.to_f64().is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((
                if v < lo { v } else { lo },
                if v > hi { v } else { hi },
            )),
        })
}

fn integer_valued<T: MatrixElement>(values: &[T]) -> bool {
    T::IS_INTEGER
        || values.iter().all(|v| {
            let v = v.to_f64();
            v.is_finite() && v.fract() == 0.0
        })
}

/// Whether candidate `U` can hold a buffer of `T`
struct Fits<'a, T> {
    values: &'a [T],
    min: T,
    max: T,
    exact: bool,
}

impl<T: MatrixElement> ElementTypeOp for Fits<'_, T> {
    type Output = bool;

    fn call<U: VariantElement>(self) -> bool {
        if U::size_bytes() > T::size_bytes() || !in_range::<U, T>(self.min, self.max) {
            return false;
        }
        !self.exact
            || self.values.iter().all(|&v| {
                let back: T = unchecked_numeric_cast(unchecked_numeric_cast::<U, T>(v));
                back == v || (back.to_f64().is_nan() && v.to_f64().is_nan())
            })
    }
}

/// Narrowest candidate type holding `values`
///
/// Integer-valued data with a negative minimum tries signed types, other
/// integer-valued data unsigned types, then floats are tried. A candidate is
/// never wider than `T`. Apart from bfloat16, which is only offered when
/// `allow_bfloat16` is set, every accepted candidate reproduces each value
/// exactly. Returns `T`'s own type when nothing narrower fits.
pub fn optimal_element_type<T: MatrixElement>(values: &[T], allow_bfloat16: bool) -> ElementType {
    let Some((min, max)) = min_max(values) else {
        return T::element_type();
    };

    let integer: &[ElementType] = if integer_valued(values) {
        match (min.to_f64() < 0.0, allow_bfloat16) {
            (true, true) => &SIGNED_CANDIDATES_BF16,
            (true, false) => &SIGNED_CANDIDATES,
            (false, true) => &UNSIGNED_CANDIDATES_BF16,
            (false, false) => &UNSIGNED_CANDIDATES,
        }
    } else {
        &[]
    };
    let floats: &[ElementType] = if allow_bfloat16 {
        &FLOAT_CANDIDATES_BF16
    } else {
        &FLOAT_CANDIDATES
    };

    integer
        .iter()
        .chain(floats)
        .copied()
        .find(|&candidate| {
            with_element_type(
                candidate,
                Fits {
                    values,
                    min,
                    max,
                    exact: candidate != Bfloat16,
                },
            )
        })
        .unwrap_or_else(T::element_type)
}

/// Element type that `selection` resolves to for `values`
pub fn select_element_type<T: MatrixElement>(
    selection: ElementSelection,
    values: &[T],
) -> ElementType {
    match selection {
        ElementSelection::Concrete(element) => element,
        ElementSelection::Original => T::element_type(),
        ElementSelection::Lossless => optimal_element_type(values, false),
        ElementSelection::Bfloat16 => optimal_element_type(values, true),
    }
}

fn wrap<U: VariantElement>(dense: DenseMatrix<U>, storage: StorageKind) -> Result<MatrixVariant> {
    Ok(match storage {
        StorageKind::Dense => U::wrap_dense(dense),
        StorageKind::Csr => U::wrap_csr(CsrMatrix::from_dense(&dense)?),
    })
}

/// Build a payload of element `U` from a row-major buffer
struct ConvertDense<'a, T> {
    storage: StorageKind,
    values: &'a [T],
    cols: usize,
}

impl<T: MatrixElement> ElementTypeOp for ConvertDense<'_, T> {
    type Output = Result<MatrixVariant>;

    fn call<U: VariantElement>(self) -> Result<MatrixVariant> {
        let mut dense = DenseMatrix::<U>::default();
        dense.convert_data(self.values, self.cols)?;
        wrap(dense, self.storage)
    }
}

/// Build a payload of element `U` from CSR parts
struct ConvertCsr<'a, T> {
    storage: StorageKind,
    rows: usize,
    cols: usize,
    row_pointers: &'a [u32],
    col_indices: &'a [u32],
    values: &'a [T],
}

impl<T: MatrixElement> ElementTypeOp for ConvertCsr<'_, T> {
    type Output = Result<MatrixVariant>;

    fn call<U: VariantElement>(self) -> Result<MatrixVariant> {
        let values = self
            .values
            .iter()
            .map(|&v| safe_numeric_cast::<U, T>(v))
            .collect::<std::result::Result<Vec<U>, _>>()?;
        let csr = CsrMatrix::from_parts(
            self.rows,
            self.cols,
            self.row_pointers.to_vec(),
            self.col_indices.to_vec(),
            values,
        )?;
        Ok(match self.storage {
            StorageKind::Csr => U::wrap_csr(csr),
            StorageKind::Dense => U::wrap_dense(DenseMatrix::from_csr(&csr)?),
        })
    }
}

/// Build with the selected element type
///
/// A concrete type that cannot hold the data falls back to lossless
/// optimisation.
fn build_selected<T, B>(
    configuration: StorageConfiguration,
    values: &[T],
    build: B,
) -> Result<(MatrixVariant, ElementType)>
where
    T: MatrixElement,
    B: Fn(ElementType) -> Result<MatrixVariant>,
{
    let element = select_element_type(configuration.selection, values);
    match build(element) {
        Ok(variant) => Ok((variant, element)),
        Err(MatrixError::Core(err)) if !configuration.selection.is_special() => {
            let fallback = optimal_element_type(values, false);
            warn!(requested = %element, %fallback, %err, "requested element type cannot hold data");
            Ok((build(fallback)?, fallback))
        }
        Err(err) => Err(err),
    }
}

impl MatrixVariant {
    /// Store a row-major buffer using a requested storage configuration
    ///
    /// Returns the element type that was chosen. On failure the current
    /// payload is unchanged.
    pub fn set_data_as<T: VariantElement>(
        &mut self,
        configuration: StorageConfiguration,
        values: Vec<T>,
        cols: usize,
    ) -> Result<ElementType> {
        let element = select_element_type(configuration.selection, &values);
        let chosen = if element == T::element_type() {
            let mut dense = DenseMatrix::<T>::default();
            dense.set_data(values, cols)?;
            *self = wrap(dense, configuration.storage)?;
            element
        } else {
            let (variant, chosen) = build_selected(configuration, &values, |element| {
                with_element_type(
                    element,
                    ConvertDense {
                        storage: configuration.storage,
                        values: &values,
                        cols,
                    },
                )
            })?;
            *self = variant;
            chosen
        };
        debug!(
            storage = configuration.storage.name(),
            selection = configuration.selection.name(),
            source = %T::element_type(),
            stored = %chosen,
            "stored point data"
        );
        Ok(chosen)
    }

    /// Store CSR parts using a requested storage configuration
    ///
    /// Optimisation considers the stored values only; the implicit zero fits
    /// every candidate.
    pub fn set_csr_data_as<T: VariantElement>(
        &mut self,
        configuration: StorageConfiguration,
        rows: usize,
        cols: usize,
        row_pointers: Vec<u32>,
        col_indices: Vec<u32>,
        values: Vec<T>,
    ) -> Result<ElementType> {
        let (variant, chosen) = build_selected(configuration, &values, |element| {
            with_element_type(
                element,
                ConvertCsr {
                    storage: configuration.storage,
                    rows,
                    cols,
                    row_pointers: &row_pointers,
                    col_indices: &col_indices,
                    values: &values,
                },
            )
        })?;
        *self = variant;
        debug!(
            storage = configuration.storage.name(),
            selection = configuration.selection.name(),
            source = %T::element_type(),
            stored = %chosen,
            "stored sparse point data"
        );
        Ok(chosen)
    }
}
