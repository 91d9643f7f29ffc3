//! Point data - dense and CSR matrices with parallel element visitation
//!
//! This library stores point data (rows are points, columns are dimensions)
//! in one of two layouts and eleven element types, selected at runtime, and
//! walks it with rayon under several work-splitting strategies.
//!
//! ## Architecture
//!
//! Point data is split into a format layer and a storage layer:
//!
//! - **pointdata-core**: element types, numeric limits, safe casts, storage
//!   names and structural validation (`no_std`, no buffers)
//! - **pointdata**: matrix storage, visitation, progress relay, storage
//!   selection and the persistence document
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pointdata::{
//!     Coverage, ElementSelection, MatrixVariant, StorageConfiguration, StorageKind, Strategy,
//! };
//!
//! fn example() -> pointdata::Result<()> {
//!     let mut points = MatrixVariant::default();
//!
//!     // 4 points with 3 dimensions, stored sparse in the narrowest exact type
//!     let config = StorageConfiguration::new(StorageKind::Csr, ElementSelection::Lossless);
//!     let values = vec![1.0f32, 0.0, 3.0, 0.0, 5.0, 0.0, 7.0, 0.0, 9.0, 0.0, 0.0, 0.0];
//!     points.set_data_as(config, values, 3)?;
//!
//!     // Visit stored values on all workers
//!     points.visit_f64(Coverage::Sparse, Strategy::RowParallel, |row, col, value| {
//!         println!("({row}, {col}) = {value}");
//!     }, None);
//!
//!     let column = points.extract_column(1, None)?;
//!     assert_eq!(column, vec![0.0, 5.0, 0.0, 0.0]);
//!
//!     let document = points.to_document();
//!     let mut restored = MatrixVariant::default();
//!     restored.from_document(&document)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Two layouts**: row-major dense and compressed sparse row
//! - **Visitation strategies**: sequential, row-parallel and column-parallel,
//!   over all cells or only non-default cells
//! - **Progress relay**: per-row or per-column progress forwarded to a sink
//!   from a dedicated thread
//! - **Storage selection**: keep the source type or pick the narrowest type
//!   that holds the data
//! - **Persistence**: JSON documents with base64 block-encoded buffers

// Re-export core abstractions and format definitions
pub use pointdata_core::{
    // Element model
    bf16, ElementType, MatrixElement, NumericLimits, SparseIndex,
    // Matrix capabilities
    CountingProgress, MatrixMut, PointMatrix, ProgressSink,
    // Storage naming
    case_at, case_index, supported_storage_types, Configuration, ElementSelection,
    StorageConfiguration, StorageKind, CASE_COUNT,
    // Numeric conversions
    in_range, safe_numeric_cast, unchecked_numeric_cast,
    // Errors
    CoreError,
};

// Implementation modules
pub mod config;
pub mod csr;
pub mod dense;
pub mod document;
pub mod error;
pub mod progress;
pub mod storage;
pub mod variant;
pub mod visit;

// Public exports
pub use config::ExecutionConfig;
pub use csr::CsrMatrix;
pub use dense::DenseMatrix;
pub use document::{decode_raw, encode_raw};
pub use error::{MatrixError, Result};
pub use progress::{with_progress, ProgressReporter};
pub use storage::{optimal_element_type, select_element_type};
pub use variant::{
    with_element_type, ElementTypeOp, ElementVisitor, MatrixVariant, VariantElement,
};
pub use visit::{Coverage, ExtractElements, Strategy, VisitElements};
