//! Abstract interfaces for point-data matrices
//!
//! Traits are pure interfaces here. Storage implementations live in the
//! `pointdata` crate.

pub mod element;
pub mod index;
pub mod matrix;
pub mod progress;

pub use element::MatrixElement;
pub use index::SparseIndex;
pub use matrix::{MatrixMut, PointMatrix};
pub use progress::{CountingProgress, ProgressSink};
