//! Structural validation utilities
//!
//! Pure functions over shapes, lengths and index arrays. Storage types call
//! these before accepting external buffers.

pub mod bounds;
pub mod csr;

pub use bounds::{
    cell_count, element_count, rows_from_len, validate_dense_len, validate_indices,
};
pub use csr::validate_csr_layout;
