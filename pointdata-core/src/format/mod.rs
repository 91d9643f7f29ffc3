//! Identifier definitions for point-data matrix storage
//!
//! Names of element types and storage kinds, and the configurations built
//! from them. No matrix storage lives here.

pub mod configuration;
pub mod constants;
pub mod element_type;

pub use configuration::{
    case_at, case_index, ElementSelection, StorageConfiguration, StorageKind, CASE_COUNT,
};
#[cfg(feature = "alloc")]
pub use configuration::{supported_storage_types, Configuration};
pub use constants::{keys, DEFAULT_MAX_BLOCK_SIZE, DOCUMENT_VERSION};
pub use element_type::ElementType;
