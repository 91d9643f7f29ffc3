//! Error types for point-data matrix operations

/// Errors raised by the format and validation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// A numeric value does not fit the target element type
    OutOfRange,
    /// Element type name is not part of the supported set
    UnknownElementType,
    /// Storage kind name is not part of the supported set
    UnknownStorageType,
    /// Row pointer array is malformed
    InvalidRowPointers,
    /// Column index array is malformed
    InvalidColumnIndices,
    /// Buffer length disagrees with the stated shape
    LengthMismatch,
    /// Row or column index out of bounds
    IndexOutOfBounds,
}

impl core::fmt::Display for CoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            CoreError::OutOfRange => "Value out of range for target element type",
            CoreError::UnknownElementType => "Unknown element type",
            CoreError::UnknownStorageType => "Unknown storage type",
            CoreError::InvalidRowPointers => "Invalid CSR row pointers",
            CoreError::InvalidColumnIndices => "Invalid CSR column indices",
            CoreError::LengthMismatch => "Buffer length does not match matrix shape",
            CoreError::IndexOutOfBounds => "Index out of bounds",
        };
        write!(f, "{msg}")
    }
}

/// Result type for core operations
pub type Result<T> = core::result::Result<T, CoreError>;
