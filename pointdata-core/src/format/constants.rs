//! Persistence document constants

/// Current document version
pub const DOCUMENT_VERSION: u64 = 1;

/// Largest raw block written into a single base64 string
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 128 * 1024 * 1024;

/// Document field names
pub mod keys {
    pub const VERSION: &str = "Version";
    pub const MATRIX_TYPE: &str = "MatrixType";
    pub const DATA_TYPE: &str = "DataType";
    pub const DATA: &str = "Data";

    pub const NUMBER_OF_POINTS: &str = "NumberOfPoints";
    pub const NUMBER_OF_DIMENSIONS: &str = "NumberOfDimensions";
    pub const VALUES: &str = "Values";
    pub const VALUES_SIZE: &str = "ValuesSize";
    pub const ROW_OFFSETS: &str = "RowOffsets";
    pub const ROW_OFFSETS_SIZE: &str = "RowOffsetsSize";
    pub const COL_INDICES: &str = "ColIndices";
    pub const COL_INDICES_SIZE: &str = "ColIndicesSize";

    pub const SIZE: &str = "Size";
    pub const BLOCK_SIZE: &str = "BlockSize";
    pub const NUMBER_OF_BLOCKS: &str = "NumberOfBlocks";
    pub const BLOCKS: &str = "Blocks";
    pub const OFFSET: &str = "Offset";
    pub const BLOCK_DATA: &str = "Data";
}
