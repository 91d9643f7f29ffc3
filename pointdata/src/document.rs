//! JSON persistence document
//!
//! A matrix is stored as its case identifiers plus the raw, native-endian
//! buffers of its payload. Each buffer is split into base64 blocks so very
//! large matrices never produce a single oversized string.
//!
//! ```text
//! {
//!   "Version": 1,
//!   "MatrixType": "CSR",
//!   "DataType": "Float32",
//!   "Data": {
//!     "NumberOfPoints": 4, "NumberOfDimensions": 3,
//!     "Values": { "Size": 20, "BlockSize": .., "NumberOfBlocks": 1,
//!                 "Blocks": [{ "Offset": 0, "Size": 20, "Data": "..." }] },
//!     "ValuesSize": 5,
//!     "RowOffsets": { .. }, "RowOffsetsSize": 5,
//!     "ColIndices": { .. }, "ColIndicesSize": 5
//!   }
//! }
//! ```
//!
//! Decoding validates every field and builds the complete payload before
//! the variant is touched.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytemuck::Pod;
use pointdata_core::{
    keys, validate_dense_len, Configuration, PointMatrix, StorageKind, DEFAULT_MAX_BLOCK_SIZE,
    DOCUMENT_VERSION,
};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::csr::CsrMatrix;
use crate::dense::DenseMatrix;
use crate::error::{MatrixError, Result};
use crate::variant::{dispatch, with_element_type, ElementTypeOp, MatrixVariant, VariantElement};

/// Legacy name of the `DataType` field
const LEGACY_ELEMENT_TYPE: &str = "ElementType";

/// Encode a buffer as a block map
pub fn encode_raw<T: Pod>(values: &[T], block_size: usize) -> Value {
    let bytes: &[u8] = bytemuck::cast_slice(values);
    let block_size = block_size.max(1);
    let blocks: Vec<Value> = bytes
        .chunks(block_size)
        .enumerate()
        .map(|(i, chunk)| {
            json!({
                keys::OFFSET: i * block_size,
                keys::SIZE: chunk.len(),
                keys::BLOCK_DATA: STANDARD.encode(chunk),
            })
        })
        .collect();

    json!({
        keys::SIZE: bytes.len(),
        keys::BLOCK_SIZE: block_size,
        keys::NUMBER_OF_BLOCKS: blocks.len(),
        keys::BLOCKS: blocks,
    })
}

/// Decode a block map into exactly `len` elements
///
/// Blocks must tile the buffer in order without gaps or overlap.
pub fn decode_raw<T: Pod>(raw: &Value, len: usize) -> Result<Vec<T>> {
    let raw = as_object(raw, "raw buffer")?;
    let size = usize_field(raw, keys::SIZE)?;
    let blocks = field(raw, keys::BLOCKS)?
        .as_array()
        .ok_or_else(|| MatrixError::malformed("Blocks is not an array"))?;
    if let Some(count) = raw.get(keys::NUMBER_OF_BLOCKS) {
        if count.as_u64() != Some(blocks.len() as u64) {
            return Err(MatrixError::malformed("NumberOfBlocks disagrees with Blocks"));
        }
    }

    let byte_len = len
        .checked_mul(std::mem::size_of::<T>())
        .ok_or_else(|| MatrixError::malformed("element count overflows"))?;
    if size != byte_len {
        return Err(MatrixError::malformed(format!(
            "buffer holds {size} bytes, expected {byte_len}"
        )));
    }

    // Grows with the decoded blocks so a lying size cannot force an allocation
    let mut bytes: Vec<u8> = Vec::new();
    for block in blocks {
        let block = as_object(block, "block")?;
        let offset = usize_field(block, keys::OFFSET)?;
        let block_size = usize_field(block, keys::SIZE)?;
        let data = field(block, keys::BLOCK_DATA)?
            .as_str()
            .ok_or_else(|| MatrixError::malformed("block data is not a string"))?;

        let cursor = bytes.len();
        if offset != cursor || block_size > byte_len - cursor {
            return Err(MatrixError::malformed(format!(
                "block at offset {offset} does not continue at {cursor}"
            )));
        }
        let decoded = STANDARD.decode(data)?;
        if decoded.len() != block_size {
            return Err(MatrixError::malformed(format!(
                "block at offset {offset} decodes to {} bytes, expected {block_size}",
                decoded.len()
            )));
        }
        bytes.extend_from_slice(&decoded);
    }

    if bytes.len() != byte_len {
        return Err(MatrixError::malformed(format!(
            "blocks cover {} of {byte_len} bytes",
            bytes.len()
        )));
    }
    let mut out = vec![T::zeroed(); len];
    bytemuck::cast_slice_mut::<T, u8>(&mut out).copy_from_slice(&bytes);
    Ok(out)
}

fn field<'a>(map: &'a Map<String, Value>, key: &'static str) -> Result<&'a Value> {
    map.get(key).ok_or(MatrixError::MissingField(key))
}

fn usize_field(map: &Map<String, Value>, key: &'static str) -> Result<usize> {
    field(map, key)?
        .as_u64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| MatrixError::malformed(format!("{key} is not an unsigned integer")))
}

fn str_field<'a>(map: &'a Map<String, Value>, key: &'static str) -> Result<&'a str> {
    field(map, key)?
        .as_str()
        .ok_or_else(|| MatrixError::malformed(format!("{key} is not a string")))
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| MatrixError::malformed(format!("{what} is not an object")))
}

trait DocumentPayload {
    fn to_data(&self, block_size: usize) -> Value;
}

impl<T: VariantElement> DocumentPayload for DenseMatrix<T> {
    fn to_data(&self, block_size: usize) -> Value {
        json!({
            keys::NUMBER_OF_POINTS: self.rows(),
            keys::NUMBER_OF_DIMENSIONS: self.cols(),
            keys::VALUES: encode_raw(self.values(), block_size),
            keys::VALUES_SIZE: self.values().len(),
        })
    }
}

impl<T: VariantElement> DocumentPayload for CsrMatrix<T> {
    fn to_data(&self, block_size: usize) -> Value {
        json!({
            keys::NUMBER_OF_POINTS: self.rows(),
            keys::NUMBER_OF_DIMENSIONS: self.cols(),
            keys::ROW_OFFSETS: encode_raw(self.row_pointers(), block_size),
            keys::ROW_OFFSETS_SIZE: self.row_pointers().len(),
            keys::COL_INDICES: encode_raw(self.col_indices(), block_size),
            keys::COL_INDICES_SIZE: self.col_indices().len(),
            keys::VALUES: encode_raw(self.values(), block_size),
            keys::VALUES_SIZE: self.values().len(),
        })
    }
}

/// Decode the `Data` map of the case with element `T`
struct DecodePayload<'a> {
    storage: StorageKind,
    data: &'a Map<String, Value>,
}

impl ElementTypeOp for DecodePayload<'_> {
    type Output = Result<MatrixVariant>;

    fn call<T: VariantElement>(self) -> Result<MatrixVariant> {
        let data = self.data;
        let rows = usize_field(data, keys::NUMBER_OF_POINTS)?;
        let cols = usize_field(data, keys::NUMBER_OF_DIMENSIONS)?;
        let values_raw = field(data, keys::VALUES)?;
        let values_len = usize_field(data, keys::VALUES_SIZE)?;

        match self.storage {
            StorageKind::Dense => {
                validate_dense_len(rows, cols, values_len)?;
                let values = decode_raw::<T>(values_raw, values_len)?;
                Ok(T::wrap_dense(DenseMatrix::from_vec(rows, cols, values)?))
            }
            StorageKind::Csr => {
                let row_raw = field(data, keys::ROW_OFFSETS)?;
                let row_len = usize_field(data, keys::ROW_OFFSETS_SIZE)?;
                let col_raw = field(data, keys::COL_INDICES)?;
                let col_len = usize_field(data, keys::COL_INDICES_SIZE)?;

                let row_pointers = decode_raw::<u32>(row_raw, row_len)?;
                let col_indices = decode_raw::<u32>(col_raw, col_len)?;
                let values = decode_raw::<T>(values_raw, values_len)?;
                let csr = CsrMatrix::from_parts(rows, cols, row_pointers, col_indices, values)?;
                Ok(T::wrap_csr(csr))
            }
        }
    }
}

fn decode_document(document: &Value) -> Result<MatrixVariant> {
    let root = as_object(document, "document")?;

    let version = field(root, keys::VERSION)?
        .as_u64()
        .ok_or_else(|| MatrixError::malformed("Version is not an unsigned integer"))?;
    if version == 0 || version > DOCUMENT_VERSION {
        return Err(MatrixError::malformed(format!(
            "unsupported document version {version}"
        )));
    }

    let storage = str_field(root, keys::MATRIX_TYPE)?;
    let element = match root
        .get(keys::DATA_TYPE)
        .or_else(|| root.get(LEGACY_ELEMENT_TYPE))
    {
        Some(value) => value
            .as_str()
            .ok_or_else(|| MatrixError::malformed("DataType is not a string"))?,
        None => return Err(MatrixError::MissingField(keys::DATA_TYPE)),
    };
    let data = as_object(field(root, keys::DATA)?, keys::DATA)?;

    let configuration = Configuration::new(storage, element);
    let (storage, element) = configuration
        .resolve()
        .map_err(|_| MatrixError::configuration_mismatch(storage, element))?;

    with_element_type(element, DecodePayload { storage, data })
}

impl MatrixVariant {
    /// Document of the active case with the default block size
    pub fn to_document(&self) -> Value {
        self.to_document_with_block_size(DEFAULT_MAX_BLOCK_SIZE)
    }

    /// Document of the active case, splitting buffers into `block_size` bytes
    pub fn to_document_with_block_size(&self, block_size: usize) -> Value {
        let configuration = self.configuration();
        let data = dispatch!(self, m => m.to_data(block_size));
        debug!(%configuration, rows = self.rows(), nnz = self.nnz(), "encoded matrix document");
        json!({
            keys::VERSION: DOCUMENT_VERSION,
            keys::MATRIX_TYPE: configuration.storage_name(),
            keys::DATA_TYPE: configuration.element_name(),
            keys::DATA: data,
        })
    }

    /// Replace the payload with the one described by `document`
    ///
    /// On error the variant keeps its prior case and contents.
    pub fn from_document(&mut self, document: &Value) -> Result<()> {
        match decode_document(document) {
            Ok(variant) => {
                debug!(
                    configuration = %variant.configuration(),
                    rows = variant.rows(),
                    nnz = variant.nnz(),
                    "decoded matrix document"
                );
                *self = variant;
                Ok(())
            }
            Err(err) => {
                warn!(%err, "rejected matrix document");
                Err(err)
            }
        }
    }
}
