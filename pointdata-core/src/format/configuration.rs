//! Storage configuration
//!
//! A configuration pairs a storage kind with an element type by name. Loaders
//! build one from persisted identifiers and the matrix variant matches it
//! against its closed set of cases.

#[cfg(feature = "alloc")]
use alloc::{string::String, vec::Vec};

use crate::format::ElementType;
use crate::{CoreError, Result};

/// Matrix storage layouts
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StorageKind {
    /// Row-major buffer holding every cell
    Dense = 0,
    /// Compressed sparse row
    Csr = 1,
}

impl StorageKind {
    pub const COUNT: usize = 2;

    pub const ALL: [StorageKind; Self::COUNT] = [StorageKind::Dense, StorageKind::Csr];

    /// Stable identifier used in configurations and documents
    pub const fn name(self) -> &'static str {
        match self {
            StorageKind::Dense => "Dense",
            StorageKind::Csr => "CSR",
        }
    }

    /// Look up a storage kind by identifier, accepting the legacy
    /// `"Full"` and `"Sparse"` names
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Dense" | "Full" => Some(StorageKind::Dense),
            "CSR" | "Sparse" => Some(StorageKind::Csr),
            _ => None,
        }
    }
}

impl core::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl core::str::FromStr for StorageKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or(CoreError::UnknownStorageType)
    }
}

/// Number of (storage, element) cases in the closed set
pub const CASE_COUNT: usize = StorageKind::COUNT * ElementType::COUNT;

/// Flat case index of a (storage, element) pair
pub const fn case_index(storage: StorageKind, element: ElementType) -> usize {
    storage as usize * ElementType::COUNT + element as usize
}

/// Inverse of [`case_index`]
pub const fn case_at(index: usize) -> Option<(StorageKind, ElementType)> {
    if index >= CASE_COUNT {
        return None;
    }
    let storage = StorageKind::ALL[index / ElementType::COUNT];
    let element = ElementType::ALL[index % ElementType::COUNT];
    Some((storage, element))
}

/// A (storage kind, element type) pair identified by name
///
/// Equality is structural on the two identifier strings, so `"Full"` and
/// `"Dense"` compare unequal even though both resolve to the same case.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Configuration {
    storage: String,
    element: String,
}

#[cfg(feature = "alloc")]
impl Configuration {
    pub fn new(storage: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            storage: storage.into(),
            element: element.into(),
        }
    }

    /// Configuration naming a resolved case
    pub fn from_kinds(storage: StorageKind, element: ElementType) -> Self {
        Self::new(storage.name(), element.name())
    }

    /// Configuration for the element type `T`
    pub fn for_element<T: crate::MatrixElement>(storage: StorageKind) -> Self {
        Self::from_kinds(storage, T::element_type())
    }

    pub fn storage_name(&self) -> &str {
        &self.storage
    }

    pub fn element_name(&self) -> &str {
        &self.element
    }

    /// Resolve both names against the supported set
    pub fn resolve(&self) -> Result<(StorageKind, ElementType)> {
        let storage = self.storage.parse()?;
        let element = self.element.parse()?;
        Ok((storage, element))
    }
}

#[cfg(feature = "alloc")]
impl core::fmt::Display for Configuration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}<{}>", self.storage, self.element)
    }
}

/// Element type requested when storing data
///
/// Besides a concrete element type, a loader may ask to keep the source type
/// or to pick the narrowest type that holds the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementSelection {
    Concrete(ElementType),
    /// Keep the element type of the source buffer
    Original,
    /// Narrowest type holding every value exactly
    Lossless,
    /// Narrowest type, allowing bfloat16 truncation
    Bfloat16,
}

impl ElementSelection {
    /// Identifiers of the non-concrete selections
    pub const SPECIAL_NAMES: [&'static str; 3] =
        ["Original", "Optimized (lossless)", "Optimized (bfloat16)"];

    pub fn name(self) -> &'static str {
        match self {
            ElementSelection::Concrete(ty) => ty.name(),
            ElementSelection::Original => Self::SPECIAL_NAMES[0],
            ElementSelection::Lossless => Self::SPECIAL_NAMES[1],
            ElementSelection::Bfloat16 => Self::SPECIAL_NAMES[2],
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Original" => Some(ElementSelection::Original),
            "Optimized (lossless)" => Some(ElementSelection::Lossless),
            "Optimized (bfloat16)" => Some(ElementSelection::Bfloat16),
            other => ElementType::from_name(other).map(ElementSelection::Concrete),
        }
    }

    pub const fn is_special(self) -> bool {
        !matches!(self, ElementSelection::Concrete(_))
    }
}

/// Storage kind plus element selection, as requested by a loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageConfiguration {
    pub storage: StorageKind,
    pub selection: ElementSelection,
}

impl StorageConfiguration {
    pub const fn new(storage: StorageKind, selection: ElementSelection) -> Self {
        Self { storage, selection }
    }

    /// Parse from the two identifiers
    pub fn from_names(storage: &str, selection: &str) -> Result<Self> {
        let storage = storage.parse()?;
        let selection =
            ElementSelection::from_name(selection).ok_or(CoreError::UnknownElementType)?;
        Ok(Self { storage, selection })
    }
}

impl Default for StorageConfiguration {
    fn default() -> Self {
        Self::new(StorageKind::Dense, ElementSelection::Original)
    }
}

/// Storage names mapped to every selection name they accept
///
/// Each list starts with the special selections followed by the element
/// type identifiers in discriminant order.
#[cfg(feature = "alloc")]
pub fn supported_storage_types() -> hashbrown::HashMap<&'static str, Vec<&'static str>> {
    StorageKind::ALL
        .iter()
        .map(|storage| {
            let names = ElementSelection::SPECIAL_NAMES
                .iter()
                .copied()
                .chain(ElementType::ALL.iter().map(|ty| ty.name()))
                .collect();
            (storage.name(), names)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_index_round_trip() {
        for index in 0..CASE_COUNT {
            let (storage, element) = case_at(index).unwrap();
            assert_eq!(case_index(storage, element), index);
        }
        assert_eq!(case_at(CASE_COUNT), None);
        assert_eq!(case_index(StorageKind::Dense, ElementType::Float32), 0);
    }

    #[test]
    fn test_storage_names() {
        assert_eq!(StorageKind::from_name("Full"), Some(StorageKind::Dense));
        assert_eq!(StorageKind::from_name("Sparse"), Some(StorageKind::Csr));
        assert_eq!("CSR".parse::<StorageKind>(), Ok(StorageKind::Csr));
        assert_eq!(
            "COO".parse::<StorageKind>(),
            Err(CoreError::UnknownStorageType)
        );
    }

    #[test]
    fn test_selection_names() {
        assert_eq!(
            ElementSelection::from_name("Optimized (lossless)"),
            Some(ElementSelection::Lossless)
        );
        assert_eq!(
            ElementSelection::from_name("Int16"),
            Some(ElementSelection::Concrete(ElementType::Int16))
        );
        assert!(ElementSelection::Original.is_special());
        assert_eq!(
            StorageConfiguration::from_names("Dense", "Bogus"),
            Err(CoreError::UnknownElementType)
        );
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn test_configuration_resolve() {
        let config = Configuration::new("CSR", "Int32");
        assert_eq!(config.resolve(), Ok((StorageKind::Csr, ElementType::Int32)));
        assert_eq!(
            Configuration::new("CSR", "Complex64").resolve(),
            Err(CoreError::UnknownElementType)
        );
        assert_ne!(Configuration::new("Full", "Int32"), Configuration::new("Dense", "Int32"));
        assert_eq!(
            Configuration::for_element::<f32>(StorageKind::Dense),
            Configuration::new("Dense", "Float32")
        );
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn test_supported_storage_types() {
        let map = supported_storage_types();
        assert_eq!(map.len(), 2);
        let dense = &map["Dense"];
        assert_eq!(dense.len(), 3 + ElementType::COUNT);
        assert_eq!(dense[0], "Original");
        assert_eq!(dense[3], "Float32");
    }
}
