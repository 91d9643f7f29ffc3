//! Element type identifiers
//!
//! The closed set of numeric types a point-data matrix can store, together
//! with the stable names used for configuration matching and persistence.

/// Supported matrix element types
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementType {
    /// 32-bit floating point
    Float32 = 0,
    /// 64-bit floating point
    Float64 = 1,
    /// 16-bit brain floating point
    Bfloat16 = 2,
    /// 8-bit signed integer
    Int8 = 3,
    /// 16-bit signed integer
    Int16 = 4,
    /// 32-bit signed integer
    Int32 = 5,
    /// 64-bit signed integer
    Int64 = 6,
    /// 8-bit unsigned integer
    Uint8 = 7,
    /// 16-bit unsigned integer
    Uint16 = 8,
    /// 32-bit unsigned integer
    Uint32 = 9,
    /// 64-bit unsigned integer
    Uint64 = 10,
}

impl ElementType {
    /// Number of supported element types
    pub const COUNT: usize = 11;

    /// All element types in discriminant order
    pub const ALL: [ElementType; Self::COUNT] = [
        ElementType::Float32,
        ElementType::Float64,
        ElementType::Bfloat16,
        ElementType::Int8,
        ElementType::Int16,
        ElementType::Int32,
        ElementType::Int64,
        ElementType::Uint8,
        ElementType::Uint16,
        ElementType::Uint32,
        ElementType::Uint64,
    ];

    /// Convert from u8 representation
    pub const fn from_u8(value: u8) -> Option<Self> {
        if (value as usize) < Self::COUNT {
            Some(Self::ALL[value as usize])
        } else {
            None
        }
    }

    /// Convert to u8 representation
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Stable identifier used in configurations and documents
    pub const fn name(self) -> &'static str {
        match self {
            ElementType::Float32 => "Float32",
            ElementType::Float64 => "Float64",
            ElementType::Bfloat16 => "Bfloat16",
            ElementType::Int8 => "Int8",
            ElementType::Int16 => "Int16",
            ElementType::Int32 => "Int32",
            ElementType::Int64 => "Int64",
            ElementType::Uint8 => "Uint8",
            ElementType::Uint16 => "Uint16",
            ElementType::Uint32 => "Uint32",
            ElementType::Uint64 => "Uint64",
        }
    }

    /// Look up an element type by its identifier
    ///
    /// `"Unt16"` is accepted as an alias of `"Uint16"` so documents written
    /// with the old misspelt identifier still load.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "Unt16" {
            return Some(ElementType::Uint16);
        }
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Size of a single element in bytes
    pub const fn size_bytes(self) -> usize {
        match self {
            ElementType::Int8 | ElementType::Uint8 => 1,
            ElementType::Bfloat16 | ElementType::Int16 | ElementType::Uint16 => 2,
            ElementType::Float32 | ElementType::Int32 | ElementType::Uint32 => 4,
            ElementType::Float64 | ElementType::Int64 | ElementType::Uint64 => 8,
        }
    }

    pub const fn is_integer(self) -> bool {
        !matches!(
            self,
            ElementType::Float32 | ElementType::Float64 | ElementType::Bfloat16
        )
    }

    pub const fn is_signed(self) -> bool {
        !matches!(
            self,
            ElementType::Uint8 | ElementType::Uint16 | ElementType::Uint32 | ElementType::Uint64
        )
    }
}

impl core::fmt::Display for ElementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl core::str::FromStr for ElementType {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or(crate::CoreError::UnknownElementType)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for ty in ElementType::ALL {
            assert_eq!(ElementType::from_name(ty.name()), Some(ty));
            assert_eq!(ElementType::from_u8(ty.as_u8()), Some(ty));
        }
        assert_eq!(ElementType::from_name("Complex64"), None);
        assert_eq!(ElementType::from_u8(11), None);
    }

    #[test]
    fn test_legacy_uint16_alias() {
        assert_eq!(ElementType::from_name("Unt16"), Some(ElementType::Uint16));
        assert_eq!(ElementType::Uint16.name(), "Uint16");
    }

    #[test]
    fn test_classification() {
        assert_eq!(ElementType::Bfloat16.size_bytes(), 2);
        assert_eq!(ElementType::Uint64.size_bytes(), 8);
        assert!(!ElementType::Bfloat16.is_integer());
        assert!(ElementType::Int8.is_signed());
        assert!(!ElementType::Uint32.is_signed());
        assert!(ElementType::Float32.is_signed());
    }
}
