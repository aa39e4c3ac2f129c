use serde::{Deserialize, Serialize};
use std::fmt;

/// A CIM data type. `Reference` carries the referenced class name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CimType {
    Boolean,
    Char16,
    DateTime,
    String,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    SInt8,
    SInt16,
    SInt32,
    SInt64,
    Real32,
    Real64,
    Reference(String),
}

impl CimType {
    /// Map a MOF data type keyword to its type. `object` is the embedded
    /// object spelling of `string`.
    pub fn from_keyword(word: &str) -> Option<CimType> {
        let t = match word.to_ascii_lowercase().as_str() {
            "boolean" => CimType::Boolean,
            "char16" => CimType::Char16,
            "datetime" => CimType::DateTime,
            "string" | "object" => CimType::String,
            "uint8" => CimType::UInt8,
            "uint16" => CimType::UInt16,
            "uint32" => CimType::UInt32,
            "uint64" => CimType::UInt64,
            "sint8" => CimType::SInt8,
            "sint16" => CimType::SInt16,
            "sint32" => CimType::SInt32,
            "sint64" => CimType::SInt64,
            "real32" => CimType::Real32,
            "real64" => CimType::Real64,
            _ => return None,
        };
        Some(t)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, CimType::Reference(_))
    }

    pub fn is_real(&self) -> bool {
        matches!(self, CimType::Real32 | CimType::Real64)
    }

    /// Inclusive value range of an integer type, `None` for non-integers.
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        let r = match self {
            CimType::UInt8 => (0, u8::MAX as i128),
            CimType::UInt16 => (0, u16::MAX as i128),
            CimType::UInt32 => (0, u32::MAX as i128),
            CimType::UInt64 => (0, u64::MAX as i128),
            CimType::SInt8 => (i8::MIN as i128, i8::MAX as i128),
            CimType::SInt16 => (i16::MIN as i128, i16::MAX as i128),
            CimType::SInt32 => (i32::MIN as i128, i32::MAX as i128),
            CimType::SInt64 => (i64::MIN as i128, i64::MAX as i128),
            _ => return None,
        };
        Some(r)
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            CimType::UInt8 | CimType::UInt16 | CimType::UInt32 | CimType::UInt64
        )
    }
}

/// MOF keyword for the type. `object` is not kept, so it renders as `string`.
impl fmt::Display for CimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CimType::Boolean => "boolean",
            CimType::Char16 => "char16",
            CimType::DateTime => "datetime",
            CimType::String => "string",
            CimType::UInt8 => "uint8",
            CimType::UInt16 => "uint16",
            CimType::UInt32 => "uint32",
            CimType::UInt64 => "uint64",
            CimType::SInt8 => "sint8",
            CimType::SInt16 => "sint16",
            CimType::SInt32 => "sint32",
            CimType::SInt64 => "sint64",
            CimType::Real32 => "real32",
            CimType::Real64 => "real64",
            CimType::Reference(class) => return write!(f, "{} REF", class),
        };
        f.write_str(s)
    }
}
