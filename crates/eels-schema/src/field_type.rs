//! The closed vocabulary of field types.
//!
//! Variants are declared in alphabetical order of their tag names, so the
//! derived `Ord` is the display/sort order every consumer sees. Do not reorder
//! them; downstream comparisons rely on it being stable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldType {
    BigInt,
    Binary,
    Boolean,
    Date,
    Decimal,
    Double,
    Float,
    Int,
    Long,
    Short,
    String,
    Struct,
    Timestamp,
}

impl FieldType {
    /// Every tag, in canonical order.
    pub const ALL: [FieldType; 13] = [
        FieldType::BigInt,
        FieldType::Binary,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Decimal,
        FieldType::Double,
        FieldType::Float,
        FieldType::Int,
        FieldType::Long,
        FieldType::Short,
        FieldType::String,
        FieldType::Struct,
        FieldType::Timestamp,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            FieldType::BigInt => "BigInt",
            FieldType::Binary => "Binary",
            FieldType::Boolean => "Boolean",
            FieldType::Date => "Date",
            FieldType::Decimal => "Decimal",
            FieldType::Double => "Double",
            FieldType::Float => "Float",
            FieldType::Int => "Int",
            FieldType::Long => "Long",
            FieldType::Short => "Short",
            FieldType::String => "String",
            FieldType::Struct => "Struct",
            FieldType::Timestamp => "Timestamp",
        }
    }

    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            FieldType::BigInt
                | FieldType::Decimal
                | FieldType::Double
                | FieldType::Float
                | FieldType::Int
                | FieldType::Long
                | FieldType::Short
        )
    }

    pub const fn is_temporal(self) -> bool {
        matches!(self, FieldType::Date | FieldType::Timestamp)
    }

    /// Struct is the only tag that owns a nested schema.
    pub const fn is_struct(self) -> bool {
        matches!(self, FieldType::Struct)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts canonical tag names (any case) and the aliases connectors
/// commonly report for their native types.
impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.trim().to_ascii_lowercase().as_str() {
            "bigint" | "biginteger" | "int128" => FieldType::BigInt,
            "binary" | "bytes" | "blob" => FieldType::Binary,
            "boolean" | "bool" => FieldType::Boolean,
            "date" | "date32" => FieldType::Date,
            "decimal" | "numeric" | "decimal128" => FieldType::Decimal,
            "double" | "float64" | "f64" => FieldType::Double,
            "float" | "float32" | "f32" | "real" => FieldType::Float,
            "int" | "integer" | "int32" | "i32" => FieldType::Int,
            "long" | "int64" | "i64" => FieldType::Long,
            "short" | "smallint" | "int16" | "i16" => FieldType::Short,
            "string" | "utf8" | "varchar" | "text" => FieldType::String,
            "struct" | "record" => FieldType::Struct,
            "timestamp" | "datetime" | "date64" => FieldType::Timestamp,
            _ => return Err(Error::UnknownFieldType(s.to_string())),
        };
        Ok(ty)
    }
}
