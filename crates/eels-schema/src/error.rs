use thiserror::Error;

use crate::field_type::FieldType;

/// Canonical result for the schema crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid field '{name}': {reason}")]
    InvalidField { name: String, reason: String },

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("duplicate field name '{name}'")]
    DuplicateFieldName { name: String },

    #[error("cyclic schema: {path}")]
    CyclicSchema { path: String },

    #[error("structural mismatch at '{path}': {field_type} field {}", mismatch_reason(.has_nested))]
    StructuralMismatch {
        path: String,
        field_type: FieldType,
        has_nested: bool,
    },

    #[error("incompatible types for field '{field}': {left} vs {right}")]
    IncompatibleType {
        field: String,
        left: FieldType,
        right: FieldType,
    },

    #[error("unknown field type: {0}")]
    UnknownFieldType(String),

    #[error("field '{field}' references unknown schema '{reference}'")]
    UnknownSchemaRef { field: String, reference: String },

    #[error("field not found: {0}")]
    FieldNotFound(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    // The schema crate does no I/O; document decoders map their parse
    // failures into this variant.
    #[error("decode error: {0}")]
    Decode(String),
}

fn mismatch_reason(has_nested: &bool) -> &'static str {
    if *has_nested {
        "carries a nested schema"
    } else {
        "has no nested schema"
    }
}

impl Error {
    pub(crate) fn invalid_field(name: &str, reason: impl Into<String>) -> Self {
        Error::InvalidField {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Decode(e.to_string())
    }
}
