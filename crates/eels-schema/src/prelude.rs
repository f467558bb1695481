//! Convenient re-exports for connector crates.

pub use crate::catalog::SchemaCatalog;
pub use crate::compat::{merge_schemas, widen, WidenResult};
pub use crate::config::SchemaConfig;
pub use crate::error::{Error, Result};
pub use crate::field_type::FieldType;
pub use crate::schema::{build_field, build_schema, Field, Schema};
pub use crate::validate::{validate, ValidationReport};
