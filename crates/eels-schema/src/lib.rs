#![forbid(unsafe_code)]
//! eels-schema: the logical type system shared by every eels connector.
//!
//! - `field_type`: the closed set of field type tags
//! - `schema`: `Field`/`Schema` values, checked construction, copy-on-transform
//! - `validate`: recursive well-formedness checks with located violations
//! - `compat`: the widening table and schema merge
//! - `catalog`: named schema definitions loaded from YAML/JSON documents
//! - `hash`: stable fingerprints
//!
//! Nothing in this crate performs I/O or holds shared mutable state; all
//! values are safe to share across threads.

pub mod catalog;
pub mod compat;
pub mod config;
pub mod error;
pub mod field_type;
pub mod hash;
pub mod prelude;
pub mod schema;
pub mod validate;

pub use catalog::{FieldDef, SchemaCatalog};
pub use compat::{common_supertype, merge_all, merge_schemas, widen, widens_to, WidenResult};
pub use config::{ConfigOverrides, SchemaConfig};
pub use error::{Error, Result};
pub use field_type::FieldType;
pub use hash::{fingerprint, Hash256};
pub use schema::{build_field, build_schema, Field, Metadata, Schema};
pub use validate::{validate, ValidationReport, Violation};
