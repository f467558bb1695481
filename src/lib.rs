#![forbid(unsafe_code)]
//! eels: schema type system for the eels data toolkit.
//!
//! Re-exports `eels-schema`; connector crates can depend on either.

pub use eels_schema::*;
