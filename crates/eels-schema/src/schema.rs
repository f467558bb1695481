//! Logical schema model. Pure data; no I/O here.
//!
//! `Field` and `Schema` are immutable values once published. Every transform
//! below returns a new `Schema`; nested schemas sit behind `Arc` so those
//! copies share unchanged subtrees.
//!
//! The public fields and the unchecked constructors (`Field::new`,
//! `Schema::new`) exist for trusted callers and for deserialization. Anything
//! built that way should go through [`crate::validate::validate`] before it is
//! handed to consumers; `build_field`/`build_schema` check as they go.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SchemaConfig;
use crate::error::{Error, Result};
use crate::field_type::FieldType;

/// Free-form field annotations. Ordered so rendering and hashing are stable.
pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
    /// Children of a Struct field. `None` for every other type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<Arc<Schema>>,
}

impl Field {
    /// Unchecked scalar field.
    pub fn new(name: impl Into<String>, field_type: FieldType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable,
            metadata: Metadata::new(),
            nested: None,
        }
    }

    /// Unchecked Struct field owning `schema`.
    pub fn new_struct(name: impl Into<String>, schema: Schema, nullable: bool) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Struct,
            nullable,
            metadata: Metadata::new(),
            nested: Some(Arc::new(schema)),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn nested(&self) -> Option<&Schema> {
        self.nested.as_deref()
    }

    pub fn is_struct(&self) -> bool {
        self.field_type.is_struct()
    }
}

/// Checked field construction.
///
/// Fails with `InvalidField` for an empty name, a name containing the
/// reserved delimiter under `strict_names`, a Struct without children or a
/// scalar with children. An empty Struct fails with `InvalidSchema` unless
/// `allow_empty_struct` is set.
pub fn build_field(
    name: impl Into<String>,
    field_type: FieldType,
    nullable: bool,
    metadata: Option<Metadata>,
    nested: Option<Schema>,
    config: &SchemaConfig,
) -> Result<Field> {
    let name = name.into();
    config.check_name(&name)?;

    match (field_type.is_struct(), &nested) {
        (true, None) => {
            return Err(Error::invalid_field(
                &name,
                "Struct field requires a nested schema",
            ))
        }
        (false, Some(_)) => {
            return Err(Error::invalid_field(
                &name,
                format!("{} field cannot carry a nested schema", field_type),
            ))
        }
        (true, Some(schema)) if schema.is_empty() && !config.allow_empty_struct => {
            return Err(Error::InvalidSchema(format!(
                "Struct field '{}' has no children",
                name
            )))
        }
        _ => {}
    }

    Ok(Field {
        name,
        field_type,
        nullable,
        metadata: metadata.unwrap_or_default(),
        nested: nested.map(Arc::new),
    })
}

/// Checked schema construction: sibling names must be unique under the
/// active case policy.
pub fn build_schema(fields: Vec<Field>, config: &SchemaConfig) -> Result<Schema> {
    let mut seen = HashSet::with_capacity(fields.len());
    for f in &fields {
        if !seen.insert(config.name_key(&f.name)) {
            return Err(Error::DuplicateFieldName {
                name: f.name.clone(),
            });
        }
    }
    Ok(Schema { fields })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    /// Unchecked construction.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Look up a field through nested Structs, e.g. `address.zipcode`.
    pub fn field_at_path(&self, path: &str, delimiter: char) -> Option<&Field> {
        let mut parts = path.split(delimiter);
        let mut field = self.field_by_name(parts.next()?)?;
        for part in parts {
            field = field.nested()?.field_by_name(part)?;
        }
        Some(field)
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| Error::FieldNotFound(name.to_string()))
    }

    /// Append `field`, rejecting a name already present at this level.
    pub fn add_field(&self, field: Field, config: &SchemaConfig) -> Result<Schema> {
        config.check_name(&field.name)?;
        let mut fields = self.fields.clone();
        fields.push(field);
        build_schema(fields, config)
    }

    pub fn drop_field(&self, name: &str) -> Result<Schema> {
        let idx = self.position(name)?;
        let mut fields = self.fields.clone();
        fields.remove(idx);
        Ok(Schema { fields })
    }

    pub fn rename_field(&self, from: &str, to: &str, config: &SchemaConfig) -> Result<Schema> {
        let idx = self.position(from)?;
        config.check_name(to)?;
        let mut fields = self.fields.clone();
        fields[idx].name = to.to_string();
        build_schema(fields, config)
    }

    /// Keep only `names`, in the order given.
    pub fn project(&self, names: &[&str]) -> Result<Schema> {
        let fields = names
            .iter()
            .map(|n| self.position(n).map(|idx| self.fields[idx].clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Schema { fields })
    }

    /// Change a scalar field's type. Moving into or out of Struct changes the
    /// field's shape and is rejected.
    pub fn update_field_type(&self, name: &str, field_type: FieldType) -> Result<Schema> {
        let idx = self.position(name)?;
        let current = self.fields[idx].field_type;
        if current.is_struct() != field_type.is_struct() {
            return Err(Error::invalid_field(
                name,
                format!("cannot retype {} to {}", current, field_type),
            ));
        }
        let mut fields = self.fields.clone();
        fields[idx].field_type = field_type;
        Ok(Schema { fields })
    }

    pub fn set_nullable(&self, name: &str, nullable: bool) -> Result<Schema> {
        let idx = self.position(name)?;
        let mut fields = self.fields.clone();
        fields[idx].nullable = nullable;
        Ok(Schema { fields })
    }

    /// Lower-case every name at every level. Fails if that makes two
    /// siblings collide.
    pub fn to_lowercase(&self, config: &SchemaConfig) -> Result<Schema> {
        let fields = self
            .fields
            .iter()
            .map(|f| -> Result<Field> {
                let nested = match f.nested() {
                    Some(n) => Some(Arc::new(n.to_lowercase(config)?)),
                    None => None,
                };
                Ok(Field {
                    name: f.name.to_lowercase(),
                    nested,
                    ..f.clone()
                })
            })
            .collect::<Result<Vec<_>>>()?;
        build_schema(fields, config)
    }

    /// Copy with all metadata removed, recursively.
    pub fn without_metadata(&self) -> Schema {
        let fields = self
            .fields
            .iter()
            .map(|f| Field {
                name: f.name.clone(),
                field_type: f.field_type,
                nullable: f.nullable,
                metadata: Metadata::new(),
                nested: f.nested().map(|n| Arc::new(n.without_metadata())),
            })
            .collect();
        Schema { fields }
    }
}

/// Canonical text form: `name:Type`, `?` when nullable, and
/// `<child, child>` after a Struct.
impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.field_type)?;
        if self.nullable {
            f.write_str("?")?;
        }
        if let Some(nested) = self.nested() {
            write!(f, "<{}>", nested)?;
        }
        Ok(())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}
