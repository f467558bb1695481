//! Declarative schema documents (YAML or JSON) with named definitions.
//!
//! Example:
//! ```yaml
//! config: { strict_names: true }
//! schemas:
//!   address:
//!     - { name: street,  type: String, nullable: true }
//!     - { name: zipcode, type: String }
//!   person:
//!     - { name: id,   type: Long }
//!     - { name: home, type: Struct, nullable: true, schema: address }
//!     - name: tags
//!       type: Struct
//!       fields:
//!         - { name: primary, type: String }
//! ```
//!
//! A Struct field either references another definition by name (`schema`)
//! or declares its children inline (`fields`). References are where shared
//! sub-schemas, and therefore cycles, come from: `validate` reports them and
//! `resolve` refuses to build them.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigOverrides, SchemaConfig};
use crate::error::{Error, Result};
use crate::field_type::FieldType;
use crate::schema::{build_field, build_schema, Field, Metadata, Schema};
use crate::validate::{ValidationReport, Violation};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaCatalog {
    #[serde(default)]
    pub config: Option<ConfigOverrides>,
    pub schemas: BTreeMap<String, Vec<FieldDef>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldDef>>,
}

impl From<&Field> for FieldDef {
    fn from(f: &Field) -> Self {
        Self {
            name: f.name.clone(),
            field_type: f.field_type.name().to_string(),
            nullable: f.nullable,
            metadata: f.metadata.clone(),
            schema: None,
            fields: f
                .nested()
                .map(|n| n.fields.iter().map(FieldDef::from).collect()),
        }
    }
}

impl SchemaCatalog {
    pub fn from_yaml_str(src: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(src)?)
    }

    pub fn from_json_str(src: &str) -> Result<Self> {
        Ok(serde_json::from_str(src)?)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Register `schema` under `name`, replacing any previous definition.
    pub fn insert(&mut self, name: impl Into<String>, schema: &Schema) {
        self.schemas
            .insert(name.into(), schema.fields.iter().map(FieldDef::from).collect());
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// The document's `config:` block applied over the default policy.
    pub fn effective_config(&self) -> SchemaConfig {
        self.config_over(SchemaConfig::default())
    }

    /// The document's `config:` block applied over `base`. Settings the
    /// block does not mention keep their `base` value.
    pub fn config_over(&self, base: SchemaConfig) -> SchemaConfig {
        match &self.config {
            Some(overrides) => overrides.apply_to(base),
            None => base,
        }
    }

    /// Check every definition without building anything.
    ///
    /// Definitions are visited in name order. Per-definition problems come
    /// first (unknown types, bad names, duplicates, Struct shape, dangling
    /// references), then every reference cycle, reported once at the field
    /// that closes it.
    pub fn validate(&self, config: &SchemaConfig) -> std::result::Result<(), ValidationReport> {
        let mut violations = Vec::new();
        for (name, fields) in &self.schemas {
            self.check_fields(fields, name, config, &mut violations);
        }

        let mut done: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = Vec::new();
        for name in self.schemas.keys() {
            if !done.contains(name.as_str()) {
                self.find_cycles(name, config, &mut stack, &mut done, &mut violations);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            definitions = self.schemas.len(),
            violations = violations.len(),
            "validated catalog"
        );

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport { violations })
        }
    }

    fn check_fields(
        &self,
        fields: &[FieldDef],
        prefix: &str,
        config: &SchemaConfig,
        out: &mut Vec<Violation>,
    ) {
        let mut seen = HashSet::with_capacity(fields.len());
        for f in fields {
            let path = join_path(prefix, &f.name, config);
            let mut report = |error| {
                out.push(Violation {
                    path: path.clone(),
                    error,
                })
            };

            if let Err(e) = config.check_name(&f.name) {
                report(e);
            }
            if !seen.insert(config.name_key(&f.name)) {
                report(Error::DuplicateFieldName {
                    name: f.name.clone(),
                });
            }

            let ty = match f.field_type.parse::<FieldType>() {
                Ok(ty) => ty,
                Err(e) => {
                    report(e);
                    continue;
                }
            };

            match (ty.is_struct(), &f.schema, &f.fields) {
                (true, Some(reference), None) => match self.schemas.get(reference) {
                    None => report(Error::UnknownSchemaRef {
                        field: path.clone(),
                        reference: reference.clone(),
                    }),
                    Some(target) if target.is_empty() && !config.allow_empty_struct => {
                        report(Error::InvalidSchema(format!(
                            "Struct field '{}' has no children",
                            f.name
                        )))
                    }
                    Some(_) => {}
                },
                (true, None, Some(children)) => {
                    if children.is_empty() && !config.allow_empty_struct {
                        report(Error::InvalidSchema(format!(
                            "Struct field '{}' has no children",
                            f.name
                        )));
                    }
                    self.check_fields(children, &path, config, out);
                }
                (false, None, None) => {}
                _ => report(Error::StructuralMismatch {
                    path: path.clone(),
                    field_type: ty,
                    has_nested: f.schema.is_some() || f.fields.is_some(),
                }),
            }
        }
    }

    /// Depth-first over references. `stack` holds the definitions on the
    /// current branch; meeting one of them again closes a cycle.
    fn find_cycles<'a>(
        &'a self,
        name: &'a str,
        config: &SchemaConfig,
        stack: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
        out: &mut Vec<Violation>,
    ) {
        stack.push(name);

        let mut edges = Vec::new();
        if let Some(fields) = self.schemas.get(name) {
            collect_refs(fields, name, config, &mut edges);
        }

        for (field_path, target) in edges {
            if let Some(pos) = stack.iter().position(|s| *s == target) {
                out.push(Violation {
                    path: field_path,
                    error: Error::CyclicSchema {
                        path: cycle_path(&stack[pos..], target),
                    },
                });
            } else if !done.contains(target) && self.schemas.contains_key(target) {
                self.find_cycles(target, config, stack, done, out);
            }
        }

        stack.pop();
        done.insert(name);
    }

    /// Build the named definition into an owned schema tree, checking every
    /// field through the construction API.
    pub fn resolve(&self, name: &str, config: &SchemaConfig) -> Result<Schema> {
        let (key, fields) = self
            .schemas
            .get_key_value(name)
            .ok_or_else(|| Error::InvalidSchema(format!("no schema named '{}'", name)))?;
        let mut stack = vec![key.as_str()];
        self.build(fields, key, config, &mut stack)
    }

    /// Resolve every definition, in name order.
    pub fn resolve_all(&self, config: &SchemaConfig) -> Result<BTreeMap<String, Schema>> {
        self.schemas
            .keys()
            .map(|name| -> Result<(String, Schema)> {
                Ok((name.clone(), self.resolve(name, config)?))
            })
            .collect()
    }

    /// `prefix` locates `fields` the same way `validate` does: a referenced
    /// definition restarts at its own name, inline children extend the path.
    fn build<'a>(
        &'a self,
        fields: &'a [FieldDef],
        prefix: &str,
        config: &SchemaConfig,
        stack: &mut Vec<&'a str>,
    ) -> Result<Schema> {
        let built = fields
            .iter()
            .map(|f| self.build_def(f, prefix, config, stack))
            .collect::<Result<Vec<_>>>()?;
        build_schema(built, config)
    }

    fn build_def<'a>(
        &'a self,
        def: &'a FieldDef,
        prefix: &str,
        config: &SchemaConfig,
        stack: &mut Vec<&'a str>,
    ) -> Result<Field> {
        let ty: FieldType = def.field_type.parse()?;
        let path = join_path(prefix, &def.name, config);

        let nested = match (&def.schema, &def.fields) {
            (Some(reference), None) => {
                if let Some(pos) = stack.iter().position(|s| *s == reference.as_str()) {
                    return Err(Error::CyclicSchema {
                        path: cycle_path(&stack[pos..], reference),
                    });
                }
                let fields = self.schemas.get(reference).ok_or_else(|| {
                    Error::UnknownSchemaRef {
                        field: path.clone(),
                        reference: reference.clone(),
                    }
                })?;
                stack.push(reference.as_str());
                let nested = self.build(fields, reference, config, stack);
                stack.pop();
                Some(nested?)
            }
            (None, Some(children)) => Some(self.build(children, &path, config, stack)?),
            (None, None) => None,
            (Some(_), Some(_)) => {
                return Err(Error::invalid_field(
                    &def.name,
                    "declares both a schema reference and inline fields",
                ))
            }
        };

        build_field(
            def.name.clone(),
            ty,
            def.nullable,
            Some(def.metadata.clone()),
            nested,
            config,
        )
    }
}

fn join_path(prefix: &str, name: &str, config: &SchemaConfig) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", prefix, config.name_delimiter, name)
    }
}

fn cycle_path(branch: &[&str], closing: &str) -> String {
    let mut parts: Vec<&str> = branch.to_vec();
    parts.push(closing);
    parts.join(" -> ")
}

/// Every `(field path, referenced definition)` under `fields`, inline
/// children included, in declaration order.
fn collect_refs<'a>(
    fields: &'a [FieldDef],
    prefix: &str,
    config: &SchemaConfig,
    out: &mut Vec<(String, &'a str)>,
) {
    for f in fields {
        let path = join_path(prefix, &f.name, config);
        if let Some(reference) = &f.schema {
            out.push((path.clone(), reference.as_str()));
        }
        if let Some(children) = &f.fields {
            collect_refs(children, &path, config, out);
        }
    }
}
