//! Recursive schema validation.
//!
//! The walk visits fields in declaration order, so the same schema always
//! yields the same ordered violation list. Each violation carries the path of
//! the offending field, joined with the configured delimiter
//! (`address.zipcode` by default).

use std::collections::HashSet;
use std::fmt;

use crate::config::SchemaConfig;
use crate::error::Error;
use crate::schema::Schema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub error: Error,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}

/// Every violation found in one schema, in visit order. Never empty when
/// returned from [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.violations.iter().map(|v| &v.error)
    }

    pub fn paths(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.path.as_str()).collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} schema violation(s)", self.violations.len())?;
        for v in &self.violations {
            write!(f, "\n  {}", v)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

/// Check every nesting level of `schema`.
///
/// Per field: name policy, sibling uniqueness, Struct iff nested schema, the
/// empty-Struct policy, and that no schema reappears on its own ancestor path.
pub fn validate(schema: &Schema, config: &SchemaConfig) -> Result<(), ValidationReport> {
    let mut walker = Walker {
        config,
        ancestors: Vec::new(),
        path: Vec::new(),
        violations: Vec::new(),
    };
    walker.visit(schema);

    #[cfg(feature = "tracing")]
    tracing::trace!(
        fields = schema.len(),
        violations = walker.violations.len(),
        "validated schema"
    );

    if walker.violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationReport {
            violations: walker.violations,
        })
    }
}

struct Walker<'a> {
    config: &'a SchemaConfig,
    /// Schemas on the current branch, compared by address.
    ancestors: Vec<&'a Schema>,
    path: Vec<&'a str>,
    violations: Vec<Violation>,
}

impl<'a> Walker<'a> {
    fn current_path(&self) -> String {
        let delim = self.config.name_delimiter.to_string();
        self.path.join(delim.as_str())
    }

    fn report(&mut self, error: Error) {
        self.violations.push(Violation {
            path: self.current_path(),
            error,
        });
    }

    fn visit(&mut self, schema: &'a Schema) {
        if self.ancestors.iter().any(|a| std::ptr::eq(*a, schema)) {
            let path = self.current_path();
            self.report(Error::CyclicSchema { path });
            return;
        }
        self.ancestors.push(schema);

        let mut seen = HashSet::with_capacity(schema.len());
        for field in &schema.fields {
            self.path.push(field.name.as_str());

            if let Err(e) = self.config.check_name(&field.name) {
                self.report(e);
            }
            if !seen.insert(self.config.name_key(&field.name)) {
                self.report(Error::DuplicateFieldName {
                    name: field.name.clone(),
                });
            }

            match (field.is_struct(), field.nested()) {
                (true, Some(nested)) => {
                    if nested.is_empty() && !self.config.allow_empty_struct {
                        self.report(Error::InvalidSchema(format!(
                            "Struct field '{}' has no children",
                            field.name
                        )));
                    }
                    self.visit(nested);
                }
                (true, None) | (false, Some(_)) => {
                    let path = self.current_path();
                    self.report(Error::StructuralMismatch {
                        path,
                        field_type: field.field_type,
                        has_nested: field.nested.is_some(),
                    });
                }
                (false, None) => {}
            }

            self.path.pop();
        }

        self.ancestors.pop();
    }
}
