//! Schema policy configuration that connectors and tools can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Reject field names containing `name_delimiter`.
    pub strict_names: bool,

    /// Permit Struct fields whose nested schema has no fields.
    pub allow_empty_struct: bool,

    /// Compare sibling names case-sensitively when checking uniqueness and
    /// matching fields during a merge.
    pub case_sensitive_names: bool,

    /// Reserved delimiter of the target connector. Also the separator used in
    /// violation paths.
    pub name_delimiter: char,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            strict_names: false,
            allow_empty_struct: false,
            case_sensitive_names: true,
            name_delimiter: '.',
        }
    }
}

impl SchemaConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `EELS_STRICT_NAMES`: `true`/`false`
    /// - `EELS_ALLOW_EMPTY_STRUCT`: `true`/`false`
    /// - `EELS_CASE_SENSITIVE_NAMES`: `true`/`false`
    /// - `EELS_NAME_DELIMITER`: a single character
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(v) = env_flag("EELS_STRICT_NAMES") {
            cfg.strict_names = v;
        }

        if let Some(v) = env_flag("EELS_ALLOW_EMPTY_STRUCT") {
            cfg.allow_empty_struct = v;
        }

        if let Some(v) = env_flag("EELS_CASE_SENSITIVE_NAMES") {
            cfg.case_sensitive_names = v;
        }

        if let Ok(s) = std::env::var("EELS_NAME_DELIMITER") {
            if let Ok(c) = parse_delimiter(&s) {
                cfg.name_delimiter = c;
            }
        }

        cfg
    }

    /// Key used to compare two sibling names under the active case policy.
    pub fn name_key(&self, name: &str) -> String {
        if self.case_sensitive_names {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    pub fn names_match(&self, a: &str, b: &str) -> bool {
        if self.case_sensitive_names {
            a == b
        } else {
            a.to_lowercase() == b.to_lowercase()
        }
    }

    /// Check a field name against this policy.
    pub fn check_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid_field(name, "name must not be empty"));
        }
        if self.strict_names && name.contains(self.name_delimiter) {
            return Err(Error::invalid_field(
                name,
                format!("name contains reserved delimiter '{}'", self.name_delimiter),
            ));
        }
        Ok(())
    }
}

/// A partial policy, as written in a document's `config:` block. Only the
/// keys present replace the corresponding base settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_names: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_empty_struct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive_names: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_delimiter: Option<char>,
}

impl ConfigOverrides {
    pub fn apply_to(&self, mut base: SchemaConfig) -> SchemaConfig {
        if let Some(v) = self.strict_names {
            base.strict_names = v;
        }
        if let Some(v) = self.allow_empty_struct {
            base.allow_empty_struct = v;
        }
        if let Some(v) = self.case_sensitive_names {
            base.case_sensitive_names = v;
        }
        if let Some(c) = self.name_delimiter {
            base.name_delimiter = c;
        }
        base
    }
}

/// Parse a delimiter override: exactly one character.
pub fn parse_delimiter(s: &str) -> Result<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(Error::Config(format!(
            "name delimiter must be a single character, got '{}'",
            s
        ))),
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let s = std::env::var(key).ok()?;
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
