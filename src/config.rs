use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, ShimError};

/// Whether a COUNT statement applies its WHERE clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountFilterPolicy {
    /// A single translatable predicate filters the count; anything else is unsupported.
    Apply,
    /// The WHERE clause is dropped and every row is counted.
    Ignore,
}

/// What raw `query` / `run` calls do with a statement they cannot translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedPolicy {
    /// Empty rows / zero changes, as legacy callers expect.
    Lenient,
    /// `ShimError::Unsupported`.
    Strict,
}

/// Translation settings.
///
/// ```toml
/// now_literal = "'now()'"
/// id_column = "id"
/// count_alias = "total"
/// count_filter = "apply"
/// unsupported = "strict"
/// literal_predicates = true
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShimConfig {
    /// Text that replaces `CURRENT_TIMESTAMP` and `datetime('now')`.
    pub now_literal: String,
    /// Column holding the store-assigned row id.
    pub id_column: String,
    /// Key of the single row returned for `COUNT(*)` without an alias.
    pub count_alias: String,
    pub count_filter: CountFilterPolicy,
    pub unsupported: UnsupportedPolicy,
    /// Accept `WHERE col = <literal>` in addition to `WHERE col = ?`.
    pub literal_predicates: bool,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            now_literal: "'now()'".to_string(),
            id_column: "id".to_string(),
            count_alias: "total".to_string(),
            count_filter: CountFilterPolicy::Apply,
            unsupported: UnsupportedPolicy::Lenient,
            literal_predicates: true,
        }
    }
}

impl ShimConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ShimConfig = toml::from_str(content)
            .map_err(|e| ShimError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ShimError::InvalidConfig(format!("Failed to read config file: {}", e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        let literal = self.now_literal.trim();
        if literal.is_empty() {
            return Err(ShimError::InvalidConfig(
                "now_literal cannot be empty".to_string(),
            ));
        }
        // A replacement that still matches would make normalization non-idempotent
        let upper = literal.to_ascii_uppercase();
        if upper.contains("CURRENT_TIMESTAMP") || upper.contains("DATETIME") {
            return Err(ShimError::InvalidConfig(format!(
                "now_literal '{}' must not contain CURRENT_TIMESTAMP or DATETIME",
                self.now_literal
            )));
        }

        for (name, value) in [("id_column", &self.id_column), ("count_alias", &self.count_alias)] {
            if !is_identifier(value) {
                return Err(ShimError::InvalidConfig(format!(
                    "{} '{}' is not a valid identifier",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShimConfig::default();
        assert_eq!(config.now_literal, "'now()'");
        assert_eq!(config.count_filter, CountFilterPolicy::Apply);
        assert_eq!(config.unsupported, UnsupportedPolicy::Lenient);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ShimConfig::from_toml_str(
            r#"
            unsupported = "strict"
            count_filter = "ignore"
            "#,
        )
        .unwrap();

        assert_eq!(config.unsupported, UnsupportedPolicy::Strict);
        assert_eq!(config.count_filter, CountFilterPolicy::Ignore);
        assert_eq!(config.id_column, "id");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            ShimConfig::from_toml_str("now_literal = \"CURRENT_TIMESTAMP\""),
            Err(ShimError::InvalidConfig(_))
        ));
        assert!(matches!(
            ShimConfig::from_toml_str("id_column = \"1id\""),
            Err(ShimError::InvalidConfig(_))
        ));
        assert!(matches!(
            ShimConfig::from_toml_str("unsupported = \"loud\""),
            Err(ShimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "count_alias = \"n\"").unwrap();

        let config = ShimConfig::from_file(file.path()).unwrap();
        assert_eq!(config.count_alias, "n");

        let missing = ShimConfig::from_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ShimError::InvalidConfig(_))));
    }
}
