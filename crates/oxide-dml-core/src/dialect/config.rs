//! Dialects described as data.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Dialect, ParamStyle};
use crate::error::{DatabaseErrorKind, Result};

/// A capability table.
///
/// Every field is optional when deserializing; a missing capability takes
/// the conservative value.
///
/// ```rust
/// use oxide_dml_core::dialect::{Dialect, DialectConfig};
///
/// let config = DialectConfig::from_json(r#"{
///     "name": "warehouse",
///     "param_style": "named",
///     "implicit_returning": true,
///     "supports_returning": true
/// }"#).unwrap();
/// let dialect = config.into_dialect();
/// assert!(dialect.implicit_returning());
/// assert!(!dialect.supports_sequences());
/// ```
// One independent flag per dialect capability.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectConfig {
    /// Dialect name used in messages.
    pub name: String,
    /// Identifier quote character.
    pub identifier_quote: char,
    /// Placeholder style.
    pub param_style: ParamStyle,
    /// Explicit RETURNING allowed.
    pub supports_returning: bool,
    /// RETURNING attached automatically to fetch generated values.
    pub implicit_returning: bool,
    /// Sequences available.
    pub supports_sequences: bool,
    /// Optional sequences are skipped.
    pub sequences_optional: bool,
    /// Driver reports the last inserted row id.
    pub postfetch_lastrowid: bool,
    /// Autoincrement sequences are executed before the INSERT.
    pub preexecute_autoincrement_sequences: bool,
    /// `DEFAULT VALUES` accepted.
    pub supports_default_values: bool,
    /// `() VALUES ()` accepted.
    pub supports_empty_insert: bool,
    /// Multi-row VALUES accepted.
    pub supports_multivalues_insert: bool,
    /// SET entries of multi-table UPDATE are table-qualified.
    pub render_table_with_column_in_update_from: bool,
    /// Template for firing a sequence; `{}` is replaced by its name.
    pub next_value_template: Option<String>,
    /// Driver error codes mapped to error kinds.
    pub error_codes: HashMap<String, DatabaseErrorKind>,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            name: String::from("configured"),
            identifier_quote: '"',
            param_style: ParamStyle::Qmark,
            supports_returning: false,
            implicit_returning: false,
            supports_sequences: false,
            sequences_optional: false,
            postfetch_lastrowid: false,
            preexecute_autoincrement_sequences: false,
            supports_default_values: false,
            supports_empty_insert: false,
            supports_multivalues_insert: false,
            render_table_with_column_in_update_from: false,
            next_value_template: None,
            error_codes: HashMap::new(),
        }
    }
}

impl DialectConfig {
    /// Reads a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::error::Error::Config) if the JSON is
    /// malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds a dialect from this configuration.
    #[must_use]
    pub const fn into_dialect(self) -> ConfiguredDialect {
        ConfiguredDialect { config: self }
    }
}

/// A dialect whose hooks come from a [`DialectConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredDialect {
    config: DialectConfig,
}

impl ConfiguredDialect {
    /// The underlying configuration.
    #[must_use]
    pub const fn config(&self) -> &DialectConfig {
        &self.config
    }
}

impl From<DialectConfig> for ConfiguredDialect {
    fn from(config: DialectConfig) -> Self {
        config.into_dialect()
    }
}

impl Dialect for ConfiguredDialect {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn identifier_quote(&self) -> char {
        self.config.identifier_quote
    }

    fn param_style(&self) -> ParamStyle {
        self.config.param_style
    }

    fn supports_returning(&self) -> bool {
        self.config.supports_returning
    }

    fn implicit_returning(&self) -> bool {
        self.config.implicit_returning
    }

    fn supports_sequences(&self) -> bool {
        self.config.supports_sequences
    }

    fn sequences_optional(&self) -> bool {
        self.config.sequences_optional
    }

    fn postfetch_lastrowid(&self) -> bool {
        self.config.postfetch_lastrowid
    }

    fn preexecute_autoincrement_sequences(&self) -> bool {
        self.config.preexecute_autoincrement_sequences
    }

    fn supports_default_values(&self) -> bool {
        self.config.supports_default_values
    }

    fn supports_empty_insert(&self) -> bool {
        self.config.supports_empty_insert
    }

    fn supports_multivalues_insert(&self) -> bool {
        self.config.supports_multivalues_insert
    }

    fn render_table_with_column_in_update_from(&self) -> bool {
        self.config.render_table_with_column_in_update_from
    }

    fn next_value_sql(&self, seq: &crate::schema::Sequence) -> Option<String> {
        let template = self.config.next_value_template.as_ref()?;
        Some(template.replace("{}", &self.format_identifier(&seq.name)))
    }

    fn classify_error(&self, code: &str) -> DatabaseErrorKind {
        self.config
            .error_codes
            .get(code)
            .copied()
            .or_else(|| DatabaseErrorKind::from_identifier(code))
            .unwrap_or(DatabaseErrorKind::Database)
    }
}
