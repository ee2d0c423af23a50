//! SQL dialect support.
//!
//! A dialect is the hook table the compiler and the INSERT/UPDATE planner
//! consult: identifier quoting, placeholder style, and the capabilities that
//! decide how generated primary keys and defaults are obtained. Every
//! capability defaults to `false`, the most portable choice: values are
//! prefetched on the client rather than relying on backend-specific
//! generation.

mod config;
mod generic;
mod mysql;
mod postgres;

pub use config::{ConfiguredDialect, DialectConfig};
pub use generic::GenericDialect;
pub use mysql::MysqlDialect;
pub use postgres::PostgresDialect;

use serde::{Deserialize, Serialize};

use crate::error::DatabaseErrorKind;
use crate::schema::Sequence;

/// Words that always need quoting when used as identifiers.
pub const ANSI_RESERVED_WORDS: &[&str] = &[
    "all", "alter", "and", "as", "between", "by", "case", "check", "column", "create",
    "default", "delete", "distinct", "drop", "else", "end", "from", "group", "having", "in",
    "index", "insert", "into", "is", "join", "key", "like", "limit", "not", "null", "offset",
    "on", "or", "order", "primary", "references", "returning", "select", "set", "table",
    "then", "union", "update", "user", "values", "when", "where",
];

/// Bind parameter placeholder style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamStyle {
    /// `?`
    #[default]
    Qmark,
    /// `:1`
    Numeric,
    /// `:name`
    Named,
    /// `%s`
    Format,
    /// `%(name)s`
    Pyformat,
    /// `$1`
    Dollar,
}

impl ParamStyle {
    /// Whether values are passed by position rather than by name.
    #[must_use]
    pub const fn is_positional(self) -> bool {
        matches!(self, Self::Qmark | Self::Numeric | Self::Format | Self::Dollar)
    }

    /// Renders the placeholder for a parameter; `position` is 1-based.
    #[must_use]
    pub fn placeholder(self, name: &str, position: usize) -> String {
        match self {
            Self::Qmark => String::from("?"),
            Self::Numeric => format!(":{position}"),
            Self::Named => format!(":{name}"),
            Self::Format => String::from("%s"),
            Self::Pyformat => format!("%({name})s"),
            Self::Dollar => format!("${position}"),
        }
    }
}

/// Trait for SQL dialect-specific behavior.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &str;

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Returns the bind parameter placeholder style.
    fn param_style(&self) -> ParamStyle {
        ParamStyle::Qmark
    }

    /// Whether an explicit RETURNING clause may be rendered.
    fn supports_returning(&self) -> bool {
        false
    }

    /// Whether generated values are fetched through an automatically
    /// attached RETURNING clause.
    fn implicit_returning(&self) -> bool {
        false
    }

    /// Whether sequences exist and can be fired inline.
    fn supports_sequences(&self) -> bool {
        false
    }

    /// Whether sequences marked optional are skipped.
    fn sequences_optional(&self) -> bool {
        false
    }

    /// Whether the driver reports the last inserted row id.
    fn postfetch_lastrowid(&self) -> bool {
        false
    }

    /// Whether the autoincrement column's sequence is executed before the
    /// INSERT when RETURNING is not used.
    fn preexecute_autoincrement_sequences(&self) -> bool {
        false
    }

    /// Whether `INSERT INTO t DEFAULT VALUES` is accepted.
    fn supports_default_values(&self) -> bool {
        false
    }

    /// Whether `INSERT INTO t () VALUES ()` is accepted.
    fn supports_empty_insert(&self) -> bool {
        false
    }

    /// Whether a single INSERT may carry several VALUES rows.
    fn supports_multivalues_insert(&self) -> bool {
        false
    }

    /// Whether SET entries of a multi-table UPDATE are table-qualified.
    fn render_table_with_column_in_update_from(&self) -> bool {
        false
    }

    /// Words that must be quoted when used as identifiers.
    fn reserved_words(&self) -> &[&str] {
        ANSI_RESERVED_WORDS
    }

    /// Whether an identifier must be quoted to be read back verbatim.
    fn requires_quotes(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        name.is_empty()
            || self.reserved_words().contains(&lower.as_str())
            || name.starts_with(|c: char| c.is_ascii_digit() || c == '$')
            || !name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$')
    }

    /// Quotes an identifier unconditionally.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    /// Quotes an identifier only when required.
    fn format_identifier(&self, name: &str) -> String {
        if self.requires_quotes(name) {
            self.quote_identifier(name)
        } else {
            name.to_owned()
        }
    }

    /// SQL that fires a sequence, if the dialect has sequences.
    fn next_value_sql(&self, _seq: &Sequence) -> Option<String> {
        None
    }

    /// The table list after `UPDATE`.
    fn update_tables_clause(&self, table: &str, _extra_froms: &[String]) -> String {
        table.to_owned()
    }

    /// The clause naming the extra tables of a multi-table UPDATE.
    fn update_from_clause(&self, extra_froms: &[String]) -> Option<String> {
        Some(format!("FROM {}", extra_froms.join(", ")))
    }

    /// Classifies a driver error code.
    ///
    /// The default accepts the stable identifiers of
    /// [`DatabaseErrorKind::from_identifier`]; dialects map their own codes
    /// onto those identifiers first.
    fn classify_error(&self, code: &str) -> DatabaseErrorKind {
        DatabaseErrorKind::from_identifier(code).unwrap_or(DatabaseErrorKind::Database)
    }
}
