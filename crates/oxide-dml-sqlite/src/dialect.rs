//! SQLite dialect implementation.

use oxide_dml_core::dialect::{Dialect, ParamStyle, ANSI_RESERVED_WORDS};
use oxide_dml_core::error::DatabaseErrorKind;
use tracing::debug;

const SQLITE_RESERVED_WORDS: &[&str] = &[
    "abort", "autoincrement", "conflict", "glob", "indexed", "notnull", "pragma", "raise",
    "regexp", "vacuum",
];

/// Primary result codes and the identifier each one classifies as.
const RESULT_CODES: &[(i32, &str, &str)] = &[
    (1, "SQLITE_ERROR", "OperationalError"),
    (2, "SQLITE_INTERNAL", "InternalError"),
    (3, "SQLITE_PERM", "OperationalError"),
    (4, "SQLITE_ABORT", "OperationalError"),
    (5, "SQLITE_BUSY", "OperationalError"),
    (6, "SQLITE_LOCKED", "OperationalError"),
    (7, "SQLITE_NOMEM", "OperationalError"),
    (8, "SQLITE_READONLY", "OperationalError"),
    (9, "SQLITE_INTERRUPT", "OperationalError"),
    (10, "SQLITE_IOERR", "OperationalError"),
    (11, "SQLITE_CORRUPT", "DatabaseError"),
    (12, "SQLITE_NOTFOUND", "InternalError"),
    (13, "SQLITE_FULL", "OperationalError"),
    (14, "SQLITE_CANTOPEN", "OperationalError"),
    (15, "SQLITE_PROTOCOL", "OperationalError"),
    (16, "SQLITE_EMPTY", "OperationalError"),
    (17, "SQLITE_SCHEMA", "OperationalError"),
    (18, "SQLITE_TOOBIG", "DataError"),
    (19, "SQLITE_CONSTRAINT", "IntegrityError"),
    (20, "SQLITE_MISMATCH", "IntegrityError"),
    (21, "SQLITE_MISUSE", "InterfaceError"),
    (22, "SQLITE_NOLFS", "OperationalError"),
    (23, "SQLITE_AUTH", "OperationalError"),
    (25, "SQLITE_RANGE", "InterfaceError"),
    (26, "SQLITE_NOTADB", "DatabaseError"),
];

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Finds the entry for a result code, given either as a name
    /// (`SQLITE_CONSTRAINT_UNIQUE`) or as a number (`2067`). Extended codes
    /// resolve to their primary code.
    fn lookup(code: &str) -> Option<&'static str> {
        let code = code.trim();
        if let Ok(number) = code.parse::<i32>() {
            let primary = number & 0xff;
            return RESULT_CODES
                .iter()
                .find(|(n, _, _)| *n == primary)
                .map(|(_, _, identifier)| *identifier);
        }
        let upper = code.to_ascii_uppercase();
        RESULT_CODES
            .iter()
            .find(|(_, name, _)| {
                upper == *name
                    || upper
                        .strip_prefix(name)
                        .is_some_and(|rest| rest.starts_with('_'))
            })
            .map(|(_, _, identifier)| *identifier)
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn identifier_quote(&self) -> char {
        '"' // also accepts backticks and brackets
    }

    fn param_style(&self) -> ParamStyle {
        ParamStyle::Qmark
    }

    fn supports_returning(&self) -> bool {
        true // SQLite 3.35.0+
    }

    fn postfetch_lastrowid(&self) -> bool {
        true
    }

    fn supports_default_values(&self) -> bool {
        true
    }

    fn supports_multivalues_insert(&self) -> bool {
        true
    }

    fn requires_quotes(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        name.is_empty()
            || ANSI_RESERVED_WORDS.contains(&lower.as_str())
            || SQLITE_RESERVED_WORDS.contains(&lower.as_str())
            || name.starts_with(|c: char| c.is_ascii_digit())
            || !name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }

    fn classify_error(&self, code: &str) -> DatabaseErrorKind {
        let kind = Self::lookup(code).and_then(DatabaseErrorKind::from_identifier);
        if kind.is_none() {
            debug!(code = %code, "Unrecognized SQLite result code");
        }
        kind.unwrap_or(DatabaseErrorKind::Database)
    }
}
