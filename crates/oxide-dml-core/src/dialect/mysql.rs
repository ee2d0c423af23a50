//! MySQL dialect.

use super::{Dialect, ParamStyle, ANSI_RESERVED_WORDS};
use crate::error::DatabaseErrorKind;

const MYSQL_RESERVED_WORDS: &[&str] = &["interval", "rank", "read", "status", "usage", "write"];

/// MySQL: backtick quoting, last-row-id keys, `UPDATE a, b SET a.x = ..`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    fn param_style(&self) -> ParamStyle {
        ParamStyle::Format
    }

    fn postfetch_lastrowid(&self) -> bool {
        true
    }

    fn supports_empty_insert(&self) -> bool {
        true
    }

    fn supports_multivalues_insert(&self) -> bool {
        true
    }

    fn render_table_with_column_in_update_from(&self) -> bool {
        true
    }

    fn requires_quotes(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        MYSQL_RESERVED_WORDS.contains(&lower.as_str())
            || name.is_empty()
            || ANSI_RESERVED_WORDS.contains(&lower.as_str())
            || !name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }

    fn update_tables_clause(&self, table: &str, extra_froms: &[String]) -> String {
        let mut tables = vec![table.to_owned()];
        tables.extend(extra_froms.iter().cloned());
        tables.join(", ")
    }

    fn update_from_clause(&self, _extra_froms: &[String]) -> Option<String> {
        None
    }

    /// Maps server error numbers onto error kinds.
    fn classify_error(&self, code: &str) -> DatabaseErrorKind {
        let identifier = match code {
            "1062" | "1451" | "1452" | "1048" => "IntegrityError",
            "1064" | "1146" | "1054" => "ProgrammingError",
            "1264" | "1366" | "1406" => "DataError",
            "2006" | "2013" | "1205" | "1213" => "OperationalError",
            other => other,
        };
        DatabaseErrorKind::from_identifier(identifier).unwrap_or(DatabaseErrorKind::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_quoting() {
        let d = MysqlDialect::new();
        assert_eq!(d.format_identifier("status"), "`status`");
        assert_eq!(d.format_identifier("users"), "users");
    }

    #[test]
    fn test_multi_table_update_clauses() {
        let d = MysqlDialect::new();
        let extra = vec![String::from("addresses")];
        assert_eq!(d.update_tables_clause("users", &extra), "users, addresses");
        assert_eq!(d.update_from_clause(&extra), None);
    }

    #[test]
    fn test_error_numbers() {
        let d = MysqlDialect::new();
        assert_eq!(d.classify_error("1062"), DatabaseErrorKind::Integrity);
        assert_eq!(d.classify_error("2006"), DatabaseErrorKind::Operational);
        assert_eq!(d.classify_error("9999"), DatabaseErrorKind::Database);
    }
}
