//! PostgreSQL dialect.

use super::{Dialect, ParamStyle};
use crate::error::DatabaseErrorKind;
use crate::schema::Sequence;

/// PostgreSQL: sequences, implicit RETURNING, `UPDATE .. FROM`.
#[derive(Debug, Clone, Copy)]
pub struct PostgresDialect {
    implicit_returning: bool,
}

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            implicit_returning: true,
        }
    }

    /// Turns implicit RETURNING off; generated keys are then obtained by
    /// pre-executing sequences.
    #[must_use]
    pub const fn without_implicit_returning(mut self) -> Self {
        self.implicit_returning = false;
        self
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgresql"
    }

    fn param_style(&self) -> ParamStyle {
        ParamStyle::Pyformat
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn implicit_returning(&self) -> bool {
        self.implicit_returning
    }

    fn supports_sequences(&self) -> bool {
        true
    }

    fn sequences_optional(&self) -> bool {
        true
    }

    fn preexecute_autoincrement_sequences(&self) -> bool {
        true
    }

    fn supports_default_values(&self) -> bool {
        true
    }

    fn supports_multivalues_insert(&self) -> bool {
        true
    }

    fn next_value_sql(&self, seq: &Sequence) -> Option<String> {
        let name = match &seq.schema {
            Some(schema) => format!(
                "{}.{}",
                self.format_identifier(schema),
                self.format_identifier(&seq.name)
            ),
            None => self.format_identifier(&seq.name),
        };
        Some(format!("nextval('{}')", name.replace('\'', "''")))
    }

    /// Maps SQLSTATE classes onto error kinds.
    fn classify_error(&self, code: &str) -> DatabaseErrorKind {
        if let Some(kind) = DatabaseErrorKind::from_identifier(code) {
            return kind;
        }
        let identifier = match code.get(..2) {
            Some("23") => "IntegrityError",
            Some("22") => "DataError",
            Some("42") => "ProgrammingError",
            Some("08" | "53" | "57") => "OperationalError",
            Some("0A") => "NotSupportedError",
            Some("XX") => "InternalError",
            _ => "DatabaseError",
        };
        DatabaseErrorKind::from_identifier(identifier).unwrap_or(DatabaseErrorKind::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_capabilities() {
        let d = PostgresDialect::new();
        assert!(d.implicit_returning());
        assert!(d.supports_sequences());
        assert!(!d.postfetch_lastrowid());
        assert!(!d.without_implicit_returning().implicit_returning());
    }

    #[test]
    fn test_nextval() {
        let d = PostgresDialect::new();
        assert_eq!(
            d.next_value_sql(&Sequence::new("user_id_seq")).as_deref(),
            Some("nextval('user_id_seq')")
        );
        assert_eq!(
            d.next_value_sql(&Sequence::new("Seq").schema("app")).as_deref(),
            Some("nextval('app.\"Seq\"')")
        );
    }

    #[test]
    fn test_sqlstate_classification() {
        let d = PostgresDialect::new();
        assert_eq!(d.classify_error("23505"), DatabaseErrorKind::Integrity);
        assert_eq!(d.classify_error("42P01"), DatabaseErrorKind::Programming);
        assert_eq!(d.classify_error("08006"), DatabaseErrorKind::Operational);
        assert_eq!(d.classify_error("P0001"), DatabaseErrorKind::Database);
    }
}
