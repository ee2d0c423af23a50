//! Client-side and server-side column default generators.

use core::fmt;
use std::sync::Arc;

use crate::sql::Expr;
use crate::value::SqlValue;

/// A client-side callable producing a default value.
pub type DefaultFn = Arc<dyn Fn() -> SqlValue + Send + Sync>;

/// A database sequence used as a column default.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    /// Sequence name.
    pub name: String,
    /// Schema the sequence lives in.
    pub schema: Option<String>,
    /// Only used on backends that have no other way of generating keys.
    pub optional: bool,
}

impl Sequence {
    /// Creates a non-optional sequence.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            optional: false,
        }
    }

    /// Marks the sequence as optional.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Sets the schema of the sequence.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// A client-side default, applied on INSERT (`default`) or UPDATE
/// (`onupdate`) when no value was supplied.
#[derive(Clone)]
pub enum ColumnDefault {
    /// A constant evaluated before the statement is sent.
    Scalar(SqlValue),
    /// A callable evaluated before the statement is sent.
    Callable(DefaultFn),
    /// A SQL expression rendered inline.
    Clause(Box<Expr>),
    /// A sequence fired inline or pre-executed.
    Sequence(Sequence),
}

impl ColumnDefault {
    /// Creates a callable default.
    #[must_use]
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn() -> SqlValue + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(f))
    }

    /// Returns true for sequence defaults.
    #[must_use]
    pub const fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    /// Returns true for SQL expression defaults.
    #[must_use]
    pub const fn is_clause_element(&self) -> bool {
        matches!(self, Self::Clause(_))
    }

    /// Returns the sequence, if this is a sequence default.
    #[must_use]
    pub const fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Self::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Evaluates a scalar or callable default.
    ///
    /// Returns `None` for defaults that can only be produced by the database.
    #[must_use]
    pub fn evaluate(&self) -> Option<SqlValue> {
        match self {
            Self::Scalar(value) => Some(value.clone()),
            Self::Callable(f) => Some(f()),
            Self::Clause(_) | Self::Sequence(_) => None,
        }
    }
}

impl fmt::Debug for ColumnDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => f.debug_tuple("Scalar").field(value).finish(),
            Self::Callable(_) => f.write_str("Callable(..)"),
            Self::Clause(expr) => f.debug_tuple("Clause").field(expr).finish(),
            Self::Sequence(seq) => f.debug_tuple("Sequence").field(seq).finish(),
        }
    }
}

impl PartialEq for ColumnDefault {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::Callable(a), Self::Callable(b)) => Arc::ptr_eq(a, b),
            (Self::Clause(a), Self::Clause(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Sequence> for ColumnDefault {
    fn from(seq: Sequence) -> Self {
        Self::Sequence(seq)
    }
}

impl From<Expr> for ColumnDefault {
    fn from(expr: Expr) -> Self {
        Self::Clause(Box::new(expr))
    }
}

impl From<SqlValue> for ColumnDefault {
    fn from(value: SqlValue) -> Self {
        Self::Scalar(value)
    }
}

/// A server-side default or on-update marker.
///
/// With `text` set the server renders that default in DDL; without it the
/// value is produced by some other server mechanism such as a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerDefault {
    /// DDL text of the default, if any.
    pub text: Option<String>,
}

impl ServerDefault {
    /// A server default with DDL text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// A value the server fills in by other means.
    #[must_use]
    pub const fn fetched() -> Self {
        Self { text: None }
    }
}
