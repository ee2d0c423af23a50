//! Error types for statement compilation.

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;

/// The statement cannot be compiled as given.
///
/// These are caller errors; they are not retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// Parameter keys matched no column of the statement's tables.
    #[error("Unconsumed column names: {}", .columns.join(", "))]
    UnconsumedColumns {
        /// Target table of the statement.
        table: String,
        /// The unmatched keys, sorted.
        columns: Vec<String>,
    },

    /// A later row of a multi-row INSERT has no value and the column has no
    /// default usable per row.
    #[error(
        "INSERT value for column {column} is explicitly rendered as a bound parameter \
         in the VALUES clause; a client-side value or SQL expression is required"
    )]
    MissingMultiparamDefault {
        /// The column, as `table.column`.
        column: String,
    },

    /// Two different bind parameters share a name.
    #[error("Bind parameter '{0}' conflicts with unique bind parameter of the same name")]
    BindConflict(String),

    /// A user bind parameter uses a name the INSERT/UPDATE planner needs.
    #[error(
        "bind parameter name '{name}' is reserved for automatic usage in the VALUES or SET \
         clause of this insert/update statement; use a name other than the column name \
         (for example, 'b_{name}')"
    )]
    ReservedBindName {
        /// The conflicting name.
        name: String,
    },

    /// A column key used for ordering or INSERT .. SELECT does not exist.
    #[error("table '{table}' has no column '{key}'")]
    UnknownColumn {
        /// Table name.
        table: String,
        /// Requested key.
        key: String,
    },

    /// The UPDATE would have an empty SET clause.
    #[error("UPDATE of table '{table}' has no columns to SET")]
    EmptyUpdate {
        /// Target table of the statement.
        table: String,
    },

    /// The INSERT would have no columns and the dialect cannot express that.
    #[error("The '{dialect}' dialect does not support empty inserts")]
    EmptyInsertUnsupported {
        /// Dialect name.
        dialect: String,
    },

    /// Multi-row VALUES on a dialect without support.
    #[error("The '{dialect}' dialect does not support in-place multirow inserts")]
    MultiValuesUnsupported {
        /// Dialect name.
        dialect: String,
    },

    /// Explicit RETURNING on a dialect without support.
    #[error("RETURNING is not supported by the '{dialect}' dialect")]
    ReturningUnsupported {
        /// Dialect name.
        dialect: String,
    },

    /// A sequence had to be rendered on a dialect without sequences.
    #[error("Dialect '{dialect}' does not support sequence increments")]
    SequencesUnsupported {
        /// Dialect name.
        dialect: String,
    },
}

/// Classification of driver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseErrorKind {
    /// Problem with the driver interface rather than the database.
    Interface,
    /// Generic database error.
    Database,
    /// Problem with the processed data (division by zero, out of range).
    Data,
    /// Problem with the database's operation (disconnect, out of memory).
    Operational,
    /// Relational integrity violated (constraint failure).
    Integrity,
    /// Database internal error.
    Internal,
    /// Programming error (bad SQL, missing table).
    Programming,
    /// Feature not supported by the database.
    NotSupported,
}

impl DatabaseErrorKind {
    const TABLE: [(&'static str, Self); 8] = [
        ("InterfaceError", Self::Interface),
        ("DatabaseError", Self::Database),
        ("DataError", Self::Data),
        ("OperationalError", Self::Operational),
        ("IntegrityError", Self::Integrity),
        ("InternalError", Self::Internal),
        ("ProgrammingError", Self::Programming),
        ("NotSupportedError", Self::NotSupported),
    ];

    /// Resolves a stable error identifier such as `"IntegrityError"`.
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(name, _)| *name == identifier)
            .map(|(_, kind)| *kind)
    }

    /// The stable identifier of this kind.
    #[must_use]
    pub fn identifier(self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("DatabaseError", |(name, _)| name)
    }
}

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The statement cannot be compiled.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A malformed argument was rejected before planning.
    #[error("argument error: {0}")]
    Argument(String),

    /// An execution-time request cannot be satisfied.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A dialect configuration could not be read.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// A driver error, classified by the dialect.
    #[error("({}) {message}", .kind.identifier())]
    Database {
        /// Classified kind.
        kind: DatabaseErrorKind,
        /// Driver-specific code.
        code: String,
        /// Driver message.
        message: String,
    },
}

impl Error {
    /// Wraps a driver error, classifying its code through the dialect.
    #[must_use]
    pub fn from_driver(dialect: &dyn Dialect, code: &str, message: impl Into<String>) -> Self {
        Self::Database {
            kind: dialect.classify_error(code),
            code: code.to_owned(),
            message: message.into(),
        }
    }
}

/// Result type alias for compilation.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_lookup_round_trips_every_kind() {
        for (name, kind) in DatabaseErrorKind::TABLE {
            assert_eq!(DatabaseErrorKind::from_identifier(name), Some(kind));
            assert_eq!(kind.identifier(), name);
        }
        assert_eq!(DatabaseErrorKind::from_identifier("KeyError"), None);
    }

    #[test]
    fn test_unconsumed_message_names_keys() {
        let err = Error::from(CompileError::UnconsumedColumns {
            table: String::from("users"),
            columns: vec![String::from("bogus"), String::from("nope")],
        });
        assert_eq!(err.to_string(), "Unconsumed column names: bogus, nope");
    }
}
