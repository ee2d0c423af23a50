//! Declared SQL types of columns and bind parameters.

use core::fmt;

/// SQL data types.
///
/// [`SqlType::Null`] is the unresolved type: a bind parameter created without
/// a type picks up the type of the column it is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SqlType {
    /// Type not known yet.
    #[default]
    Null,
    /// Small integer (2 bytes).
    Smallint,
    /// Integer (4 bytes).
    Integer,
    /// Big integer (8 bytes).
    Bigint,
    /// Double precision float.
    Double,
    /// Decimal with optional precision and scale.
    Numeric {
        /// Total number of digits.
        precision: Option<u16>,
        /// Number of digits after decimal point.
        scale: Option<u16>,
    },
    /// Variable-length character string.
    Varchar(Option<u32>),
    /// Text (variable length, no limit).
    Text,
    /// Binary large object.
    Blob,
    /// Boolean.
    Boolean,
    /// Date.
    Date,
    /// Timestamp.
    Timestamp,
    /// Database-specific type, rendered verbatim.
    Custom(String),
}

impl SqlType {
    /// Returns true for the unresolved type.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for integer types, the only ones eligible to be an
    /// implicit autoincrement column.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Smallint | Self::Integer | Self::Bigint)
    }

    /// Returns the SQL representation of the type.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Smallint => String::from("SMALLINT"),
            Self::Integer => String::from("INTEGER"),
            Self::Bigint => String::from("BIGINT"),
            Self::Double => String::from("DOUBLE PRECISION"),
            Self::Numeric { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("NUMERIC({p}, {s})"),
                (Some(p), None) => format!("NUMERIC({p})"),
                _ => String::from("NUMERIC"),
            },
            Self::Varchar(Some(n)) => format!("VARCHAR({n})"),
            Self::Varchar(None) => String::from("VARCHAR"),
            Self::Text => String::from("TEXT"),
            Self::Blob => String::from("BLOB"),
            Self::Boolean => String::from("BOOLEAN"),
            Self::Date => String::from("DATE"),
            Self::Timestamp => String::from("TIMESTAMP"),
            Self::Custom(name) => name.clone(),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
