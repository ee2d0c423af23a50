//! Generic SQL dialect.

use super::Dialect;

/// A generic ANSI dialect: qmark placeholders, no sequences, no RETURNING,
/// generated keys read from the driver's last row id.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDialect;

impl GenericDialect {
    /// Creates a new generic dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &str {
        "generic"
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
}
