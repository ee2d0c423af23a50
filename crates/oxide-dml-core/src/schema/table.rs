//! Table definitions.

use std::collections::HashSet;
use std::sync::Arc;

use super::column::{Autoincrement, Column, ColumnBuilder, ColumnRef};
use super::default::ColumnDefault;
use crate::error::{Error, Result};

/// A table: an ordered collection of columns.
///
/// Column order is significant; it is the order columns are rendered in
/// INSERT and UPDATE statements.
#[derive(Debug)]
pub struct Table {
    name: String,
    schema: Option<String>,
    columns: Vec<ColumnRef>,
    autoincrement: Option<usize>,
    implicit_returning: bool,
}

impl Table {
    /// Starts building a table.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder::new(name)
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema name.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    /// Looks up a column by key.
    #[must_use]
    pub fn c(&self, key: &str) -> Option<&ColumnRef> {
        self.columns.iter().find(|c| c.key() == key)
    }

    /// Looks up a column by key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] if the table has no column with that key.
    pub fn column(&self, key: &str) -> Result<ColumnRef> {
        self.c(key).cloned().ok_or_else(|| {
            Error::Argument(format!("table '{}' has no column '{key}'", self.name))
        })
    }

    /// Whether `column` belongs to this table.
    #[must_use]
    pub fn contains(&self, column: &Column) -> bool {
        column.table_name() == self.name
            && column.schema() == self.schema()
            && self.c(column.key()).is_some()
    }

    /// Primary key columns in declaration order.
    pub fn primary_key(&self) -> impl Iterator<Item = &ColumnRef> {
        self.columns.iter().filter(|c| c.primary_key())
    }

    /// The column receiving a database-generated identity value, if any.
    #[must_use]
    pub fn autoincrement_column(&self) -> Option<&ColumnRef> {
        self.autoincrement.map(|i| &self.columns[i])
    }

    /// Whether `column` is this table's autoincrement column.
    #[must_use]
    pub fn is_autoincrement(&self, column: &Column) -> bool {
        self.autoincrement_column().is_some_and(|c| **c == *column)
    }

    /// Whether RETURNING may be attached implicitly to statements against
    /// this table.
    #[must_use]
    pub const fn implicit_returning(&self) -> bool {
        self.implicit_returning
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.schema == other.schema
    }
}

/// Fluent table builder.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    name: String,
    schema: Option<String>,
    columns: Vec<ColumnBuilder>,
    implicit_returning: bool,
}

impl TableBuilder {
    /// Creates a new table builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            columns: Vec::new(),
            implicit_returning: true,
        }
    }

    /// Sets the schema.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: ColumnBuilder) -> Self {
        self.columns.push(column);
        self
    }

    /// Enables or disables implicit RETURNING for this table.
    #[must_use]
    pub const fn implicit_returning(mut self, enabled: bool) -> Self {
        self.implicit_returning = enabled;
        self
    }

    /// Builds the table, attaching every column to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] on a duplicate column key or when more
    /// than one column is marked autoincrement.
    pub fn build(self) -> Result<Arc<Table>> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.resolved_key().to_owned()) {
                return Err(Error::Argument(format!(
                    "duplicate column key '{}' in table '{}'",
                    column.resolved_key(),
                    self.name
                )));
            }
        }

        let columns: Vec<ColumnRef> = self
            .columns
            .into_iter()
            .map(|c| ColumnRef(Arc::new(c.build(&self.name, self.schema.as_deref()))))
            .collect();
        let autoincrement = resolve_autoincrement(&columns)?;

        Ok(Arc::new(Table {
            name: self.name,
            schema: self.schema,
            columns,
            autoincrement,
            implicit_returning: self.implicit_returning,
        }))
    }
}

fn resolve_autoincrement(columns: &[ColumnRef]) -> Result<Option<usize>> {
    let explicit: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.primary_key() && c.autoincrement() == Autoincrement::Always)
        .map(|(i, _)| i)
        .collect();
    match explicit.as_slice() {
        [single] => return Ok(Some(*single)),
        [] => {}
        _ => {
            return Err(Error::Argument(String::from(
                "only one column per table may be marked autoincrement",
            )))
        }
    }

    let pks: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.primary_key())
        .map(|(i, _)| i)
        .collect();
    let [single] = pks.as_slice() else {
        return Ok(None);
    };
    let col = &columns[*single];
    let eligible = col.autoincrement() == Autoincrement::Auto
        && col.sql_type().is_integer()
        && col.default().is_none_or(ColumnDefault::is_sequence);
    Ok(eligible.then_some(*single))
}
