//! Column definitions.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Deref;
use std::sync::Arc;

use super::default::{ColumnDefault, ServerDefault};
use crate::sql::{BinaryOp, BindParameter, Expr};
use crate::types::SqlType;
use crate::value::ToSqlValue;

/// Autoincrement setting of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Autoincrement {
    /// Eligible when it is the table's single integer primary key.
    #[default]
    Auto,
    /// Always the autoincrement column.
    Always,
    /// Never the autoincrement column.
    Never,
}

/// A table column.
///
/// Columns are created through [`ColumnBuilder`] and become immutable once
/// the owning table is built. Two columns are the same column when they
/// share schema, table name and key.
#[derive(Debug)]
pub struct Column {
    pub(crate) name: String,
    pub(crate) key: String,
    pub(crate) table: String,
    pub(crate) schema: Option<String>,
    pub(crate) sql_type: SqlType,
    pub(crate) nullable: bool,
    pub(crate) primary_key: bool,
    pub(crate) autoincrement: Autoincrement,
    pub(crate) default: Option<ColumnDefault>,
    pub(crate) server_default: Option<ServerDefault>,
    pub(crate) onupdate: Option<ColumnDefault>,
    pub(crate) server_onupdate: Option<ServerDefault>,
}

impl Column {
    /// SQL name of the column.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key used to address the column in statement parameters.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Name of the owning table.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Schema of the owning table.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Declared type.
    #[must_use]
    pub const fn sql_type(&self) -> &SqlType {
        &self.sql_type
    }

    /// Whether the column accepts NULL.
    #[must_use]
    pub const fn nullable(&self) -> bool {
        self.nullable
    }

    /// Whether the column is part of the primary key.
    #[must_use]
    pub const fn primary_key(&self) -> bool {
        self.primary_key
    }

    /// Autoincrement setting.
    #[must_use]
    pub const fn autoincrement(&self) -> Autoincrement {
        self.autoincrement
    }

    /// Client-side INSERT default.
    #[must_use]
    pub const fn default(&self) -> Option<&ColumnDefault> {
        self.default.as_ref()
    }

    /// Server-side INSERT default.
    #[must_use]
    pub const fn server_default(&self) -> Option<&ServerDefault> {
        self.server_default.as_ref()
    }

    /// Client-side UPDATE default.
    #[must_use]
    pub const fn onupdate(&self) -> Option<&ColumnDefault> {
        self.onupdate.as_ref()
    }

    /// Server-side UPDATE marker.
    #[must_use]
    pub const fn server_onupdate(&self) -> Option<&ServerDefault> {
        self.server_onupdate.as_ref()
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.schema == other.schema && self.key == other.key
    }
}

impl Eq for Column {}

impl Hash for Column {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.hash(state);
        self.schema.hash(state);
        self.key.hash(state);
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{schema}.")?;
        }
        write!(f, "{}.{}", self.table, self.name)
    }
}

/// A shared handle to a column of a built table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef(pub(crate) Arc<Column>);

impl Deref for ColumnRef {
    type Target = Column;

    fn deref(&self) -> &Column {
        &self.0
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ColumnRef {
    /// Returns this column as an expression.
    #[must_use]
    pub fn expr(&self) -> Expr {
        Expr::Column(self.clone())
    }

    /// Creates an anonymous bind parameter typed like this column.
    #[must_use]
    pub fn bind<T: ToSqlValue>(&self, value: T) -> Expr {
        Expr::Bind(BindParameter::anonymous(
            &self.key,
            value.to_sql_value(),
            self.sql_type.clone(),
        ))
    }

    fn compare<T: ToSqlValue>(&self, op: BinaryOp, value: T) -> Expr {
        self.expr().binary(op, self.bind(value))
    }

    /// Creates `column = :key_n`.
    #[must_use]
    pub fn eq<T: ToSqlValue>(&self, value: T) -> Expr {
        self.compare(BinaryOp::Eq, value)
    }

    /// Creates `column != :key_n`.
    #[must_use]
    pub fn not_eq<T: ToSqlValue>(&self, value: T) -> Expr {
        self.compare(BinaryOp::NotEq, value)
    }

    /// Creates `column < :key_n`.
    #[must_use]
    pub fn lt<T: ToSqlValue>(&self, value: T) -> Expr {
        self.compare(BinaryOp::Lt, value)
    }

    /// Creates `column > :key_n`.
    #[must_use]
    pub fn gt<T: ToSqlValue>(&self, value: T) -> Expr {
        self.compare(BinaryOp::Gt, value)
    }

    /// Creates `column + :key_n`.
    #[must_use]
    pub fn add<T: ToSqlValue>(&self, value: T) -> Expr {
        self.compare(BinaryOp::Add, value)
    }
}

/// Fluent column definition builder.
#[derive(Debug, Clone)]
pub struct ColumnBuilder {
    name: String,
    key: Option<String>,
    sql_type: SqlType,
    nullable: bool,
    primary_key: bool,
    autoincrement: Autoincrement,
    default: Option<ColumnDefault>,
    server_default: Option<ServerDefault>,
    onupdate: Option<ColumnDefault>,
    server_onupdate: Option<ServerDefault>,
}

impl ColumnBuilder {
    /// Creates a new column builder with name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            key: None,
            sql_type,
            nullable: true,
            primary_key: false,
            autoincrement: Autoincrement::Auto,
            default: None,
            server_default: None,
            onupdate: None,
            server_onupdate: None,
        }
    }

    /// Sets a parameter key different from the SQL name.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Marks the column as NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Marks the column as part of the primary key (implies NOT NULL).
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Sets the autoincrement behavior.
    #[must_use]
    pub const fn autoincrement(mut self, autoincrement: Autoincrement) -> Self {
        self.autoincrement = autoincrement;
        self
    }

    /// Sets the client-side INSERT default.
    #[must_use]
    pub fn default(mut self, default: impl Into<ColumnDefault>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets the server-side INSERT default.
    #[must_use]
    pub fn server_default(mut self, default: ServerDefault) -> Self {
        self.server_default = Some(default);
        self
    }

    /// Sets the client-side UPDATE default.
    #[must_use]
    pub fn onupdate(mut self, default: impl Into<ColumnDefault>) -> Self {
        self.onupdate = Some(default.into());
        self
    }

    /// Sets the server-side UPDATE marker.
    #[must_use]
    pub fn server_onupdate(mut self, default: ServerDefault) -> Self {
        self.server_onupdate = Some(default);
        self
    }

    /// Returns the key this column will be addressed by.
    pub(crate) fn resolved_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }

    pub(crate) fn build(self, table: &str, schema: Option<&str>) -> Column {
        let key = self.key.unwrap_or_else(|| self.name.clone());
        Column {
            name: self.name,
            key,
            table: String::from(table),
            schema: schema.map(String::from),
            sql_type: self.sql_type,
            nullable: self.nullable,
            primary_key: self.primary_key,
            autoincrement: self.autoincrement,
            default: self.default,
            server_default: self.server_default,
            onupdate: self.onupdate,
            server_onupdate: self.server_onupdate,
        }
    }
}
