//! # oxide-dml-core
//!
//! SQL expression compiler with an INSERT/UPDATE parameter planner.
//!
//! This crate provides:
//! - A schema model: tables, columns, client-side and server-side defaults
//! - An immutable expression tree for SELECT, INSERT, UPDATE and DELETE
//! - A dialect hook table describing how a backend quotes identifiers,
//!   renders placeholders and produces generated values
//! - A compiler that renders statements to SQL and decides, per column,
//!   how each value of an INSERT or UPDATE is obtained
//!
//! ## Planning an INSERT
//!
//! Columns are visited in table order. A supplied value becomes a bind
//! parameter; a missing one is resolved through its default or through the
//! dialect's mechanism for generated primary keys:
//!
//! ```rust
//! use oxide_dml_core::dialect::PostgresDialect;
//! use oxide_dml_core::schema::{ColumnBuilder, Table};
//! use oxide_dml_core::sql::Insert;
//! use oxide_dml_core::types::SqlType;
//!
//! let users = Table::builder("users")
//!     .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
//!     .column(ColumnBuilder::new("name", SqlType::Text))
//!     .build()
//!     .unwrap();
//!
//! let compiled = Insert::new(&users)
//!     .value("name", "bob")
//!     .compile(&PostgresDialect::new())
//!     .unwrap();
//!
//! assert_eq!(
//!     compiled.sql(),
//!     "INSERT INTO users (name) VALUES (%(name)s) RETURNING id"
//! );
//! assert_eq!(compiled.returning()[0].name(), "id");
//! ```
//!
//! ## Execution-time values
//!
//! Client-side defaults are not evaluated at compile time. The compiled
//! statement records them, and [`compiler::Compiled::construct_params`]
//! evaluates each one when the statement is about to be executed:
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use oxide_dml_core::dialect::GenericDialect;
//! use oxide_dml_core::schema::{ColumnBuilder, Table};
//! use oxide_dml_core::sql::Insert;
//! use oxide_dml_core::types::SqlType;
//! use oxide_dml_core::value::SqlValue;
//!
//! let tasks = Table::builder("tasks")
//!     .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
//!     .column(ColumnBuilder::new("state", SqlType::Text).default(SqlValue::Text("new".into())))
//!     .build()
//!     .unwrap();
//!
//! let compiled = Insert::new(&tasks).value("id", 1).compile(&GenericDialect::new()).unwrap();
//! assert_eq!(compiled.sql(), "INSERT INTO tasks (id, state) VALUES (?, ?)");
//!
//! let params = compiled.positional_params(&HashMap::new()).unwrap();
//! assert_eq!(params, vec![SqlValue::Int(1), SqlValue::Text("new".into())]);
//! ```

pub mod compiler;
pub mod dialect;
pub mod error;
pub mod schema;
pub mod sql;
pub mod types;
pub mod value;

pub use compiler::{CompileOptions, Compiled, Compiler};
pub use dialect::Dialect;
pub use error::{CompileError, Error, Result};
pub use schema::{ColumnBuilder, Table};
pub use sql::{Delete, Expr, Insert, Select, Statement, Update};
pub use types::SqlType;
pub use value::SqlValue;
