//! # oxide-dml-sqlite
//!
//! SQLite dialect for `oxide-dml-core`.
//!
//! # How SQLite differs from other dialects
//!
//! - **Generated keys**: an `INTEGER PRIMARY KEY` column is an alias for
//!   the [rowid]; the driver reports it after each INSERT, so the
//!   planner leaves autoincrement keys out of the statement and relies on
//!   the last row id instead of RETURNING.
//! - **[RETURNING]**: accepted on INSERT, UPDATE and DELETE (since
//!   SQLite 3.35.0) when asked for explicitly. It is not attached
//!   implicitly.
//! - **No sequences**: a column whose default is a sequence falls back to
//!   the last row id or to the conservative path.
//! - **`DEFAULT VALUES`** and multi-row `VALUES` lists are both accepted.
//! - **[UPDATE FROM]**: supported since SQLite 3.33.0 with PostgreSQL
//!   syntax.
//! - **[Result codes]**: driver failures carry a primary or extended
//!   result code (`SQLITE_CONSTRAINT_UNIQUE`, `2067`), classified by
//!   [`SqliteDialect`] into a `DatabaseErrorKind`.
//!
//! [rowid]: https://www.sqlite.org/lang_createtable.html#rowid
//! [RETURNING]: https://www.sqlite.org/lang_returning.html
//! [UPDATE FROM]: https://www.sqlite.org/lang_update.html#update_from
//! [Result codes]: https://www.sqlite.org/rescode.html
//!
//! ## Example
//!
//! ```rust
//! use oxide_dml_core::schema::{ColumnBuilder, Table};
//! use oxide_dml_core::sql::Insert;
//! use oxide_dml_core::types::SqlType;
//! use oxide_dml_sqlite::SqliteDialect;
//!
//! let notes = Table::builder("notes")
//!     .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
//!     .column(ColumnBuilder::new("body", SqlType::Text))
//!     .build()
//!     .unwrap();
//!
//! let compiled = Insert::new(&notes)
//!     .value("body", "hello")
//!     .compile(&SqliteDialect::new())
//!     .unwrap();
//!
//! assert_eq!(compiled.sql(), "INSERT INTO notes (body) VALUES (?)");
//! assert!(compiled.returning_plan().unwrap().postfetch_lastrowid);
//! ```

mod dialect;

pub use dialect::SqliteDialect;
