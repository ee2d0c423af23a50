#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use oxide_dml_core::compiler::Compiled;
use oxide_dml_core::dialect::{ConfiguredDialect, DialectConfig};
use oxide_dml_core::schema::{ColumnBuilder, ColumnDefault, ServerDefault, Table};
use oxide_dml_core::sql::Expr;
use oxide_dml_core::types::SqlType;
use oxide_dml_core::value::SqlValue;

/// `users(id PK autoincrement, name)`.
pub fn users() -> Arc<Table> {
    Table::builder("users")
        .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
        .column(ColumnBuilder::new("name", SqlType::Text))
        .build()
        .unwrap()
}

/// `addresses(id PK, user_id, email, touched)` with an on-update clause.
pub fn addresses() -> Arc<Table> {
    Table::builder("addresses")
        .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
        .column(ColumnBuilder::new("user_id", SqlType::Integer))
        .column(ColumnBuilder::new("email", SqlType::Text))
        .column(
            ColumnBuilder::new("touched", SqlType::Timestamp)
                .onupdate(Expr::func("now", vec![])),
        )
        .build()
        .unwrap()
}

/// A table mixing supplied, client-defaulted and server-defaulted columns.
pub fn accounts() -> Arc<Table> {
    Table::builder("accounts")
        .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
        .column(ColumnBuilder::new("name", SqlType::Text))
        .column(ColumnBuilder::new("email", SqlType::Text))
        .column(
            ColumnBuilder::new("status", SqlType::Text)
                .default(SqlValue::Text(String::from("active"))),
        )
        .column(
            ColumnBuilder::new("created", SqlType::Timestamp)
                .server_default(ServerDefault::text("CURRENT_TIMESTAMP")),
        )
        .build()
        .unwrap()
}

/// `documents(id PK, title, body, revised)`; `revised` is set by every
/// UPDATE.
pub fn documents() -> Arc<Table> {
    Table::builder("documents")
        .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
        .column(ColumnBuilder::new("title", SqlType::Text))
        .column(ColumnBuilder::new("body", SqlType::Text))
        .column(
            ColumnBuilder::new("revised", SqlType::Timestamp)
                .onupdate(Expr::func("now", vec![])),
        )
        .build()
        .unwrap()
}

/// A dialect with the three key-generation capabilities set as given and
/// every other capability off. RETURNING is accepted whenever it is
/// implicit.
pub fn capabilities(
    implicit_returning: bool,
    supports_sequences: bool,
    postfetch_lastrowid: bool,
) -> ConfiguredDialect {
    DialectConfig {
        supports_returning: implicit_returning,
        implicit_returning,
        supports_sequences,
        postfetch_lastrowid,
        ..DialectConfig::default()
    }
    .into_dialect()
}

/// A client-side default returning 1, 2, 3, ... and the counter behind it.
pub fn counter_default() -> (ColumnDefault, Arc<AtomicI64>) {
    let counter = Arc::new(AtomicI64::new(0));
    let calls = Arc::clone(&counter);
    let default =
        ColumnDefault::callable(move || SqlValue::Int(calls.fetch_add(1, Ordering::SeqCst) + 1));
    (default, counter)
}

/// Names of the planned columns of the first VALUES/SET row.
pub fn planned_columns(compiled: &Compiled) -> Vec<String> {
    compiled.crud_params()[0]
        .iter()
        .map(|p| {
            p.as_column()
                .map_or_else(|| String::from("<expr>"), |c| c.name().to_owned())
        })
        .collect()
}

pub fn names(columns: &[oxide_dml_core::schema::ColumnRef]) -> Vec<&str> {
    columns.iter().map(|c| c.name()).collect()
}
