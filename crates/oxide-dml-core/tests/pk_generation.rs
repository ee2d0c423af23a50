//! How a primary key without a supplied value is obtained, for every
//! combination of the key-generation capabilities.

mod common;
use common::{capabilities, counter_default, names, users};

use std::collections::HashMap;

use oxide_dml_core::compiler::CompileWarning;
use oxide_dml_core::dialect::{Dialect, DialectConfig};
use oxide_dml_core::error::Error;
use oxide_dml_core::schema::{ColumnBuilder, ColumnDefault, Sequence, Table};
use oxide_dml_core::sql::{BindValue, Insert};
use oxide_dml_core::types::SqlType;
use oxide_dml_core::value::SqlValue;

#[derive(Debug, PartialEq)]
enum Outcome {
    Returning,
    Prefetch,
    Warning,
    LastRowId,
}

fn outcome_for(dialect: &dyn Dialect) -> Outcome {
    let t = users();
    let compiled = Insert::new(&t).value("name", "bob").compile(dialect).unwrap();
    let id = t.column("id").unwrap();

    let returned = compiled.returning().contains(&id);
    let prefetched = compiled.insert_prefetch().contains(&id);
    let warned = !compiled.warnings().is_empty();
    let lastrowid = compiled.returning_plan().unwrap().postfetch_lastrowid;

    match (returned, prefetched, warned) {
        (true, false, false) => Outcome::Returning,
        (false, true, false) => Outcome::Prefetch,
        (false, false, true) => Outcome::Warning,
        (false, false, false) if lastrowid => Outcome::LastRowId,
        other => panic!("Inconsistent registration for {}: {other:?}", dialect.name()),
    }
}

#[test]
fn autoincrement_key_decision_table() {
    let cases = [
        // implicit_returning, supports_sequences, postfetch_lastrowid
        ((true, false, false), Outcome::Returning),
        ((true, false, true), Outcome::Returning),
        ((true, true, false), Outcome::Returning),
        ((true, true, true), Outcome::Returning),
        ((false, true, false), Outcome::Prefetch),
        ((false, false, false), Outcome::Warning),
        ((false, false, true), Outcome::LastRowId),
        ((false, true, true), Outcome::LastRowId),
    ];
    for ((implicit, sequences, lastrowid), expected) in cases {
        let dialect = capabilities(implicit, sequences, lastrowid);
        assert_eq!(
            outcome_for(&dialect),
            expected,
            "implicit_returning={implicit} supports_sequences={sequences} \
             postfetch_lastrowid={lastrowid}"
        );
    }
}

#[test]
fn decision_is_stable_across_compiles() {
    for implicit in [false, true] {
        for sequences in [false, true] {
            for lastrowid in [false, true] {
                let dialect = capabilities(implicit, sequences, lastrowid);
                assert_eq!(outcome_for(&dialect), outcome_for(&dialect));
            }
        }
    }
}

#[test]
fn returning_scenario() {
    let t = users();
    let compiled = Insert::new(&t)
        .value("name", "bob")
        .compile(&capabilities(true, false, false))
        .unwrap();
    assert_eq!(compiled.sql(), "INSERT INTO users (name) VALUES (?) RETURNING id");
    assert_eq!(names(compiled.returning()), ["id"]);
    assert!(compiled.insert_prefetch().is_empty());
    let name = compiled.bind("name").unwrap();
    assert_eq!(name.value, BindValue::Value(SqlValue::Text(String::from("bob"))));
    assert!(name.is_crud);
}

#[test]
fn last_row_id_scenario() {
    let t = users();
    let compiled = Insert::new(&t)
        .value("name", "bob")
        .compile(&capabilities(false, false, true))
        .unwrap();
    assert_eq!(compiled.sql(), "INSERT INTO users (name) VALUES (?)");
    assert!(compiled.returning().is_empty());
    assert!(compiled.insert_prefetch().is_empty());
    let plan = compiled.returning_plan().unwrap();
    assert!(plan.need_pks);
    assert!(plan.postfetch_lastrowid);
    assert!(!plan.implicit_returning);
}

#[test]
fn prefetched_sequence_needs_its_value_before_execution() {
    let t = users();
    let compiled = Insert::new(&t)
        .value("name", "bob")
        .compile(&capabilities(false, true, false))
        .unwrap();
    assert_eq!(compiled.sql(), "INSERT INTO users (id, name) VALUES (?, ?)");
    assert_eq!(
        compiled.bind("id").unwrap().value,
        BindValue::Prefetch(ColumnDefault::Sequence(Sequence::new("users_id_seq")))
    );

    let err = compiled.positional_params(&HashMap::new()).unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    let mut overrides = HashMap::new();
    overrides.insert(String::from("id"), SqlValue::Int(41));
    assert_eq!(
        compiled.positional_params(&overrides).unwrap(),
        vec![SqlValue::Int(41), SqlValue::Text(String::from("bob"))]
    );
}

#[test]
fn warning_names_the_column() {
    let t = users();
    let compiled = Insert::new(&t)
        .value("name", "bob")
        .compile(&capabilities(false, false, false))
        .unwrap();
    assert_eq!(
        compiled.warnings(),
        [CompileWarning::PrimaryKeyWithoutValue {
            table: String::from("users"),
            column: String::from("id"),
        }]
    );
    assert!(compiled.warnings()[0]
        .to_string()
        .starts_with("Column 'users.id' is marked as a member of the primary key"));
}

#[test]
fn natural_key_without_value_always_warns() {
    let t = Table::builder("countries")
        .column(ColumnBuilder::new("code", SqlType::Text).primary_key())
        .column(ColumnBuilder::new("name", SqlType::Text))
        .build()
        .unwrap();
    for implicit in [false, true] {
        for sequences in [false, true] {
            for lastrowid in [false, true] {
                let compiled = Insert::new(&t)
                    .value("name", "Belgium")
                    .compile(&capabilities(implicit, sequences, lastrowid))
                    .unwrap();
                assert_eq!(compiled.warnings().len(), 1);
                assert!(compiled.returning().is_empty());
                assert!(compiled.insert_prefetch().is_empty());
            }
        }
    }
}

#[test]
fn client_default_key_is_prefetched_without_returning() {
    let (default, _) = counter_default();
    let t = Table::builder("jobs")
        .column(ColumnBuilder::new("id", SqlType::Integer).primary_key().default(default))
        .column(ColumnBuilder::new("kind", SqlType::Text))
        .build()
        .unwrap();
    for implicit in [false, true] {
        let compiled = Insert::new(&t)
            .value("kind", "sync")
            .compile(&capabilities(implicit, false, false))
            .unwrap();
        assert_eq!(compiled.sql(), "INSERT INTO jobs (id, kind) VALUES (?, ?)");
        assert_eq!(names(compiled.insert_prefetch()), ["id"]);
        assert!(compiled.returning().is_empty());
    }
}

#[test]
fn table_can_opt_out_of_implicit_returning() {
    let t = Table::builder("users")
        .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
        .column(ColumnBuilder::new("name", SqlType::Text))
        .implicit_returning(false)
        .build()
        .unwrap();
    let dialect = DialectConfig {
        supports_returning: true,
        implicit_returning: true,
        postfetch_lastrowid: true,
        ..DialectConfig::default()
    }
    .into_dialect();
    let compiled = Insert::new(&t).value("name", "bob").compile(&dialect).unwrap();
    assert_eq!(compiled.sql(), "INSERT INTO users (name) VALUES (?)");
    assert!(compiled.returning_plan().unwrap().postfetch_lastrowid);
}

#[test]
fn dialect_config_from_json() {
    let dialect = DialectConfig::from_json(
        r#"{ "name": "warehouse", "implicit_returning": true, "supports_returning": true }"#,
    )
    .unwrap()
    .into_dialect();
    let t = users();
    let compiled = Insert::new(&t).value("name", "bob").compile(&dialect).unwrap();
    assert_eq!(compiled.sql(), "INSERT INTO users (name) VALUES (?) RETURNING id");

    assert!(matches!(
        DialectConfig::from_json("{ \"implicit_returning\": 3 }"),
        Err(Error::Config(_))
    ));
}
