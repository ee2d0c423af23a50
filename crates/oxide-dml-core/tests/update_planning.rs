//! UPDATE planning: SET order, explicit ordering, multi-table keys and
//! compile determinism.

mod common;
use common::{addresses, counter_default, documents, names, planned_columns, users};

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use oxide_dml_core::dialect::{GenericDialect, MysqlDialect, PostgresDialect};
use oxide_dml_core::error::{CompileError, Error};
use oxide_dml_core::schema::{ColumnBuilder, ColumnDefault, ServerDefault, Table};
use oxide_dml_core::sql::{Insert, Update};
use oxide_dml_core::types::SqlType;
use oxide_dml_core::value::SqlValue;
use oxide_dml_core::Dialect;

#[test]
fn set_follows_table_order() {
    let t = documents();
    for pairs in [
        [("body", "b"), ("title", "t")],
        [("title", "t"), ("body", "b")],
    ] {
        let compiled = Update::new(&t)
            .values(pairs)
            .where_clause(t.column("id").unwrap().eq(1))
            .compile(&GenericDialect::new())
            .unwrap();
        assert_eq!(
            compiled.sql(),
            "UPDATE documents SET title=?, body=?, revised=now() WHERE id = ?"
        );
        assert_eq!(planned_columns(&compiled), ["title", "body", "revised"]);
        assert_eq!(compiled.positiontup().unwrap(), ["title", "body", "id_1"]);
        assert_eq!(names(compiled.postfetch()), ["revised"]);
    }
}

#[test]
fn explicit_ordering_comes_first() {
    let t = documents();
    let stmt = Update::new(&t)
        .ordered_values([("body", "b"), ("title", "t")])
        .where_clause(t.column("id").unwrap().eq(1));
    let first = stmt.compile(&GenericDialect::new()).unwrap();
    assert_eq!(
        first.sql(),
        "UPDATE documents SET body=?, title=?, revised=now() WHERE id = ?"
    );
    assert_eq!(planned_columns(&first), ["body", "title", "revised"]);

    let second = stmt.compile(&GenericDialect::new()).unwrap();
    assert_eq!(first.sql(), second.sql());
    assert_eq!(planned_columns(&first), planned_columns(&second));
}

#[test]
fn explicit_ordering_subset_keeps_table_order_for_the_rest() {
    let t = Table::builder("profiles")
        .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
        .column(ColumnBuilder::new("a", SqlType::Text))
        .column(ColumnBuilder::new("b", SqlType::Text).onupdate(SqlValue::Text(String::from("x"))))
        .column(ColumnBuilder::new("c", SqlType::Text))
        .column(ColumnBuilder::new("d", SqlType::Text).onupdate(SqlValue::Text(String::from("y"))))
        .build()
        .unwrap();
    let compiled = Update::new(&t)
        .ordered_values([("c", "3"), ("a", "1")])
        .compile(&GenericDialect::new())
        .unwrap();
    assert_eq!(compiled.sql(), "UPDATE profiles SET c=?, a=?, b=?, d=?");
    assert_eq!(names(compiled.update_prefetch()), ["b", "d"]);
    assert!(compiled.insert_prefetch().is_empty());
}

#[test]
fn compiling_twice_is_identical() {
    let (default, _) = counter_default();
    let t = Table::builder("tickets")
        .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
        .column(ColumnBuilder::new("title", SqlType::Text))
        .column(ColumnBuilder::new("seq", SqlType::Integer).default(default))
        .build()
        .unwrap();
    let insert = Insert::new(&t).value("title", "a");
    let update = Update::new(&t)
        .value("title", "b")
        .where_clause(t.column("id").unwrap().eq(4).and(t.column("seq").unwrap().gt(1)));

    for dialect in [
        &PostgresDialect::new() as &dyn Dialect,
        &MysqlDialect::new(),
        &GenericDialect::new(),
    ] {
        let a = insert.compile(dialect).unwrap();
        let b = insert.compile(dialect).unwrap();
        assert_eq!(a.sql(), b.sql());
        assert_eq!(a.binds(), b.binds());
        assert_eq!(a.positiontup(), b.positiontup());

        let a = update.compile(dialect).unwrap();
        let b = update.compile(dialect).unwrap();
        assert_eq!(a.sql(), b.sql());
        assert_eq!(a.binds(), b.binds());
    }
}

#[test]
fn extra_table_columns_are_qualified() {
    let u = users();
    let a = addresses();
    let stmt = Update::new(&u)
        .value("name", "ann")
        .value(a.column("email").unwrap(), "ann@example.com")
        .extra_from(&a)
        .where_clause(
            u.column("id")
                .unwrap()
                .expr()
                .eq(a.column("user_id").unwrap().expr()),
        );

    let compiled = stmt.compile(&MysqlDialect::new()).unwrap();
    assert_eq!(
        compiled.sql(),
        "UPDATE users, addresses SET addresses.email=%s, addresses.touched=now(), \
         users.name=%s WHERE users.id = addresses.user_id"
    );
    assert_eq!(
        compiled.positiontup().unwrap(),
        ["addresses_email", "name"]
    );
    assert_eq!(names(compiled.postfetch()), ["touched"]);

    let compiled = stmt.compile(&PostgresDialect::new()).unwrap();
    assert_eq!(
        compiled.sql(),
        "UPDATE users SET email=%(addresses_email)s, touched=now(), name=%(name)s \
         FROM addresses WHERE users.id = addresses.user_id"
    );
    let params: HashMap<String, SqlValue> = compiled
        .construct_params(&HashMap::new())
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(params["name"], SqlValue::Text(String::from("ann")));
    assert_eq!(
        params["addresses_email"],
        SqlValue::Text(String::from("ann@example.com"))
    );
}

#[test]
fn extra_table_key_given_by_name_is_unconsumed() {
    let u = users();
    let a = addresses();
    let err = Update::new(&u)
        .value("name", "ann")
        .value("email", "ann@example.com")
        .extra_from(&a)
        .compile(&PostgresDialect::new())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Compile(CompileError::UnconsumedColumns { ref columns, .. }) if columns == &["email"]
    ));
}

/// `profiles(id PK, user_id, bio, version, synced)`: `version` comes from a
/// client-side counter on every UPDATE, `synced` is set by the server.
fn profiles(version: ColumnDefault) -> Arc<Table> {
    Table::builder("profiles")
        .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
        .column(ColumnBuilder::new("user_id", SqlType::Integer))
        .column(ColumnBuilder::new("bio", SqlType::Text))
        .column(ColumnBuilder::new("version", SqlType::Integer).onupdate(version))
        .column(
            ColumnBuilder::new("synced", SqlType::Timestamp)
                .server_onupdate(ServerDefault::fetched()),
        )
        .build()
        .unwrap()
}

#[test]
fn affected_extra_table_runs_its_onupdate_defaults() {
    let u = users();
    let (version, calls) = counter_default();
    let p = profiles(version);
    let compiled = Update::new(&u)
        .value("name", "ann")
        .value(p.column("bio").unwrap(), "hello")
        .extra_from(&p)
        .compile(&MysqlDialect::new())
        .unwrap();

    assert_eq!(
        compiled.sql(),
        "UPDATE users, profiles SET profiles.bio=%s, profiles.version=%s, users.name=%s"
    );
    assert_eq!(
        compiled.positiontup().unwrap(),
        ["profiles_bio", "profiles_version", "name"]
    );
    assert_eq!(names(compiled.update_prefetch()), ["version"]);
    assert_eq!(names(compiled.postfetch()), ["synced"]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let params: HashMap<String, SqlValue> = compiled
        .construct_params(&HashMap::new())
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(params["profiles_version"], SqlValue::Int(1));
    assert_eq!(params["profiles_bio"], SqlValue::Text(String::from("hello")));
}

#[test]
fn untouched_extra_table_adds_no_onupdate_entries() {
    let u = users();
    let (version, calls) = counter_default();
    let p = profiles(version);
    let compiled = Update::new(&u)
        .value("name", "ann")
        .extra_from(&p)
        .where_clause(
            u.column("id")
                .unwrap()
                .expr()
                .eq(p.column("user_id").unwrap().expr()),
        )
        .compile(&MysqlDialect::new())
        .unwrap();

    assert_eq!(
        compiled.sql(),
        "UPDATE users, profiles SET users.name=%s WHERE users.id = profiles.user_id"
    );
    assert_eq!(planned_columns(&compiled), ["name"]);
    assert!(compiled.update_prefetch().is_empty());
    assert!(compiled.postfetch().is_empty());
    compiled.construct_params(&HashMap::new()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn same_named_table_in_another_schema_keeps_primary_keys_plain() {
    let users_in = |schema: &str| {
        Table::builder("users")
            .schema(schema)
            .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
            .column(ColumnBuilder::new("name", SqlType::Text))
            .build()
            .unwrap()
    };
    let (a_users, b_users) = (users_in("a"), users_in("b"));
    let stmt = Update::new(&a_users).value("name", "x").extra_from(&b_users);

    let compiled = stmt.compile(&MysqlDialect::new()).unwrap();
    assert_eq!(compiled.sql(), "UPDATE a.users, b.users SET a.users.name=%s");
    assert_eq!(compiled.positiontup().unwrap(), ["name"]);

    let compiled = stmt.compile(&PostgresDialect::new()).unwrap();
    assert_eq!(compiled.sql(), "UPDATE a.users SET name=%(name)s FROM b.users");

    let compiled = Update::new(&a_users)
        .value("name", "x")
        .value(b_users.column("name").unwrap(), "y")
        .extra_from(&b_users)
        .compile(&MysqlDialect::new())
        .unwrap();
    assert_eq!(
        compiled.sql(),
        "UPDATE a.users, b.users SET b.users.name=%s, a.users.name=%s"
    );
    assert_eq!(compiled.positiontup().unwrap(), ["users_name", "name"]);
}

#[test]
fn empty_set_clause_is_rejected() {
    let t = users();
    let err = Update::new(&t)
        .values(Vec::<(&str, i32)>::new())
        .compile(&GenericDialect::new())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Compile(CompileError::EmptyUpdate { ref table }) if table == "users"
    ));
}
