//! Default resolution for columns without a supplied value.
//!
//! Backends learn generated primary keys in different ways: through
//! RETURNING, through the driver's last row id, by pre-executing a sequence,
//! or from a value computed on the client. Exactly one of these is chosen per
//! column from the dialect's capabilities.

use tracing::trace;

use super::compiled::CompileWarning;
use super::crud::{CrudParam, CrudPlanner};
use crate::error::Result;
use crate::schema::{ColumnDefault, ColumnRef, Sequence};
use crate::sql::{BindParameter, BindValue, Expr, ReturnDefaults};

impl CrudPlanner<'_, '_, '_> {
    pub(super) fn sequence_usable(&self, seq: &Sequence) -> bool {
        let dialect = self.compiler.dialect;
        dialect.supports_sequences() && (!seq.optional || !dialect.sequences_optional())
    }

    /// Registers a bind whose value is produced by `default` before the
    /// statement is executed.
    pub(super) fn prefetch_bind(
        &mut self,
        column: &ColumnRef,
        default: ColumnDefault,
        name: String,
    ) -> Result<String> {
        let sql = self
            .compiler
            .crud_bind(column, BindValue::Prefetch(default), name)?;
        if self.compiler.kind.is_update() {
            self.compiler.update_prefetch.push(column.clone());
        } else {
            self.compiler.insert_prefetch.push(column.clone());
        }
        trace!(column = %column, "Default prefetched");
        Ok(sql)
    }

    fn push_inline(&mut self, column: &ColumnRef, expr: &Expr) -> Result<()> {
        let sql = self.compiler.nested().process(expr)?;
        self.values.push(CrudParam::column(column, sql));
        Ok(())
    }

    fn push_prefetch(&mut self, column: &ColumnRef, default: ColumnDefault) -> Result<()> {
        let sql = self.prefetch_bind(column, default, column.key().to_owned())?;
        self.values.push(CrudParam::column(column, sql));
        Ok(())
    }

    /// `returning` when claimed by `return_defaults`, else `postfetch`
    /// unless the column is part of the primary key.
    fn returning_or_postfetch(&mut self, column: &ColumnRef) {
        if self.plan.returns_default(column) {
            self.compiler.returning.push(column.clone());
        } else if !column.primary_key() {
            self.compiler.postfetch.push(column.clone());
        }
    }

    fn warn_pk_without_value(&mut self, column: &ColumnRef) {
        self.compiler.warn(CompileWarning::PrimaryKeyWithoutValue {
            table: column.table_name().to_owned(),
            column: column.name().to_owned(),
        });
    }

    /// INSERT: a column that was given no value.
    pub(super) fn append_insert_default(&mut self, column: &ColumnRef) -> Result<()> {
        let autoincrement = self.stmt.table.is_autoincrement(column);
        let plan = &self.plan;
        let pk_needed = column.primary_key()
            && plan.need_pks
            && (plan.implicit_returning || !plan.postfetch_lastrowid || !autoincrement);

        if pk_needed {
            if self.plan.implicit_returning {
                self.insert_pk_returning(column, autoincrement)
            } else {
                self.insert_pk_prefetch(column, autoincrement)
            }
        } else if let Some(default) = column.default() {
            self.insert_hasdefault(column, default)
        } else if column.server_default().is_some() {
            self.returning_or_postfetch(column);
            Ok(())
        } else if self.plan.returns_default(column) {
            self.compiler.returning.push(column.clone());
            Ok(())
        } else {
            if column.primary_key() && !autoincrement && !column.nullable() {
                self.warn_pk_without_value(column);
            }
            Ok(())
        }
    }

    /// Primary key learned through the implicit RETURNING clause.
    fn insert_pk_returning(&mut self, column: &ColumnRef, autoincrement: bool) -> Result<()> {
        match column.default() {
            Some(ColumnDefault::Sequence(seq)) => {
                if self.sequence_usable(seq) {
                    self.push_inline(column, &Expr::NextValue(seq.clone()))?;
                }
                self.compiler.returning.push(column.clone());
            }
            Some(ColumnDefault::Clause(expr)) => {
                self.push_inline(column, expr)?;
                self.compiler.returning.push(column.clone());
            }
            Some(default) => self.push_prefetch(column, default.clone())?,
            None => {
                if autoincrement || column.server_default().is_some() {
                    self.compiler.returning.push(column.clone());
                } else if !column.nullable() {
                    self.warn_pk_without_value(column);
                }
            }
        }
        Ok(())
    }

    /// Primary key computed before the statement is sent.
    fn insert_pk_prefetch(&mut self, column: &ColumnRef, autoincrement: bool) -> Result<()> {
        let dialect = self.compiler.dialect;
        let usable_default = column
            .default()
            .filter(|d| !d.is_sequence() || dialect.supports_sequences());
        if let Some(default) = usable_default {
            return self.push_prefetch(column, default.clone());
        }
        if autoincrement
            && (dialect.supports_sequences() || dialect.preexecute_autoincrement_sequences())
        {
            let table = self.stmt.table;
            let mut seq = Sequence::new(format!("{}_{}_seq", table.name(), column.name()));
            if let Some(schema) = table.schema() {
                seq = seq.schema(schema);
            }
            return self.push_prefetch(column, ColumnDefault::Sequence(seq));
        }
        if column.default().is_none() && column.server_default().is_none() && !column.nullable() {
            self.warn_pk_without_value(column);
        }
        Ok(())
    }

    fn insert_hasdefault(&mut self, column: &ColumnRef, default: &ColumnDefault) -> Result<()> {
        match default {
            ColumnDefault::Sequence(seq) => {
                if self.sequence_usable(seq) {
                    self.push_inline(column, &Expr::NextValue(seq.clone()))?;
                    self.returning_or_postfetch(column);
                }
            }
            ColumnDefault::Clause(expr) => {
                self.push_inline(column, expr)?;
                self.returning_or_postfetch(column);
            }
            ColumnDefault::Scalar(_) | ColumnDefault::Callable(_) => {
                self.push_prefetch(column, default.clone())?;
            }
        }
        Ok(())
    }

    /// INSERT .. SELECT: the expression appended to the SELECT for a
    /// defaulted column. Scalar and callable defaults become prefetch binds
    /// rendered when the SELECT is compiled.
    pub(super) fn insert_select_default(
        &mut self,
        column: &ColumnRef,
        default: &ColumnDefault,
    ) -> Option<Expr> {
        match default {
            ColumnDefault::Sequence(seq) => self
                .sequence_usable(seq)
                .then(|| Expr::NextValue(seq.clone())),
            ColumnDefault::Clause(expr) => Some((**expr).clone()),
            ColumnDefault::Scalar(_) | ColumnDefault::Callable(_) => {
                self.compiler.insert_prefetch.push(column.clone());
                Some(Expr::Bind(BindParameter::crud(
                    column.key(),
                    BindValue::Prefetch(default.clone()),
                    column.sql_type().clone(),
                )))
            }
        }
    }

    /// UPDATE: a column that was given no value.
    pub(super) fn append_update_default(&mut self, column: &ColumnRef) -> Result<()> {
        match column.onupdate() {
            Some(ColumnDefault::Clause(expr)) => {
                self.push_inline(column, expr)?;
                if self.plan.returns_default(column) {
                    self.compiler.returning.push(column.clone());
                } else {
                    self.compiler.postfetch.push(column.clone());
                }
            }
            Some(default) if !default.is_sequence() => {
                self.push_prefetch(column, default.clone())?;
            }
            _ => {
                if column.server_onupdate().is_some() {
                    if self.plan.returns_default(column) {
                        self.compiler.returning.push(column.clone());
                    } else {
                        self.compiler.postfetch.push(column.clone());
                    }
                } else if !matches!(self.stmt.return_defaults, ReturnDefaults::All)
                    && self.plan.returns_default(column)
                {
                    self.compiler.returning.push(column.clone());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::CompileWarning;
    use crate::dialect::{DialectConfig, GenericDialect, PostgresDialect};
    use crate::schema::{ColumnBuilder, ColumnDefault, Sequence, ServerDefault, Table};
    use crate::sql::{BindValue, Expr, Insert, Update};
    use crate::types::SqlType;
    use crate::value::SqlValue;

    #[test]
    fn test_expression_default_is_inlined_and_postfetched() {
        let t = Table::builder("events")
            .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
            .column(ColumnBuilder::new("at", SqlType::Timestamp).default(Expr::func("now", vec![])))
            .build()
            .unwrap();
        let compiled = Insert::new(&t)
            .value("id", 1)
            .compile(&GenericDialect::new())
            .unwrap();
        assert_eq!(compiled.sql(), "INSERT INTO events (id, at) VALUES (?, now())");
        assert_eq!(compiled.postfetch(), &[t.column("at").unwrap()]);
        assert!(compiled.insert_prefetch().is_empty());
    }

    #[test]
    fn test_server_default_is_postfetched_unless_pk() {
        let t = Table::builder("events")
            .column(
                ColumnBuilder::new("code", SqlType::Text)
                    .primary_key()
                    .server_default(ServerDefault::text("gen_code()")),
            )
            .column(
                ColumnBuilder::new("created", SqlType::Timestamp)
                    .server_default(ServerDefault::text("CURRENT_TIMESTAMP")),
            )
            .build()
            .unwrap();
        let compiled = Insert::new(&t)
            .value("code", "a")
            .compile(&GenericDialect::new())
            .unwrap();
        assert_eq!(compiled.sql(), "INSERT INTO events (code) VALUES (?)");
        assert_eq!(compiled.postfetch(), &[t.column("created").unwrap()]);
    }

    #[test]
    fn test_sequence_default_on_postgres() {
        let t = Table::builder("orders")
            .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
            .column(
                ColumnBuilder::new("number", SqlType::Integer)
                    .default(Sequence::new("order_number_seq")),
            )
            .build()
            .unwrap();
        let compiled = Insert::new(&t)
            .value("id", 5)
            .compile(&PostgresDialect::new())
            .unwrap();
        assert_eq!(
            compiled.sql(),
            "INSERT INTO orders (id, number) VALUES (%(id)s, nextval('order_number_seq'))"
        );
        assert_eq!(compiled.postfetch(), &[t.column("number").unwrap()]);
    }

    #[test]
    fn test_optional_sequence_skipped_where_sequences_are_optional() {
        let t = Table::builder("orders")
            .column(
                ColumnBuilder::new("id", SqlType::Integer)
                    .primary_key()
                    .default(Sequence::new("orders_id_seq").optional()),
            )
            .column(ColumnBuilder::new("note", SqlType::Text))
            .build()
            .unwrap();
        let compiled = Insert::new(&t)
            .value("note", "x")
            .compile(&PostgresDialect::new())
            .unwrap();
        assert_eq!(
            compiled.sql(),
            "INSERT INTO orders (note) VALUES (%(note)s) RETURNING id"
        );
        assert_eq!(compiled.returning(), &[t.column("id").unwrap()]);
    }

    #[test]
    fn test_pk_prefetch_of_implicit_sequence() {
        let t = Table::builder("orders")
            .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
            .column(ColumnBuilder::new("note", SqlType::Text))
            .build()
            .unwrap();
        let compiled = Insert::new(&t)
            .value("note", "x")
            .compile(&PostgresDialect::new().without_implicit_returning())
            .unwrap();
        assert_eq!(
            compiled.sql(),
            "INSERT INTO orders (id, note) VALUES (%(id)s, %(note)s)"
        );
        assert_eq!(compiled.insert_prefetch(), &[t.column("id").unwrap()]);
        assert_eq!(
            compiled.bind("id").unwrap().value,
            BindValue::Prefetch(ColumnDefault::Sequence(Sequence::new("orders_id_seq")))
        );
    }

    #[test]
    fn test_nullable_pk_without_value_does_not_warn() {
        let t = Table::builder("links")
            .column(ColumnBuilder::new("a", SqlType::Integer).primary_key())
            .column(ColumnBuilder::new("b", SqlType::Integer).primary_key().nullable())
            .build()
            .unwrap();
        let compiled = Insert::new(&t)
            .value("a", 1)
            .compile(&DialectConfig::default().into_dialect())
            .unwrap();
        assert!(compiled.warnings().is_empty());
    }

    #[test]
    fn test_composite_pk_without_value_warns() {
        let t = Table::builder("links")
            .column(ColumnBuilder::new("a", SqlType::Integer).primary_key())
            .column(ColumnBuilder::new("b", SqlType::Integer).primary_key())
            .build()
            .unwrap();
        let compiled = Insert::new(&t)
            .value("a", 1)
            .compile(&GenericDialect::new())
            .unwrap();
        assert_eq!(compiled.sql(), "INSERT INTO links (a) VALUES (?)");
        assert_eq!(
            compiled.warnings(),
            &[CompileWarning::PrimaryKeyWithoutValue {
                table: "links".into(),
                column: "b".into()
            }]
        );
    }

    #[test]
    fn test_update_onupdate_defaults() {
        let t = Table::builder("docs")
            .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
            .column(ColumnBuilder::new("body", SqlType::Text))
            .column(ColumnBuilder::new("rev", SqlType::Integer).onupdate(SqlValue::Int(0)))
            .column(
                ColumnBuilder::new("touched", SqlType::Timestamp)
                    .onupdate(Expr::func("current_timestamp", vec![])),
            )
            .column(
                ColumnBuilder::new("etag", SqlType::Text)
                    .server_onupdate(ServerDefault::fetched()),
            )
            .build()
            .unwrap();
        let compiled = Update::new(&t)
            .value("body", "hi")
            .compile(&GenericDialect::new())
            .unwrap();
        assert_eq!(
            compiled.sql(),
            "UPDATE docs SET body=?, rev=?, touched=CURRENT_TIMESTAMP"
        );
        assert_eq!(compiled.update_prefetch(), &[t.column("rev").unwrap()]);
        assert_eq!(
            compiled.postfetch(),
            &[t.column("touched").unwrap(), t.column("etag").unwrap()]
        );
        assert!(compiled.insert_prefetch().is_empty());
    }

    #[test]
    fn test_update_return_defaults_uses_returning() {
        let t = Table::builder("docs")
            .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
            .column(
                ColumnBuilder::new("touched", SqlType::Timestamp)
                    .onupdate(Expr::func("now", vec![])),
            )
            .column(ColumnBuilder::new("version", SqlType::Integer))
            .build()
            .unwrap();
        let version = t.column("version").unwrap();
        let compiled = Update::new(&t)
            .value("id", 1)
            .return_defaults_for([t.column("touched").unwrap(), version.clone()])
            .compile(&PostgresDialect::new())
            .unwrap();
        assert_eq!(
            compiled.sql(),
            "UPDATE docs SET id=%(id)s, touched=now() RETURNING touched, version"
        );
        assert_eq!(compiled.returning(), &[t.column("touched").unwrap(), version]);
        assert!(compiled.postfetch().is_empty());
    }
}
