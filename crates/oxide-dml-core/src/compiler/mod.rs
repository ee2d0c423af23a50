//! Statement compiler.
//!
//! Renders an expression tree to SQL text for a [`Dialect`]. INSERT and
//! UPDATE statements are handed to the CRUD planner ([`crud`]), which decides
//! for each column of the target table whether it gets a bind parameter, an
//! inline SQL expression, a prefetched client-side default, or nothing at
//! all, and which generated values come back through RETURNING or a later
//! fetch.

mod compiled;
mod crud;
mod defaults;
mod guard;
mod keys;
mod returning;

pub use compiled::{CompileWarning, Compiled, CompiledBind};
pub use crud::{CrudParam, CrudTarget, CrudValue};
pub use guard::DmlKind;
pub use keys::ColumnKey;
pub use returning::ReturningPlan;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::dialect::Dialect;
use crate::error::{CompileError, Result};
use crate::schema::{Column, ColumnRef, Table};
use crate::sql::{
    BinaryOp, BindKey, BindParameter, BindValue, Delete, Expr, Insert, Select, Statement, Update,
};
use crud::{CrudPlan, DmlStatement};
use guard::NestedCompile;

/// SQL functions rendered without parentheses when called with no arguments.
const NILADIC_FUNCTIONS: &[&str] = &[
    "current_date",
    "current_time",
    "current_timestamp",
    "current_user",
    "localtime",
    "localtimestamp",
    "session_user",
    "user",
];

/// Per-compile flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Keys of the parameters that will be supplied at execution time. Keys
    /// not given as statement values become required bind parameters.
    pub column_keys: Option<Vec<String>>,
    /// Render defaults inline and do not fetch generated primary keys.
    pub inline: bool,
}

impl CompileOptions {
    /// Options declaring the execution-time parameter keys.
    #[must_use]
    pub fn with_column_keys<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            column_keys: Some(keys.into_iter().map(Into::into).collect()),
            inline: false,
        }
    }
}

/// State of one compile pass.
pub struct Compiler<'d> {
    dialect: &'d dyn Dialect,
    options: &'d CompileOptions,
    kind: DmlKind,
    dml_table: Option<(Option<String>, String)>,
    multi_table: bool,
    binds: Vec<CompiledBind>,
    bind_index: HashMap<String, usize>,
    anon_counters: HashMap<String, usize>,
    positiontup: Vec<String>,
    crud_params: Vec<Vec<CrudParam>>,
    postfetch: Vec<ColumnRef>,
    returning: Vec<ColumnRef>,
    insert_prefetch: Vec<ColumnRef>,
    update_prefetch: Vec<ColumnRef>,
    returning_plan: Option<ReturningPlan>,
    warnings: Vec<CompileWarning>,
}

impl<'d> Compiler<'d> {
    fn new(dialect: &'d dyn Dialect, options: &'d CompileOptions) -> Self {
        Self {
            dialect,
            options,
            kind: DmlKind::None,
            dml_table: None,
            multi_table: false,
            binds: Vec::new(),
            bind_index: HashMap::new(),
            anon_counters: HashMap::new(),
            positiontup: Vec::new(),
            crud_params: Vec::new(),
            postfetch: Vec::new(),
            returning: Vec::new(),
            insert_prefetch: Vec::new(),
            update_prefetch: Vec::new(),
            returning_plan: None,
            warnings: Vec::new(),
        }
    }

    /// Compiles a statement.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Argument`] for malformed statements and
    /// [`crate::Error::Compile`] when the statement cannot be expressed.
    pub fn compile(
        dialect: &dyn Dialect,
        statement: &Statement,
        options: &CompileOptions,
    ) -> Result<Compiled> {
        let mut compiler = Compiler::new(dialect, options);
        let sql = match statement {
            Statement::Select(select) => compiler.visit_select(select)?,
            Statement::Insert(insert) => compiler.visit_insert(insert)?,
            Statement::Update(update) => compiler.visit_update(update)?,
            Statement::Delete(delete) => compiler.visit_delete(delete)?,
        };
        Ok(compiler.finish(sql))
    }

    fn finish(self, sql: String) -> Compiled {
        debug!(
            dialect = self.dialect.name(),
            sql = %sql,
            binds = self.binds.len(),
            postfetch = self.postfetch.len(),
            returning = self.returning.len(),
            prefetch = self.insert_prefetch.len() + self.update_prefetch.len(),
            "Compiled statement"
        );
        let positiontup = self
            .dialect
            .param_style()
            .is_positional()
            .then_some(self.positiontup);
        Compiled {
            sql,
            param_style: self.dialect.param_style(),
            binds: self.binds,
            positiontup,
            crud_params: self.crud_params,
            postfetch: self.postfetch,
            returning: self.returning,
            insert_prefetch: self.insert_prefetch,
            update_prefetch: self.update_prefetch,
            returning_plan: self.returning_plan,
            warnings: self.warnings,
        }
    }

    /// Clears the DML kind until the returned guard is dropped.
    pub(crate) fn nested(&mut self) -> NestedCompile<'_, 'd> {
        NestedCompile::new(self)
    }

    pub(crate) fn warn(&mut self, warning: CompileWarning) {
        warn!(warning = %warning, "Primary key column has no anticipated value");
        self.warnings.push(warning);
    }

    /// Renders an expression.
    pub(crate) fn process(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Column(column) => Ok(self.visit_column(column)),
            Expr::Literal(value) => Ok(value.to_sql_inline()),
            Expr::Text(sql) => Ok(sql.clone()),
            Expr::Bind(bind) => self.visit_bind(bind),
            Expr::Binary { left, op, right } => self.visit_binary(left, *op, right),
            Expr::Unary { op, operand } => {
                let inner = self.process(operand)?;
                let inner = if operand.precedence() < u8::MAX {
                    format!("({inner})")
                } else {
                    inner
                };
                Ok(format!("{}{inner}", op.as_str()))
            }
            Expr::Function(call) => {
                let lower = call.name.to_ascii_lowercase();
                if call.args.is_empty() && NILADIC_FUNCTIONS.contains(&lower.as_str()) {
                    return Ok(call.name.to_ascii_uppercase());
                }
                let args = self.process_list(&call.args)?;
                Ok(format!("{}({})", call.name, args.join(", ")))
            }
            Expr::IsNull { expr, negated } => {
                let inner = self.process(expr)?;
                let inner = if expr.precedence() < u8::MAX {
                    format!("({inner})")
                } else {
                    inner
                };
                let not = if *negated { " NOT" } else { "" };
                Ok(format!("{inner} IS{not} NULL"))
            }
            Expr::Cast { expr, sql_type } => {
                Ok(format!("CAST({} AS {sql_type})", self.process(expr)?))
            }
            Expr::Grouping(inner) => Ok(format!("({})", self.process(inner)?)),
            Expr::NextValue(seq) => self.dialect.next_value_sql(seq).ok_or_else(|| {
                CompileError::SequencesUnsupported {
                    dialect: self.dialect.name().to_owned(),
                }
                .into()
            }),
            Expr::Subquery(select) => Ok(format!("({})", self.nested().visit_select(select)?)),
        }
    }

    fn process_list(&mut self, exprs: &[Expr]) -> Result<Vec<String>> {
        exprs.iter().map(|e| self.process(e)).collect()
    }

    fn visit_binary(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> Result<String> {
        let precedence = op.precedence();
        let l = self.process(left)?;
        let l = if left.precedence() < precedence {
            format!("({l})")
        } else {
            l
        };
        let r = self.process(right)?;
        let non_associative = matches!(op, BinaryOp::Sub | BinaryOp::Div | BinaryOp::Mod);
        let r = if right.precedence() < precedence
            || (non_associative && right.precedence() == precedence)
        {
            format!("({r})")
        } else {
            r
        };
        Ok(format!("{l} {} {r}", op.as_str()))
    }

    fn visit_column(&self, column: &Column) -> String {
        let name = self.dialect.format_identifier(column.name());
        let own_table = self.kind.is_dml()
            && !self.multi_table
            && self.dml_table.as_ref().is_some_and(|(schema, table)| {
                table == column.table_name() && schema.as_deref() == column.schema()
            });
        if own_table {
            name
        } else {
            format!("{}.{name}", self.format_column_table(column))
        }
    }

    fn format_column_table(&self, column: &Column) -> String {
        let table = self.dialect.format_identifier(column.table_name());
        match column.schema() {
            Some(schema) => format!("{}.{table}", self.dialect.format_identifier(schema)),
            None => table,
        }
    }

    fn format_table(&self, table: &Table) -> String {
        let name = self.dialect.format_identifier(table.name());
        match table.schema() {
            Some(schema) => format!("{}.{name}", self.dialect.format_identifier(schema)),
            None => name,
        }
    }

    /// Registers a bind parameter and returns its placeholder.
    pub(crate) fn visit_bind(&mut self, bind: &BindParameter) -> Result<String> {
        let name = match &bind.key {
            BindKey::Named(name) => name.clone(),
            BindKey::Anonymous(prefix) => {
                let counter = self.anon_counters.entry(prefix.clone()).or_insert(0);
                *counter += 1;
                format!("{prefix}_{counter}")
            }
        };
        if let Some(&index) = self.bind_index.get(&name) {
            let existing = &self.binds[index];
            let same = existing.value == bind.value
                && existing.sql_type == bind.sql_type
                && existing.is_crud == bind.is_crud;
            if !same {
                if existing.is_crud || bind.is_crud {
                    return Err(CompileError::ReservedBindName { name }.into());
                }
                return Err(CompileError::BindConflict(name).into());
            }
        } else {
            self.bind_index.insert(name.clone(), self.binds.len());
            self.binds.push(CompiledBind {
                name: name.clone(),
                value: bind.value.clone(),
                sql_type: bind.sql_type.clone(),
                is_crud: bind.is_crud,
            });
        }
        Ok(self.placeholder(name))
    }

    /// Registers a bind parameter of the INSERT/UPDATE planner, typed like
    /// `column`.
    pub(crate) fn crud_bind(
        &mut self,
        column: &Column,
        value: BindValue,
        name: impl Into<String>,
    ) -> Result<String> {
        self.visit_bind(&BindParameter::crud(name, value, column.sql_type().clone()))
    }

    fn placeholder(&mut self, name: String) -> String {
        let style = self.dialect.param_style();
        if style.is_positional() {
            let position = self.positiontup.len() + 1;
            let placeholder = style.placeholder(&name, position);
            self.positiontup.push(name);
            placeholder
        } else {
            style.placeholder(&name, 0)
        }
    }

    fn begin_dml(&mut self, kind: DmlKind, table: &Table, multi_table: bool) {
        self.kind = kind;
        self.dml_table = Some((table.schema().map(str::to_owned), table.name().to_owned()));
        self.multi_table = multi_table;
    }

    fn returning_clause(&mut self, explicit: &[Expr]) -> Result<Option<String>> {
        let exprs: Vec<Expr> = if explicit.is_empty() {
            self.returning.iter().map(ColumnRef::expr).collect()
        } else {
            explicit.to_vec()
        };
        if exprs.is_empty() {
            return Ok(None);
        }
        if !self.dialect.supports_returning() {
            return Err(CompileError::ReturningUnsupported {
                dialect: self.dialect.name().to_owned(),
            }
            .into());
        }
        let columns = self.process_list(&exprs)?;
        Ok(Some(format!("RETURNING {}", columns.join(", "))))
    }

    fn render_target(&mut self, target: &CrudTarget, qualify: bool) -> Result<String> {
        match target {
            CrudTarget::Column(column) => {
                let name = self.dialect.format_identifier(column.name());
                Ok(if qualify {
                    format!("{}.{name}", self.format_column_table(column))
                } else {
                    name
                })
            }
            CrudTarget::Expr(expr) => self.process(expr),
        }
    }

    fn visit_insert(&mut self, stmt: &Insert) -> Result<String> {
        stmt.validate()?;
        self.begin_dml(DmlKind::Insert, &stmt.table, false);

        let CrudPlan { rows, select } = crud::plan(self, DmlStatement::from(stmt))?;
        if rows.len() > 1 && !self.dialect.supports_multivalues_insert() {
            return Err(CompileError::MultiValuesUnsupported {
                dialect: self.dialect.name().to_owned(),
            }
            .into());
        }

        let mut sql = format!("INSERT INTO {}", self.format_table(&stmt.table));
        let first = rows.first().map_or(&[][..], Vec::as_slice);
        if first.is_empty() && select.is_none() {
            if self.dialect.supports_default_values() {
                sql.push_str(" DEFAULT VALUES");
            } else if self.dialect.supports_empty_insert() {
                sql.push_str(" () VALUES ()");
            } else {
                return Err(CompileError::EmptyInsertUnsupported {
                    dialect: self.dialect.name().to_owned(),
                }
                .into());
            }
        } else {
            let mut columns = Vec::with_capacity(first.len());
            for param in first {
                columns.push(self.render_target(&param.target, false)?);
            }
            sql.push_str(" (");
            sql.push_str(&columns.join(", "));
            sql.push(')');
            if let Some(select) = &select {
                let select_sql = self.nested().visit_select(select)?;
                sql.push(' ');
                sql.push_str(&select_sql);
            } else {
                let values: Vec<String> = rows
                    .iter()
                    .map(|row| {
                        let cells: Vec<&str> =
                            row.iter().filter_map(|p| p.value.sql()).collect();
                        format!("({})", cells.join(", "))
                    })
                    .collect();
                sql.push_str(" VALUES ");
                sql.push_str(&values.join(", "));
            }
        }

        if let Some(returning) = self.returning_clause(&stmt.returning)? {
            sql.push(' ');
            sql.push_str(&returning);
        }
        self.crud_params = rows;
        Ok(sql)
    }

    fn visit_update(&mut self, stmt: &Update) -> Result<String> {
        stmt.validate()?;
        let multi_table = !stmt.extra_froms.is_empty();
        self.begin_dml(DmlKind::Update, &stmt.table, multi_table);

        let CrudPlan { rows, .. } = crud::plan(self, DmlStatement::from(stmt))?;
        let set = rows.first().map_or(&[][..], Vec::as_slice);
        if set.is_empty() {
            return Err(CompileError::EmptyUpdate {
                table: stmt.table.name().to_owned(),
            }
            .into());
        }

        let table = self.format_table(&stmt.table);
        let extra: Vec<String> = stmt
            .extra_froms
            .iter()
            .map(|t| self.format_table(t))
            .collect();
        let qualify = multi_table && self.dialect.render_table_with_column_in_update_from();

        let mut assignments = Vec::with_capacity(set.len());
        for param in set {
            let target = self.render_target(&param.target, qualify)?;
            let value = param.value.sql().unwrap_or_default();
            assignments.push(format!("{target}={value}"));
        }

        let mut sql = format!(
            "UPDATE {} SET {}",
            self.dialect.update_tables_clause(&table, &extra),
            assignments.join(", ")
        );
        if multi_table {
            if let Some(from) = self.dialect.update_from_clause(&extra) {
                sql.push(' ');
                sql.push_str(&from);
            }
        }
        if let Some(where_clause) = &stmt.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&self.process(where_clause)?);
        }
        if let Some(returning) = self.returning_clause(&stmt.returning)? {
            sql.push(' ');
            sql.push_str(&returning);
        }
        self.crud_params = rows;
        Ok(sql)
    }

    fn visit_delete(&mut self, stmt: &Delete) -> Result<String> {
        self.begin_dml(DmlKind::Delete, &stmt.table, false);
        let mut sql = format!("DELETE FROM {}", self.format_table(&stmt.table));
        if let Some(where_clause) = &stmt.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&self.process(where_clause)?);
        }
        if let Some(returning) = self.returning_clause(&stmt.returning)? {
            sql.push(' ');
            sql.push_str(&returning);
        }
        Ok(sql)
    }

    fn visit_select(&mut self, select: &Select) -> Result<String> {
        let columns = self.process_list(&select.columns)?;
        let mut sql = format!("SELECT {}", columns.join(", "));
        let froms: Vec<String> = if select.froms.is_empty() {
            let mut tables = std::collections::BTreeSet::new();
            for column in &select.columns {
                tables.extend(column.referenced_tables());
            }
            tables
                .iter()
                .map(|t| self.dialect.format_identifier(t))
                .collect()
        } else {
            select.froms.iter().map(|t| self.format_table(t)).collect()
        };
        if !froms.is_empty() {
            sql.push_str(" FROM ");
            sql.push_str(&froms.join(", "));
        }
        if let Some(where_clause) = &select.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&self.process(where_clause)?);
        }
        Ok(sql)
    }
}
