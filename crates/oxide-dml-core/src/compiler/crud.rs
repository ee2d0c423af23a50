//! Planning of the VALUES list of an INSERT and the SET list of an UPDATE.
//!
//! The planner walks the target table's columns in declaration order (or the
//! explicit parameter ordering of an UPDATE) and produces one
//! [`CrudParam`] per column that appears in the statement, while filling the
//! compiler's `postfetch`, `returning`, `insert_prefetch` and
//! `update_prefetch` lists. Columns without a supplied value are resolved
//! through their defaults (see `defaults.rs`).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::trace;

use super::keys::{ColumnKey, KeyResolver};
use super::returning::ReturningPlan;
use super::Compiler;
use crate::error::{CompileError, Error, Result};
use crate::schema::{Column, ColumnDefault, ColumnRef, Table};
use crate::sql::{
    BindKey, BindParameter, BindValue, Expr, Insert, InsertFromSelect, ParamKey, Parameters,
    ReturnDefaults, Row, Select, Update,
};
use crate::types::SqlType;
use crate::value::ParamValue;

/// Left-hand side of a planned entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CrudTarget {
    /// A column of one of the statement's tables.
    Column(ColumnRef),
    /// A caller-supplied expression.
    Expr(Expr),
}

/// Right-hand side of a planned entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CrudValue {
    /// Rendered SQL: a placeholder or an inline expression.
    Sql(String),
    /// INSERT .. SELECT: the value comes from the projection of the SELECT itself.
    FromSelect,
    /// INSERT .. SELECT: a default appended to the projection of the SELECT.
    SelectColumn(Expr),
}

impl CrudValue {
    /// The rendered SQL of a VALUES or SET entry.
    #[must_use]
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Sql(sql) => Some(sql),
            Self::FromSelect | Self::SelectColumn(_) => None,
        }
    }
}

/// One planned `(target, value)` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CrudParam {
    /// Column or expression being assigned.
    pub target: CrudTarget,
    /// Assigned value.
    pub value: CrudValue,
}

impl CrudParam {
    pub(crate) fn column(column: &ColumnRef, sql: String) -> Self {
        Self {
            target: CrudTarget::Column(column.clone()),
            value: CrudValue::Sql(sql),
        }
    }

    /// The target column, if the target is a column.
    #[must_use]
    pub const fn as_column(&self) -> Option<&ColumnRef> {
        match &self.target {
            CrudTarget::Column(column) => Some(column),
            CrudTarget::Expr(_) => None,
        }
    }
}

/// The parts of an INSERT or UPDATE the planner reads.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy)]
pub struct DmlStatement<'a> {
    pub(crate) table: &'a Arc<Table>,
    pub(crate) parameters: &'a Parameters,
    pub(crate) parameter_ordering: Option<&'a [ParamKey]>,
    pub(crate) extra_froms: &'a [Arc<Table>],
    pub(crate) from_select: Option<&'a InsertFromSelect>,
    pub(crate) include_defaults: bool,
    pub(crate) return_defaults: &'a ReturnDefaults,
    pub(crate) has_returning: bool,
    pub(crate) inline: bool,
}

impl<'a> From<&'a Insert> for DmlStatement<'a> {
    fn from(stmt: &'a Insert) -> Self {
        Self {
            table: &stmt.table,
            parameters: &stmt.parameters,
            parameter_ordering: None,
            extra_froms: &[],
            from_select: stmt.from_select.as_ref(),
            include_defaults: stmt.include_defaults,
            return_defaults: &stmt.return_defaults,
            has_returning: !stmt.returning.is_empty(),
            inline: stmt.inline,
        }
    }
}

impl<'a> From<&'a Update> for DmlStatement<'a> {
    fn from(stmt: &'a Update) -> Self {
        Self {
            table: &stmt.table,
            parameters: &stmt.parameters,
            parameter_ordering: stmt.parameter_ordering.as_deref(),
            extra_froms: &stmt.extra_froms,
            from_select: None,
            include_defaults: false,
            return_defaults: &stmt.return_defaults,
            has_returning: !stmt.returning.is_empty(),
            inline: false,
        }
    }
}

/// Output of the planner.
pub struct CrudPlan {
    /// One row for UPDATE and single-row INSERT; one per row of a multi-row
    /// INSERT.
    pub(crate) rows: Vec<Vec<CrudParam>>,
    /// INSERT .. SELECT source with appended default columns.
    pub(crate) select: Option<Select>,
}

/// Plans the VALUES/SET entries of `stmt`. The compiler's DML kind must
/// already be set.
pub fn plan(compiler: &mut Compiler<'_>, stmt: DmlStatement<'_>) -> Result<CrudPlan> {
    let plan = ReturningPlan::compute(
        compiler.kind,
        compiler.dialect,
        stmt.table,
        stmt.inline || compiler.options.inline,
        stmt.has_returning,
        stmt.parameters.is_multi(),
        stmt.return_defaults,
    );
    compiler.returning_plan = Some(plan.clone());

    if compiler.options.column_keys.is_none()
        && matches!(stmt.parameters, Parameters::None)
        && stmt.from_select.is_none()
    {
        let mut row = Vec::with_capacity(stmt.table.columns().len());
        for column in stmt.table.columns() {
            let sql = compiler.crud_bind(column, BindValue::Required, column.key())?;
            row.push(CrudParam::column(column, sql));
        }
        return Ok(CrudPlan {
            rows: vec![row],
            select: None,
        });
    }

    let keys = KeyResolver::new(compiler.kind, stmt.extra_froms);
    let first = stmt.parameters.first();

    let mut parameters = HashMap::new();
    if let Some(column_keys) = &compiler.options.column_keys {
        for key in column_keys {
            let key = ColumnKey::Plain(key.clone());
            let supplied = first.is_some_and(|row| {
                row.iter()
                    .any(|(k, _)| keys.column_as_key(k).as_ref() == Some(&key))
            });
            if !supplied {
                parameters.insert(key, ParamValue::Required);
            }
        }
    }

    let mut planner = CrudPlanner {
        compiler,
        stmt,
        keys,
        plan,
        parameters,
        check_columns: HashSet::new(),
        values: Vec::new(),
    };

    if let Some(row) = first {
        planner.stmt_parameter_params(row)?;
    }
    if planner.compiler.kind.is_update() && !stmt.extra_froms.is_empty() {
        if let Some(row) = first.filter(|row| !row.is_empty()) {
            planner.multitable_params(row)?;
        }
    }

    let select = match stmt.from_select {
        Some(from_select) if planner.compiler.kind.is_insert() => {
            Some(planner.scan_insert_from_select_cols(from_select)?)
        }
        _ => {
            planner.scan_cols()?;
            None
        }
    };

    if let Some(row) = first.filter(|row| !row.is_empty()) {
        planner.check_unconsumed(row)?;
    }

    let mut rows = vec![std::mem::take(&mut planner.values)];
    if let Parameters::Multi(multi) = stmt.parameters {
        let extra = planner.extend_values_for_multiparams(&rows[0], &multi[1..])?;
        rows.extend(extra);
    }
    Ok(CrudPlan { rows, select })
}

pub(super) struct CrudPlanner<'a, 'c, 'd> {
    pub(super) compiler: &'c mut Compiler<'d>,
    pub(super) stmt: DmlStatement<'a>,
    pub(super) keys: KeyResolver,
    pub(super) plan: ReturningPlan,
    pub(super) parameters: HashMap<ColumnKey, ParamValue>,
    pub(super) check_columns: HashSet<ColumnKey>,
    pub(super) values: Vec<CrudParam>,
}

/// Gives an untyped bind parameter the type of the column it is assigned to.
fn coerce(expr: &Expr, column: &Column) -> Expr {
    match expr {
        Expr::Bind(bind) if bind.sql_type.is_null() => {
            Expr::Bind(bind.clone().with_type(column.sql_type().clone()))
        }
        other => other.clone(),
    }
}

impl CrudPlanner<'_, '_, '_> {
    /// Seeds the working parameters from the first row and renders entries
    /// whose left-hand side is not a column.
    fn stmt_parameter_params(&mut self, row: &Row) -> Result<()> {
        for (key, value) in row {
            if let ParamKey::Expr(target) = key {
                let sql = self.render_unkeyed_value(value)?;
                self.values.push(CrudParam {
                    target: CrudTarget::Expr(target.clone()),
                    value: CrudValue::Sql(sql),
                });
            } else if let Some(column_key) = self.keys.column_as_key(key) {
                self.parameters
                    .entry(column_key)
                    .or_insert_with(|| value.clone());
            }
        }
        Ok(())
    }

    fn render_unkeyed_value(&mut self, value: &ParamValue) -> Result<String> {
        let bind_value = match value {
            ParamValue::Literal(v) => BindValue::Value(v.clone()),
            ParamValue::Required => BindValue::Required,
            ParamValue::Expr(expr) => return self.compiler.process(expr),
        };
        self.compiler.visit_bind(&BindParameter {
            key: BindKey::Anonymous(String::from("param")),
            value: bind_value,
            sql_type: SqlType::Null,
            is_crud: false,
        })
    }

    /// Renders a supplied value for `column` under the bind name `name`.
    fn render_value(
        &mut self,
        column: &ColumnRef,
        value: &ParamValue,
        name: String,
    ) -> Result<String> {
        match value {
            ParamValue::Literal(v) => {
                self.compiler
                    .crud_bind(column, BindValue::Value(v.clone()), name)
            }
            ParamValue::Required => self.compiler.crud_bind(column, BindValue::Required, name),
            ParamValue::Expr(expr) => self.compiler.process(&coerce(expr, column)),
        }
    }

    /// SET entries for columns of the extra tables of a multi-table UPDATE,
    /// followed by the on-update defaults of every affected extra table.
    fn multitable_params(&mut self, row: &Row) -> Result<()> {
        let supplied = |column: &ColumnRef| {
            row.iter().find_map(|(key, value)| match key {
                ParamKey::Column(c) if c == column => Some(value),
                _ => None,
            })
        };
        let extra_froms = self.stmt.extra_froms;
        let mut affected: Vec<&Arc<Table>> = Vec::new();

        for table in extra_froms {
            for column in table.columns() {
                let Some(value) = supplied(column) else {
                    continue;
                };
                if !affected.iter().any(|t| Arc::ptr_eq(t, table)) {
                    affected.push(table);
                }
                self.check_columns.insert(self.keys.getattr_col_key(column));
                if !value.is_literal() {
                    self.compiler.postfetch.push(column.clone());
                }
                let name = self.keys.col_bind_name(column);
                let sql = self.render_value(column, value, name)?;
                trace!(column = %column, "Extra table column set from parameters");
                self.values.push(CrudParam::column(column, sql));
            }
        }

        for table in affected {
            for column in table.columns() {
                if supplied(column).is_some() {
                    continue;
                }
                match column.onupdate() {
                    Some(ColumnDefault::Clause(expr)) => {
                        let sql = self.compiler.nested().process(expr)?;
                        self.values.push(CrudParam::column(column, sql));
                        self.compiler.postfetch.push(column.clone());
                    }
                    Some(default) if !default.is_sequence() => {
                        let name = self.keys.col_bind_name(column);
                        let sql = self.prefetch_bind(column, default.clone(), name)?;
                        self.values.push(CrudParam::column(column, sql));
                    }
                    _ => {
                        if column.server_onupdate().is_some() {
                            self.compiler.postfetch.push(column.clone());
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Column list of an INSERT .. SELECT, with the client-side defaults of
    /// the remaining columns appended to the SELECT.
    fn scan_insert_from_select_cols(&mut self, from_select: &InsertFromSelect) -> Result<Select> {
        let table = self.stmt.table;
        let mut columns: Vec<ColumnRef> = Vec::with_capacity(from_select.names.len());
        for name in &from_select.names {
            let key = self.keys.column_as_key(name).ok_or_else(|| {
                Error::Argument(String::from(
                    "INSERT .. SELECT target names must be columns",
                ))
            })?;
            let column = self.lookup(&key)?;
            self.parameters.insert(key, ParamValue::Expr(Expr::null()));
            columns.push(column);
        }
        if self.stmt.include_defaults {
            for column in table.columns() {
                if !columns.contains(column) && column.default().is_some() {
                    columns.push(column.clone());
                }
            }
        }

        let mut added: Vec<(ColumnRef, Expr)> = Vec::new();
        for column in &columns {
            let key = self.keys.getattr_col_key(column);
            if self.parameters.contains_key(&key) && !self.check_columns.contains(&key) {
                self.parameters.remove(&key);
                self.values.push(CrudParam {
                    target: CrudTarget::Column(column.clone()),
                    value: CrudValue::FromSelect,
                });
            } else if let Some(default) = column.default() {
                if let Some(expr) = self.insert_select_default(column, default) {
                    added.push((column.clone(), expr));
                }
            }
        }

        let select = from_select
            .select
            .with_columns(added.iter().map(|(_, expr)| expr.clone()));
        for (column, expr) in added {
            self.values.push(CrudParam {
                target: CrudTarget::Column(column),
                value: CrudValue::SelectColumn(expr),
            });
        }
        Ok(select)
    }

    /// A primary-table column by normalized key.
    fn lookup(&self, key: &ColumnKey) -> Result<ColumnRef> {
        self.stmt
            .table
            .columns()
            .iter()
            .find(|c| self.keys.getattr_col_key(c) == *key)
            .cloned()
            .ok_or_else(|| {
                CompileError::UnknownColumn {
                    table: self.stmt.table.name().to_owned(),
                    key: key.to_string(),
                }
                .into()
            })
    }

    /// Columns in planning order: the explicit parameter ordering first,
    /// then the rest in declaration order.
    fn ordered_columns(&self) -> Result<Vec<ColumnRef>> {
        let table = self.stmt.table;
        let Some(ordering) = self.stmt.parameter_ordering else {
            return Ok(table.columns().to_vec());
        };
        let mut ordered: Vec<ColumnRef> = Vec::with_capacity(table.columns().len());
        for key in ordering {
            let Some(key) = self.keys.column_as_key(key) else {
                continue;
            };
            if matches!(key, ColumnKey::Qualified { .. }) {
                continue;
            }
            let column = self.lookup(&key)?;
            if !ordered.contains(&column) {
                ordered.push(column);
            }
        }
        for column in table.columns() {
            if !ordered.contains(column) {
                ordered.push(column.clone());
            }
        }
        Ok(ordered)
    }

    fn scan_cols(&mut self) -> Result<()> {
        for column in self.ordered_columns()? {
            let key = self.keys.getattr_col_key(&column);
            if self.parameters.contains_key(&key) && !self.check_columns.contains(&key) {
                self.append_param_parameter(&column, &key)?;
            } else if self.compiler.kind.is_insert() {
                self.append_insert_default(&column)?;
            } else if self.compiler.kind.is_update() {
                self.append_update_default(&column)?;
            }
        }
        Ok(())
    }

    /// Renders a supplied value and registers where its result is learned.
    fn append_param_parameter(&mut self, column: &ColumnRef, key: &ColumnKey) -> Result<()> {
        let Some(value) = self.parameters.remove(key) else {
            return Ok(());
        };
        let sql = if let ParamValue::Expr(expr) = &value {
            if (column.primary_key() && self.plan.implicit_returning)
                || self.plan.returns_default(column)
            {
                self.compiler.returning.push(column.clone());
            } else if !column.primary_key() {
                self.compiler.postfetch.push(column.clone());
            }
            self.compiler.process(&coerce(expr, column))?
        } else {
            let name = if self.stmt.parameters.is_multi() {
                format!("{}_0", self.keys.col_bind_name(column))
            } else {
                self.keys.col_bind_name(column)
            };
            self.render_value(column, &value, name)?
        };
        trace!(column = %column, "Column set from parameters");
        self.values.push(CrudParam::column(column, sql));
        Ok(())
    }

    fn check_unconsumed(&self, row: &Row) -> Result<()> {
        if self.parameters.is_empty() {
            return Ok(());
        }
        let supplied: HashSet<ColumnKey> = row
            .iter()
            .filter_map(|(key, _)| self.keys.column_as_key(key))
            .collect();
        let mut unconsumed: Vec<String> = self
            .parameters
            .keys()
            .filter(|key| supplied.contains(*key) && !self.check_columns.contains(*key))
            .map(ToString::to_string)
            .collect();
        if unconsumed.is_empty() {
            return Ok(());
        }
        unconsumed.sort();
        Err(CompileError::UnconsumedColumns {
            table: self.stmt.table.name().to_owned(),
            columns: unconsumed,
        }
        .into())
    }

    /// Renders rows 2..n of a multi-row INSERT against the columns planned
    /// for the first row.
    fn extend_values_for_multiparams(
        &mut self,
        first: &[CrudParam],
        rest: &[Row],
    ) -> Result<Vec<Vec<CrudParam>>> {
        let mut rows = Vec::with_capacity(rest.len());
        for (index, row) in rest.iter().enumerate() {
            let suffix = index + 1;
            let mut extension = Vec::with_capacity(first.len());
            for param in first {
                let sql = match &param.target {
                    CrudTarget::Column(column) => {
                        let key = self.keys.getattr_col_key(column);
                        let supplied = row.iter().find_map(|(k, v)| {
                            (self.keys.column_as_key(k).as_ref() == Some(&key)).then_some(v)
                        });
                        match supplied {
                            Some(value) => {
                                let name = format!("{}_{suffix}", column.key());
                                self.render_value(column, value, name)?
                            }
                            None => self.multiparam_default(column, suffix)?,
                        }
                    }
                    CrudTarget::Expr(target) => {
                        let supplied = row.iter().find_map(|(k, v)| match k {
                            ParamKey::Expr(e) if e == target => Some(v),
                            _ => None,
                        });
                        match supplied {
                            Some(value) => self.render_unkeyed_value(value)?,
                            None => {
                                let column = self.compiler.nested().process(target)?;
                                return Err(
                                    CompileError::MissingMultiparamDefault { column }.into()
                                );
                            }
                        }
                    }
                };
                extension.push(CrudParam {
                    target: param.target.clone(),
                    value: CrudValue::Sql(sql),
                });
            }
            rows.push(extension);
        }
        Ok(rows)
    }

    /// The default of `column` for one additional row, evaluated separately
    /// from every other row.
    fn multiparam_default(&mut self, column: &ColumnRef, suffix: usize) -> Result<String> {
        match column.default() {
            None => Err(CompileError::MissingMultiparamDefault {
                column: column.to_string(),
            }
            .into()),
            Some(ColumnDefault::Clause(expr)) => self.compiler.nested().process(expr),
            Some(ColumnDefault::Sequence(seq)) if self.sequence_usable(seq) => self
                .compiler
                .nested()
                .process(&Expr::NextValue(seq.clone())),
            Some(default) => {
                let name = format!("{}_{suffix}", column.key());
                self.prefetch_bind(column, default.clone(), name)
            }
        }
    }
}
