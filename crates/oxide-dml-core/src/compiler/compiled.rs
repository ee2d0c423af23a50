//! The result of a compile pass.

use std::collections::HashMap;
use std::fmt;

use super::crud::CrudParam;
use super::returning::ReturningPlan;
use crate::dialect::ParamStyle;
use crate::error::{Error, Result};
use crate::schema::ColumnRef;
use crate::sql::BindValue;
use crate::types::SqlType;
use crate::value::SqlValue;

/// A bind parameter as registered in the compiled statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledBind {
    /// Final name.
    pub name: String,
    /// Compile-time value.
    pub value: BindValue,
    /// Type used to process the value.
    pub sql_type: SqlType,
    /// Created by INSERT/UPDATE planning.
    pub is_crud: bool,
}

/// A non-fatal condition found while compiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileWarning {
    /// A primary key column will get no value from the statement, a
    /// default, or the database.
    PrimaryKeyWithoutValue {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrimaryKeyWithoutValue { table, column } => write!(
                f,
                "Column '{table}.{column}' is marked as a member of the primary key for table \
                 '{table}', but has no client-side or server-side default generator indicated, \
                 nor does it indicate autoincrement or nullable, and no explicit value is passed. \
                 Primary key columns typically may not store NULL."
            ),
        }
    }
}

/// A compiled statement: SQL text, bind parameters and the planning
/// side-tables the execution layer needs.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub(crate) sql: String,
    pub(crate) param_style: ParamStyle,
    pub(crate) binds: Vec<CompiledBind>,
    pub(crate) positiontup: Option<Vec<String>>,
    pub(crate) crud_params: Vec<Vec<CrudParam>>,
    pub(crate) postfetch: Vec<ColumnRef>,
    pub(crate) returning: Vec<ColumnRef>,
    pub(crate) insert_prefetch: Vec<ColumnRef>,
    pub(crate) update_prefetch: Vec<ColumnRef>,
    pub(crate) returning_plan: Option<ReturningPlan>,
    pub(crate) warnings: Vec<CompileWarning>,
}

impl Compiled {
    /// The SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Placeholder style the text was rendered with.
    #[must_use]
    pub const fn param_style(&self) -> ParamStyle {
        self.param_style
    }

    /// Bind parameters in registration order.
    #[must_use]
    pub fn binds(&self) -> &[CompiledBind] {
        &self.binds
    }

    /// Looks up a bind parameter by name.
    #[must_use]
    pub fn bind(&self, name: &str) -> Option<&CompiledBind> {
        self.binds.iter().find(|b| b.name == name)
    }

    /// Bind parameter names in registration order.
    pub fn bind_names(&self) -> impl Iterator<Item = &str> {
        self.binds.iter().map(|b| b.name.as_str())
    }

    /// For positional styles, the bind name behind each placeholder.
    #[must_use]
    pub fn positiontup(&self) -> Option<&[String]> {
        self.positiontup.as_deref()
    }

    /// The planned VALUES rows of an INSERT, or the single SET row of an
    /// UPDATE. Empty for other statements.
    #[must_use]
    pub fn crud_params(&self) -> &[Vec<CrudParam>] {
        &self.crud_params
    }

    /// Columns whose value should be re-fetched after execution.
    #[must_use]
    pub fn postfetch(&self) -> &[ColumnRef] {
        &self.postfetch
    }

    /// Columns delivered by the RETURNING clause.
    #[must_use]
    pub fn returning(&self) -> &[ColumnRef] {
        &self.returning
    }

    /// Columns whose INSERT default is evaluated before execution; one
    /// entry per prefetch bind, so a multi-row INSERT may list a column once
    /// per row.
    #[must_use]
    pub fn insert_prefetch(&self) -> &[ColumnRef] {
        &self.insert_prefetch
    }

    /// Columns whose UPDATE default is evaluated before execution.
    #[must_use]
    pub fn update_prefetch(&self) -> &[ColumnRef] {
        &self.update_prefetch
    }

    /// Returning modifiers of an INSERT or UPDATE.
    #[must_use]
    pub const fn returning_plan(&self) -> Option<&ReturningPlan> {
        self.returning_plan.as_ref()
    }

    /// Non-fatal conditions found while compiling.
    #[must_use]
    pub fn warnings(&self) -> &[CompileWarning] {
        &self.warnings
    }

    /// Resolves the value of every bind parameter, in registration order.
    ///
    /// Values in `overrides` win. Client-side defaults are evaluated once per
    /// bind parameter, so each row of a multi-row INSERT gets its own value.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRequest`] when a required value is missing, or when a
    /// sequence must be pre-executed and no value was supplied for it.
    pub fn construct_params(
        &self,
        overrides: &HashMap<String, SqlValue>,
    ) -> Result<Vec<(String, SqlValue)>> {
        self.binds
            .iter()
            .map(|bind| {
                if let Some(value) = overrides.get(&bind.name) {
                    return Ok((bind.name.clone(), value.clone()));
                }
                let value = match &bind.value {
                    BindValue::Value(value) => value.clone(),
                    BindValue::Unset => SqlValue::Null,
                    BindValue::Required => {
                        return Err(Error::InvalidRequest(format!(
                            "A value is required for bind parameter '{}'",
                            bind.name
                        )));
                    }
                    BindValue::Prefetch(default) => default.evaluate().ok_or_else(|| {
                        Error::InvalidRequest(format!(
                            "bind parameter '{}' takes the next value of a sequence, \
                             which must be executed before the statement",
                            bind.name
                        ))
                    })?,
                };
                Ok((bind.name.clone(), value))
            })
            .collect()
    }

    /// Resolves parameter values in placeholder order.
    ///
    /// For named styles the order is the registration order.
    ///
    /// # Errors
    ///
    /// As [`Compiled::construct_params`].
    pub fn positional_params(&self, overrides: &HashMap<String, SqlValue>) -> Result<Vec<SqlValue>> {
        let params = self.construct_params(overrides)?;
        let Some(order) = &self.positiontup else {
            return Ok(params.into_iter().map(|(_, value)| value).collect());
        };
        let by_name: HashMap<&str, &SqlValue> =
            params.iter().map(|(name, value)| (name.as_str(), value)).collect();
        order
            .iter()
            .map(|name| {
                by_name.get(name.as_str()).map(|v| (*v).clone()).ok_or_else(|| {
                    Error::InvalidRequest(format!("no value for bind parameter '{name}'"))
                })
            })
            .collect()
    }
}

impl fmt::Display for Compiled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
