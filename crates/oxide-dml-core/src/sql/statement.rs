//! SELECT, INSERT, UPDATE and DELETE statements.

use std::sync::Arc;

use super::expression::Expr;
use crate::compiler::{CompileOptions, Compiled, Compiler};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::schema::{ColumnRef, Table};
use crate::value::ParamValue;

/// The left-hand side of a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKey {
    /// A column key given as a string.
    Name(String),
    /// A column object.
    Column(ColumnRef),
    /// Any other expression, rendered as-is on the left-hand side.
    Expr(Expr),
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        Self::Name(String::from(name))
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<ColumnRef> for ParamKey {
    fn from(column: ColumnRef) -> Self {
        Self::Column(column)
    }
}

impl From<&ColumnRef> for ParamKey {
    fn from(column: &ColumnRef) -> Self {
        Self::Column(column.clone())
    }
}

impl From<Expr> for ParamKey {
    fn from(expr: Expr) -> Self {
        match expr {
            Expr::Column(column) => Self::Column(column),
            other => Self::Expr(other),
        }
    }
}

/// One row of statement parameters, in the order they were supplied.
pub type Row = Vec<(ParamKey, ParamValue)>;

/// The parameters of an INSERT or UPDATE.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Parameters {
    /// No values given; everything is bound at execution time.
    #[default]
    None,
    /// A single row.
    Single(Row),
    /// Several rows rendered as one multi-row VALUES clause.
    Multi(Vec<Row>),
}

impl Parameters {
    /// The row the column planning is based on: the only row, or the first
    /// row of a multi-row INSERT.
    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        match self {
            Self::None => None,
            Self::Single(row) => Some(row),
            Self::Multi(rows) => rows.first(),
        }
    }

    /// Whether these are multi-row parameters.
    #[must_use]
    pub const fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(_))
    }

    fn push(&mut self, key: ParamKey, value: ParamValue) {
        match self {
            Self::None => *self = Self::Single(vec![(key, value)]),
            Self::Single(row) => row.push((key, value)),
            Self::Multi(rows) => rows.iter_mut().for_each(|r| r.push((key.clone(), value.clone()))),
        }
    }
}

/// Which server-generated values a statement asks to get back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReturnDefaults {
    /// Nothing requested.
    #[default]
    None,
    /// Every column of the table.
    All,
    /// The given columns.
    Columns(Vec<ColumnRef>),
}

impl ReturnDefaults {
    /// Whether anything was requested.
    #[must_use]
    pub const fn is_requested(&self) -> bool {
        !matches!(self, Self::None)
    }
}

fn collect_row<K, V>(row: impl IntoIterator<Item = (K, V)>) -> Row
where
    K: Into<ParamKey>,
    V: Into<ParamValue>,
{
    row.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// The SELECT side of an INSERT .. SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertFromSelect {
    /// Target column keys, in SELECT column order.
    pub names: Vec<ParamKey>,
    /// The source query.
    pub select: Select,
}

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub(crate) table: Arc<Table>,
    pub(crate) parameters: Parameters,
    pub(crate) from_select: Option<InsertFromSelect>,
    pub(crate) include_defaults: bool,
    pub(crate) return_defaults: ReturnDefaults,
    pub(crate) returning: Vec<Expr>,
    pub(crate) inline: bool,
}

impl Insert {
    /// Creates an INSERT into `table`.
    #[must_use]
    pub fn new(table: &Arc<Table>) -> Self {
        Self {
            table: Arc::clone(table),
            parameters: Parameters::None,
            from_select: None,
            include_defaults: true,
            return_defaults: ReturnDefaults::None,
            returning: Vec::new(),
            inline: false,
        }
    }

    /// Target table.
    #[must_use]
    pub const fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// Adds a single value.
    #[must_use]
    pub fn value(mut self, key: impl Into<ParamKey>, value: impl Into<ParamValue>) -> Self {
        self.parameters.push(key.into(), value.into());
        self
    }

    /// Sets the values of a single-row INSERT.
    #[must_use]
    pub fn values<K, V>(mut self, row: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<ParamKey>,
        V: Into<ParamValue>,
    {
        self.parameters = Parameters::Single(collect_row(row));
        self
    }

    /// Sets the rows of a multi-row INSERT.
    #[must_use]
    pub fn values_many<K, V, R>(mut self, rows: impl IntoIterator<Item = R>) -> Self
    where
        K: Into<ParamKey>,
        V: Into<ParamValue>,
        R: IntoIterator<Item = (K, V)>,
    {
        self.parameters = Parameters::Multi(rows.into_iter().map(collect_row).collect());
        self
    }

    /// Adds a row given positionally, matched against the table's columns in
    /// declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] if the row has more values than the table
    /// has columns.
    pub fn values_positional<V>(mut self, row: impl IntoIterator<Item = V>) -> Result<Self>
    where
        V: Into<ParamValue>,
    {
        let values: Vec<ParamValue> = row.into_iter().map(Into::into).collect();
        if values.len() > self.table.columns().len() {
            return Err(Error::Argument(format!(
                "{} values given for table '{}' with {} columns",
                values.len(),
                self.table.name(),
                self.table.columns().len()
            )));
        }
        let row: Row = self
            .table
            .columns()
            .iter()
            .zip(values)
            .map(|(c, v)| (ParamKey::Column(c.clone()), v))
            .collect();
        self.parameters = match self.parameters {
            Parameters::None => Parameters::Single(row),
            Parameters::Single(first) => Parameters::Multi(vec![first, row]),
            Parameters::Multi(mut rows) => {
                rows.push(row);
                Parameters::Multi(rows)
            }
        };
        Ok(self)
    }

    /// Turns the statement into `INSERT INTO table (names) SELECT ...`.
    #[must_use]
    pub fn from_select<K: Into<ParamKey>>(
        mut self,
        names: impl IntoIterator<Item = K>,
        select: Select,
    ) -> Self {
        self.from_select = Some(InsertFromSelect {
            names: names.into_iter().map(Into::into).collect(),
            select,
        });
        self
    }

    /// Whether client-side defaults of columns not named in
    /// [`Insert::from_select`] are added to the SELECT.
    #[must_use]
    pub const fn include_defaults(mut self, include: bool) -> Self {
        self.include_defaults = include;
        self
    }

    /// Asks for every server-generated value.
    #[must_use]
    pub fn return_defaults(mut self) -> Self {
        self.return_defaults = ReturnDefaults::All;
        self
    }

    /// Asks for the server-generated values of the given columns.
    #[must_use]
    pub fn return_defaults_for(mut self, columns: impl IntoIterator<Item = ColumnRef>) -> Self {
        self.return_defaults = ReturnDefaults::Columns(columns.into_iter().collect());
        self
    }

    /// Adds an explicit RETURNING clause.
    #[must_use]
    pub fn returning(mut self, exprs: impl IntoIterator<Item = Expr>) -> Self {
        self.returning.extend(exprs);
        self
    }

    /// Renders defaults inline and does not fetch primary keys.
    #[must_use]
    pub const fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Parameters::Multi(rows) = &self.parameters {
            if rows.is_empty() {
                return Err(Error::Argument(String::from(
                    "multi-row INSERT requires at least one row",
                )));
            }
        }
        if self.from_select.is_some() && !matches!(self.parameters, Parameters::None) {
            return Err(Error::Argument(String::from(
                "INSERT .. SELECT cannot be combined with VALUES",
            )));
        }
        validate_returning(&self.return_defaults, &self.returning)
    }

    /// Compiles the statement against a dialect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] for an invalid combination of builder
    /// options and [`Error::Compile`] when the statement cannot be planned
    /// or rendered for `dialect`.
    pub fn compile(&self, dialect: &dyn Dialect) -> Result<Compiled> {
        Compiler::compile(dialect, &Statement::Insert(self.clone()), &CompileOptions::default())
    }
}

/// An UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub(crate) table: Arc<Table>,
    pub(crate) parameters: Parameters,
    pub(crate) parameter_ordering: Option<Vec<ParamKey>>,
    pub(crate) extra_froms: Vec<Arc<Table>>,
    pub(crate) where_clause: Option<Expr>,
    pub(crate) return_defaults: ReturnDefaults,
    pub(crate) returning: Vec<Expr>,
}

impl Update {
    /// Creates an UPDATE of `table`.
    #[must_use]
    pub fn new(table: &Arc<Table>) -> Self {
        Self {
            table: Arc::clone(table),
            parameters: Parameters::None,
            parameter_ordering: None,
            extra_froms: Vec::new(),
            where_clause: None,
            return_defaults: ReturnDefaults::None,
            returning: Vec::new(),
        }
    }

    /// Target table.
    #[must_use]
    pub const fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// Adds a single SET value.
    #[must_use]
    pub fn value(mut self, key: impl Into<ParamKey>, value: impl Into<ParamValue>) -> Self {
        self.parameters.push(key.into(), value.into());
        self
    }

    /// Sets the SET values; columns render in table order.
    #[must_use]
    pub fn values<K, V>(mut self, row: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<ParamKey>,
        V: Into<ParamValue>,
    {
        self.parameters = Parameters::Single(collect_row(row));
        self
    }

    /// Sets the SET values; columns render in the given order, followed by
    /// any remaining columns in table order.
    #[must_use]
    pub fn ordered_values<K, V>(mut self, row: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<ParamKey>,
        V: Into<ParamValue>,
    {
        let row = collect_row(row);
        self.parameter_ordering = Some(row.iter().map(|(k, _)| k.clone()).collect());
        self.parameters = Parameters::Single(row);
        self
    }

    /// Adds a table to a multi-table UPDATE.
    #[must_use]
    pub fn extra_from(mut self, table: &Arc<Table>) -> Self {
        if !self.extra_froms.iter().any(|t| **t == **table) && *self.table != **table {
            self.extra_froms.push(Arc::clone(table));
        }
        self
    }

    /// Adds a WHERE condition, combined with any existing one through AND.
    #[must_use]
    pub fn where_clause(mut self, expr: Expr) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    /// Asks for every server-generated value.
    #[must_use]
    pub fn return_defaults(mut self) -> Self {
        self.return_defaults = ReturnDefaults::All;
        self
    }

    /// Asks for the server-generated values of the given columns.
    #[must_use]
    pub fn return_defaults_for(mut self, columns: impl IntoIterator<Item = ColumnRef>) -> Self {
        self.return_defaults = ReturnDefaults::Columns(columns.into_iter().collect());
        self
    }

    /// Adds an explicit RETURNING clause.
    #[must_use]
    pub fn returning(mut self, exprs: impl IntoIterator<Item = Expr>) -> Self {
        self.returning.extend(exprs);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.parameters.is_multi() {
            return Err(Error::Argument(String::from(
                "UPDATE does not accept multiple parameter rows",
            )));
        }
        validate_returning(&self.return_defaults, &self.returning)
    }

    /// Compiles the statement against a dialect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] for an invalid combination of builder
    /// options and [`Error::Compile`] when the statement cannot be planned
    /// or rendered for `dialect`.
    pub fn compile(&self, dialect: &dyn Dialect) -> Result<Compiled> {
        Compiler::compile(dialect, &Statement::Update(self.clone()), &CompileOptions::default())
    }
}

fn validate_returning(return_defaults: &ReturnDefaults, returning: &[Expr]) -> Result<()> {
    if return_defaults.is_requested() && !returning.is_empty() {
        return Err(Error::Argument(String::from(
            "return_defaults() is mutually exclusive against returning()",
        )));
    }
    Ok(())
}

/// A DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub(crate) table: Arc<Table>,
    pub(crate) where_clause: Option<Expr>,
    pub(crate) returning: Vec<Expr>,
}

impl Delete {
    /// Creates a DELETE from `table`.
    #[must_use]
    pub fn new(table: &Arc<Table>) -> Self {
        Self {
            table: Arc::clone(table),
            where_clause: None,
            returning: Vec::new(),
        }
    }

    /// Adds a WHERE condition, combined with any existing one through AND.
    #[must_use]
    pub fn where_clause(mut self, expr: Expr) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    /// Adds an explicit RETURNING clause.
    #[must_use]
    pub fn returning(mut self, exprs: impl IntoIterator<Item = Expr>) -> Self {
        self.returning.extend(exprs);
        self
    }

    /// Compiles the statement against a dialect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Compile`] when the statement cannot be rendered for
    /// `dialect`.
    pub fn compile(&self, dialect: &dyn Dialect) -> Result<Compiled> {
        Compiler::compile(dialect, &Statement::Delete(self.clone()), &CompileOptions::default())
    }
}

/// A SELECT statement, used as a subquery or as the source of an
/// INSERT .. SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub(crate) columns: Vec<Expr>,
    pub(crate) froms: Vec<Arc<Table>>,
    pub(crate) where_clause: Option<Expr>,
}

impl Select {
    /// Creates a SELECT of the given columns.
    ///
    /// Without an explicit [`Select::from`], the FROM list is made of the
    /// tables referenced by the columns.
    #[must_use]
    pub fn new(columns: impl IntoIterator<Item = Expr>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            froms: Vec::new(),
            where_clause: None,
        }
    }

    /// Adds a table to the FROM list.
    #[must_use]
    pub fn from(mut self, table: &Arc<Table>) -> Self {
        self.froms.push(Arc::clone(table));
        self
    }

    /// Adds a WHERE condition, combined with any existing one through AND.
    #[must_use]
    pub fn where_clause(mut self, expr: Expr) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    /// Projected expressions.
    #[must_use]
    pub fn columns(&self) -> &[Expr] {
        &self.columns
    }

    /// Returns a copy with extra projected expressions.
    #[must_use]
    pub(crate) fn with_columns(&self, extra: impl IntoIterator<Item = Expr>) -> Self {
        let mut select = self.clone();
        select.columns.extend(extra);
        select
    }
}

/// Any compilable statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// SELECT.
    Select(Select),
    /// INSERT.
    Insert(Insert),
    /// UPDATE.
    Update(Update),
    /// DELETE.
    Delete(Delete),
}

impl Statement {
    /// Compiles the statement with explicit options.
    ///
    /// # Errors
    ///
    /// Same as the `compile` method of the wrapped statement.
    pub fn compile_with(&self, dialect: &dyn Dialect, options: &CompileOptions) -> Result<Compiled> {
        Compiler::compile(dialect, self, options)
    }
}

impl From<Insert> for Statement {
    fn from(stmt: Insert) -> Self {
        Self::Insert(stmt)
    }
}

impl From<Update> for Statement {
    fn from(stmt: Update) -> Self {
        Self::Update(stmt)
    }
}

impl From<Delete> for Statement {
    fn from(stmt: Delete) -> Self {
        Self::Delete(stmt)
    }
}

impl From<Select> for Statement {
    fn from(stmt: Select) -> Self {
        Self::Select(stmt)
    }
}
