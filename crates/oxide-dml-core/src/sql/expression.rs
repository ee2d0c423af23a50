//! Expression tree.

use std::collections::BTreeSet;

use super::statement::Select;
use crate::schema::{ColumnDefault, ColumnRef, Sequence};
use crate::types::SqlType;
use crate::value::SqlValue;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Concat,
    Like,
}

impl BinaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Concat => "||",
            Self::Like => "LIKE",
        }
    }

    /// Returns the precedence of the operator (higher = binds tighter).
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq => 3,
            Self::Like => 4,
            Self::Add | Self::Sub | Self::Concat => 8,
            Self::Mul | Self::Div | Self::Mod => 9,
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Logical NOT
    Not,
}

impl UnaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "NOT ",
        }
    }
}

/// A function call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// The function name.
    pub name: String,
    /// The arguments.
    pub args: Vec<Expr>,
}

/// How a bind parameter is named in the compiled statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindKey {
    /// Used verbatim.
    Named(String),
    /// Named `{prefix}_{n}` by the compiler.
    Anonymous(String),
}

/// The value carried by a bind parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    /// A known value.
    Value(SqlValue),
    /// Must be supplied when the statement is executed.
    Required,
    /// No value; NULL unless supplied at execution time.
    Unset,
    /// Produced by a client-side default before the statement is sent.
    Prefetch(ColumnDefault),
}

/// A named placeholder in a compiled statement.
#[derive(Debug, Clone, PartialEq)]
pub struct BindParameter {
    /// Naming of the placeholder.
    pub key: BindKey,
    /// Bound value.
    pub value: BindValue,
    /// Type used to process the value.
    pub sql_type: SqlType,
    /// Created by INSERT/UPDATE planning rather than by the caller.
    pub is_crud: bool,
}

impl BindParameter {
    /// A user bind parameter with a fixed name.
    #[must_use]
    pub fn named(name: impl Into<String>, value: SqlValue) -> Self {
        Self {
            key: BindKey::Named(name.into()),
            value: BindValue::Value(value),
            sql_type: SqlType::Null,
            is_crud: false,
        }
    }

    /// A user bind parameter whose value is supplied at execution time.
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            key: BindKey::Named(name.into()),
            value: BindValue::Required,
            sql_type: SqlType::Null,
            is_crud: false,
        }
    }

    /// A uniquely named bind parameter.
    #[must_use]
    pub fn anonymous(prefix: impl Into<String>, value: SqlValue, sql_type: SqlType) -> Self {
        Self {
            key: BindKey::Anonymous(prefix.into()),
            value: BindValue::Value(value),
            sql_type,
            is_crud: false,
        }
    }

    /// A bind parameter created by the INSERT/UPDATE planner.
    pub(crate) fn crud(name: impl Into<String>, value: BindValue, sql_type: SqlType) -> Self {
        Self {
            key: BindKey::Named(name.into()),
            value,
            sql_type,
            is_crud: true,
        }
    }

    /// Sets the type of the parameter.
    #[must_use]
    pub fn with_type(mut self, sql_type: SqlType) -> Self {
        self.sql_type = sql_type;
        self
    }
}

/// A SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column of a table.
    Column(ColumnRef),
    /// A value rendered inline.
    Literal(SqlValue),
    /// Raw SQL text.
    Text(String),
    /// A bind parameter.
    Bind(BindParameter),
    /// A binary expression.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },
    /// A unary expression.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// A function call.
    Function(FunctionCall),
    /// IS [NOT] NULL.
    IsNull {
        /// The expression to check.
        expr: Box<Expr>,
        /// Whether this is IS NOT NULL.
        negated: bool,
    },
    /// CAST(expr AS type).
    Cast {
        /// Expression to cast.
        expr: Box<Expr>,
        /// Target type.
        sql_type: SqlType,
    },
    /// Parenthesized expression.
    Grouping(Box<Expr>),
    /// Next value of a sequence.
    NextValue(Sequence),
    /// A scalar subquery.
    Subquery(Box<Select>),
}

impl Expr {
    /// Raw SQL text.
    #[must_use]
    pub fn text(sql: impl Into<String>) -> Self {
        Self::Text(sql.into())
    }

    /// An inline literal.
    #[must_use]
    pub const fn literal(value: SqlValue) -> Self {
        Self::Literal(value)
    }

    /// The NULL keyword.
    #[must_use]
    pub const fn null() -> Self {
        Self::Literal(SqlValue::Null)
    }

    /// A function call.
    #[must_use]
    pub fn func(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Function(FunctionCall {
            name: name.into(),
            args,
        })
    }

    /// A bind parameter expression.
    #[must_use]
    pub const fn bind(param: BindParameter) -> Self {
        Self::Bind(param)
    }

    /// The next value of a sequence.
    #[must_use]
    pub const fn next_value(seq: Sequence) -> Self {
        Self::NextValue(seq)
    }

    /// A scalar subquery.
    #[must_use]
    pub fn scalar(select: Select) -> Self {
        Self::Subquery(Box::new(select))
    }

    /// Creates a binary expression.
    #[must_use]
    pub fn binary(self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    /// Creates an equality expression.
    #[must_use]
    pub fn eq(self, right: Self) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    /// Creates an AND expression.
    #[must_use]
    pub fn and(self, right: Self) -> Self {
        self.binary(BinaryOp::And, right)
    }

    /// Creates an OR expression.
    #[must_use]
    pub fn or(self, right: Self) -> Self {
        self.binary(BinaryOp::Or, right)
    }

    /// Creates an addition.
    #[must_use]
    pub fn plus(self, right: Self) -> Self {
        self.binary(BinaryOp::Add, right)
    }

    /// Creates a NOT expression.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }

    /// Creates an IS NULL expression.
    #[must_use]
    pub fn is_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    /// Creates an IS NOT NULL expression.
    #[must_use]
    pub fn is_not_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    /// Creates a CAST expression.
    #[must_use]
    pub fn cast(self, sql_type: SqlType) -> Self {
        Self::Cast {
            expr: Box::new(self),
            sql_type,
        }
    }

    /// Wraps the expression in parentheses.
    #[must_use]
    pub fn grouped(self) -> Self {
        Self::Grouping(Box::new(self))
    }

    /// Precedence used to decide parenthesization of operands.
    pub(crate) const fn precedence(&self) -> u8 {
        match self {
            Self::Binary { op, .. } => op.precedence(),
            Self::IsNull { .. } => 3,
            Self::Unary {
                op: UnaryOp::Not, ..
            } => 2,
            _ => u8::MAX,
        }
    }

    /// Names of the tables referenced by columns in this expression.
    #[must_use]
    pub fn referenced_tables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_tables(&mut out);
        out
    }

    fn collect_tables(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Column(c) => {
                out.insert(c.table_name().to_owned());
            }
            Self::Binary { left, right, .. } => {
                left.collect_tables(out);
                right.collect_tables(out);
            }
            Self::Unary { operand: expr, .. }
            | Self::IsNull { expr, .. }
            | Self::Cast { expr, .. }
            | Self::Grouping(expr) => expr.collect_tables(out),
            Self::Function(f) => f.args.iter().for_each(|a| a.collect_tables(out)),
            Self::Literal(_)
            | Self::Text(_)
            | Self::Bind(_)
            | Self::NextValue(_)
            | Self::Subquery(_) => {}
        }
    }
}

impl From<ColumnRef> for Expr {
    fn from(column: ColumnRef) -> Self {
        Self::Column(column)
    }
}

impl From<&ColumnRef> for Expr {
    fn from(column: &ColumnRef) -> Self {
        Self::Column(column.clone())
    }
}
