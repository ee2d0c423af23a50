//! Expression tree and statement types.
//!
//! Nodes are immutable by convention: compiling a statement never modifies
//! it, so the same statement may be compiled any number of times.

mod expression;
mod statement;

pub use expression::{BinaryOp, BindKey, BindParameter, BindValue, Expr, FunctionCall, UnaryOp};
pub use statement::{
    Delete, Insert, InsertFromSelect, ParamKey, Parameters, ReturnDefaults, Row, Select,
    Statement, Update,
};
