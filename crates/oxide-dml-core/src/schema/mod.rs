//! Schema model: tables, columns and their default generators.
//!
//! Tables are immutable once built and shared through `Arc`, so many
//! compiles may read the same table concurrently.

mod column;
mod default;
mod table;

pub use column::{Autoincrement, Column, ColumnBuilder, ColumnRef};
pub use default::{ColumnDefault, DefaultFn, Sequence, ServerDefault};
pub use table::{Table, TableBuilder};
