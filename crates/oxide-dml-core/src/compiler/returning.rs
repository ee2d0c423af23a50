//! How generated values of an INSERT or UPDATE are obtained.

use super::guard::DmlKind;
use crate::dialect::Dialect;
use crate::schema::{Column, ColumnRef, Table};
use crate::sql::ReturnDefaults;

/// Returning modifiers, computed once per statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturningPlan {
    /// An INSERT that must learn its primary key values.
    pub need_pks: bool,
    /// Generated primary keys come back through an implicit RETURNING.
    pub implicit_returning: bool,
    /// Columns whose generated values are fetched through RETURNING
    /// because `return_defaults` asked for them.
    pub implicit_return_defaults: Option<Vec<ColumnRef>>,
    /// The driver's last row id is used for the autoincrement column.
    pub postfetch_lastrowid: bool,
}

impl ReturningPlan {
    pub(crate) fn compute(
        kind: DmlKind,
        dialect: &dyn Dialect,
        table: &Table,
        inline: bool,
        has_returning: bool,
        is_multi: bool,
        return_defaults: &ReturnDefaults,
    ) -> Self {
        let need_pks = kind.is_insert() && !inline && !is_multi && !has_returning;
        let implicit_returning = need_pks
            && dialect.implicit_returning()
            && table.implicit_returning();
        let returns_defaults = match kind {
            DmlKind::Insert => implicit_returning,
            DmlKind::Update => dialect.implicit_returning() && table.implicit_returning(),
            DmlKind::Delete | DmlKind::None => false,
        };
        let implicit_return_defaults = if returns_defaults && return_defaults.is_requested() {
            Some(match return_defaults {
                ReturnDefaults::Columns(columns) => columns.clone(),
                _ => table.columns().to_vec(),
            })
        } else {
            None
        };
        let postfetch_lastrowid = need_pks && dialect.postfetch_lastrowid();
        Self {
            need_pks,
            implicit_returning,
            implicit_return_defaults,
            postfetch_lastrowid,
        }
    }

    /// Whether `return_defaults` claims the column for RETURNING.
    #[must_use]
    pub fn returns_default(&self, column: &Column) -> bool {
        self.implicit_return_defaults
            .as_ref()
            .is_some_and(|cols| cols.iter().any(|c| **c == *column))
    }
}
