//! Normalization of parameter keys.
//!
//! A single-table statement keys its parameters by column key. A
//! multi-table UPDATE keys columns of the extra tables by `(table, key)` so
//! that equally named columns of different tables stay apart, and names
//! their bind parameters `{table}_{key}`.
//!
//! Normalization is asymmetric: a plain string key always resolves to a
//! column of the primary table, while a column object of an extra table
//! resolves to its qualified key.

use std::fmt;
use std::sync::Arc;

use super::guard::DmlKind;
use crate::schema::{Column, Table};
use crate::sql::ParamKey;

/// A normalized parameter key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnKey {
    /// A column key of the primary table.
    Plain(String),
    /// A column of an extra table of a multi-table UPDATE.
    Qualified {
        /// Schema of the table.
        schema: Option<String>,
        /// Table name.
        table: String,
        /// Column key.
        key: String,
    },
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(key) => f.write_str(key),
            Self::Qualified { schema, table, key } => {
                if let Some(schema) = schema {
                    write!(f, "{schema}.")?;
                }
                write!(f, "{table}.{key}")
            }
        }
    }
}

/// Key normalization for one statement.
#[derive(Debug, Clone, Default)]
pub struct KeyResolver {
    extra_tables: Vec<Arc<Table>>,
}

impl KeyResolver {
    pub(crate) fn new(kind: DmlKind, extra_froms: &[Arc<Table>]) -> Self {
        let extra_tables = if kind.is_update() {
            extra_froms.to_vec()
        } else {
            Vec::new()
        };
        Self { extra_tables }
    }

    fn is_extra(&self, column: &Column) -> bool {
        self.extra_tables.iter().any(|t| t.contains(column))
    }

    /// Normalizes a parameter key; `None` for keys that are not columns.
    pub(crate) fn column_as_key(&self, key: &ParamKey) -> Option<ColumnKey> {
        match key {
            ParamKey::Name(name) => Some(ColumnKey::Plain(name.clone())),
            ParamKey::Column(column) => Some(self.getattr_col_key(column)),
            ParamKey::Expr(_) => None,
        }
    }

    /// The key a column is looked up under.
    pub(crate) fn getattr_col_key(&self, column: &Column) -> ColumnKey {
        if self.is_extra(column) {
            ColumnKey::Qualified {
                schema: column.schema().map(str::to_owned),
                table: column.table_name().to_owned(),
                key: column.key().to_owned(),
            }
        } else {
            ColumnKey::Plain(column.key().to_owned())
        }
    }

    /// The bind parameter name of a column.
    pub(crate) fn col_bind_name(&self, column: &Column) -> String {
        if self.is_extra(column) {
            format!("{}_{}", column.table_name(), column.key())
        } else {
            column.key().to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnBuilder;
    use crate::sql::Expr;
    use crate::types::SqlType;

    fn tables() -> (Arc<Table>, Arc<Table>) {
        let users = Table::builder("users")
            .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
            .column(ColumnBuilder::new("name", SqlType::Text))
            .build()
            .unwrap();
        let addresses = Table::builder("addresses")
            .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
            .column(ColumnBuilder::new("name", SqlType::Text))
            .build()
            .unwrap();
        (users, addresses)
    }

    #[test]
    fn test_single_table_keys_are_plain() {
        let (users, _) = tables();
        let keys = KeyResolver::new(DmlKind::Insert, &[]);
        let name = users.column("name").unwrap();
        assert_eq!(keys.getattr_col_key(&name), ColumnKey::Plain("name".into()));
        assert_eq!(keys.col_bind_name(&name), "name");
        assert_eq!(
            keys.column_as_key(&ParamKey::Column(name)),
            Some(ColumnKey::Plain("name".into()))
        );
    }

    #[test]
    fn test_extra_table_columns_are_qualified() {
        let (users, addresses) = tables();
        let keys = KeyResolver::new(DmlKind::Update, &[Arc::clone(&addresses)]);
        let a_name = addresses.column("name").unwrap();
        let u_name = users.column("name").unwrap();
        assert_eq!(
            keys.column_as_key(&ParamKey::Column(a_name.clone())),
            Some(ColumnKey::Qualified {
                schema: None,
                table: "addresses".into(),
                key: "name".into()
            })
        );
        assert_eq!(keys.col_bind_name(&a_name), "addresses_name");
        assert_eq!(keys.col_bind_name(&u_name), "name");
        assert_eq!(
            keys.column_as_key(&ParamKey::from("name")),
            Some(ColumnKey::Plain("name".into()))
        );
    }

    #[test]
    fn test_same_named_table_in_another_schema_is_distinct() {
        let table = |schema: &str| {
            Table::builder("users")
                .schema(schema)
                .column(ColumnBuilder::new("id", SqlType::Integer).primary_key())
                .column(ColumnBuilder::new("name", SqlType::Text))
                .build()
                .unwrap()
        };
        let (a_users, b_users) = (table("a"), table("b"));
        let keys = KeyResolver::new(DmlKind::Update, &[Arc::clone(&b_users)]);

        let a_name = a_users.column("name").unwrap();
        let b_name = b_users.column("name").unwrap();
        assert_ne!(a_name, b_name);
        assert_eq!(keys.getattr_col_key(&a_name), ColumnKey::Plain("name".into()));
        assert_eq!(keys.col_bind_name(&a_name), "name");
        let qualified = keys.getattr_col_key(&b_name);
        assert_eq!(qualified.to_string(), "b.users.name");
        assert_eq!(keys.col_bind_name(&b_name), "users_name");
    }

    #[test]
    fn test_expression_keys_are_not_columns() {
        let keys = KeyResolver::default();
        assert_eq!(keys.column_as_key(&ParamKey::Expr(Expr::text("x"))), None);
    }

    #[test]
    fn test_insert_ignores_extra_tables() {
        let (_, addresses) = tables();
        let keys = KeyResolver::new(DmlKind::Insert, &[Arc::clone(&addresses)]);
        let col = addresses.column("name").unwrap();
        assert_eq!(keys.col_bind_name(&col), "name");
    }
}
