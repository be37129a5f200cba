use crate::error::ComposeError;
use connectors::sql::base::adapter::SqlAdapter;
use model::core::value::Value;
use planner::{
    query::{
        ast::expr::Expr,
        builder::{delete::DeleteBuilder, insert::InsertBuilder},
        ident,
        renderer::render,
        value,
    },
    table_ref,
};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// An id collection, either `"1,2,3"` or discrete values.
#[derive(Debug, Clone, PartialEq)]
pub enum Ids {
    Delimited(String),
    List(Vec<Value>),
}

impl Ids {
    /// Distinct ids in input order. Ids compare by their text, so `1` and
    /// `"1"` are the same id. Blank tokens and nulls are dropped.
    pub fn normalize(&self) -> Vec<Value> {
        let values: Vec<Value> = match self {
            Ids::Delimited(s) => s
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| Value::String(token.to_string()))
                .collect(),
            Ids::List(values) => values.clone(),
        };

        let mut seen = HashSet::new();
        values
            .into_iter()
            .filter(|v| v.as_string().is_some_and(|key| seen.insert(key)))
            .collect()
    }
}

impl From<&str> for Ids {
    fn from(value: &str) -> Self {
        Ids::Delimited(value.to_string())
    }
}

impl From<String> for Ids {
    fn from(value: String) -> Self {
        Ids::Delimited(value)
    }
}

impl From<Vec<Value>> for Ids {
    fn from(values: Vec<Value>) -> Self {
        Ids::List(values)
    }
}

impl From<Vec<i64>> for Ids {
    fn from(values: Vec<i64>) -> Self {
        Ids::List(values.into_iter().map(Value::Int).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncDiff {
    pub insert: Vec<Value>,
    pub delete: Vec<Value>,
}

impl SyncDiff {
    /// `insert = desired - previous`, `delete = previous - desired`.
    pub fn compute(desired: &Ids, previous: &Ids) -> Self {
        let desired = desired.normalize();
        let previous = previous.normalize();

        let keys = |values: &[Value]| -> HashSet<String> {
            values.iter().filter_map(Value::as_string).collect()
        };
        let desired_keys = keys(&desired);
        let previous_keys = keys(&previous);

        let minus = |values: Vec<Value>, other: &HashSet<String>| -> Vec<Value> {
            values
                .into_iter()
                .filter(|v| v.as_string().is_some_and(|key| !other.contains(&key)))
                .collect()
        };

        SyncDiff {
            insert: minus(desired, &previous_keys),
            delete: minus(previous, &desired_keys),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.insert.is_empty() && self.delete.is_empty()
    }
}

/// Brings the rows of `join_table` scoped by `common` in line with
/// `desired`: one batch delete of ids no longer wanted, then one batch
/// insert of new ids. `common` is used verbatim as the delete filter and
/// must not be empty.
pub async fn sync_many_to_many(
    adapter: &dyn SqlAdapter,
    join_table: &str,
    common: &[(&str, Value)],
    remote_id_field: &str,
    desired: impl Into<Ids>,
    previous: impl Into<Ids>,
) -> Result<SyncDiff, ComposeError> {
    if common.is_empty() {
        return Err(ComposeError::UnscopedSync(join_table.to_string()));
    }

    let diff = SyncDiff::compute(&desired.into(), &previous.into());
    debug!(
        "Sync diff for `{}`: {} to insert, {} to delete",
        join_table,
        diff.insert.len(),
        diff.delete.len()
    );

    if !diff.delete.is_empty() {
        let scope = common
            .iter()
            .map(|(column, v)| Expr::eq(ident(column), value(v.clone())));
        let in_list = Expr::InList {
            expr: Box::new(ident(remote_id_field)),
            list: diff.delete.iter().cloned().map(value).collect(),
        };

        if let Some(condition) = Expr::and_all(scope.chain(std::iter::once(in_list))) {
            let ast = DeleteBuilder::new(table_ref!(join_table))
                .where_clause(condition)
                .build();
            let (sql, params) = render(&ast, adapter.dialect());
            let affected = adapter.exec_params(&sql, params).await?;
            info!("Deleted {} rows from `{}`", affected, join_table);
        }
    }

    if !diff.insert.is_empty() {
        let columns: Vec<&str> = common
            .iter()
            .map(|(column, _)| *column)
            .chain(std::iter::once(remote_id_field))
            .collect();

        let mut builder = InsertBuilder::new(table_ref!(join_table)).columns(&columns);
        for id in &diff.insert {
            let row = common
                .iter()
                .map(|(_, v)| value(v.clone()))
                .chain(std::iter::once(value(id.clone())))
                .collect();
            builder = builder.values(row);
        }

        let (sql, params) = render(&builder.build(), adapter.dialect());
        let affected = adapter.exec_params(&sql, params).await?;
        info!("Inserted {} rows into `{}`", affected, join_table);
    }

    Ok(diff)
}
