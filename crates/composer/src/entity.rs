//! Row-scoped helpers working on a source's primary key.

use crate::{error::ComposeError, source::Source};
use connectors::sql::base::adapter::SqlAdapter;
use model::{core::value::Value, records::row::RowData};
use planner::{
    query::{
        ast::expr::Expr,
        builder::{delete::DeleteBuilder, update::UpdateBuilder},
        ident,
        renderer::render,
        value,
    },
    table_ref,
};
use std::collections::HashMap;
use tracing::{debug, info};

/// Detaches `row` from `null_tables` by nulling their copy of the primary
/// key, then deletes its rows from `delete_tables`. Returns the total number
/// of affected rows.
pub async fn delete_from_tables(
    adapter: &dyn SqlAdapter,
    source: &Source,
    row: &RowData,
    delete_tables: &[&str],
    null_tables: &[&str],
) -> Result<u64, ComposeError> {
    let pk = source.require_primary_key()?;
    let id = row.get_value(pk);
    if id.is_empty() {
        return Err(ComposeError::MissingEntityKey {
            source_name: source.name().to_string(),
            key: pk.to_string(),
        });
    }

    let mut affected = 0;
    for table in null_tables {
        let ast = UpdateBuilder::new(table_ref!(table))
            .set(pk, value(Value::Null))
            .where_clause(Expr::eq(ident(pk), value(id.clone())))
            .build();
        let (sql, params) = render(&ast, adapter.dialect());
        affected += adapter.exec_params(&sql, params).await?;
    }

    for table in delete_tables {
        let ast = DeleteBuilder::new(table_ref!(table))
            .where_clause(Expr::eq(ident(pk), value(id.clone())))
            .build();
        let (sql, params) = render(&ast, adapter.dialect());
        affected += adapter.exec_params(&sql, params).await?;
    }

    info!(
        "Removed `{}` {:?} from {} tables ({} rows)",
        source.name(),
        id,
        null_tables.len() + delete_tables.len(),
        affected
    );
    Ok(affected)
}

/// Reads the next `AUTO_INCREMENT` value of the source's table in the
/// current schema.
pub async fn next_auto_increment(
    adapter: &dyn SqlAdapter,
    source: &Source,
) -> Result<u64, ComposeError> {
    let sql = format!(
        "SELECT AUTO_INCREMENT FROM information_schema.tables \
         WHERE table_name = {} AND table_schema = DATABASE()",
        adapter.dialect().get_placeholder(0)
    );
    let rows = adapter
        .query_rows(&sql, vec![Value::String(source.table().to_string())])
        .await?;

    let next = rows
        .first()
        .and_then(|row| row.get_value("AUTO_INCREMENT").as_u64())
        .ok_or_else(|| {
            ComposeError::SchemaLookupFailure(format!(
                "cannot find AUTO_INCREMENT for table `{}`",
                source.table()
            ))
        })?;

    debug!("Next AUTO_INCREMENT of `{}` is {}", source.table(), next);
    Ok(next)
}

/// Indexes rows by the text of `id_field`. Later rows win; rows without an
/// id are skipped.
pub fn make_dictionary(rows: Vec<RowData>, id_field: &str) -> HashMap<String, RowData> {
    let mut dict = HashMap::with_capacity(rows.len());
    for row in rows {
        match row.get_value(id_field).as_string() {
            Some(id) => {
                dict.insert(id, row);
            }
            None => debug!("Skipping row without `{}`", id_field),
        }
    }
    dict
}

impl Source {
    /// Indexes rows by this source's primary key.
    pub fn dictionary(&self, rows: Vec<RowData>) -> Result<HashMap<String, RowData>, ComposeError> {
        let pk = self.require_primary_key()?;
        Ok(make_dictionary(rows, pk))
    }
}
