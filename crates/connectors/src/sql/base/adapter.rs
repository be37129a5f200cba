use crate::sql::base::error::DbError;
use async_trait::async_trait;
use model::{core::value::Value, records::row::RowData};
use planner::query::dialect::Dialect;

/// The primitives the composition layer needs from a database client:
/// parameterized row fetches and parameterized statements.
///
/// Implementations never retry; a failed call is returned as-is.
#[async_trait]
pub trait SqlAdapter: Send + Sync {
    /// The dialect used to render statements sent through this adapter.
    fn dialect(&self) -> &dyn Dialect;

    async fn query_rows(&self, sql: &str, params: Vec<Value>) -> Result<Vec<RowData>, DbError>;

    /// Executes a statement and returns the number of affected rows.
    async fn exec_params(&self, sql: &str, params: Vec<Value>) -> Result<u64, DbError>;
}
