use crate::sql::{
    base::{adapter::SqlAdapter, error::DbError},
    mysql::{params::MySqlParamStore, row::to_row_data},
};
use async_trait::async_trait;
use model::{core::value::Value, records::row::RowData};
use mysql_async::{Opts, Pool, Row, prelude::Queryable};
use planner::query::dialect::{self, Dialect};
use tracing::{debug, info};

#[derive(Clone)]
pub struct MySqlAdapter {
    pool: Pool,
    dialect: dialect::MySql,
}

impl MySqlAdapter {
    /// Builds a connection pool from a `mysql://` URL. Connections are
    /// opened lazily on first use.
    pub fn connect(url: &str) -> Result<Self, DbError> {
        let opts = Opts::from_url(url)?;
        info!(
            "Connecting to MySQL at {}:{}",
            opts.ip_or_hostname(),
            opts.tcp_port()
        );
        Ok(MySqlAdapter {
            pool: Pool::new(opts),
            dialect: dialect::MySql,
        })
    }

    /// Closes every pooled connection.
    pub async fn disconnect(self) -> Result<(), DbError> {
        self.pool.disconnect().await?;
        Ok(())
    }
}

#[async_trait]
impl SqlAdapter for MySqlAdapter {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn query_rows(&self, sql: &str, params: Vec<Value>) -> Result<Vec<RowData>, DbError> {
        debug!("Executing query: {}", sql);
        debug!("Parameters: {:?}", params);

        let store = MySqlParamStore::from_values(&params);
        let mut conn = self.pool.get_conn().await?;
        let rows: Vec<Row> = conn.exec(sql, store.params()).await?;

        Ok(rows.iter().map(|row| to_row_data(row, "")).collect())
    }

    async fn exec_params(&self, sql: &str, params: Vec<Value>) -> Result<u64, DbError> {
        debug!("Executing statement: {}", sql);
        debug!("Parameters: {:?}", params);

        let store = MySqlParamStore::from_values(&params);
        let mut conn = self.pool.get_conn().await?;
        conn.exec_drop(sql, store.params()).await?;

        Ok(conn.affected_rows())
    }
}
