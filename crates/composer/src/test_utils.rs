use async_trait::async_trait;
use connectors::sql::base::{adapter::SqlAdapter, error::DbError};
use model::{core::value::Value, records::row::RowData};
use planner::query::dialect::{Dialect, MySql};
use std::{collections::VecDeque, sync::Mutex};

/// In-memory adapter recording every statement it receives.
pub(crate) struct RecordingAdapter {
    dialect: MySql,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    results: Mutex<VecDeque<Vec<RowData>>>,
    fail_at: Option<usize>,
}

impl RecordingAdapter {
    pub fn new() -> Self {
        RecordingAdapter {
            dialect: MySql,
            calls: Mutex::new(Vec::new()),
            results: Mutex::new(VecDeque::new()),
            fail_at: None,
        }
    }

    /// Queues the rows returned by the next `query_rows` call.
    pub fn with_rows(self, rows: Vec<RowData>) -> Self {
        self.results.lock().unwrap().push_back(rows);
        self
    }

    /// Makes the call with this (zero-based) index fail.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, sql: &str, params: Vec<Value>) -> Result<(), DbError> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push((sql.to_string(), params));
        if self.fail_at == Some(index) {
            return Err(DbError::Unknown(format!("call {index} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl SqlAdapter for RecordingAdapter {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn query_rows(&self, sql: &str, params: Vec<Value>) -> Result<Vec<RowData>, DbError> {
        self.record(sql, params)?;
        Ok(self.results.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn exec_params(&self, sql: &str, params: Vec<Value>) -> Result<u64, DbError> {
        self.record(sql, params)?;
        Ok(1)
    }
}
