//! Provides a fluent builder for constructing `Insert` ASTs.

use crate::query::ast::{common::TableRef, expr::Expr, insert::Insert};

#[derive(Debug, Clone)]
pub struct InsertBuilder {
    ast: Insert,
}

impl InsertBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: Insert {
                table,
                ..Default::default()
            },
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.ast.columns = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Appends one row of values. Call repeatedly for a batch insert.
    pub fn values(mut self, values: Vec<Expr>) -> Self {
        self.ast.values.push(values);
        self
    }

    pub fn build(self) -> Insert {
        self.ast
    }
}
