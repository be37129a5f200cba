//! Provides a fluent builder for constructing `Delete` ASTs.

use crate::query::ast::{common::TableRef, delete::Delete, expr::Expr};

#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    ast: Delete,
}

impl DeleteBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: Delete {
                table,
                where_clause: None,
            },
        }
    }

    pub fn where_clause(mut self, condition: Expr) -> Self {
        self.ast.where_clause = Some(condition);
        self
    }

    pub fn build(self) -> Delete {
        self.ast
    }
}
