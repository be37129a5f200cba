//! Provides a fluent builder for constructing `Update` ASTs.

use crate::query::ast::{
    common::TableRef,
    expr::Expr,
    update::{Assignment, Update},
};

#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    ast: Update,
}

impl UpdateBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: Update {
                table,
                ..Default::default()
            },
        }
    }

    pub fn set(mut self, column: &str, value: Expr) -> Self {
        self.ast.assignments.push(Assignment {
            column: column.to_string(),
            value,
        });
        self
    }

    pub fn where_clause(mut self, condition: Expr) -> Self {
        self.ast.where_clause = Some(condition);
        self
    }

    pub fn build(self) -> Update {
        self.ast
    }
}
