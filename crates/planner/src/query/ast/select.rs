//! Defines the Abstract Syntax Tree (AST) for a SELECT query.

use crate::query::ast::{
    common::{JoinKind, OrderDir, TableRef},
    expr::Expr,
};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Select {
    /// The list of columns or expressions to be returned.
    /// e.g., `id`, `name`, `COUNT(*)`
    pub columns: Vec<Expr>,

    /// The primary table for the query.
    /// e.g., `FROM users`
    pub from: Option<FromClause>,

    /// A list of JOIN clauses.
    pub joins: Vec<JoinClause>,

    /// The WHERE clause condition.
    pub where_clause: Option<Expr>,

    /// The ORDER BY clause.
    pub order_by: Vec<OrderByExpr>,

    /// The LIMIT clause.
    pub limit: Option<Expr>,

    /// The OFFSET clause.
    pub offset: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub table: TableRef,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub target: JoinTarget,
    /// The join condition, e.g., `ON users.id = posts.user_id`.
    pub on: Expr,
    /// Whether the target's identifiers are quoted by the dialect.
    pub escape: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinTarget {
    /// A plain table, optionally renamed: `bar` or `bar AS b`.
    Table {
        table: TableRef,
        alias: Option<String>,
    },
    /// A derived table: `(<sql>) AS <alias>`. Never escaped.
    Derived { sql: String, alias: String },
}

impl JoinTarget {
    /// Builds a derived-table target, wrapping `sql` in parentheses unless
    /// it already starts with one.
    pub fn derived(sql: &str, alias: &str) -> Self {
        let sql = sql.trim();
        let sql = if sql.starts_with('(') {
            sql.to_string()
        } else {
            format!("({sql})")
        };
        JoinTarget::Derived {
            sql,
            alias: alias.to_string(),
        }
    }

    /// The name columns of this target are qualified with.
    pub fn alias(&self) -> &str {
        match self {
            JoinTarget::Table { table, alias } => alias.as_deref().unwrap_or(&table.name),
            JoinTarget::Derived { alias, .. } => alias,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub direction: Option<OrderDir>,
}
