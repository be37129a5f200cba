//! Provides a type-safe, fluent builder for constructing `Select` ASTs.

// --- Typestate Marker Structs ---
// These zero-sized structs represent the state of the builder.
// They ensure that methods are called in the correct SQL order at compile time.

use crate::query::ast::{
    common::{JoinKind, OrderDir, TableRef},
    expr::Expr,
    select::{FromClause, JoinClause, JoinTarget, OrderByExpr, Select},
};

/// The initial state of the builder before any clauses have been added.
#[derive(Debug, Default, Clone)]
pub struct InitialState;

/// The state after the `SELECT` clause has been added.
#[derive(Debug, Default, Clone)]
pub struct SelectState;

/// The state after the `FROM` clause has been added.
#[derive(Debug, Default, Clone)]
pub struct FromState;

// --- The Main Builder ---

#[derive(Debug, Clone)]
pub struct SelectBuilder<State> {
    ast: Select,
    state: State,
}

impl Default for SelectBuilder<InitialState> {
    fn default() -> Self {
        Self::new()
    }
}

/// Implementation for the initial state of the builder.
impl SelectBuilder<InitialState> {
    pub fn new() -> Self {
        Self {
            ast: Select::default(),
            state: InitialState,
        }
    }

    /// Adds a `SELECT` clause with a list of columns.
    /// This is the entry point for building a select query.
    pub fn select(mut self, columns: Vec<Expr>) -> SelectBuilder<SelectState> {
        self.ast.columns = columns;
        SelectBuilder {
            ast: self.ast,
            state: SelectState,
        }
    }
}

/// Implementation for the state after `SELECT` has been called.
/// The only valid next step is to specify a `FROM` table.
impl SelectBuilder<SelectState> {
    /// Adds a `FROM` clause specifying the primary table.
    pub fn from(mut self, table: TableRef, alias: Option<&str>) -> SelectBuilder<FromState> {
        self.ast.from = Some(FromClause {
            table,
            alias: alias.map(String::from),
        });
        SelectBuilder {
            ast: self.ast,
            state: FromState,
        }
    }
}

/// Implementation for the state after `FROM` has been called.
/// From here, we can add optional clauses like `JOIN`, `WHERE`, etc.
impl SelectBuilder<FromState> {
    /// Adds a `JOIN` clause to the query.
    pub fn join(mut self, kind: JoinKind, target: JoinTarget, on: Expr, escape: bool) -> Self {
        self.ast.joins.push(JoinClause {
            kind,
            target,
            on,
            escape,
        });
        self
    }

    /// Adds an already assembled `JOIN` clause.
    pub fn join_clause(mut self, clause: JoinClause) -> Self {
        self.ast.joins.push(clause);
        self
    }

    /// Adds a `WHERE` clause to the query.
    pub fn where_clause(mut self, condition: Expr) -> Self {
        self.ast.where_clause = Some(condition);
        self
    }

    /// Adds an `ORDER BY` clause to the query.
    pub fn order_by(mut self, expr: Expr, direction: Option<OrderDir>) -> Self {
        self.ast.order_by.push(OrderByExpr { expr, direction });
        self
    }

    /// Adds a `LIMIT` clause to the query.
    pub fn limit(mut self, limit: Expr) -> Self {
        self.ast.limit = Some(limit);
        self
    }

    /// Adds an `OFFSET` clause to the query.
    pub fn offset(mut self, offset: Expr) -> Self {
        self.ast.offset = Some(offset);
        self
    }

    /// Finalizes and returns the constructed `Select` AST.
    pub fn build(self) -> Select {
        self.ast
    }
}
