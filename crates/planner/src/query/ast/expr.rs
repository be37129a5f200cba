//! Defines the AST for SQL expressions.

use model::core::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column or table identifier, e.g., `users` or `users.id`.
    Identifier(Ident),

    /// A literal value, bound as a query parameter.
    Value(Value),

    /// A binary operation, e.g., `column = 'value'` or `a AND b`.
    BinaryOp(Box<BinaryOp>),

    /// A function call, e.g., `COUNT(*)` or `MAX(price)`.
    FunctionCall(FunctionCall),

    /// An aliased expression, e.g. `COUNT(*) AS total_count`
    Alias { expr: Box<Expr>, alias: String },

    /// `expr IN (a, b, c)`
    InList { expr: Box<Expr>, list: Vec<Expr> },

    /// Caller-trusted SQL text, rendered verbatim and never escaped.
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub qualifier: Option<String>, // e.g., the 'users' in 'users.id'
    pub name: String,              // e.g., the 'id' in 'users.id'
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Expr,
    pub op: BinaryOperator,
    pub right: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub wildcard: bool, // represents the '*' in 'COUNT(*)'
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,    // =
    NotEq, // <>
    Lt,    // <
    LtEq,  // <=
    Gt,    // >
    GtEq,  // >=

    // Logical
    And,
    Or,
}

impl Expr {
    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
        Expr::BinaryOp(Box::new(BinaryOp { left, op, right }))
    }

    pub fn eq(left: Expr, right: Expr) -> Expr {
        Expr::binary(left, BinaryOperator::Eq, right)
    }

    /// Folds conditions into a left-deep `AND` chain. `None` when empty.
    pub fn and_all(conditions: impl IntoIterator<Item = Expr>) -> Option<Expr> {
        conditions
            .into_iter()
            .reduce(|acc, next| Expr::binary(acc, BinaryOperator::And, next))
    }
}
