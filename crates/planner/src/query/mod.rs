use crate::query::ast::expr::{Expr, Ident};
use model::core::value::Value;

pub mod ast;
pub mod builder;
pub mod dialect;
pub mod macros;
pub mod renderer;

pub fn ident(name: &str) -> Expr {
    Expr::Identifier(Ident {
        qualifier: None,
        name: name.to_string(),
    })
}

/// Builds an identifier from `alias.column` text, splitting on the first dot.
pub fn qualified(column: &str) -> Expr {
    match column.split_once('.') {
        Some((qualifier, name)) => Expr::Identifier(Ident {
            qualifier: Some(qualifier.to_string()),
            name: name.to_string(),
        }),
        None => ident(column),
    }
}

pub fn value(val: Value) -> Expr {
    Expr::Value(val)
}
