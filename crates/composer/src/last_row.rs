//! "Last row in a group" scalar subqueries built from nested selects, for
//! servers without window functions.
//!
//! ```text
//! (SELECT <select> FROM <remote> [<joins> ]WHERE <remote>.<key> = <outer>.<key>
//!  AND <where> IN (SELECT MAX(<where>) FROM <remote> AS <remote>_inner
//!                  WHERE <remote>_inner.<key> = <outer>.<key>)) AS <alias>
//! ```
//!
//! Both tables should be indexed on the key and the compared field.

use crate::{error::ComposeError, source::Source};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aggregate {
    #[default]
    Max,
    Min,
}

impl Aggregate {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Aggregate::Max => "MAX",
            Aggregate::Min => "MIN",
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Aggregate {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MAX" => Ok(Aggregate::Max),
            "MIN" => Ok(Aggregate::Min),
            other => Err(ComposeError::Config(format!("unknown aggregate `{other}`"))),
        }
    }
}

/// A request for the value of `select_field` from the row of
/// `remote_table` whose `where_field` is extremal, per outer row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastRow {
    /// Column or expression to return, optionally `<expr> AS <alias>`.
    pub select_field: String,
    pub remote_table: String,
    pub where_field: String,
    #[serde(default)]
    pub aggregate: Aggregate,
    /// Raw join text placed after the remote table of the outer select.
    #[serde(default)]
    pub joins: String,
    /// Outer table; defaults to the primary source's table.
    #[serde(default)]
    pub table: Option<String>,
    /// Correlation key; defaults to the primary source's primary key.
    #[serde(default)]
    pub common_key: Option<String>,
}

impl LastRow {
    pub fn new(select_field: &str, remote_table: &str, where_field: &str) -> Self {
        LastRow {
            select_field: select_field.to_string(),
            remote_table: remote_table.to_string(),
            where_field: where_field.to_string(),
            aggregate: Aggregate::default(),
            joins: String::new(),
            table: None,
            common_key: None,
        }
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = aggregate;
        self
    }

    pub fn joins(mut self, joins: &str) -> Self {
        self.joins = joins.to_string();
        self
    }

    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn common_key(mut self, common_key: &str) -> Self {
        self.common_key = Some(common_key.to_string());
        self
    }

    /// Renders `(<outer>) AS <alias>`, resolving defaults against `primary`.
    pub fn to_select_sql(&self, primary: &Source) -> Result<String, ComposeError> {
        let table = self.table.as_deref().unwrap_or(primary.table());
        let common_key = match self.common_key.as_deref() {
            Some(key) => key,
            None => primary.require_primary_key()?,
        };

        let (select_field, alias) = split_alias(&self.select_field);
        validate_identifier(alias)?;

        let outer = outer_last_row_sql(
            select_field,
            &self.remote_table,
            &self.where_field,
            self.aggregate,
            &self.joins,
            table,
            common_key,
        )?;
        Ok(format!("({outer}) AS {alias}"))
    }
}

/// `SELECT <op>(<field>) FROM <remote> AS <remote>_inner WHERE <remote>_inner.<key> = <table>.<key>`
pub fn inner_last_row_sql(
    remote_table: &str,
    field: &str,
    aggregate: Aggregate,
    table: &str,
    common_key: &str,
) -> Result<String, ComposeError> {
    validate_identifier(remote_table)?;
    validate_identifier(table)?;
    validate_identifier(common_key)?;

    let inner_alias = format!("{remote_table}_inner");
    let field = requalify(field, remote_table, &inner_alias);
    Ok(format!(
        "SELECT {aggregate}({field}) FROM {remote_table} AS {inner_alias} \
         WHERE {inner_alias}.{common_key} = {table}.{common_key}"
    ))
}

/// `SELECT <select> FROM <remote> [<joins> ]WHERE <remote>.<key> = <table>.<key> AND <where> IN (<inner>)`
pub fn outer_last_row_sql(
    select_field: &str,
    remote_table: &str,
    where_field: &str,
    aggregate: Aggregate,
    joins: &str,
    table: &str,
    common_key: &str,
) -> Result<String, ComposeError> {
    let inner = inner_last_row_sql(remote_table, where_field, aggregate, table, common_key)?;
    let joins = joins.trim();
    let joins = if joins.is_empty() {
        String::new()
    } else {
        format!("{joins} ")
    };
    Ok(format!(
        "SELECT {select_field} FROM {remote_table} {joins}\
         WHERE {remote_table}.{common_key} = {table}.{common_key} \
         AND {where_field} IN ({inner})"
    ))
}

/// Plain identifiers only: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(ident: &str) -> Result<(), ComposeError> {
    let mut chars = ident.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(ComposeError::InvalidIdentifier(ident.to_string()))
    }
}

/// Splits `expr AS alias` (any case) on the first ` AS ` outside
/// parentheses, so `CAST(x AS CHAR)` keeps its inner cast. Without one the
/// alias is the text after the last `.`, else the whole field.
fn split_alias(select_field: &str) -> (&str, &str) {
    let field = select_field.trim();
    let bytes = field.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b' ' if depth == 0
                && bytes
                    .get(i..i + 4)
                    .is_some_and(|w| w.eq_ignore_ascii_case(b" as ")) =>
            {
                return (field[..i].trim(), field[i + 4..].trim());
            }
            _ => {}
        }
    }
    match field.rfind('.') {
        Some(pos) => (field, &field[pos + 1..]),
        None => (field, field),
    }
}

/// Replaces `<table>.` with `<alias>.` where `<table>` is not the tail of a
/// longer identifier.
fn requalify(field: &str, table: &str, alias: &str) -> String {
    let needle = format!("{table}.");
    let mut out = String::with_capacity(field.len());
    let mut rest = field;

    while let Some(pos) = rest.find(&needle) {
        let (before, after) = rest.split_at(pos);
        out.push_str(before);
        let boundary = out
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'));
        if boundary {
            out.push_str(alias);
            out.push('.');
        } else {
            out.push_str(&needle);
        }
        rest = &after[needle.len()..];
    }
    out.push_str(rest);
    out
}
