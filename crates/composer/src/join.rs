use planner::query::ast::common::JoinKind;
use serde::{Deserialize, Serialize};

/// One join against a catalog source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// Catalog identifier of the joined source.
    pub source: String,
    /// Raw `ON` text. Blank means `<primary>.<pk> = <target>.<pk>`.
    #[serde(default)]
    pub clause: String,
    #[serde(default)]
    pub kind: JoinKind,
    #[serde(default)]
    pub alias: Option<String>,
    /// Prepended to every output field of the joined source.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Joins `(<sql>) AS <alias>` instead of the source's table.
    #[serde(default)]
    pub derived_sql: Option<String>,
    /// Quote the target table. Defaults to true; ignored for derived SQL.
    #[serde(default)]
    pub escape: Option<bool>,
}

impl JoinSpec {
    pub fn new(source: &str) -> Self {
        JoinSpec {
            source: source.to_string(),
            ..Default::default()
        }
    }

    pub fn clause(mut self, clause: &str) -> Self {
        self.clause = clause.to_string();
        self
    }

    pub fn kind(mut self, kind: JoinKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn derived_sql(mut self, sql: &str) -> Self {
        self.derived_sql = Some(sql.to_string());
        self
    }

    pub fn escape(mut self, escape: bool) -> Self {
        self.escape = Some(escape);
        self
    }
}

/// A join against a table or SQL text whose columns come from a registry
/// built elsewhere, typically by another composer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryJoin {
    pub table_or_sql: String,
    pub clause: String,
    pub kind: JoinKind,
    pub alias: Option<String>,
    pub prefix: Option<String>,
    pub escape: Option<bool>,
}

impl RegistryJoin {
    pub fn new(table_or_sql: &str, clause: &str) -> Self {
        RegistryJoin {
            table_or_sql: table_or_sql.to_string(),
            clause: clause.to_string(),
            ..Default::default()
        }
    }

    pub fn kind(mut self, kind: JoinKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn escape(mut self, escape: bool) -> Self {
        self.escape = Some(escape);
        self
    }
}

/// `Some` trimmed text, or `None` when absent or blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
