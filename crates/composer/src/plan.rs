//! JSON-described queries, composed against a catalog.

use crate::{
    composer::QueryComposer,
    error::ComposeError,
    join::{JoinSpec, RegistryJoin},
    last_row::LastRow,
    source::SourceCatalog,
};
use planner::query::{ast::common::JoinKind, dialect::Dialect};
use serde::{Deserialize, Serialize};
use tracing::debug;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanJoin {
    /// A catalog source.
    Source(JoinSpec),
    /// Another plan compiled into a derived table. Its projected fields are
    /// visible to the outer query as `<alias>.<field>`.
    Subquery {
        plan: Box<ComposePlan>,
        clause: String,
        alias: String,
        #[serde(default)]
        kind: JoinKind,
        #[serde(default)]
        prefix: Option<String>,
        /// Only fields starting with this are re-exposed; default all.
        #[serde(default)]
        expose_prefix: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restriction {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposePlan {
    pub primary: String,
    #[serde(default)]
    pub joins: Vec<PlanJoin>,
    #[serde(default)]
    pub restrict: Vec<Restriction>,
    #[serde(default)]
    pub last_rows: Vec<LastRow>,
    #[serde(default)]
    pub only_fields: Vec<String>,
    #[serde(default = "default_true")]
    pub include_own_columns: bool,
    /// Raw conditions, AND-ed together.
    #[serde(default, rename = "where")]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl ComposePlan {
    pub fn from_json_str(json: &str) -> Result<Self, ComposeError> {
        serde_json::from_str(json)
            .map_err(|err| ComposeError::Config(format!("invalid compose plan: {err}")))
    }

    /// Replays the plan on a fresh composer and projects it.
    pub fn compose<'a>(
        &self,
        catalog: &'a SourceCatalog,
        dialect: &dyn Dialect,
    ) -> Result<QueryComposer<'a>, ComposeError> {
        let mut composer = QueryComposer::new(catalog, &self.primary)?;

        for join in &self.joins {
            match join {
                PlanJoin::Source(spec) => {
                    composer.join(spec.clone())?;
                }
                PlanJoin::Subquery {
                    plan,
                    clause,
                    alias,
                    kind,
                    prefix,
                    expose_prefix,
                } => {
                    let inner = plan.compose(catalog, dialect)?;
                    let sql = inner.to_subquery_sql(dialect)?;
                    let registry = inner.registry().expose_prefixed(expose_prefix);

                    let mut join = RegistryJoin::new(&sql, clause).kind(*kind).alias(alias);
                    if let Some(prefix) = prefix {
                        join = join.prefix(prefix);
                    }
                    composer.join_registry(&registry, join)?;
                }
            }
        }

        for restriction in &self.restrict {
            let fields: Vec<&str> = restriction.fields.iter().map(String::as_str).collect();
            composer.restrict_columns(restriction.source.as_deref(), &fields);
        }
        for last_row in &self.last_rows {
            composer.select_last_row(last_row)?;
        }
        for condition in &self.conditions {
            composer.where_raw(condition);
        }
        if let Some(limit) = self.limit {
            composer.limit(limit);
        }

        let only_fields: Vec<&str> = self.only_fields.iter().map(String::as_str).collect();
        composer.project(&only_fields, self.include_own_columns)?;
        debug!("Composed plan on `{}`", self.primary);
        Ok(composer)
    }
}

#[cfg(test)]
mod tests {
    use super::ComposePlan;
    use crate::{
        error::ComposeError,
        source::{SourceCatalog, SourceDef},
    };
    use planner::query::dialect::MySql;

    fn catalog() -> SourceCatalog {
        [
            SourceDef::new("Order", "orders")
                .primary_key("order_id")
                .columns(&["status"])
                .audit_fields("", "", "")
                .build(),
            SourceDef::new("Customer", "customers")
                .primary_key("customer_id")
                .columns(&["order_id", "email"])
                .audit_fields("", "", "")
                .build(),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_compose_from_json() {
        let plan = ComposePlan::from_json_str(
            r#"{
                "primary": "Order",
                "joins": [
                    {"type": "source", "source": "Customer", "kind": "inner",
                     "clause": "customers.order_id = orders.order_id", "escape": false}
                ],
                "restrict": [{"source": "Customer", "fields": ["email"]}],
                "last_rows": [
                    {"select_field": "widget_date", "remote_table": "widgets",
                     "where_field": "widget_date", "aggregate": "MAX"}
                ],
                "where": ["orders.status <> 'void'"],
                "limit": 5
            }"#,
        )
        .unwrap();

        let catalog = catalog();
        let composer = plan.compose(&catalog, &MySql).unwrap();
        let (sql, params) = composer.to_sql(&MySql);

        assert!(sql.starts_with(
            "SELECT `customers`.`email` AS `email`, `orders`.`order_id` AS `order_id`, \
             `orders`.`status` AS `status`, (SELECT widget_date FROM widgets"
        ));
        assert!(sql.contains(
            "FROM `orders` INNER JOIN customers ON customers.order_id = orders.order_id \
             WHERE orders.status <> 'void' LIMIT ?"
        ));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_subquery_join() {
        let plan = ComposePlan::from_json_str(
            r#"{
                "primary": "Order",
                "include_own_columns": false,
                "joins": [{
                    "type": "subquery",
                    "alias": "c",
                    "prefix": "c_",
                    "clause": "c.order_id = orders.order_id",
                    "plan": {"primary": "Customer", "only_fields": ["customer_id", "email"]}
                }]
            }"#,
        )
        .unwrap();

        let catalog = catalog();
        let composer = plan.compose(&catalog, &MySql).unwrap();
        let (sql, _) = composer.to_sql(&MySql);

        assert_eq!(
            sql,
            "SELECT `c`.`customer_id` AS `c_customer_id`, `c`.`email` AS `c_email` \
             FROM `orders` LEFT JOIN (SELECT `customers`.`customer_id` AS `customer_id`, \
             `customers`.`email` AS `email` FROM `customers`) AS c \
             ON c.order_id = orders.order_id"
        );
    }

    #[test]
    fn test_unknown_primary() {
        let plan = ComposePlan::from_json_str(r#"{"primary": "Ghost"}"#).unwrap();
        let err = plan.compose(&catalog(), &MySql).unwrap_err();
        assert!(matches!(err, ComposeError::UnknownSource(_)));
    }
}
