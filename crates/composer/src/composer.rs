use crate::{
    error::ComposeError,
    join::{JoinSpec, RegistryJoin, non_blank},
    last_row::LastRow,
    projection::Projection,
    registry::{ColumnSet, Registry},
    source::{Source, SourceCatalog},
};
use connectors::sql::base::adapter::SqlAdapter;
use model::{core::value::Value, records::row::RowData};
use planner::{
    query::{
        ast::{
            common::OrderDir,
            expr::Expr,
            select::{JoinClause, JoinTarget, Select},
        },
        builder::select::SelectBuilder,
        dialect::Dialect,
        qualified,
        renderer::render,
        value,
    },
    table_ref,
};
use std::collections::HashMap;
use tracing::debug;

/// Builds one SELECT over a primary source, tracking which output field
/// every joined column lands in.
///
/// A composer is used for a single query; start a new one for the next.
#[derive(Debug, Clone)]
pub struct QueryComposer<'a> {
    catalog: &'a SourceCatalog,
    primary: &'a Source,
    registry: Registry,
    joins: Vec<JoinClause>,
    projection: Option<Projection>,
    raw_selects: Vec<Expr>,
    conditions: Vec<Expr>,
    order_by: Vec<(Expr, Option<OrderDir>)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl<'a> QueryComposer<'a> {
    pub fn new(catalog: &'a SourceCatalog, primary: &str) -> Result<Self, ComposeError> {
        let primary = catalog.get(primary)?;
        Ok(QueryComposer {
            catalog,
            primary,
            registry: Registry::new(),
            joins: Vec::new(),
            projection: None,
            raw_selects: Vec::new(),
            conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        })
    }

    pub fn primary(&self) -> &Source {
        self.primary
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn into_registry(self) -> Registry {
        self.registry
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    /// Joins a catalog source and registers all of its columns as
    /// `<alias>.<col> -> <prefix><col>`.
    pub fn join(&mut self, spec: JoinSpec) -> Result<&mut Self, ComposeError> {
        let target = self.catalog.get(&spec.source)?;

        let clause = match non_blank(Some(spec.clause.as_str())) {
            Some(clause) => clause.to_string(),
            None => {
                let pk = self.primary.require_primary_key()?;
                format!("{}.{pk} = {}.{pk}", self.primary.table(), target.table())
            }
        };

        let alias = non_blank(spec.alias.as_deref());
        let (join_target, escape) = match non_blank(spec.derived_sql.as_deref()) {
            Some(sql) => (
                JoinTarget::derived(sql, alias.unwrap_or(target.table())),
                false,
            ),
            None => (
                JoinTarget::Table {
                    table: table_ref!(target.table()),
                    alias: alias.filter(|a| *a != target.table()).map(String::from),
                },
                spec.escape.unwrap_or(true),
            ),
        };

        let prefix = spec.prefix.as_deref().unwrap_or_default();
        let set = ColumnSet::for_columns(join_target.alias(), &target.columns(true), prefix);
        let id = self.registry.register(target.name(), set)?;
        debug!("Joined `{}` as `{}` ON {}", id, join_target.alias(), clause);

        self.joins.push(JoinClause {
            kind: spec.kind,
            target: join_target,
            on: Expr::Literal(clause),
            escape,
        });
        Ok(self)
    }

    /// Joins a table or SQL text and merges a registry built for it. With an
    /// alias every column of `foreign` is requalified with that alias. Text
    /// containing whitespace is never escaped; with an alias it becomes a
    /// derived table, without one it is joined as written.
    pub fn join_registry(
        &mut self,
        foreign: &Registry,
        join: RegistryJoin,
    ) -> Result<&mut Self, ComposeError> {
        let clause = non_blank(Some(join.clause.as_str()))
            .ok_or_else(|| {
                ComposeError::Config(format!(
                    "join against `{}` needs an explicit clause",
                    join.table_or_sql.trim()
                ))
            })?
            .to_string();

        let table_or_sql = join.table_or_sql.trim();
        let alias = non_blank(join.alias.as_deref());
        let is_sql = table_or_sql.contains(char::is_whitespace);

        let (target, escape) = match (is_sql, alias) {
            (true, Some(alias)) => (JoinTarget::derived(table_or_sql, alias), false),
            // inline forms such as `bar b` go out verbatim
            (true, None) => (
                JoinTarget::Table {
                    table: table_ref!(table_or_sql),
                    alias: None,
                },
                false,
            ),
            (false, alias) => (
                JoinTarget::Table {
                    table: table_ref!(table_or_sql),
                    alias: alias.map(String::from),
                },
                join.escape.unwrap_or(true),
            ),
        };

        let mapping: HashMap<String, String> = match alias {
            Some(alias) => foreign
                .aliases()
                .into_iter()
                .map(|old| (old, alias.to_string()))
                .collect(),
            None => HashMap::new(),
        };
        let ids = self
            .registry
            .merge(foreign.remap(&mapping, join.prefix.as_deref()))?;
        debug!("Joined {} ON {}, merged sets {:?}", target.alias(), clause, ids);

        self.joins.push(JoinClause {
            kind: join.kind,
            target,
            on: Expr::Literal(clause),
            escape,
        });
        Ok(self)
    }

    /// Registers the primary source's own columns under its identifier.
    pub fn add_own_columns(
        &mut self,
        alias: Option<&str>,
        prefix: Option<&str>,
    ) -> Result<&mut Self, ComposeError> {
        let alias = non_blank(alias).unwrap_or(self.primary.table());
        let set = ColumnSet::for_columns(
            alias,
            &self.primary.columns(true),
            prefix.unwrap_or_default(),
        );
        self.registry.register(self.primary.name(), set)?;
        Ok(self)
    }

    /// See [`Registry::filter`].
    pub fn restrict_columns(&mut self, source: Option<&str>, fields: &[&str]) -> &mut Self {
        self.registry.filter(source, fields);
        self
    }

    /// Flattens the registry into the select list, replacing any previous
    /// projection. Later registrations win on output-field collisions.
    pub fn project(
        &mut self,
        only_fields: &[&str],
        include_own_columns: bool,
    ) -> Result<Projection, ComposeError> {
        if include_own_columns {
            self.add_own_columns(None, None)?;
        }
        if !only_fields.is_empty() {
            self.registry.filter(None, only_fields);
        }

        let projection = Projection::from_registry(&self.registry);
        debug!("Projected {} columns", projection.len());
        self.projection = Some(projection.clone());
        Ok(projection)
    }

    /// Appends `(<last row select>) AS <alias>` to the select list.
    pub fn select_last_row(&mut self, last_row: &LastRow) -> Result<&mut Self, ComposeError> {
        let sql = last_row.to_select_sql(self.primary)?;
        self.raw_selects.push(Expr::Literal(sql));
        Ok(self)
    }

    /// Appends caller-trusted select text, never escaped.
    pub fn select_raw(&mut self, sql: &str) -> &mut Self {
        self.raw_selects.push(Expr::Literal(sql.to_string()));
        self
    }

    pub fn where_eq(&mut self, column: &str, val: Value) -> &mut Self {
        self.conditions.push(Expr::eq(qualified(column), value(val)));
        self
    }

    pub fn where_in(&mut self, column: &str, values: Vec<Value>) -> &mut Self {
        self.conditions.push(Expr::InList {
            expr: Box::new(qualified(column)),
            list: values.into_iter().map(value).collect(),
        });
        self
    }

    /// Adds caller-trusted condition text, never escaped.
    pub fn where_raw(&mut self, sql: &str) -> &mut Self {
        self.conditions.push(Expr::Literal(sql.to_string()));
        self
    }

    pub fn order_by(&mut self, column: &str, direction: Option<OrderDir>) -> &mut Self {
        self.order_by.push((qualified(column), direction));
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    pub fn build(&self) -> Select {
        let mut columns = self
            .projection
            .as_ref()
            .map(Projection::to_exprs)
            .unwrap_or_default();
        columns.extend(self.raw_selects.iter().cloned());

        let mut builder = SelectBuilder::new()
            .select(columns)
            .from(table_ref!(self.primary.table()), None);

        for join in &self.joins {
            builder = builder.join_clause(join.clone());
        }
        if let Some(condition) = Expr::and_all(self.conditions.iter().cloned()) {
            builder = builder.where_clause(condition);
        }
        for (expr, direction) in &self.order_by {
            builder = builder.order_by(expr.clone(), direction.clone());
        }
        if let Some(limit) = self.limit {
            builder = builder.limit(value(Value::Uint(limit)));
        }
        if let Some(offset) = self.offset {
            builder = builder.offset(value(Value::Uint(offset)));
        }

        builder.build()
    }

    pub fn to_sql(&self, dialect: &dyn Dialect) -> (String, Vec<Value>) {
        let (sql, params) = render(&self.build(), dialect);
        debug!("Composed SQL: {}", sql);
        (sql, params)
    }

    /// The query as self-contained text for use as a derived table. Fails
    /// when it carries bound parameters.
    pub fn to_subquery_sql(&self, dialect: &dyn Dialect) -> Result<String, ComposeError> {
        let (sql, params) = self.to_sql(dialect);
        if !params.is_empty() {
            return Err(ComposeError::Config(format!(
                "subquery on `{}` has {} bound parameters; use raw conditions instead",
                self.primary.name(),
                params.len()
            )));
        }
        Ok(sql)
    }

    /// Runs the query, tagging rows with the primary source's identifier.
    pub async fn fetch(&self, adapter: &dyn SqlAdapter) -> Result<Vec<RowData>, ComposeError> {
        let (sql, params) = self.to_sql(adapter.dialect());
        let mut rows = adapter.query_rows(&sql, params).await?;
        for row in rows.iter_mut() {
            row.entity = self.primary.name().to_string();
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::QueryComposer;
    use crate::{
        error::ComposeError,
        join::{JoinSpec, RegistryJoin},
        last_row::LastRow,
        registry::Registry,
        source::{SourceCatalog, SourceDef},
        test_utils::RecordingAdapter,
    };
    use model::{
        core::value::{FieldValue, Value},
        records::row::RowData,
    };
    use planner::query::{
        ast::common::{JoinKind, OrderDir},
        dialect::MySql,
    };

    fn catalog() -> SourceCatalog {
        [
            SourceDef::new("Foo", "foo")
                .primary_key("id")
                .columns(&["name"])
                .audit_fields("", "", "")
                .build(),
            SourceDef::new("Bar", "bar")
                .primary_key("id")
                .columns(&["name", "x"])
                .audit_fields("", "", "")
                .build(),
            SourceDef::new("Log", "logs")
                .columns(&["message"])
                .audit_fields("", "", "")
                .build(),
            SourceDef::new("Order", "orders")
                .primary_key("order_id")
                .columns(&["status"])
                .audit_fields("", "", "")
                .build(),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_auto_clause_and_registration() {
        let catalog = catalog();
        let mut composer = QueryComposer::new(&catalog, "Foo").unwrap();
        composer
            .join(JoinSpec::new("Bar").kind(JoinKind::Inner))
            .unwrap();

        let set = composer.registry().get("Bar").unwrap();
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![("bar.id", "id"), ("bar.name", "name"), ("bar.x", "x")]
        );

        let (sql, _) = composer.to_sql(&MySql);
        assert_eq!(sql, "SELECT * FROM `foo` INNER JOIN `bar` ON foo.id = bar.id");
    }

    #[test]
    fn test_missing_primary_key_for_auto_clause() {
        let catalog = catalog();
        let mut composer = QueryComposer::new(&catalog, "Log").unwrap();
        let err = composer.join(JoinSpec::new("Bar")).unwrap_err();

        assert!(matches!(err, ComposeError::MissingPrimaryKey(name) if name == "Log"));
        assert!(composer.joins().is_empty());
        assert!(composer.registry().is_empty());
    }

    #[test]
    fn test_unknown_sources() {
        let catalog = catalog();
        assert!(matches!(
            QueryComposer::new(&catalog, "Nope"),
            Err(ComposeError::UnknownSource(_))
        ));

        let mut composer = QueryComposer::new(&catalog, "Foo").unwrap();
        let err = composer.join(JoinSpec::new("Ghost")).unwrap_err();
        assert!(matches!(err, ComposeError::UnknownSource(name) if name == "Ghost"));
    }

    #[test]
    fn test_derived_join_is_never_escaped() {
        let catalog = catalog();
        let mut composer = QueryComposer::new(&catalog, "Foo").unwrap();
        composer
            .join(
                JoinSpec::new("Bar")
                    .clause("foo.id = b.id")
                    .alias("b")
                    .derived_sql("SELECT * FROM bar WHERE x=1")
                    .escape(true),
            )
            .unwrap();

        let (sql, _) = composer.to_sql(&MySql);
        assert_eq!(
            sql,
            "SELECT * FROM `foo` LEFT JOIN (SELECT * FROM bar WHERE x=1) AS b ON foo.id = b.id"
        );
        assert_eq!(
            composer.registry().get("Bar").unwrap().get("b.x"),
            Some("x")
        );
    }

    #[test]
    fn test_aliased_unescaped_join_with_prefix() {
        let catalog = catalog();
        let mut composer = QueryComposer::new(&catalog, "Foo").unwrap();
        composer
            .join(
                JoinSpec::new("Bar")
                    .clause("b2.id = foo.id")
                    .alias("b2")
                    .prefix("bar_")
                    .escape(false),
            )
            .unwrap();

        let (sql, _) = composer.to_sql(&MySql);
        assert_eq!(sql, "SELECT * FROM `foo` LEFT JOIN bar AS b2 ON b2.id = foo.id");
        assert_eq!(
            composer.registry().get("Bar").unwrap().get("b2.name"),
            Some("bar_name")
        );
    }

    #[test]
    fn test_project_last_registered_wins() {
        let catalog = catalog();
        let mut composer = QueryComposer::new(&catalog, "Foo").unwrap();
        composer.add_own_columns(None, None).unwrap();
        composer
            .join(JoinSpec::new("Bar").clause("bar.id = foo.id"))
            .unwrap();

        let projection = composer.project(&[], false).unwrap();
        assert_eq!(projection.column_for("id"), Some("bar.id"));
        assert_eq!(projection.column_for("name"), Some("bar.name"));
        assert_eq!(projection.column_for("x"), Some("bar.x"));

        let (sql, _) = composer.to_sql(&MySql);
        assert_eq!(
            sql,
            "SELECT `bar`.`id` AS `id`, `bar`.`name` AS `name`, `bar`.`x` AS `x` \
             FROM `foo` LEFT JOIN `bar` ON bar.id = foo.id"
        );
    }

    #[test]
    fn test_project_includes_own_columns_last() {
        let catalog = catalog();
        let mut composer = QueryComposer::new(&catalog, "Foo").unwrap();
        composer
            .join(JoinSpec::new("Bar").clause("bar.id = foo.id"))
            .unwrap();

        let projection = composer.project(&["id", "x"], true).unwrap();
        assert_eq!(projection.column_for("id"), Some("foo.id"));
        assert_eq!(projection.column_for("x"), Some("bar.x"));
        assert_eq!(projection.column_for("name"), None);
    }

    #[test]
    fn test_project_twice_is_stable() {
        let catalog = catalog();
        let mut composer = QueryComposer::new(&catalog, "Foo").unwrap();
        composer.join(JoinSpec::new("Bar").prefix("bar_")).unwrap();

        let first = composer.project(&[], true).unwrap();
        let second = composer.project(&[], true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_restrict_columns_removes_a_source() {
        let catalog = catalog();
        let mut composer = QueryComposer::new(&catalog, "Foo").unwrap();
        composer.join(JoinSpec::new("Bar")).unwrap();
        composer.join(JoinSpec::new("Bar").alias("b2")).unwrap();
        composer.restrict_columns(Some("Bar"), &[]);

        let projection = composer.project(&[], true).unwrap();
        assert!(projection.columns().iter().all(|c| c.column.starts_with("foo.")));
        assert_eq!(composer.joins().len(), 2);
    }

    #[test]
    fn test_join_registry_with_subquery() {
        let catalog = catalog();
        let mut inner = QueryComposer::new(&catalog, "Bar").unwrap();
        inner
            .join(JoinSpec::new("Foo").clause("foo.id = bar.id"))
            .unwrap();
        inner.restrict_columns(Some("Foo"), &["name"]);
        inner.project(&[], true).unwrap();
        let inner_sql = inner.to_subquery_sql(&MySql).unwrap();
        let inner_registry = inner.registry().expose_prefixed("");

        let mut outer = QueryComposer::new(&catalog, "Order").unwrap();
        outer
            .join_registry(
                &inner_registry,
                RegistryJoin::new(&inner_sql, "sub.id = orders.order_id")
                    .alias("sub")
                    .prefix("sub_"),
            )
            .unwrap();
        let projection = outer.project(&[], false).unwrap();

        assert_eq!(projection.column_for("sub_id"), Some("sub.id"));
        assert_eq!(projection.column_for("sub_name"), Some("sub.name"));
        assert_eq!(projection.column_for("sub_x"), Some("sub.x"));

        let (sql, _) = outer.to_sql(&MySql);
        assert!(sql.contains(&format!("LEFT JOIN ({inner_sql}) AS sub ON sub.id = orders.order_id")));
    }

    #[test]
    fn test_join_registry_inline_alias_is_raw() {
        let catalog = catalog();
        let foreign: Registry = {
            let mut registry = Registry::default();
            registry
                .register("Bar", [("b.name", "bar_name")].into_iter().collect())
                .unwrap();
            registry
        };

        let mut composer = QueryComposer::new(&catalog, "Foo").unwrap();
        composer
            .join_registry(
                &foreign,
                RegistryJoin::new("bar b", "b.id = foo.id").escape(true),
            )
            .unwrap();

        let (sql, _) = composer.to_sql(&MySql);
        assert_eq!(sql, "SELECT * FROM `foo` LEFT JOIN bar b ON b.id = foo.id");
        assert_eq!(
            composer.registry().get("Bar").unwrap().get("b.name"),
            Some("bar_name")
        );
    }

    #[test]
    fn test_join_registry_requires_clause() {
        let catalog = catalog();
        let mut composer = QueryComposer::new(&catalog, "Foo").unwrap();
        let err = composer
            .join_registry(&Default::default(), RegistryJoin::new("bar", " "))
            .unwrap_err();
        assert!(matches!(err, ComposeError::Config(_)));
        assert!(composer.joins().is_empty());
    }

    #[test]
    fn test_derived_join_alias_defaults_to_table() {
        let catalog = catalog();
        let mut composer = QueryComposer::new(&catalog, "Foo").unwrap();
        composer
            .join(
                JoinSpec::new("Bar")
                    .clause("foo.id = bar.id")
                    .derived_sql("SELECT * FROM bar WHERE x=1"),
            )
            .unwrap();

        let (sql, _) = composer.to_sql(&MySql);
        assert_eq!(
            sql,
            "SELECT * FROM `foo` LEFT JOIN (SELECT * FROM bar WHERE x=1) AS bar ON foo.id = bar.id"
        );
        assert_eq!(
            composer.registry().get("Bar").unwrap().get("bar.x"),
            Some("x")
        );
    }

    #[test]
    fn test_select_last_row_on_orders() {
        let catalog = catalog();
        let mut composer = QueryComposer::new(&catalog, "Order").unwrap();
        composer
            .select_last_row(&LastRow::new("widget_date", "widgets", "widget_date"))
            .unwrap();

        let (sql, _) = composer.to_sql(&MySql);
        assert!(sql.contains("FROM widgets AS widgets_inner"));
        assert!(sql.contains("widgets_inner.order_id = orders.order_id"));
        assert!(sql.contains("widgets.order_id = orders.order_id AND widget_date IN ("));
        assert!(sql.starts_with("SELECT (SELECT widget_date FROM widgets"));
        assert!(sql.ends_with(") AS widget_date FROM `orders`"));
    }

    #[test]
    fn test_conditions_order_and_paging() {
        let catalog = catalog();
        let mut composer = QueryComposer::new(&catalog, "Order").unwrap();
        composer
            .where_eq("orders.status", Value::from("open"))
            .where_in("order_id", vec![Value::Int(1), Value::Int(2)])
            .where_raw("orders.order_id > 0")
            .order_by("orders.order_id", Some(OrderDir::Desc))
            .limit(10)
            .offset(20);

        let (sql, params) = composer.to_sql(&MySql);
        assert_eq!(
            sql,
            "SELECT * FROM `orders` WHERE (((`orders`.`status` = ?) AND `order_id` IN (?, ?)) \
             AND orders.order_id > 0) ORDER BY `orders`.`order_id` DESC LIMIT ? OFFSET ?"
        );
        assert_eq!(params.len(), 5);
        assert!(composer.to_subquery_sql(&MySql).is_err());
    }

    #[tokio::test]
    async fn test_fetch_tags_rows_with_primary() {
        let adapter = RecordingAdapter::new().with_rows(vec![RowData::new(
            "",
            vec![FieldValue::new("order_id", Value::Int(3))],
        )]);
        let catalog = catalog();
        let mut composer = QueryComposer::new(&catalog, "Order").unwrap();
        composer.project(&[], true).unwrap();

        let rows = composer.fetch(&adapter).await.unwrap();
        assert_eq!(rows[0].entity, "Order");
        assert_eq!(
            adapter.calls()[0].0,
            "SELECT `orders`.`order_id` AS `order_id`, `orders`.`status` AS `status` FROM `orders`"
        );
    }
}
