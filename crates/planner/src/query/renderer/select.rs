use crate::query::{
    ast::{
        common::{JoinKind, OrderDir},
        select::{FromClause, JoinClause, JoinTarget, OrderByExpr, Select},
    },
    renderer::{Render, Renderer},
};

impl Render for Select {
    fn render(&self, r: &mut Renderer) {
        // 1. SELECT clause
        r.sql.push_str("SELECT ");
        if self.columns.is_empty() {
            r.sql.push('*');
        }
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            col.render(r);
        }

        // 2. FROM
        if let Some(from) = &self.from {
            r.sql.push(' ');
            from.render(r);
        }

        // 3. JOIN
        for join in &self.joins {
            r.sql.push(' ');
            join.render(r);
        }

        // 4. WHERE
        if let Some(where_clause) = &self.where_clause {
            r.sql.push_str(" WHERE ");
            where_clause.render(r);
        }

        // 5. ORDER BY
        if !self.order_by.is_empty() {
            r.sql.push_str(" ORDER BY ");
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    r.sql.push_str(", ");
                }
                order.render(r);
            }
        }

        // 6. LIMIT
        if let Some(limit) = &self.limit {
            r.sql.push_str(" LIMIT ");
            limit.render(r);
        }

        // 7. OFFSET
        if let Some(offset) = &self.offset {
            r.sql.push_str(" OFFSET ");
            offset.render(r);
        }
    }
}

impl Render for FromClause {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("FROM ");
        r.render_table_ref(&self.table);
        if let Some(alias) = &self.alias {
            r.sql.push_str(" AS ");
            r.sql.push_str(&r.dialect.quote_identifier(alias));
        }
    }
}

impl Render for JoinClause {
    fn render(&self, r: &mut Renderer) {
        let join_str = match self.kind {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        };
        r.sql.push_str(join_str);
        r.sql.push(' ');

        match &self.target {
            JoinTarget::Table { table, alias } => {
                if self.escape {
                    r.render_table_ref(table);
                } else {
                    if let Some(schema) = &table.schema {
                        r.sql.push_str(schema);
                        r.sql.push('.');
                    }
                    r.sql.push_str(&table.name);
                }
                if let Some(alias) = alias {
                    r.sql.push_str(" AS ");
                    if self.escape {
                        r.sql.push_str(&r.dialect.quote_identifier(alias));
                    } else {
                        r.sql.push_str(alias);
                    }
                }
            }
            // derived tables are caller-trusted SQL; escaping never applies
            JoinTarget::Derived { sql, alias } => {
                r.sql.push_str(sql);
                r.sql.push_str(" AS ");
                r.sql.push_str(alias);
            }
        }

        r.sql.push_str(" ON ");
        self.on.render(r);
    }
}

impl Render for OrderByExpr {
    fn render(&self, r: &mut Renderer) {
        self.expr.render(r);
        if let Some(dir) = &self.direction {
            let dir_str = match dir {
                OrderDir::Asc => "ASC",
                OrderDir::Desc => "DESC",
            };
            r.sql.push(' ');
            r.sql.push_str(dir_str);
        }
    }
}
