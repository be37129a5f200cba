use crate::query::{ast::delete::Delete, renderer::Render};

impl Render for Delete {
    fn render(&self, r: &mut super::Renderer) {
        r.sql.push_str("DELETE FROM ");
        r.render_table_ref(&self.table);
        if let Some(where_clause) = &self.where_clause {
            r.sql.push_str(" WHERE ");
            where_clause.render(r);
        }
        r.sql.push(';');
    }
}

#[cfg(test)]
mod tests {
    use model::core::value::Value;

    use crate::{
        query::{ast::expr::Expr, builder::delete::DeleteBuilder, dialect::MySql, ident, renderer::render},
        table_ref,
    };

    #[test]
    fn test_render_scoped_delete() {
        let ast = DeleteBuilder::new(table_ref!("foos2bars"))
            .where_clause(
                Expr::and_all(vec![
                    Expr::eq(ident("foo_id"), Expr::Value(Value::Int(1))),
                    Expr::InList {
                        expr: Box::new(ident("bar_id")),
                        list: vec![Expr::Value(Value::Int(5)), Expr::Value(Value::Int(14))],
                    },
                ])
                .unwrap(),
            )
            .build();

        let (sql, params) = render(&ast, &MySql);
        assert_eq!(
            sql,
            "DELETE FROM `foos2bars` WHERE ((`foo_id` = ?) AND `bar_id` IN (?, ?));"
        );
        assert_eq!(params, vec![Value::Int(1), Value::Int(5), Value::Int(14)]);
    }
}
