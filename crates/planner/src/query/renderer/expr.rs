use crate::query::{
    ast::expr::{BinaryOp, BinaryOperator, Expr, FunctionCall, Ident},
    renderer::{Render, Renderer},
};

impl Render for Expr {
    fn render(&self, r: &mut Renderer) {
        match self {
            Expr::Identifier(ident) => ident.render(r),
            Expr::Value(val) => r.add_param(val.clone()),
            Expr::BinaryOp(op) => op.render(r),
            Expr::FunctionCall(func) => func.render(r),
            Expr::Alias { expr, alias } => {
                expr.render(r);
                r.sql.push_str(" AS ");
                r.sql.push_str(&r.dialect.quote_identifier(alias));
            }
            Expr::InList { expr, list } => {
                expr.render(r);
                r.sql.push_str(" IN (");
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        r.sql.push_str(", ");
                    }
                    item.render(r);
                }
                r.sql.push(')');
            }
            Expr::Literal(sql) => r.sql.push_str(sql),
        }
    }
}

impl Render for Ident {
    fn render(&self, r: &mut Renderer) {
        if let Some(qualifier) = &self.qualifier {
            r.sql.push_str(&r.dialect.quote_identifier(qualifier));
            r.sql.push('.');
        }
        r.sql.push_str(&r.dialect.quote_identifier(&self.name));
    }
}

impl Render for BinaryOp {
    fn render(&self, r: &mut Renderer) {
        r.sql.push('(');
        self.left.render(r);

        let op_str = match self.op {
            BinaryOperator::Eq => " = ",
            BinaryOperator::NotEq => " <> ",
            BinaryOperator::Lt => " < ",
            BinaryOperator::LtEq => " <= ",
            BinaryOperator::Gt => " > ",
            BinaryOperator::GtEq => " >= ",
            BinaryOperator::And => " AND ",
            BinaryOperator::Or => " OR ",
        };
        r.sql.push_str(op_str);

        self.right.render(r);
        r.sql.push(')');
    }
}

impl Render for FunctionCall {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str(&self.name);
        r.sql.push('(');
        if self.wildcard {
            r.sql.push('*');
        } else {
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    r.sql.push_str(", ");
                }
                arg.render(r);
            }
        }
        r.sql.push(')');
    }
}

#[cfg(test)]
mod tests {
    use model::core::value::Value;

    use crate::query::{
        ast::expr::{Expr, FunctionCall},
        dialect::{MySql, Postgres},
        qualified,
        renderer::render,
    };

    #[test]
    fn test_in_list_binds_each_value() {
        let expr = Expr::InList {
            expr: Box::new(qualified("foos2bars.bar_id")),
            list: vec![Expr::Value(Value::Int(5)), Expr::Value(Value::Int(14))],
        };

        let (sql, params) = render(&expr, &Postgres);
        assert_eq!(sql, r#""foos2bars"."bar_id" IN ($1, $2)"#);
        assert_eq!(params, vec![Value::Int(5), Value::Int(14)]);
    }

    #[test]
    fn test_literal_is_verbatim() {
        let expr = Expr::Alias {
            expr: Box::new(Expr::FunctionCall(FunctionCall {
                name: "COUNT".to_string(),
                args: vec![],
                wildcard: true,
            })),
            alias: "total".to_string(),
        };
        let (sql, _) = render(&expr, &MySql);
        assert_eq!(sql, "COUNT(*) AS `total`");

        let (sql, params) = render(&Expr::Literal("(SELECT 1) AS one".to_string()), &MySql);
        assert_eq!(sql, "(SELECT 1) AS one");
        assert!(params.is_empty());
    }

    #[test]
    fn test_and_all_chains_left_deep() {
        let cond = Expr::and_all(vec![
            Expr::eq(qualified("foo_id"), Expr::Value(Value::Int(1))),
            Expr::eq(qualified("kind"), Expr::Value(Value::String("x".to_string()))),
        ])
        .unwrap();

        let (sql, _) = render(&cond, &MySql);
        assert_eq!(sql, "((`foo_id` = ?) AND (`kind` = ?))");
        assert!(Expr::and_all(Vec::new()).is_none());
    }
}
