use crate::query::{ast::update::Update, renderer::Render};

impl Render for Update {
    fn render(&self, r: &mut super::Renderer) {
        r.sql.push_str("UPDATE ");
        r.render_table_ref(&self.table);
        r.sql.push_str(" SET ");
        for (i, assignment) in self.assignments.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            r.sql
                .push_str(&r.dialect.quote_identifier(&assignment.column));
            r.sql.push_str(" = ");
            assignment.value.render(r);
        }
        if let Some(where_clause) = &self.where_clause {
            r.sql.push_str(" WHERE ");
            where_clause.render(r);
        }
        r.sql.push(';');
    }
}
