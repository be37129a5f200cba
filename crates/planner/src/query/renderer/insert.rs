use crate::query::{
    ast::insert::Insert,
    renderer::{Render, Renderer},
};

impl Render for Insert {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("INSERT INTO ");
        r.render_table_ref(&self.table);

        let columns = self
            .columns
            .iter()
            .map(|c| r.dialect.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        r.sql.push_str(&format!(" ({columns}) VALUES "));

        // one parenthesized tuple per row, params bound in row order
        for (i, row) in self.values.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            r.sql.push('(');
            for (j, val) in row.iter().enumerate() {
                if j > 0 {
                    r.sql.push_str(", ");
                }
                val.render(r);
            }
            r.sql.push(')');
        }
        r.sql.push(';');
    }
}
