use crate::registry::Registry;
use planner::query::{ast::expr::Expr, qualified};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedColumn {
    /// Qualified source column, e.g. `orders.order_id`.
    pub column: String,
    pub field: String,
}

/// The final select list: one entry per distinct output field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    columns: Vec<ProjectedColumn>,
}

impl Projection {
    /// Flattens `registry` in registration order. A field written again by
    /// a later set takes the later column and keeps its first position.
    pub fn from_registry(registry: &Registry) -> Self {
        let mut columns: Vec<ProjectedColumn> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (_, set) in registry.iter() {
            for (column, field) in set.iter() {
                match positions.get(field) {
                    Some(&pos) => columns[pos].column = column.to_string(),
                    None => {
                        positions.insert(field.to_string(), columns.len());
                        columns.push(ProjectedColumn {
                            column: column.to_string(),
                            field: field.to_string(),
                        });
                    }
                }
            }
        }

        Projection { columns }
    }

    pub fn columns(&self) -> &[ProjectedColumn] {
        &self.columns
    }

    pub fn column_for(&self, field: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.field == field)
            .map(|c| c.column.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// `<column> AS <field>` select expressions.
    pub fn to_exprs(&self) -> Vec<Expr> {
        self.columns
            .iter()
            .map(|c| Expr::Alias {
                expr: Box::new(qualified(&c.column)),
                alias: c.field.clone(),
            })
            .collect()
    }
}
