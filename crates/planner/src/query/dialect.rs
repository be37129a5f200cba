//! Defines the `Dialect` trait for database-specific SQL syntax.

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// quotation marks for the dialect.
    ///
    /// - PostgreSQL uses double quotes: `"my_column"`
    /// - MySQL uses backticks: `` `my_column` ``
    fn quote_identifier(&self, ident: &str) -> String;

    /// Returns the placeholder for a parameterized query.
    ///
    /// - PostgreSQL uses `$1`, `$2`, etc.
    /// - MySQL uses `?`
    fn get_placeholder(&self, index: usize) -> String;

    /// Returns the name of the dialect (e.g., "PostgreSQL", "MySQL").
    fn name(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', r#""""#))
    }

    fn get_placeholder(&self, index: usize) -> String {
        // PostgreSQL uses $1, $2, etc.
        format!("${}", index + 1)
    }

    fn name(&self) -> String {
        "PostgreSQL".into()
    }
}

#[derive(Debug, Clone)]
pub struct MySql;

impl Dialect for MySql {
    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn get_placeholder(&self, _index: usize) -> String {
        "?".into()
    }

    fn name(&self) -> String {
        "MySQL".into()
    }
}

/// Resolves a dialect by its common names ("mysql", "mariadb", "pg", ...).
pub fn by_name(name: &str) -> Option<Box<dyn Dialect>> {
    match name.to_lowercase().as_str() {
        "mysql" | "mariadb" => Some(Box::new(MySql)),
        "pg" | "postgres" | "postgresql" => Some(Box::new(Postgres)),
        _ => None,
    }
}
