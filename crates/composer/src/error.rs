use connectors::sql::base::error::DbError;
use thiserror::Error;

/// Errors raised while composing or executing a query. Every variant
/// except `Db` is a caller configuration error.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Source `{0}` declares no primary key")]
    MissingPrimaryKey(String),

    #[error("Row of `{source_name}` has an empty primary key `{key}`")]
    MissingEntityKey { source_name: String, key: String },

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Schema lookup failed: {0}")]
    SchemaLookupFailure(String),

    /// Two different columns of one registration map to the same field.
    #[error("Output field `{field}` is mapped more than once in `{set}`")]
    DuplicateOutputField { set: String, field: String },

    #[error("Invalid identifier: `{0}`")]
    InvalidIdentifier(String),

    #[error("Refusing to sync `{0}` without key values scoping the delete")]
    UnscopedSync(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Db(#[from] DbError),
}
