use composer::error::ComposeError;
use connectors::sql::base::error::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read the configuration file: {0}")]
    ConfigFileRead(#[from] std::io::Error),

    #[error("Failed to compose the query: {0}")]
    Compose(#[from] ComposeError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Unknown SQL dialect: {0}")]
    UnknownDialect(String),

    #[error("Invalid argument `{0}`: expected NAME=VALUE")]
    InvalidPair(String),
}
