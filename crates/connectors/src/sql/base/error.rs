use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Any MySQL driver error.
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// The connection string could not be parsed.
    #[error("Invalid connection URL: {0}")]
    Url(#[from] mysql_async::UrlError),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
