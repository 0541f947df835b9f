use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("Failed to connect to the database: {0}")]
    ConnectionError(#[source] sqlx::Error),

    #[error("Query against '{table}' failed: {source}")]
    QueryError {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Unexpected schema in '{table}': {message}")]
    SchemaError { table: String, message: String },

    #[error("Failed to read '{}': {source}", path.display())]
    CsvError {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
