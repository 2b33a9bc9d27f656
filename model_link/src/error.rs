//! Error types for model_link

use thiserror::Error;

/// Result type for model_link operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for model_link
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid relation kind: {0}")]
    InvalidRelationKind(String),

    #[error("Invalid relation: {0}")]
    InvalidRelation(String),

    #[error("Invalid sync mode: {0}")]
    InvalidSyncMode(String),

    #[error("Model definition error: {0}")]
    ModelDefinition(String),

    /// The database rejected the credentials or could not be reached.
    #[error("Authentication failed: {0}")]
    Authentication(#[source] sqlx::Error),

    /// Schema application failed after a successful authentication.
    #[error("Schema sync failed: {0}")]
    Sync(#[source] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert TOML deserialization errors to model_link errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::Config(error.to_string())
    }
}
