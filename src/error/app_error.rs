use crate::config::ConfigError;
use crate::error::DatabaseErrorConverter;
use crate::notify::NotifyError;
use thiserror::Error;

/// Application-wide error type for the ledger, its stores and the worker.
///
/// Constraint violations raised by PostgreSQL are converted into the
/// structured variants (`Duplicate`, `InvalidReference`, `StillReferenced`,
/// `Validation`) so callers can branch on them without string matching.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// Unique constraint violation; composite keys keep PostgreSQL's `a, b` form
    #[error("Duplicate entry: {entity}.({field}) = ({value}) already exists")]
    Duplicate {
        entity: String,
        field: String,
        value: String,
    },

    /// A row points at a parent that does not exist
    #[error("Invalid reference: {entity}.{field} = '{value}' does not match any {referenced}")]
    InvalidReference {
        entity: String,
        field: String,
        value: String,
        referenced: String,
    },

    /// A parent row cannot be removed while children still point at it
    #[error("{entity} with {field}={value} is still referenced from {referenced_by}")]
    StillReferenced {
        entity: String,
        field: String,
        value: String,
        referenced_by: String,
    },

    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Database operation error with operation context
    #[error("Database operation failed: {operation}")]
    Database {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// LISTEN/NOTIFY failure on a named channel
    #[error("Notification failure on channel '{channel}'")]
    Notification {
        channel: String,
        #[source]
        source: NotifyError,
    },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Connection pool error
    #[error("Connection pool error")]
    ConnectionPool {
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Wraps a pool checkout failure.
    pub fn connection_pool<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AppError::ConnectionPool {
            source: anyhow::Error::from(error),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, AppError::Duplicate { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound { .. })
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(error: diesel::result::Error) -> Self {
        DatabaseErrorConverter::convert_diesel_error(error, "database operation")
    }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for AppError {
    fn from(error: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
        AppError::connection_pool(error)
    }
}

impl From<NotifyError> for AppError {
    fn from(error: NotifyError) -> Self {
        AppError::Notification {
            channel: error.channel().unwrap_or("*").to_string(),
            source: error,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = error.key().unwrap_or("settings").to_string();
        AppError::Configuration {
            key,
            source: anyhow::Error::from(error),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
