//! Errors raised while loading or validating settings.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required file such as `config/default.toml` is absent
    #[error("Configuration file not found: {0}")]
    MissingFile(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// A setting holds a value the ledger cannot run with
    #[error("Invalid {field}: {message}")]
    Invalid { field: String, message: String },

    /// `LEDGER_APP_ENV` names no known environment
    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    /// Two sources were given that cannot be combined
    #[error("Conflicting configuration sources: {0}")]
    ConflictingSources(String),

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn missing_file(path: impl Into<String>) -> Self {
        ConfigError::MissingFile(path.into())
    }

    pub fn conflicting_sources(message: impl Into<String>) -> Self {
        ConfigError::ConflictingSources(message.into())
    }

    /// Dotted setting name the error refers to, e.g. `listener.reconcile_cron`
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigError::Invalid { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_carries_key() {
        let error = ConfigError::invalid("database.url", "Database URL is required");
        assert_eq!(error.key(), Some("database.url"));
        assert_eq!(
            error.to_string(),
            "Invalid database.url: Database URL is required"
        );
    }

    #[test]
    fn test_other_variants_have_no_key() {
        assert!(ConfigError::missing_file("config/default.toml").key().is_none());
        assert!(ConfigError::conflicting_sources("dir and file").key().is_none());
    }
}
