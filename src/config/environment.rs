//! Deployment environment, which picks the `config/{env}.toml` overlay.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Staging,
    Production,
}

impl Environment {
    /// Variable naming the active environment
    pub const ENV_VAR: &'static str = "LEDGER_APP_ENV";

    pub const ALL: [Environment; 4] = [
        Environment::Development,
        Environment::Test,
        Environment::Staging,
        Environment::Production,
    ];

    /// Reads `LEDGER_APP_ENV`; unset or unknown values mean development.
    pub fn from_env() -> Self {
        match std::env::var(Self::ENV_VAR) {
            Ok(value) => value.parse().unwrap_or_else(|error| {
                tracing::warn!(%error, "Falling back to the development environment");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Short names accepted besides [`Environment::as_str`]
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Environment::Development => &["dev"],
            Environment::Test => &[],
            Environment::Staging => &["stage"],
            Environment::Production => &["prod"],
        }
    }

    /// File name of the overlay inside the configuration directory
    pub fn overlay_file(&self) -> String {
        format!("{}.toml", self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|env| env.as_str() == wanted || env.aliases().contains(&wanted.as_str()))
            .ok_or_else(|| {
                ConfigError::UnknownEnvironment(format!(
                    "'{}' (expected development, test, staging or production)",
                    s
                ))
            })
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
