//! Configuration merger for CLI arguments and config files
//!
//! CLI arguments override file and environment configuration.

use std::path::Path;

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Settings};

/// Applies CLI overrides on top of the loaded configuration.
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Loads the base configuration honouring `--config` and `--env`.
    ///
    /// # Errors
    /// Returns ConfigError if configuration loading or validation fails
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;

        if let Some(path) = cli.config.as_deref() {
            Self::validate_config_file_access(path)?;
            loader = loader.with_file(path);
        }

        if let Some(env) = cli.env {
            loader = loader.with_environment(env.into());
        }

        tracing::debug!(environment = loader.environment().as_str(), "Loading configuration");
        Ok(Self::new(loader.load()?))
    }

    /// Validate that the configuration file is accessible and readable
    fn validate_config_file_access(path: &Path) -> Result<(), ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::Invalid {
                field: "config_file".to_string(),
                message: format!("Configuration path is not a readable file: '{}'", path.display()),
            });
        }

        std::fs::File::open(path)
            .map(|_| ())
            .map_err(|e| ConfigError::Invalid {
                field: "config_file".to_string(),
                message: format!("Cannot read configuration file '{}': {}", path.display(), e),
            })
    }

    /// Merge CLI arguments with the base configuration
    ///
    /// # Returns
    /// A new Settings instance with CLI overrides applied
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if let Some(level) = cli.log_level() {
            config.logger.level = level.into();
        }

        if let Some(Commands::Listen { replay: true }) = cli.command {
            config.listener.replay_on_start = true;
        }

        config.validate()?;

        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn create_valid_base_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/test".to_string();
        config
    }

    #[test]
    fn test_configuration_merger_new() {
        let base_config = Settings::default();
        let merger = ConfigurationMerger::new(base_config.clone());
        assert_eq!(merger.config(), &base_config);
    }

    #[test]
    fn test_merge_verbose_flag() {
        let merger = ConfigurationMerger::new(create_valid_base_config());
        let cli = Cli::try_parse_from(["timetable-ledger", "--verbose"]).unwrap();
        assert_eq!(merger.merge_cli_args(&cli).unwrap().logger.level, "debug");
    }

    #[test]
    fn test_merge_quiet_flag() {
        let merger = ConfigurationMerger::new(create_valid_base_config());
        let cli = Cli::try_parse_from(["timetable-ledger", "--quiet"]).unwrap();
        assert_eq!(merger.merge_cli_args(&cli).unwrap().logger.level, "error");
    }

    #[test]
    fn test_merge_keeps_file_level_without_flags() {
        let mut base = create_valid_base_config();
        base.logger.level = "warn".to_string();
        let merger = ConfigurationMerger::new(base);
        let cli = Cli::try_parse_from(["timetable-ledger", "runs"]).unwrap();
        assert_eq!(merger.merge_cli_args(&cli).unwrap().logger.level, "warn");
    }

    #[test]
    fn test_merge_listen_replay() {
        let merger = ConfigurationMerger::new(create_valid_base_config());
        let cli = Cli::try_parse_from(["timetable-ledger", "listen", "--replay"]).unwrap();
        assert!(merger.merge_cli_args(&cli).unwrap().listener.replay_on_start);
    }

    #[test]
    fn test_merge_rejects_invalid_base() {
        let merger = ConfigurationMerger::new(Settings::default());
        let cli = Cli::try_parse_from(["timetable-ledger"]).unwrap();
        assert!(merger.merge_cli_args(&cli).is_err());
    }
}
