//! Logger Module
//!
//! A logging system based on `tracing-subscriber` with support for:
//! - Console output with color control
//! - File output with multiple formats (Full, Compact, JSON)

pub mod config;
pub mod error;
pub(crate) mod writer;

pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing::Subscriber;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use writer::open_log_writer;

type BoxedSubscriber = Box<dyn Subscriber + Send + Sync + 'static>;

/// Initialize the global subscriber with the given configuration
pub fn init_logger(config: LoggerConfig) -> anyhow::Result<()> {
    config.validate()?;
    build_subscriber(&config)?.init();
    Ok(())
}

/// Assembles the subscriber for the enabled outputs without installing it.
fn build_subscriber(config: &LoggerConfig) -> anyhow::Result<BoxedSubscriber> {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    match (config.console.enabled, config.file.enabled) {
        (true, true) => both_subscriber(config, filter),
        (true, false) => Ok(console_subscriber(&config.console, filter)),
        (false, true) => file_subscriber(&config.file, filter),
        (false, false) => anyhow::bail!("At least one output (console or file) must be enabled"),
    }
}

fn console_ansi(config: &ConsoleConfig) -> bool {
    config.colored && std::io::stdout().is_terminal()
}

fn console_subscriber(config: &ConsoleConfig, filter: EnvFilter) -> BoxedSubscriber {
    Box::new(
        tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .with_ansi(console_ansi(config))
                .with_target(true)
                .with_level(true),
        ),
    )
}

fn file_subscriber(config: &FileConfig, filter: EnvFilter) -> anyhow::Result<BoxedSubscriber> {
    let writer = open_log_writer(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    Ok(match config.format {
        LogFormat::Full => Box::new(
            registry.with(fmt::layer().with_ansi(false).with_target(true).with_writer(writer)),
        ),
        LogFormat::Compact => Box::new(
            registry.with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .compact()
                    .with_writer(writer),
            ),
        ),
        LogFormat::Json => {
            Box::new(registry.with(fmt::layer().with_ansi(false).json().with_writer(writer)))
        }
    })
}

fn both_subscriber(config: &LoggerConfig, filter: EnvFilter) -> anyhow::Result<BoxedSubscriber> {
    let writer = open_log_writer(&config.file)?;
    let use_ansi = console_ansi(&config.console);

    // File layer goes first: the first layer's ANSI setting leaks into span
    // field formatting (tokio-rs/tracing#1817). The console layer is built per
    // arm because its subscriber type differs with the file format.
    Ok(match config.file.format {
        LogFormat::Full => {
            let file_layer = fmt::layer().with_ansi(false).with_target(true).with_writer(writer);
            let console_layer = fmt::layer().with_ansi(use_ansi).with_target(true).with_level(true);

            Box::new(
                tracing_subscriber::registry()
                    .with(filter)
                    .with(file_layer)
                    .with(console_layer),
            )
        }
        LogFormat::Compact => {
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .compact()
                .with_writer(writer);
            let console_layer = fmt::layer().with_ansi(use_ansi).with_target(true).with_level(true);

            Box::new(
                tracing_subscriber::registry()
                    .with(filter)
                    .with(file_layer)
                    .with(console_layer),
            )
        }
        LogFormat::Json => {
            let file_layer = fmt::layer().with_ansi(false).json().with_writer(writer);
            let console_layer = fmt::layer().with_ansi(use_ansi).with_target(true).with_level(true);

            Box::new(
                tracing_subscriber::registry()
                    .with(filter)
                    .with(file_layer)
                    .with(console_layer),
            )
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir, console: bool, format: LogFormat) -> LoggerConfig {
        LoggerConfig {
            console: ConsoleConfig {
                enabled: console,
                colored: false,
            },
            file: FileConfig {
                enabled: true,
                path: dir.path().join("ledger.log"),
                append: false,
                format,
            },
            level: "info".to_string(),
        }
    }

    fn log_through(config: &LoggerConfig, message: &str) -> String {
        let subscriber = build_subscriber(config).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(run_id = 7, "{}", message);
            tracing::debug!("filtered out");
        });
        std::fs::read_to_string(&config.file.path).unwrap()
    }

    #[test]
    fn test_console_and_file_for_every_format() {
        for format in [LogFormat::Full, LogFormat::Compact, LogFormat::Json] {
            let dir = TempDir::new().unwrap();
            let config = config(&dir, true, format);

            let content = log_through(&config, "run dispatched");
            assert!(content.contains("run dispatched"), "{:?}: {}", format, content);
            assert!(!content.contains("filtered out"));
            assert!(!content.contains('\u{1b}'));
        }
    }

    #[test]
    fn test_json_file_lines_parse() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, false, LogFormat::Json);

        let content = log_through(&config, "json line");
        let line: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(line["fields"]["message"], "json line");
        assert_eq!(line["fields"]["run_id"], 7);
    }

    #[test]
    fn test_no_output_enabled() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir, false, LogFormat::Full);
        config.file.enabled = false;
        assert!(build_subscriber(&config).is_err());
    }
}
