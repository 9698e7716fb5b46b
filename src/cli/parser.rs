//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::models::RunStatus;

/// Timetable run ledger and change notifier
#[derive(Parser, Debug)]
#[command(name = "timetable-ledger")]
#[command(about = "Timetable run ledger with Postgres change notifications")]
#[command(long_about = "
timetable-ledger records timetable runs in PostgreSQL, announces every new
run on the `new_timetable_run` channel and maps solution events to external
calendar ids.

EXAMPLES:
    # Listen for new runs (default command)
    timetable-ledger listen

    # Record a manual run from a solution file
    timetable-ledger record --status MANUAL --fingerprint manual_2025_09 --solution-file solution.json

    # Ask listeners to process the latest successful or manual run
    timetable-ledger trigger

    # Show the ten newest runs
    timetable-ledger runs --limit 10

    # Apply pending migrations
    timetable-ledger migrate
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Load this single TOML file instead of the layered `config/` directory.
    /// The file must exist and be readable.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects which `config/{env}.toml` overlay is loaded.
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging
    ///
    /// Raises the log level to debug. Cannot be used with --quiet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    ///
    /// Lowers the log level to error. Cannot be used with --verbose.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Listen for new runs and dispatch them (default)
    ///
    /// Keeps a dedicated connection subscribed to `new_timetable_run` and
    /// `manual-ptm-misc-trigger`, reconnecting on failure, and scans for
    /// missed runs on the configured cron schedule.
    Listen {
        /// Dispatch every processable run already in the ledger on startup
        #[arg(long)]
        replay: bool,
    },
    /// Insert a run into the ledger
    ///
    /// Prints the new run id. Listeners are notified once the insert commits.
    ///
    /// Examples:
    ///   timetable-ledger record --status SUCCESS --fingerprint v42 --solution '[]'
    ///   timetable-ledger record --status MANUAL --fingerprint manual_01 --solution-file run.json
    Record {
        /// Run status: PENDING, RUNNING, SUCCESS, FAILED or MANUAL
        #[arg(long, value_parser = super::validation::validate_status)]
        status: RunStatus,

        /// Input version hash identifying the solver input
        #[arg(long, value_name = "HASH", value_parser = super::validation::validate_fingerprint)]
        fingerprint: String,

        /// Solution document as inline JSON
        #[arg(long, value_name = "JSON", conflicts_with = "solution_file", required_unless_present = "solution_file")]
        solution: Option<String>,

        /// Path to a file holding the solution document
        #[arg(long, value_name = "PATH")]
        solution_file: Option<PathBuf>,

        /// Start time (RFC 3339); defaults to the insertion time
        #[arg(long, value_name = "TIMESTAMP", value_parser = super::validation::validate_timestamp)]
        started_at: Option<jiff::Timestamp>,
    },
    /// Delete a run by id
    ///
    /// Prints the number of deleted rows (0 when the id does not exist).
    Remove {
        /// Run id
        #[arg(long, value_parser = super::validation::validate_run_id)]
        id: i32,
    },
    /// Publish LATEST on the manual trigger channel
    Trigger,
    /// List the newest runs
    Runs {
        /// Maximum number of runs to show
        #[arg(long, default_value_t = 20, value_parser = super::validation::validate_limit)]
        limit: i64,
    },
    /// List calendar event mappings
    Events {
        /// Only show mappings of this run
        #[arg(long, value_parser = super::validation::validate_run_id)]
        run: Option<i32>,

        /// Show solution events of the run that have no mapping yet
        #[arg(long, requires = "run")]
        unmapped: bool,
    },
    /// Database migration operations
    ///
    /// Examples:
    ///   timetable-ledger migrate                    # Apply all pending migrations
    ///   timetable-ledger migrate --dry-run          # Show pending migrations without applying
    ///   timetable-ledger migrate --rollback 1       # Revert the last migration
    Migrate {
        /// Show pending migrations without applying
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Number of migrations to rollback
        ///
        /// Must be between 1 and 100. Cannot be used with --dry-run.
        #[arg(long, value_name = "STEPS", conflicts_with = "dry_run", value_parser = super::validation::validate_rollback_steps)]
        rollback: Option<u32>,
    },
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

/// Log level options
#[derive(ValueEnum, Clone, Debug)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl Cli {
    /// Checks argument combinations clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        match &self.command {
            Some(Commands::Migrate {
                dry_run: true,
                rollback: Some(_),
            }) => Err("Cannot use --dry-run and --rollback together".to_string()),
            Some(Commands::Record {
                solution: None,
                solution_file: None,
                ..
            }) => Err("One of --solution or --solution-file is required".to_string()),
            Some(Commands::Record {
                solution: Some(_),
                solution_file: Some(_),
                ..
            }) => Err("Cannot use --solution and --solution-file together".to_string()),
            _ => Ok(()),
        }
    }

    /// Log level implied by the global flags, if any
    pub fn log_level(&self) -> Option<LogLevel> {
        if self.verbose {
            Some(LogLevel::Debug)
        } else if self.quiet {
            Some(LogLevel::Error)
        } else {
            None
        }
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => "error".to_string(),
            LogLevel::Warn => "warn".to_string(),
            LogLevel::Info => "info".to_string(),
            LogLevel::Debug => "debug".to_string(),
            LogLevel::Trace => "trace".to_string(),
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}
