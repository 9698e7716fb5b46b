//! Command executor for dispatching CLI commands
//!
//! Entry point for running a parsed command once configuration and logging
//! are in place.

use super::handlers::{LedgerCommandHandler, ListenCommandHandler, MigrateCommandHandler, RecordArgs};
use super::parser::{Cli, Commands};
use crate::config::Settings;
use crate::error::{AppError, AppResult};

/// Execute a CLI command with the given settings
///
/// Without a subcommand the listener is started.
///
/// # Errors
/// Returns errors from command handlers or validation failures
pub async fn execute_command(cli: Cli, settings: Settings) -> AppResult<()> {
    validate_command_args(&cli)?;

    match cli.command {
        Some(Commands::Listen { .. }) | None => ListenCommandHandler::new(settings).execute().await,
        Some(Commands::Migrate { dry_run, rollback }) => {
            MigrateCommandHandler::new(settings)
                .execute(dry_run, rollback)
                .await
        }
        Some(Commands::Record {
            status,
            fingerprint,
            solution,
            solution_file,
            started_at,
        }) => {
            LedgerCommandHandler::connect(&settings)
                .await?
                .record(RecordArgs {
                    status,
                    fingerprint,
                    solution,
                    solution_file,
                    started_at,
                })
                .await
        }
        Some(Commands::Remove { id }) => LedgerCommandHandler::connect(&settings).await?.remove(id).await,
        Some(Commands::Trigger) => LedgerCommandHandler::connect(&settings).await?.trigger().await,
        Some(Commands::Runs { limit }) => LedgerCommandHandler::connect(&settings).await?.runs(limit).await,
        Some(Commands::Events { run, unmapped }) => {
            LedgerCommandHandler::connect(&settings)
                .await?
                .events(run, unmapped)
                .await
        }
    }
}

/// Validate command arguments before any connection is opened
fn validate_command_args(cli: &Cli) -> AppResult<()> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })?;

    if let Some(Commands::Migrate {
        rollback: Some(steps),
        ..
    }) = cli.command
    {
        if steps > 50 {
            tracing::warn!(
                steps,
                "Rolling back this many migrations is a large operation"
            );
        }
    }

    Ok(())
}
