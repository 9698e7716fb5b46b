use clap::Parser;

use timetable_ledger::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = cli::load_and_merge_config(&cli)?;
    cli::init_logger_from_settings(&settings)?;

    tracing::debug!(
        version = timetable_ledger::pkg_version(),
        application = %settings.application.name,
        "Configuration loaded"
    );

    cli::execute_command(cli, settings).await?;

    Ok(())
}
