//! econcal-sync entry point.

use std::process::ExitCode;

use clap::Parser;

use econcal_cli::cli::{Cli, Command, ConfigAction};
use econcal_cli::commands::sync::SyncOptions;
use econcal_cli::config::AppConfig;
use econcal_cli::error::{SyncError, SyncResult};
use econcal_core::{TracingConfig, TracingOutputFormat, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut tracing = if cli.debug {
        TracingConfig::debug()
    } else if cli.json_logs {
        TracingConfig::scheduled()
    } else {
        TracingConfig::default()
    };
    if cli.json_logs {
        tracing = tracing.with_format(TracingOutputFormat::Json);
    }
    if let Err(e) = init_tracing(tracing) {
        eprintln!("error: {}", SyncError::from(e));
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> SyncResult<()> {
    let mut config = match cli.config {
        Some(ref path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .map_err(SyncError::Config)?;
    config.apply_cli(&cli);

    match cli.command {
        Some(Command::Sources) => econcal_cli::commands::sources::list(),
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => econcal_cli::commands::config::dump(&config),
            ConfigAction::Validate => econcal_cli::commands::config::validate(&config),
            ConfigAction::Path => econcal_cli::commands::config::path(),
        },
        Some(Command::Sync) | None => {
            let options = SyncOptions {
                dry_run: cli.dry_run,
                replay: cli.replay,
            };
            econcal_cli::commands::sync::run(&config, &options).await
        }
    }
}
