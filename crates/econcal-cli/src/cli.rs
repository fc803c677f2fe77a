//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// econcal-sync - Economic calendar events in your Google Calendar
#[derive(Debug, Parser)]
#[command(name = "econcal-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "ECONCAL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log as JSON lines (for cron and CI runs)
    #[arg(long, global = true)]
    pub json_logs: bool,

    // --- Source selection ---
    /// Economic calendar source (see `econcal-sync sources`)
    #[arg(long, short, env = "EVENT_SOURCE")]
    pub source: Option<String>,

    /// Locale code to include, e.g. USD (can be repeated)
    #[arg(long = "country", action = clap::ArgAction::Append)]
    pub countries: Vec<String>,

    /// Minimum importance, 0 (holiday) to 3 (high)
    #[arg(long)]
    pub importance_min: Option<u8>,

    /// Lookahead window in weeks
    #[arg(long)]
    pub weeks: Option<u32>,

    /// FMP API key (supports env::, file:: and pass:: references)
    #[arg(long, env = "FMP_API_KEY", hide_env_values = true)]
    pub fmp_api_key: Option<String>,

    // --- Calendar ---
    /// Target calendar id
    #[arg(long, env = "GOOGLE_CALENDAR_ID")]
    pub calendar_id: Option<String>,

    /// Service account key JSON (supports env::, file:: and pass:: references)
    #[arg(long, env = "GOOGLE_SA_JSON", hide_env_values = true)]
    pub service_account: Option<String>,

    // --- Run modes ---
    /// Fetch and normalize only; print events as JSON to stdout
    #[arg(long)]
    pub dry_run: bool,

    /// Use a saved upstream JSON payload instead of fetching
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch events and upsert them into the calendar (default)
    Sync,

    /// List the registered event sources
    Sources,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump the effective configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::try_parse_from([
            "econcal-sync",
            "--source",
            "fmp",
            "--country",
            "USD",
            "--country",
            "EUR",
            "--importance-min",
            "3",
            "--weeks",
            "2",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.source.as_deref(), Some("fmp"));
        assert_eq!(cli.countries, vec!["USD", "EUR"]);
        assert_eq!(cli.importance_min, Some(3));
        assert_eq!(cli.weeks, Some(2));
        assert!(cli.dry_run);
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["econcal-sync", "config", "dump"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config {
                action: ConfigAction::Dump
            })
        ));

        let cli = Cli::try_parse_from(["econcal-sync", "sources", "--debug"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Sources)));
        assert!(cli.debug);
    }
}
