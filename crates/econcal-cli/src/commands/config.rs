//! Configuration commands.

use crate::config::AppConfig;
use crate::error::{SyncError, SyncResult};

/// Dump the effective configuration to stdout, literal secrets masked.
pub fn dump(config: &AppConfig) -> SyncResult<()> {
    println!("# config.toml ({})", AppConfig::default_path().display());
    println!("{}", render(config)?);
    Ok(())
}

fn render(config: &AppConfig) -> SyncResult<String> {
    toml::to_string_pretty(&config.redacted())
        .map_err(|e| SyncError::Config(format!("failed to serialize config: {}", e)))
}

/// Validate the configuration, including credential references.
pub fn validate(config: &AppConfig) -> SyncResult<()> {
    config.validate().map_err(SyncError::Config)?;

    if config.calendar.service_account.is_some() {
        config
            .service_account_json()
            .map_err(|e| SyncError::Config(format!("invalid calendar credentials: {}", e)))?;
        println!("Calendar credentials resolve.");
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> SyncResult<()> {
    println!("config: {}", AppConfig::default_path().display());
    Ok(())
}
