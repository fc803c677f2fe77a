//! Sync configuration.
//!
//! Settings are layered: built-in defaults, then `config.toml`
//! (`~/.config/econcal/config.toml` unless `--config` is given), then
//! environment variables and command-line flags.
//!
//! Credential values (`calendar.service_account`, `sources.fmp.api_key`)
//! support secret references:
//! - `pass::path/in/store` - resolved via `pass show`
//! - `env::VAR_NAME` - resolved from the environment
//! - `file::/path/to/key.json` - file contents
//! - plain text - used as-is

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use econcal_calendar::PresentationConfig;
use econcal_calendar::presentation::{
    DEFAULT_DURATION_MINUTES, DEFAULT_REMINDER_MINUTES, DEFAULT_TIME_ZONE,
};
use econcal_core::{DateRange, Importance};
use econcal_sources::forexfactory::NEXT_WEEK_URL;
use econcal_sources::{DEFAULT_SOURCE, FetchRequest, RawRecord, SourceContext};

use crate::cli::Cli;

const REDACTED: &str = "<redacted>";

/// Longest accepted lookahead window.
pub const MAX_WEEKS: u32 = 520;

// ---------------------------------------------------------------------------
// AppConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for a sync run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// What to fetch.
    pub sync: SyncSettings,

    /// Where and how to write.
    pub calendar: CalendarSettings,

    /// Per-source settings.
    pub sources: SourcesSettings,

    /// Upstream HTTP settings.
    pub http: HttpSettings,
}

/// Event selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Registered source name.
    pub source: String,

    /// Locale codes to include.
    pub countries: Vec<String>,

    /// Minimum importance, 0 to 3.
    pub importance_min: u8,

    /// Lookahead window in weeks.
    pub weeks: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            countries: vec!["USD".to_string(), "JPY".to_string()],
            importance_min: Importance::MEDIUM.level(),
            weeks: 4,
        }
    }
}

/// Target calendar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Calendar id to write into.
    pub calendar_id: Option<String>,

    /// Service account key JSON or a secret reference to it.
    pub service_account: Option<String>,

    /// IANA timezone stamped on timed entries.
    pub time_zone: String,

    /// Length of timed entries.
    pub duration_minutes: u32,

    /// Popup reminders, minutes before start.
    pub reminder_minutes: Vec<u32>,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            calendar_id: None,
            service_account: None,
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            reminder_minutes: DEFAULT_REMINDER_MINUTES.to_vec(),
        }
    }
}

/// Source-specific settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesSettings {
    /// ForexFactory settings.
    pub forexfactory: ForexFactorySettings,

    /// FMP settings.
    pub fmp: FmpSettings,
}

/// ForexFactory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForexFactorySettings {
    /// Also fetch the supplementary export.
    pub supplementary: bool,

    /// Supplementary export URL.
    pub supplementary_url: String,
}

impl Default for ForexFactorySettings {
    fn default() -> Self {
        Self {
            supplementary: true,
            supplementary_url: NEXT_WEEK_URL.to_string(),
        }
    }
}

/// FMP settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FmpSettings {
    /// API key or a secret reference to it.
    pub api_key: Option<String>,
}

/// Upstream HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// User agent override.
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: econcal_sources::DEFAULT_TIMEOUT.as_secs(),
            user_agent: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the default path.
    ///
    /// A missing default file yields the built-in defaults.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("econcal")
    }

    /// Applies environment and command-line overrides.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(ref source) = cli.source {
            self.sync.source = source.clone();
        }
        if !cli.countries.is_empty() {
            self.sync.countries = cli.countries.clone();
        }
        if let Some(level) = cli.importance_min {
            self.sync.importance_min = level;
        }
        if let Some(weeks) = cli.weeks {
            self.sync.weeks = weeks;
        }
        if let Some(ref key) = cli.fmp_api_key {
            self.sources.fmp.api_key = Some(key.clone());
        }
        if let Some(ref id) = cli.calendar_id {
            self.calendar.calendar_id = Some(id.clone());
        }
        if let Some(ref sa) = cli.service_account {
            self.calendar.service_account = Some(sa.clone());
        }
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        let mut problems = Vec::new();

        if self.sync.source.trim().is_empty() {
            problems.push("sync.source must not be empty".to_string());
        }
        if Importance::new(self.sync.importance_min).is_none() {
            problems.push(format!(
                "sync.importance_min must be between {} and {}, got {}",
                Importance::HOLIDAY.level(),
                Importance::HIGH.level(),
                self.sync.importance_min
            ));
        }
        if self.sync.weeks == 0 || self.sync.weeks > MAX_WEEKS {
            problems.push(format!(
                "sync.weeks must be between 1 and {}, got {}",
                MAX_WEEKS, self.sync.weeks
            ));
        }
        if self.sync.countries.iter().all(|c| c.trim().is_empty()) {
            problems.push("sync.countries must name at least one locale".to_string());
        }
        if self.calendar.duration_minutes == 0 {
            problems.push("calendar.duration_minutes must be at least 1".to_string());
        }
        if self.http.timeout_secs == 0 {
            problems.push("http.timeout_secs must be at least 1".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }

    /// Per-request upstream timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// The sync window starting at `today`.
    pub fn range(&self, today: NaiveDate) -> Result<DateRange, String> {
        DateRange::lookahead(today, self.sync.weeks).ok_or_else(|| {
            format!(
                "sync.weeks {} from {} is past the last representable date",
                self.sync.weeks, today
            )
        })
    }

    /// Builds the fetch parameters for a run starting at `today`.
    pub fn fetch_request(&self, today: NaiveDate) -> Result<FetchRequest, String> {
        let importance = Importance::new(self.sync.importance_min).ok_or_else(|| {
            format!("invalid importance_min {}", self.sync.importance_min)
        })?;
        let countries = self
            .sync
            .countries
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty());
        Ok(FetchRequest::new(self.range(today)?, countries, importance))
    }

    /// Builds the fetcher context, resolving the FMP key reference.
    ///
    /// An FMP key that cannot be resolved is logged and left unset, so the
    /// FMP source comes back empty instead of failing the run.
    pub fn source_context(&self, replay: Option<Vec<RawRecord>>) -> SourceContext {
        let mut context = SourceContext {
            timeout: self.timeout(),
            ..SourceContext::default()
        };
        if let Some(ref agent) = self.http.user_agent {
            context.user_agent = agent.clone();
        }

        let supplementary = self
            .sources
            .forexfactory
            .supplementary
            .then(|| self.sources.forexfactory.supplementary_url.clone());
        context = context.with_forexfactory_supplementary(supplementary);

        // Resolved only when FMP is the selected source.
        if self.sync.source == econcal_sources::fmp::SOURCE_NAME {
            if let Some(ref raw) = self.sources.fmp.api_key {
                match crate::secret::resolve(raw) {
                    Ok(key) if !key.trim().is_empty() => {
                        context = context.with_fmp_api_key(key.trim());
                    }
                    Ok(_) => warn!("sources.fmp.api_key resolved to an empty value"),
                    Err(e) => warn!("failed to resolve sources.fmp.api_key: {}", e),
                }
            }
        }

        if let Some(records) = replay {
            context = context.with_replay(records);
        }

        context
    }

    /// Builds the entry presentation settings.
    pub fn presentation(&self) -> PresentationConfig {
        PresentationConfig::default()
            .with_time_zone(self.calendar.time_zone.clone())
            .with_duration_minutes(self.calendar.duration_minutes)
            .with_reminders(self.calendar.reminder_minutes.clone())
    }

    /// Returns the target calendar id.
    pub fn calendar_id(&self) -> Result<&str, String> {
        self.calendar
            .calendar_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                "calendar id not set; use --calendar-id, GOOGLE_CALENDAR_ID or \
                 calendar.calendar_id in config.toml"
                    .to_string()
            })
    }

    /// Resolves the service account key JSON.
    pub fn service_account_json(&self) -> Result<String, String> {
        let raw = self
            .calendar
            .service_account
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                format!(
                    "calendar credentials not found. Set GOOGLE_SA_JSON or add to {}:\n  \
                     [calendar]\n  \
                     service_account = \"file::/path/to/service-account.json\"",
                    Self::default_path().display()
                )
            })?;

        let json = crate::secret::resolve(raw)
            .map_err(|e| format!("failed to resolve calendar.service_account: {}", e))?;
        if !json.trim_start().starts_with('{') {
            return Err("calendar.service_account does not contain a JSON key".to_string());
        }
        Ok(json)
    }

    /// A copy safe to print: literal credentials are masked, references kept.
    pub fn redacted(&self) -> Self {
        fn mask(value: &Option<String>) -> Option<String> {
            value.as_ref().map(|v| {
                if crate::secret::is_reference(v) {
                    v.clone()
                } else {
                    REDACTED.to_string()
                }
            })
        }

        let mut copy = self.clone();
        copy.calendar.service_account = mask(&self.calendar.service_account);
        copy.sources.fmp.api_key = mask(&self.sources.fmp.api_key);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.sync.source, "forexfactory");
        assert_eq!(config.sync.countries, vec!["USD", "JPY"]);
        assert_eq!(config.sync.importance_min, 2);
        assert_eq!(config.sync.weeks, 4);
        assert_eq!(config.calendar.time_zone, "Asia/Tokyo");
        assert_eq!(config.calendar.duration_minutes, 30);
        assert_eq!(config.calendar.reminder_minutes, vec![40, 10]);
        assert_eq!(config.http.timeout_secs, 30);
        assert!(config.sources.forexfactory.supplementary);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml_content = r#"
[sync]
countries = ["EUR"]

[calendar]
calendar_id = "econ@group.calendar.google.com"
"#;
        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.sync.countries, vec!["EUR"]);
        assert_eq!(config.sync.weeks, 4);
        assert_eq!(config.calendar.time_zone, "Asia/Tokyo");
        assert_eq!(config.calendar_id().unwrap(), "econ@group.calendar.google.com");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[sync]\nsource = \"fmp\"\nweeks = 2\n\n[sources.fmp]\napi_key = \"env::X\"\n\n[http]\ntimeout_secs = 5"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.sync.source, "fmp");
        assert_eq!(config.sync.weeks, 2);
        assert_eq!(config.sources.fmp.api_key.as_deref(), Some("env::X"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sync]\nweeks = \"many\"").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(err.contains("failed to parse config"));
    }

    #[test]
    fn load_from_missing_file_errors() {
        let err = AppConfig::load_from(Path::new("/nonexistent/econcal.toml")).unwrap_err();
        assert!(err.contains("failed to read config"));
    }

    #[test]
    fn cli_overrides_file_values() {
        let mut config: AppConfig = toml::from_str("[sync]\nsource = \"fmp\"\nweeks = 8\n").unwrap();
        let cli = Cli::try_parse_from([
            "econcal-sync",
            "--source",
            "forexfactory",
            "--country",
            "GBP",
            "--importance-min",
            "3",
            "--calendar-id",
            "cli-cal",
        ])
        .unwrap();

        config.apply_cli(&cli);
        assert_eq!(config.sync.source, "forexfactory");
        assert_eq!(config.sync.countries, vec!["GBP"]);
        assert_eq!(config.sync.importance_min, 3);
        assert_eq!(config.sync.weeks, 8);
        assert_eq!(config.calendar_id().unwrap(), "cli-cal");
    }

    #[test]
    fn validate_collects_problems() {
        let mut config = AppConfig::default();
        config.sync.importance_min = 4;
        config.sync.weeks = 0;
        config.sync.countries = vec![" ".to_string()];

        let err = config.validate().unwrap_err();
        assert!(err.contains("importance_min"));
        assert!(err.contains("weeks"));
        assert!(err.contains("countries"));
    }

    #[test]
    fn fetch_request_uses_window_and_filters() {
        let mut config = AppConfig::default();
        config.sync.countries = vec!["usd".to_string(), "".to_string()];
        config.sync.weeks = 1;

        let request = config.fetch_request(date(2024, 6, 3)).unwrap();
        assert_eq!(request.range.from(), date(2024, 6, 3));
        assert_eq!(request.range.to(), date(2024, 6, 10));
        assert_eq!(request.countries.len(), 1);
        assert!(request.admits_locale("USD"));
        assert_eq!(request.importance_min, Importance::MEDIUM);
    }

    #[test]
    fn source_context_resolves_fmp_key_only_for_fmp() {
        unsafe {
            std::env::set_var("_ECONCAL_CFG_FMP_KEY", "resolved-key");
        }
        let mut config = AppConfig::default();
        config.sources.fmp.api_key = Some("env::_ECONCAL_CFG_FMP_KEY".to_string());

        let context = config.source_context(None);
        assert!(context.fmp_api_key.is_none());

        config.sync.source = "fmp".to_string();
        let context = config.source_context(None);
        assert_eq!(context.fmp_api_key.as_deref(), Some("resolved-key"));

        unsafe {
            std::env::remove_var("_ECONCAL_CFG_FMP_KEY");
        }
    }

    #[test]
    fn source_context_skips_unresolvable_fmp_key() {
        let mut config = AppConfig::default();
        config.sync.source = "fmp".to_string();
        config.sources.fmp.api_key = Some("env::_ECONCAL_CFG_UNSET_FMP_KEY".to_string());

        let context = config.source_context(None);
        assert!(context.fmp_api_key.is_none());
    }

    #[test]
    fn weeks_upper_bound() {
        let mut config = AppConfig::default();
        config.sync.weeks = MAX_WEEKS;
        assert!(config.validate().is_ok());
        assert!(config.range(NaiveDate::from_ymd_opt(2026, 2, 16).unwrap()).is_ok());

        config.sync.weeks = 100_000_000;
        assert!(config.validate().unwrap_err().contains("sync.weeks"));
        assert!(config.range(NaiveDate::from_ymd_opt(2026, 2, 16).unwrap()).is_err());
    }

    #[test]
    fn source_context_can_disable_supplementary_feed() {
        let mut config = AppConfig::default();
        let context = config.source_context(None);
        assert_eq!(context.forexfactory_supplementary_url.as_deref(), Some(NEXT_WEEK_URL));

        config.sources.forexfactory.supplementary = false;
        config.http.user_agent = Some("custom/1.0".to_string());
        let context = config.source_context(Some(Vec::new()));
        assert!(context.forexfactory_supplementary_url.is_none());
        assert_eq!(context.user_agent, "custom/1.0");
        assert!(context.replay.is_some());
    }

    #[test]
    fn presentation_follows_calendar_settings() {
        let mut config = AppConfig::default();
        config.calendar.time_zone = "Europe/London".to_string();
        config.calendar.reminder_minutes = vec![15];

        let presentation = config.presentation();
        assert_eq!(presentation.time_zone, "Europe/London");
        assert_eq!(presentation.reminder_minutes, vec![15]);
        assert_eq!(presentation.metadata_key, "econ_event_id");
    }

    #[test]
    fn missing_calendar_settings_error() {
        let config = AppConfig::default();
        assert!(config.calendar_id().is_err());
        assert!(
            config
                .service_account_json()
                .unwrap_err()
                .contains("credentials not found")
        );
    }

    #[test]
    fn service_account_must_be_json() {
        let mut config = AppConfig::default();
        config.calendar.service_account = Some("not-json".to_string());
        assert!(config.service_account_json().unwrap_err().contains("JSON key"));

        config.calendar.service_account = Some(r#"{"client_email":"a@b"}"#.to_string());
        assert!(config.service_account_json().is_ok());
    }

    #[test]
    fn redacted_masks_literals_only() {
        let mut config = AppConfig::default();
        config.calendar.service_account = Some(r#"{"private_key":"..."}"#.to_string());
        config.sources.fmp.api_key = Some("env::FMP_API_KEY".to_string());

        let shown = config.redacted();
        assert_eq!(shown.calendar.service_account.as_deref(), Some(REDACTED));
        assert_eq!(shown.sources.fmp.api_key.as_deref(), Some("env::FMP_API_KEY"));
    }
}
