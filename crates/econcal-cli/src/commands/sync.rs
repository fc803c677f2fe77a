//! The sync command: fetch, normalize, reconcile.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::{debug, info, warn};

use econcal_calendar::{CalendarBackend, PresentationConfig, Reconciler, SyncReport};
use econcal_core::{DateRange, EconomicEvent};
use econcal_sources::{RawRecord, SourceRegistry, records_from_str};

use crate::config::AppConfig;
use crate::error::{SyncError, SyncResult};

/// Run-mode switches from the command line.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Print events instead of writing them.
    pub dry_run: bool,
    /// Saved upstream payload to use instead of fetching.
    pub replay: Option<PathBuf>,
}

/// Runs one sync.
pub async fn run(config: &AppConfig, options: &SyncOptions) -> SyncResult<()> {
    config.validate().map_err(SyncError::Config)?;

    // Credentials are checked before any network call.
    let target = if options.dry_run {
        None
    } else {
        Some(open_calendar(config)?)
    };

    let replay = options.replay.as_deref().map(load_replay).transpose()?;
    let today = window_start(Utc::now());
    let events = fetch_events(config, replay, today).await?;

    match target {
        None => print_events(&events),
        Some((backend, calendar_id)) => {
            let range = config.range(today).map_err(SyncError::Config)?;
            write_events(
                backend.as_ref(),
                &calendar_id,
                config.presentation(),
                &range,
                &events,
            )
            .await?;
            Ok(())
        }
    }
}

#[cfg(feature = "google")]
fn open_calendar(config: &AppConfig) -> SyncResult<(Box<dyn CalendarBackend>, String)> {
    use econcal_calendar::google::GoogleCalendarClient;

    let calendar_id = config.calendar_id().map_err(SyncError::Config)?.to_string();
    let key_json = config.service_account_json().map_err(SyncError::Config)?;
    let client = GoogleCalendarClient::from_key_json(&key_json, config.timeout())?;
    Ok((Box::new(client), calendar_id))
}

#[cfg(not(feature = "google"))]
fn open_calendar(_config: &AppConfig) -> SyncResult<(Box<dyn CalendarBackend>, String)> {
    Err(SyncError::Config(
        "built without the `google` feature; only --dry-run is available".to_string(),
    ))
}

/// First day of the sync window: the UTC date of `now`, matching the UTC
/// effective dates of timed events.
fn window_start<Tz: TimeZone>(now: DateTime<Tz>) -> NaiveDate {
    now.with_timezone(&Utc).date_naive()
}

fn load_replay(path: &Path) -> SyncResult<Vec<RawRecord>> {
    let body = std::fs::read_to_string(path)?;
    let records = records_from_str(&body)?;
    info!("replaying {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Fetches normalized events from the configured source.
///
/// # Errors
///
/// Fails on an unknown source name or when nothing matches the filters.
pub async fn fetch_events(
    config: &AppConfig,
    replay: Option<Vec<RawRecord>>,
    today: NaiveDate,
) -> SyncResult<Vec<EconomicEvent>> {
    let request = config.fetch_request(today).map_err(SyncError::Config)?;
    let context = config.source_context(replay);
    let registry = SourceRegistry::builtin(context);
    let source = registry.get(&config.sync.source)?;

    info!(
        "fetching from {} for {} (countries: {}, importance >= {})",
        source.name(),
        request.range,
        config.sync.countries.join(","),
        request.importance_min.level()
    );

    let events = source.fetch(&request).await;
    if events.is_empty() {
        return Err(SyncError::NoEvents {
            source_name: source.name().to_string(),
            range: request.range.to_string(),
        });
    }

    info!("{} events to sync", events.len());
    Ok(events)
}

/// Reconciles `events` into `calendar_id` and logs the summary.
///
/// # Errors
///
/// Fails if the existing entries cannot be listed, or with
/// [`SyncError::WriteFailures`] when any individual write failed.
pub async fn write_events(
    backend: &dyn CalendarBackend,
    calendar_id: &str,
    presentation: PresentationConfig,
    range: &DateRange,
    events: &[EconomicEvent],
) -> SyncResult<SyncReport> {
    let reconciler = Reconciler::new(backend, calendar_id, presentation);
    let mut index = reconciler.load_index(range).await?;
    debug!("{} managed entries already in {}", index.len(), range);

    let report = reconciler.reconcile(events, &mut index).await;
    info!(
        "sync finished: created={} updated={} failed={}",
        report.created, report.updated, report.failed
    );
    info!("entries for events no longer published upstream are not removed");

    if report.failed > 0 {
        warn!("{} of {} writes failed", report.failed, report.total());
        return Err(SyncError::WriteFailures {
            failed: report.failed,
            total: report.total(),
        });
    }
    Ok(report)
}

fn print_events(events: &[EconomicEvent]) -> SyncResult<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, events).map_err(std::io::Error::from)?;
    std::io::Write::write_all(&mut out, b"\n")?;
    Ok(())
}
