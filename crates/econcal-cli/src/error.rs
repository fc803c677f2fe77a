//! Sync run error types.

use thiserror::Error;

use econcal_calendar::CalendarError;
use econcal_core::TracingError;
use econcal_sources::SourceError;

/// Result type for sync runs.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that end a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Source selection or setup failed.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// The calendar could not be listed or the client could not be set up.
    #[error("calendar error: {0}")]
    Calendar(#[from] CalendarError),

    /// Nothing matched after fetching and filtering.
    #[error("no events from '{source_name}' matched the filters for {range}")]
    NoEvents {
        /// Selected source.
        source_name: String,
        /// Sync window.
        range: String,
    },

    /// Some entries could not be written.
    #[error("{failed} of {total} calendar writes failed")]
    WriteFailures {
        /// Failed writes.
        failed: usize,
        /// Events processed.
        total: usize,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging could not be initialized.
    #[error("logging setup failed: {0}")]
    Tracing(#[from] TracingError),
}

impl SyncError {
    /// Process exit code: 2 for an empty result, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NoEvents { .. } => 2,
            _ => 1,
        }
    }
}
