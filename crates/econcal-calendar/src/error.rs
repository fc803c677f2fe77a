//! Error types for calendar backends.

use thiserror::Error;

/// Errors raised by a [`CalendarBackend`](crate::CalendarBackend).
#[derive(Debug, Error)]
pub enum CalendarError {
    /// The credential could not be parsed or used to sign a token request.
    #[error("invalid calendar credential: {0}")]
    Credential(String),

    /// The backend rejected the credential or access token.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The credential is valid but has no access to the calendar.
    #[error("access denied: {0}")]
    Authorization(String),

    /// The calendar or entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Too many requests.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The backend answered with an unexpected status.
    #[error("calendar API error ({status}): {body}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body, trimmed.
        body: String,
    },

    /// The response could not be parsed.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Connection failed or timed out.
    #[error("network error: {0}")]
    Network(String),
}

impl CalendarError {
    /// Returns true if a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::Network(_) => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// A specialized Result type for calendar operations.
pub type CalendarResult<T> = Result<T, CalendarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(CalendarError::Network("timeout".into()).is_transient());
        assert!(CalendarError::RateLimited("quota".into()).is_transient());
        assert!(
            CalendarError::Server {
                status: 503,
                body: String::new()
            }
            .is_transient()
        );
        assert!(
            !CalendarError::Server {
                status: 400,
                body: "bad colorId".into()
            }
            .is_transient()
        );
        assert!(!CalendarError::Authorization("no writer role".into()).is_transient());
    }

    #[test]
    fn display_includes_status() {
        let err = CalendarError::Server {
            status: 400,
            body: "Invalid colorId".into(),
        };
        assert_eq!(err.to_string(), "calendar API error (400): Invalid colorId");
    }
}
