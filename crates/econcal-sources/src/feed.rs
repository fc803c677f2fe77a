//! Record feed transports.

use std::time::Duration;

use tracing::debug;

use econcal_core::DateRange;

use crate::error::{SourceError, SourceErrorCode, SourceResult};
use crate::raw_record::{RawRecord, records_from_str};
use crate::source::{BoxFuture, RecordFeed};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("econcal/", env!("CARGO_PKG_VERSION"));

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A feed backed by an HTTP endpoint returning a JSON array.
#[derive(Debug, Clone)]
pub struct JsonFeed {
    name: String,
    url: String,
    http_client: reqwest::Client,
    /// Credential sent as a request header (name, value).
    header: Option<(String, String)>,
    /// Query parameter names for the range bounds (from, to).
    range_params: Option<(String, String)>,
}

impl JsonFeed {
    /// Creates a feed for `url`.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built (e.g. no TLS backend).
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> SourceResult<Self> {
        let name = name.into();
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                SourceError::network(format!("failed to create HTTP client: {}", e))
                    .with_source_name(&name)
                    .with_cause(e)
            })?;

        Ok(Self {
            name,
            url: url.into(),
            http_client,
            header: None,
            range_params: None,
        })
    }

    /// Builder method to send a credential header on every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header = Some((name.into(), value.into()));
        self
    }

    /// Builder method to pass the range bounds as `YYYY-MM-DD` query parameters.
    pub fn with_range_query(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.range_params = Some((from.into(), to.into()));
        self
    }

    /// The endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn get(&self, range: &DateRange) -> SourceResult<Vec<RawRecord>> {
        let mut request = self.http_client.get(&self.url);

        if let Some((ref from, ref to)) = self.range_params {
            request = request.query(&[
                (from.as_str(), range.from().format("%Y-%m-%d").to_string()),
                (to.as_str(), range.to().format("%Y-%m-%d").to_string()),
            ]);
        }

        if let Some((ref name, ref value)) = self.header {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| {
            let err = if e.is_timeout() {
                SourceError::network("request timeout")
            } else if e.is_connect() {
                SourceError::network(format!("connection failed: {}", e))
            } else {
                SourceError::network(format!("request failed: {}", e))
            };
            err.with_cause(e)
        })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(SourceError::rate_limited(format!(
                "rate limit exceeded{}",
                retry_after
                    .map(|s| format!(", retry after {} seconds", s))
                    .unwrap_or_default()
            )));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(SourceError::authentication(format!(
                "upstream rejected the credential ({})",
                status
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::server(format!(
                "upstream error ({}): {}",
                status,
                body.trim()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::network(format!("failed to read response: {}", e)))?;

        let records = records_from_str(&body)?;
        debug!("fetched {} records from {}", records.len(), self.name);
        Ok(records)
    }
}

impl RecordFeed for JsonFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_records<'a>(
        &'a self,
        range: &'a DateRange,
    ) -> BoxFuture<'a, SourceResult<Vec<RawRecord>>> {
        Box::pin(async move {
            self.get(range)
                .await
                .map_err(|e| e.with_source_name(&self.name))
        })
    }
}

/// A feed serving fixed records, or a fixed failure.
///
/// Used for `--replay` runs and in tests.
#[derive(Debug, Clone)]
pub struct StaticFeed {
    name: String,
    outcome: Result<Vec<RawRecord>, (SourceErrorCode, String)>,
}

impl StaticFeed {
    /// Creates a feed that always returns `records`.
    pub fn new(name: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            name: name.into(),
            outcome: Ok(records),
        }
    }

    /// Creates a feed that always fails with the given code and message.
    pub fn failing(
        name: impl Into<String>,
        code: SourceErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            outcome: Err((code, message.into())),
        }
    }
}

impl RecordFeed for StaticFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_records<'a>(
        &'a self,
        _range: &'a DateRange,
    ) -> BoxFuture<'a, SourceResult<Vec<RawRecord>>> {
        let result = match self.outcome {
            Ok(ref records) => Ok(records.clone()),
            Err((code, ref message)) => {
                Err(SourceError::new(code, message.clone()).with_source_name(&self.name))
            }
        };
        Box::pin(async move { result })
    }
}
