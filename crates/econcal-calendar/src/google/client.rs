//! Google Calendar API client.
//!
//! Implements [`CalendarBackend`] over the Calendar v3 REST API, authenticated
//! as a service account.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use econcal_core::BoxFuture;

use crate::backend::CalendarBackend;
use crate::entry::{EntryBody, EntryPage, ExistingEntry};
use crate::error::{CalendarError, CalendarResult};

use super::auth::{ServiceAccountAuth, ServiceAccountKey};

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Page size requested from the list endpoint (the API maximum).
const MAX_RESULTS: &str = "2500";

/// Google Calendar API client.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    auth: ServiceAccountAuth,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ListItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListItem {
    #[serde(flatten)]
    entry: ExistingEntry,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    id: String,
}

impl GoogleCalendarClient {
    /// Creates a client authenticated with `key`.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(key: ServiceAccountKey, timeout: Duration) -> CalendarResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CalendarError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            auth: ServiceAccountAuth::new(key, timeout)?,
            base_url: CALENDAR_API_BASE.to_string(),
        })
    }

    /// Creates a client from the JSON key file contents.
    ///
    /// # Errors
    ///
    /// Fails if the key cannot be parsed or the HTTP client cannot be built.
    pub fn from_key_json(json: &str, timeout: Duration) -> CalendarResult<Self> {
        Self::new(ServiceAccountKey::from_json(json)?, timeout)
    }

    /// Builder method to point the client at another API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        )
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> CalendarResult<String> {
        let token = self.auth.access_token().await?;

        let response = request.bearer_auth(token).send().await.map_err(|e| {
            if e.is_timeout() {
                CalendarError::Network("request timeout".into())
            } else if e.is_connect() {
                CalendarError::Network(format!("connection failed: {}", e))
            } else {
                CalendarError::Network(format!("request failed: {}", e))
            }
        })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CalendarError::RateLimited("rate limit exceeded".into()));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.auth.invalidate().await;
            return Err(CalendarError::Authentication(
                "access token expired or invalid".into(),
            ));
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            if body.contains("rateLimitExceeded") || body.contains("userRateLimitExceeded") {
                return Err(CalendarError::RateLimited(body.trim().to_string()));
            }
            return Err(CalendarError::Authorization(format!(
                "access denied to calendar for {}",
                self.auth.client_email()
            )));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CalendarError::NotFound("calendar or entry not found".into()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarError::Server {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| CalendarError::Network(format!("failed to read response: {}", e)))
    }

    async fn fetch_page(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> CalendarResult<EntryPage> {
        let mut request = self.http_client.get(self.events_url(calendar_id)).query(&[
            ("timeMin", time_min.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("timeMax", time_max.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("singleEvents", "true".to_string()),
            ("maxResults", MAX_RESULTS.to_string()),
        ]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let body = self.send(request).await?;
        let list: EventListResponse = serde_json::from_str(&body).map_err(|e| {
            CalendarError::InvalidResponse(format!("failed to parse response: {}", e))
        })?;

        let entries = list
            .items
            .into_iter()
            .filter(|item| item.status.as_deref() != Some("cancelled"))
            .map(|item| item.entry)
            .collect::<Vec<_>>();

        debug!("listed {} entries from {}", entries.len(), calendar_id);
        Ok(EntryPage {
            entries,
            next_page_token: list.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn insert_entry(&self, calendar_id: &str, body: &EntryBody) -> CalendarResult<String> {
        let request = self.http_client.post(self.events_url(calendar_id)).json(body);
        let response = self.send(request).await?;
        let created: InsertResponse = serde_json::from_str(&response).map_err(|e| {
            CalendarError::InvalidResponse(format!("failed to parse insert response: {}", e))
        })?;
        Ok(created.id)
    }

    async fn update_entry(
        &self,
        calendar_id: &str,
        entry_id: &str,
        body: &EntryBody,
    ) -> CalendarResult<()> {
        let url = format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(entry_id)
        );
        let request = self.http_client.put(url).json(body);
        if let Err(e) = self.send(request).await {
            if matches!(e, CalendarError::NotFound(_)) {
                warn!("entry {} vanished before update", entry_id);
            }
            return Err(e);
        }
        Ok(())
    }
}

impl CalendarBackend for GoogleCalendarClient {
    fn name(&self) -> &str {
        "google"
    }

    fn list_page<'a>(
        &'a self,
        calendar_id: &'a str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        page_token: Option<&'a str>,
    ) -> BoxFuture<'a, CalendarResult<EntryPage>> {
        Box::pin(self.fetch_page(calendar_id, time_min, time_max, page_token))
    }

    fn insert<'a>(
        &'a self,
        calendar_id: &'a str,
        body: &'a EntryBody,
    ) -> BoxFuture<'a, CalendarResult<String>> {
        Box::pin(self.insert_entry(calendar_id, body))
    }

    fn update<'a>(
        &'a self,
        calendar_id: &'a str,
        entry_id: &'a str,
        body: &'a EntryBody,
    ) -> BoxFuture<'a, CalendarResult<()>> {
        Box::pin(self.update_entry(calendar_id, entry_id, body))
    }
}
