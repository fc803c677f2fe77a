//! Service-account authentication for Google APIs.
//!
//! A service account authenticates with the two-legged JWT bearer flow:
//!
//! 1. Sign a short-lived RS256 JWT with the account's private key
//! 2. POST it to the key's `token_uri`
//! 3. Use the returned access token as a bearer token until it expires
//!
//! Tokens are cached and refreshed one minute before expiry.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{CalendarError, CalendarResult};

/// Read/write access to calendars.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Token endpoint used when the key omits `token_uri`.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for signed assertions (the maximum Google accepts).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh margin before the access token expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// The fields of a service-account JSON key this client uses.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Account email, the JWT issuer.
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    /// Key id, sent as the JWT `kid` header.
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// OAuth token endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Parses the JSON key file contents.
    ///
    /// # Errors
    ///
    /// Fails if the JSON is malformed or a required field is blank.
    pub fn from_json(json: &str) -> CalendarResult<Self> {
        let key: Self = serde_json::from_str(json).map_err(|e| {
            CalendarError::Credential(format!("failed to parse service account key: {}", e))
        })?;
        if key.client_email.trim().is_empty() {
            return Err(CalendarError::Credential(
                "service account key has no client_email".into(),
            ));
        }
        if key.private_key.trim().is_empty() {
            return Err(CalendarError::Credential(
                "service account key has no private_key".into(),
            ));
        }
        Ok(key)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Signs the JWT assertion exchanged for an access token.
///
/// # Errors
///
/// Fails if the private key is not a valid RSA PEM key.
pub fn signed_assertion(
    key: &ServiceAccountKey,
    scope: &str,
    now: DateTime<Utc>,
) -> CalendarResult<String> {
    let claims = Claims {
        iss: key.client_email.clone(),
        scope: scope.to_string(),
        aud: key.token_uri.clone(),
        iat: now.timestamp(),
        exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| CalendarError::Credential(format!("invalid private key: {}", e)))?;

    jsonwebtoken::encode(&header, &claims, &encoding_key)
        .map_err(|e| CalendarError::Credential(format!("failed to sign assertion: {}", e)))
}

/// A cached access token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Bearer token value.
    pub value: String,
    /// When to stop using the token (already reduced by the refresh margin).
    pub refresh_at: DateTime<Utc>,
}

impl AccessToken {
    /// Creates a token valid for `expires_in_secs` from `now`.
    pub fn new(value: impl Into<String>, expires_in_secs: i64, now: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            refresh_at: now + chrono::Duration::seconds(expires_in_secs - EXPIRY_MARGIN_SECS),
        }
    }

    /// Returns true if the token should be refreshed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.refresh_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

/// Access token provider for one service account.
#[derive(Debug)]
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    scope: String,
    http_client: reqwest::Client,
    cached: Mutex<Option<AccessToken>>,
}

impl ServiceAccountAuth {
    /// Creates a provider for `key` with the calendar scope.
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
            key,
            scope: CALENDAR_SCOPE.to_string(),
            http_client,
            cached: Mutex::new(None),
        })
    }

    /// The service account email.
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Returns a valid access token, fetching a new one if needed.
    ///
    /// # Errors
    ///
    /// Fails if signing or the token exchange fails.
    pub async fn access_token(&self) -> CalendarResult<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(ref token) = *cached {
            if !token.is_expired(now) {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch_token(now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drops the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn fetch_token(&self, now: DateTime<Utc>) -> CalendarResult<AccessToken> {
        let assertion = signed_assertion(&self.key, &self.scope, now)?;

        let response = self
            .http_client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| CalendarError::Network(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarError::Authentication(format!(
                "token exchange rejected ({}): {}",
                status,
                body.trim()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CalendarError::Network(format!("failed to read token response: {}", e)))?;
        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            CalendarError::InvalidResponse(format!("failed to parse token response: {}", e))
        })?;

        debug!(
            "obtained access token for {} (expires in {}s)",
            self.key.client_email, token.expires_in
        );
        Ok(AccessToken::new(token.access_token, token.expires_in, now))
    }
}
