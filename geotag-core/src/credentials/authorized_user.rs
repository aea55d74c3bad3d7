//! Authorized-user credentials backed by a token file.
//!
//! The token file is the JSON document written after the user completed the
//! OAuth consent flow once: an access token, its expiry, and the refresh token
//! plus client identity needed to mint new access tokens without user
//! interaction.

use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::CredentialProvider;
use crate::error::{GeotagError, Result};

/// Google OAuth 2.0 token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are treated as expired.
const EXPIRY_SKEW: chrono::Duration = chrono::Duration::seconds(60);

/// Timeout for token refresh requests.
const REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

/// On-disk representation of authorized-user credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthorizedUserFile {
    /// Current access token
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Access token expiry (RFC 3339, UTC)
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for AuthorizedUserFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUserFile")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// Response from the OAuth token endpoint for a `refresh_token` grant.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct TokenState {
    access_token: Option<String>,
    expiry: Option<DateTime<Utc>>,
}

/// Credentials loaded from an authorized-user token file.
///
/// Refreshes are serialized: concurrent callers that all observe an expired
/// token trigger a single request to the token endpoint.
pub struct AuthorizedUserCredentials {
    file: AuthorizedUserFile,
    state: RwLock<TokenState>,
    refresh_lock: Mutex<()>,
    persist_path: Option<PathBuf>,
    client: Client,
}

impl AuthorizedUserCredentials {
    /// Build credentials from an already-parsed token file.
    pub fn new(file: AuthorizedUserFile) -> Result<Self> {
        let client = Client::builder()
            .timeout(REFRESH_TIMEOUT)
            .build()
            .map_err(|e| {
                GeotagError::CredentialError(format!("Failed to create HTTP client: {e}"))
            })?;

        let state = TokenState {
            access_token: file.token.clone(),
            expiry: file.expiry,
        };

        Ok(Self {
            file,
            state: RwLock::new(state),
            refresh_lock: Mutex::new(()),
            persist_path: None,
            client,
        })
    }

    /// Load credentials from a token file; refreshed tokens are written back
    /// to the same path.
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GeotagError::ConfigError(format!(
                    "Token file not found at {}. Complete the authorization flow first.",
                    path.display()
                ))
            } else {
                GeotagError::IoError(e)
            }
        })?;

        let mut creds = Self::from_json(&raw)?;
        creds.persist_path = Some(path.to_path_buf());
        debug!("Loaded authorized-user credentials");
        Ok(creds)
    }

    /// Parse credentials from token file JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: AuthorizedUserFile = serde_json::from_str(json)
            .map_err(|e| GeotagError::ConfigError(format!("Invalid token file: {e}")))?;
        Self::new(file)
    }

    /// Expiry of the current access token, if known.
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.read_state().expiry
    }

    fn read_state(&self) -> TokenState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn state_expired(state: &TokenState) -> bool {
        match (&state.access_token, state.expiry) {
            (None, _) => true,
            (Some(token), _) if token.is_empty() => true,
            (Some(_), Some(expiry)) => Utc::now() + EXPIRY_SKEW >= expiry,
            (Some(_), None) => false,
        }
    }

    async fn request_token(&self) -> Result<TokenState> {
        let refresh_token = self.file.refresh_token.as_deref().ok_or_else(|| {
            GeotagError::CredentialError(
                "Token expired and no refresh token is available; re-run authorization".into(),
            )
        })?;

        let start = Instant::now();
        let response = self
            .client
            .post(&self.file.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.file.client_id.as_str()),
                ("client_secret", self.file.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                GeotagError::CredentialError(format!("Token refresh request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Token endpoint rejected refresh");
            return Err(GeotagError::CredentialError(format!(
                "Token endpoint returned status: {status}"
            )));
        }

        let refreshed: RefreshResponse = response.json().await.map_err(|e| {
            GeotagError::CredentialError(format!("Failed to parse token response: {e}"))
        })?;

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            "Token refresh completed"
        );

        Ok(TokenState {
            access_token: Some(refreshed.access_token),
            expiry: refreshed
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        })
    }

    async fn persist(&self, state: &TokenState) {
        let Some(path) = &self.persist_path else {
            return;
        };

        let mut file = self.file.clone();
        file.token = state.access_token.clone();
        file.expiry = state.expiry;

        let json = match serde_json::to_string_pretty(&file) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize refreshed token");
                return;
            }
        };

        if let Err(e) = tokio::fs::write(path, json).await {
            warn!(error = %e, path = %path.display(), "Failed to persist refreshed token");
        }
    }
}

impl std::fmt::Debug for AuthorizedUserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUserCredentials")
            .field("file", &self.file)
            .field("persist_path", &self.persist_path)
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for AuthorizedUserCredentials {
    fn is_expired(&self) -> bool {
        Self::state_expired(&self.read_state())
    }

    #[instrument(level = "info", skip(self), fields(token_uri = %self.file.token_uri))]
    async fn refresh(&self) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;

        // Another task may have refreshed while we waited for the lock.
        if !self.is_expired() {
            debug!("Token already refreshed by a concurrent request");
            return Ok(());
        }

        let state = self.request_token().await?;
        {
            let mut current = self.state.write().unwrap_or_else(|e| e.into_inner());
            *current = state.clone();
        }
        self.persist(&state).await;

        info!(expiry = ?state.expiry, "Access token refreshed");
        Ok(())
    }

    fn token(&self) -> String {
        self.read_state().access_token.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token_json(token_uri: &str, expiry: &str) -> String {
        serde_json::json!({
            "token": "ya29.old",
            "refresh_token": "1//refresh",
            "token_uri": token_uri,
            "client_id": "client.apps.googleusercontent.com",
            "client_secret": "secret",
            "scopes": ["https://www.googleapis.com/auth/drive.readonly"],
            "expiry": expiry,
        })
        .to_string()
    }

    #[test]
    fn test_parses_python_style_expiry() {
        let json = token_json(DEFAULT_TOKEN_URI, "2024-07-08T12:00:00.123456Z");
        let creds = AuthorizedUserCredentials::from_json(&json).unwrap();
        assert!(creds.expiry().is_some());
        assert!(creds.is_expired(), "2024 token must be expired");
        assert_eq!(creds.token(), "ya29.old");
    }

    #[test]
    fn test_future_expiry_is_valid() {
        let expiry = (Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
        let creds =
            AuthorizedUserCredentials::from_json(&token_json(DEFAULT_TOKEN_URI, &expiry)).unwrap();
        assert!(!creds.is_expired());
    }

    #[test]
    fn test_expiry_within_skew_counts_as_expired() {
        let expiry = (Utc::now() + chrono::Duration::seconds(10)).to_rfc3339();
        let creds =
            AuthorizedUserCredentials::from_json(&token_json(DEFAULT_TOKEN_URI, &expiry)).unwrap();
        assert!(creds.is_expired());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let json = token_json(DEFAULT_TOKEN_URI, "2024-07-08T12:00:00Z");
        let creds = AuthorizedUserCredentials::from_json(&json).unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("ya29.old"));
        assert!(!debug.contains("1//refresh"));
        assert!(!debug.contains("\"secret\""));
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = AuthorizedUserCredentials::from_json("{not json").unwrap_err();
        assert!(matches!(err, GeotagError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AuthorizedUserCredentials::from_file(dir.path().join("token.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, GeotagError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_refresh_updates_token_and_persists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.new",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token.json");
        let json = token_json(&format!("{}/token", server.uri()), "2024-07-08T12:00:00Z");
        tokio::fs::write(&token_path, json).await.unwrap();

        let creds = AuthorizedUserCredentials::from_file(&token_path).await.unwrap();
        assert!(creds.is_expired());

        creds.refresh().await.unwrap();
        assert_eq!(creds.token(), "ya29.new");
        assert!(!creds.is_expired());

        let saved: AuthorizedUserFile =
            serde_json::from_str(&tokio::fs::read_to_string(&token_path).await.unwrap()).unwrap();
        assert_eq!(saved.token.as_deref(), Some("ya29.new"));
        assert_eq!(saved.refresh_token.as_deref(), Some("1//refresh"));
    }

    #[tokio::test]
    async fn test_refresh_rejected_by_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let json = token_json(&format!("{}/token", server.uri()), "2024-07-08T12:00:00Z");
        let creds = AuthorizedUserCredentials::from_json(&json).unwrap();

        let err = creds.refresh().await.unwrap_err();
        assert!(matches!(err, GeotagError::CredentialError(_)));
        assert_eq!(creds.token(), "ya29.old");
    }
}
