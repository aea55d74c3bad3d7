//! reqwest-based Google Drive v3 client.
//!
//! ## Features
//!
//! - Token freshness check before every authenticated call
//! - Bounded retry with exponential backoff on transient listing and
//!   download errors; the thumbnail link lookup is a single attempt
//! - Chunked media download accumulated in memory
//! - Full observability with tracing instrumentation

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::query::THUMBNAIL_LINK_FIELDS;
use super::{DriveApi, FetchedLink, FileListPage, ListFilesRequest};
use crate::credentials::{ensure_fresh, CredentialProvider};
use crate::error::{GeotagError, Result};
use crate::model::DownloadedMedia;

/// Default Drive v3 API base URL.
pub const DEFAULT_DRIVE_API_URL: &str = "https://www.googleapis.com/drive/v3";

/// Default number of retries for transient errors.
const MAX_RETRIES: u32 = 3;

/// Initial retry interval.
const INITIAL_INTERVAL: Duration = Duration::from_millis(200);

/// Maximum retry interval.
const MAX_INTERVAL: Duration = Duration::from_secs(5);

/// Upper bound on the buffer reserved from a download's `Content-Length`.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// Configuration for the Drive HTTP client.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// API base URL.
    pub api_url: String,
    /// Per-request timeout; `None` leaves listing and downloads unbounded.
    pub timeout: Option<Duration>,
    /// Maximum retry attempts for transient errors (0 disables retry).
    pub max_retries: u32,
    /// Refuse plain-HTTP endpoints.
    pub https_only: bool,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_DRIVE_API_URL.to_string(),
            timeout: None,
            max_retries: MAX_RETRIES,
            https_only: true,
        }
    }
}

impl DriveConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional: `DRIVE_API_URL`, `DRIVE_TIMEOUT_SECS`, `DRIVE_MAX_RETRIES`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_url = std::env::var("DRIVE_API_URL").unwrap_or(defaults.api_url);

        let timeout = std::env::var("DRIVE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs);

        let max_retries = std::env::var("DRIVE_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_retries);

        Self {
            api_url,
            timeout,
            max_retries,
            https_only: defaults.https_only,
        }
    }
}

/// Error payload returned by Google APIs.
#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThumbnailLinkResponse {
    #[serde(default)]
    thumbnail_link: Option<String>,
}

/// Google Drive v3 client.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use geotag_core::credentials::AuthorizedUserCredentials;
/// use geotag_core::drive::{DriveApi, DriveClient, DriveConfig};
///
/// # async fn example() -> geotag_core::Result<()> {
/// let creds = Arc::new(AuthorizedUserCredentials::from_file("token.json").await?);
/// let drive = DriveClient::new(DriveConfig::default(), creds)?;
/// let link = drive.thumbnail_link("1AbCdEf").await?;
/// # Ok(())
/// # }
/// ```
pub struct DriveClient {
    client: Client,
    config: DriveConfig,
    credentials: Arc<dyn CredentialProvider>,
}

impl DriveClient {
    /// Create a new Drive client.
    #[instrument(level = "debug", skip_all, fields(
        api_url = %config.api_url,
        max_retries = config.max_retries
    ))]
    pub fn new(config: DriveConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let mut builder = Client::builder().https_only(config.https_only);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            warn!(error = %e, "Failed to create HTTP client");
            GeotagError::DriveError(format!("Failed to create HTTP client: {e}"))
        })?;

        debug!("Drive client created");
        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    fn files_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| GeotagError::ConfigError(format!("Invalid Drive API URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| GeotagError::ConfigError("Drive API URL cannot be a base".into()))?
            .pop_if_empty()
            .push("files");
        Ok(url)
    }

    fn file_url(&self, file_id: &str) -> Result<Url> {
        let mut url = self.files_url()?;
        url.path_segments_mut()
            .map_err(|_| GeotagError::ConfigError("Drive API URL cannot be a base".into()))?
            .push(file_id);
        Ok(url)
    }

    /// Attach a fresh bearer token to `request`.
    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        ensure_fresh(self.credentials.as_ref()).await?;
        Ok(request.bearer_auth(self.credentials.token()))
    }

    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: INITIAL_INTERVAL,
            max_interval: MAX_INTERVAL,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// Run `operation`, retrying transient failures up to `max_retries` times.
    async fn with_retry<T, F, Fut>(&self, operation: &'static str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, backoff::Error<GeotagError>>>,
    {
        let max_retries = self.config.max_retries;
        let mut attempts = 0u32;

        retry_notify(
            self.build_backoff(),
            || {
                attempts += 1;
                let exhausted = attempts > max_retries;
                let attempt = f();
                async move {
                    attempt.await.map_err(|e| match e {
                        backoff::Error::Transient { err, .. } if exhausted => {
                            backoff::Error::permanent(err)
                        }
                        other => other,
                    })
                }
            },
            |err: GeotagError, duration: Duration| {
                warn!(
                    operation,
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await
    }

    /// Send an authorized request and classify failures for retry.
    async fn send_once(
        &self,
        request: RequestBuilder,
        operation: &'static str,
    ) -> std::result::Result<Response, backoff::Error<GeotagError>> {
        let start = Instant::now();
        let request = self
            .authorize(request)
            .await
            .map_err(backoff::Error::permanent)?;

        let response = request.send().await.map_err(|e| {
            let latency_ms = start.elapsed().as_millis() as u64;
            if is_transient_error(&e) {
                warn!(operation, error = %e, latency_ms, "Transient error");
                backoff::Error::transient(GeotagError::HttpError(e))
            } else {
                warn!(operation, error = %e, latency_ms, "Permanent error, aborting");
                backoff::Error::permanent(GeotagError::HttpError(e))
            }
        })?;

        let status = response.status();
        debug!(operation, status = %status, "Received HTTP response");

        if status.is_success() {
            return Ok(response);
        }

        let latency_ms = start.elapsed().as_millis() as u64;
        let detail = error_detail(response).await;
        let err = GeotagError::DriveError(format!("{operation} returned status {status}{detail}"));

        if is_transient_status(status) {
            warn!(operation, status = %status, latency_ms, "Transient HTTP status");
            Err(backoff::Error::transient(err))
        } else {
            warn!(operation, status = %status, latency_ms, "Permanent HTTP error");
            Err(backoff::Error::permanent(err))
        }
    }

    async fn list_once(
        &self,
        url: &Url,
        request: &ListFilesRequest,
    ) -> std::result::Result<FileListPage, backoff::Error<GeotagError>> {
        let mut params: Vec<(&str, String)> = vec![
            ("q", request.query.clone()),
            ("fields", request.fields.clone()),
            ("pageSize", request.page_size.to_string()),
        ];
        if let Some(token) = &request.page_token {
            params.push(("pageToken", token.clone()));
        }

        let response = self
            .send_once(self.client.get(url.clone()).query(&params), "files.list")
            .await?;

        response.json::<FileListPage>().await.map_err(|e| {
            warn!(error = %e, "Failed to parse files.list response");
            backoff::Error::permanent(GeotagError::DriveError(format!(
                "Failed to parse files.list response: {e}"
            )))
        })
    }

    async fn thumbnail_link_once(
        &self,
        url: &Url,
    ) -> std::result::Result<Option<String>, backoff::Error<GeotagError>> {
        let response = self
            .send_once(
                self.client
                    .get(url.clone())
                    .query(&[("fields", THUMBNAIL_LINK_FIELDS)]),
                "files.get",
            )
            .await?;

        let parsed: ThumbnailLinkResponse = response.json().await.map_err(|e| {
            backoff::Error::permanent(GeotagError::DriveError(format!(
                "Failed to parse files.get response: {e}"
            )))
        })?;

        Ok(parsed.thumbnail_link.filter(|link| !link.is_empty()))
    }

    async fn download_once(
        &self,
        url: &Url,
    ) -> std::result::Result<DownloadedMedia, backoff::Error<GeotagError>> {
        let mut response = self
            .send_once(
                self.client.get(url.clone()).query(&[("alt", "media")]),
                "files.get_media",
            )
            .await?;

        let content_type = content_type_of(&response);
        let mut bytes = Vec::with_capacity(download_capacity(response.content_length()));

        let mut chunks = 0usize;
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            if is_transient_error(&e) || e.is_body() {
                backoff::Error::transient(GeotagError::HttpError(e))
            } else {
                backoff::Error::permanent(GeotagError::HttpError(e))
            }
        })? {
            chunks += 1;
            bytes.extend_from_slice(&chunk);
        }

        debug!(chunks, bytes = bytes.len(), "Media download complete");
        Ok(DownloadedMedia {
            bytes,
            content_type,
        })
    }
}

#[async_trait]
impl DriveApi for DriveClient {
    #[instrument(level = "debug", skip(self, request), fields(
        page_token = request.page_token.as_deref().unwrap_or("")
    ))]
    async fn list_files(&self, request: &ListFilesRequest) -> Result<FileListPage> {
        let url = self.files_url()?;
        let start = Instant::now();

        let page = self
            .with_retry("files.list", || self.list_once(&url, request))
            .await?;

        debug!(
            files = page.files.len(),
            has_next = page.next_page_token.is_some(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Listed page"
        );
        Ok(page)
    }

    /// Single attempt; the resolver treats any failure as "no link".
    #[instrument(level = "debug", skip(self))]
    async fn thumbnail_link(&self, file_id: &str) -> Result<Option<String>> {
        let url = self.file_url(file_id)?;
        self.thumbnail_link_once(&url).await.map_err(|e| match e {
            backoff::Error::Permanent(err) | backoff::Error::Transient { err, .. } => err,
        })
    }

    #[instrument(level = "debug", skip_all)]
    async fn fetch_link(&self, link: &str, bearer_token: &str) -> Result<FetchedLink> {
        let start = Instant::now();
        let response = self
            .client
            .get(link)
            .bearer_auth(bearer_token)
            .send()
            .await?;

        let status = response.status();
        let content_type = content_type_of(&response);
        let body = response.bytes().await?.to_vec();

        debug!(
            status = %status,
            bytes = body.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Fetched thumbnail link"
        );

        Ok(FetchedLink {
            status,
            body,
            content_type,
        })
    }

    #[instrument(level = "info", skip(self))]
    async fn download_media(&self, file_id: &str) -> Result<DownloadedMedia> {
        let url = self.file_url(file_id)?;
        let start = Instant::now();

        let result = self
            .with_retry("files.get_media", || self.download_once(&url))
            .await;

        let total_latency_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(media) => info!(
                bytes = media.bytes.len(),
                total_latency_ms, "Downloaded full file"
            ),
            Err(e) => warn!(error = %e, total_latency_ms, "Full file download failed"),
        }

        result
    }
}

fn content_type_of(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Initial buffer size for a download; the declared length is only a hint.
fn download_capacity(content_length: Option<u64>) -> usize {
    content_length.map_or(0, |len| len.min(MAX_PREALLOCATION) as usize)
}

/// Extract the Google error message from a failed response, if any.
async fn error_detail(response: Response) -> String {
    match response.json::<GoogleErrorBody>().await {
        Ok(body) if !body.error.message.is_empty() => format!(": {}", body.error.message),
        _ => String::new(),
    }
}

/// Check if a reqwest error is transient and should be retried.
pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// Check if an HTTP status code indicates a transient error.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY
    )
}
