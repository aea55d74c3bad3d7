//! Thumbnail resolution.
//!
//! A thumbnail is obtained, in order, from:
//!
//! 1. the link cached during discovery,
//! 2. otherwise a live `thumbnailLink` lookup (failures count as "no link"),
//! 3. an authenticated GET against that link, bounded by a timeout,
//! 4. otherwise a full download of the original, re-encoded locally.
//!
//! Steps 1-3 never surface errors; they only decide whether step 4 runs.
//! Step 4 is the last resort and its errors are returned to the caller.

mod reencode;

pub use reencode::{Reencoder, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DIMENSION};
#[cfg(feature = "reencode")]
pub use reencode::shrink_to_jpeg;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use crate::cache::ThumbnailCache;
use crate::credentials::{ensure_fresh, CredentialProvider};
use crate::drive::DriveApi;
use crate::error::Result;
use crate::model::{ThumbnailBytes, DEFAULT_CONTENT_TYPE};

/// Time allowed for a direct thumbnail link fetch.
pub const DEFAULT_LINK_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for thumbnail resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Time allowed for the direct link fetch.
    pub link_timeout: Duration,
    /// How full downloads are shrunk.
    pub reencoder: Reencoder,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            link_timeout: DEFAULT_LINK_TIMEOUT,
            reencoder: Reencoder::detect(),
        }
    }
}

/// Which step of the pipeline produced a thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailSource {
    /// Fetched through a thumbnail link
    Link,
    /// Downloaded in full and passed through the re-encoder
    FullDownload,
}

/// Resolves thumbnail bytes for Drive files.
pub struct ThumbnailResolver {
    drive: Arc<dyn DriveApi>,
    credentials: Arc<dyn CredentialProvider>,
    cache: Arc<ThumbnailCache>,
    config: ResolverConfig,
}

impl ThumbnailResolver {
    pub fn new(
        drive: Arc<dyn DriveApi>,
        credentials: Arc<dyn CredentialProvider>,
        cache: Arc<ThumbnailCache>,
    ) -> Self {
        Self::with_config(drive, credentials, cache, ResolverConfig::default())
    }

    pub fn with_config(
        drive: Arc<dyn DriveApi>,
        credentials: Arc<dyn CredentialProvider>,
        cache: Arc<ThumbnailCache>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            drive,
            credentials,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the thumbnail of `file_id`.
    ///
    /// Fails only when the full download (or its re-encoding) fails, or when
    /// an expired token cannot be refreshed.
    pub async fn resolve_thumbnail(&self, file_id: &str) -> Result<ThumbnailBytes> {
        self.resolve_with_source(file_id)
            .await
            .map(|(thumbnail, _)| thumbnail)
    }

    /// Like [`resolve_thumbnail`](Self::resolve_thumbnail), also reporting
    /// which step produced the bytes.
    #[instrument(level = "info", skip(self), fields(reencoder = self.config.reencoder.name()))]
    pub async fn resolve_with_source(
        &self,
        file_id: &str,
    ) -> Result<(ThumbnailBytes, ThumbnailSource)> {
        let start = Instant::now();

        let link = match self.cache.get(file_id) {
            Some(link) => {
                debug!("Thumbnail link cache hit");
                Some(link)
            }
            None => self.lookup_link(file_id).await,
        };

        ensure_fresh(self.credentials.as_ref()).await?;

        if let Some(link) = link {
            if let Some(thumbnail) = self.fetch_link(&link).await {
                info!(
                    bytes = thumbnail.len(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Served thumbnail from link"
                );
                return Ok((thumbnail, ThumbnailSource::Link));
            }
        }

        let thumbnail = self.full_download(file_id).await?;
        info!(
            bytes = thumbnail.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Served thumbnail from full download"
        );
        Ok((thumbnail, ThumbnailSource::FullDownload))
    }

    /// Live `thumbnailLink` lookup; any failure means "no link".
    async fn lookup_link(&self, file_id: &str) -> Option<String> {
        match self.drive.thumbnail_link(file_id).await {
            Ok(Some(link)) => {
                debug!("Thumbnail link from metadata lookup");
                Some(link)
            }
            Ok(None) => {
                debug!("File has no thumbnail link");
                None
            }
            Err(e) => {
                warn!(error = %e, "Thumbnail link lookup failed, falling back");
                None
            }
        }
    }

    /// Authenticated GET against `link`; `None` unless the status is a success.
    async fn fetch_link(&self, link: &str) -> Option<ThumbnailBytes> {
        let token = self.credentials.token();
        let fetch = self.drive.fetch_link(link, &token);

        match tokio::time::timeout(self.config.link_timeout, fetch).await {
            Ok(Ok(fetched)) if fetched.status.is_success() => {
                let content_type = fetched
                    .content_type
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
                Some(ThumbnailBytes::new(fetched.body, content_type))
            }
            Ok(Ok(fetched)) => {
                debug!(status = %fetched.status, "Thumbnail link rejected, falling back");
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Thumbnail link fetch failed, falling back");
                None
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.link_timeout.as_millis() as u64,
                    "Thumbnail link fetch timed out, falling back"
                );
                None
            }
        }
    }

    async fn full_download(&self, file_id: &str) -> Result<ThumbnailBytes> {
        let media = self.drive.download_media(file_id).await?;
        debug!(bytes = media.bytes.len(), "Re-encoding full download");
        self.config.reencoder.apply(media).await
    }
}
