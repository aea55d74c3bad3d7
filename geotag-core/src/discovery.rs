//! Discovery of geotagged images inside a Drive folder.
//!
//! Pages through `files.list` for non-trashed images in a folder and keeps the
//! files whose embedded metadata carries both latitude and longitude.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::drive::query::{images_in_folder_query, IMAGE_LIST_FIELDS};
use crate::drive::{DriveApi, DriveFile, ListFilesRequest};
use crate::error::{GeotagError, Result};
use crate::model::ImageRecord;

/// Files requested per `files.list` page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Configuration for image discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Files requested per page.
    pub page_size: u32,
    /// Upper bound on pages fetched per folder.
    ///
    /// `None` follows continuation tokens for as long as Drive returns them,
    /// which trusts Drive to eventually stop.
    pub max_pages: Option<u32>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: None,
        }
    }
}

impl DiscoveryConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional: `DISCOVERY_MAX_PAGES` (0 or unset = unbounded)
    pub fn from_env() -> Self {
        let max_pages = std::env::var("DISCOVERY_MAX_PAGES")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&pages: &u32| pages > 0);

        Self {
            max_pages,
            ..Default::default()
        }
    }
}

/// Lists geotagged images in Drive folders.
pub struct ImageDiscovery {
    drive: Arc<dyn DriveApi>,
    config: DiscoveryConfig,
}

impl ImageDiscovery {
    pub fn new(drive: Arc<dyn DriveApi>) -> Self {
        Self::with_config(drive, DiscoveryConfig::default())
    }

    pub fn with_config(drive: Arc<dyn DriveApi>, config: DiscoveryConfig) -> Self {
        Self { drive, config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// List every image in `folder_id` that has a GPS location.
    ///
    /// Records keep the order Drive returned them in, pages concatenated.
    /// Files without latitude and longitude are skipped. Any remote error
    /// aborts the listing and is returned as-is.
    #[instrument(level = "info", skip(self), fields(page_size = self.config.page_size))]
    pub async fn list_geotagged_images(&self, folder_id: &str) -> Result<Vec<ImageRecord>> {
        let start = Instant::now();
        let query = images_in_folder_query(folder_id);

        let mut images = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0u32;
        let mut seen = 0usize;

        loop {
            if let Some(max_pages) = self.config.max_pages {
                if pages >= max_pages {
                    warn!(pages, kept = images.len(), "Page limit reached with results pending");
                    return Err(GeotagError::PageLimitExceeded { pages });
                }
            }

            let request = ListFilesRequest {
                query: query.clone(),
                fields: IMAGE_LIST_FIELDS.to_string(),
                page_size: self.config.page_size,
                page_token: page_token.take(),
            };

            let page = self.drive.list_files(&request).await?;
            pages += 1;
            seen += page.files.len();

            let before = images.len();
            images.extend(page.files.into_iter().filter_map(geotagged_record));
            debug!(page = pages, kept = images.len() - before, "Processed page");

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!(
            pages,
            files_seen = seen,
            geotagged = images.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Discovery complete"
        );

        Ok(images)
    }
}

/// Convert a listed file into a record if it carries latitude and longitude.
pub fn geotagged_record(file: DriveFile) -> Option<ImageRecord> {
    let location = file.location()?;
    let lat = location.latitude?;
    let lon = location.longitude?;
    let altitude = location.altitude;

    Some(ImageRecord {
        id: file.id,
        name: file.name,
        thumbnail_link: file.thumbnail_link,
        lat,
        lon,
        altitude,
    })
}
