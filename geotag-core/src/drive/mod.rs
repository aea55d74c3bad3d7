//! Google Drive v3 access.
//!
//! The core only needs four remote calls: a paginated file listing, a
//! single-field metadata lookup, an authenticated GET against a thumbnail
//! link, and a full media download. They are grouped behind [`DriveApi`] so
//! discovery and thumbnail resolution can run against the real HTTP client or
//! the in-memory mock.
//!
//! - **DriveClient** - reqwest client with bounded retry on transient failures
//! - **MockDrive** - in-memory pages, links and media with call counters

mod client;
mod mock;
pub mod query;

pub use client::{DriveClient, DriveConfig, DEFAULT_DRIVE_API_URL};
pub use mock::{geotagged_file, untagged_file, MockDrive};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::DownloadedMedia;

/// Parameters of a single `files.list` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilesRequest {
    /// Drive query expression (`q`)
    pub query: String,
    /// Partial response field mask (`fields`)
    pub fields: String,
    pub page_size: u32,
    /// Continuation token from the previous page
    pub page_token: Option<String>,
}

/// One page of `files.list` results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListPage {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// File resource restricted to the fields discovery asks for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub thumbnail_link: Option<String>,
    #[serde(default)]
    pub image_media_metadata: Option<ImageMediaMetadata>,
}

impl DriveFile {
    /// Embedded GPS location, if Drive extracted one.
    pub fn location(&self) -> Option<&Location> {
        self.image_media_metadata.as_ref()?.location.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMediaMetadata {
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub altitude: Option<f64>,
}

/// Response of a direct thumbnail link fetch, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedLink {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

/// Remote calls the core makes against Drive.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Fetch one page of a `files.list` query.
    async fn list_files(&self, request: &ListFilesRequest) -> Result<FileListPage>;

    /// Look up the current `thumbnailLink` of a file.
    async fn thumbnail_link(&self, file_id: &str) -> Result<Option<String>>;

    /// GET a thumbnail link with the given bearer token.
    ///
    /// Non-success statuses are returned as a [`FetchedLink`], not an error;
    /// only transport failures produce `Err`.
    async fn fetch_link(&self, link: &str, bearer_token: &str) -> Result<FetchedLink>;

    /// Download the complete contents of a file.
    async fn download_media(&self, file_id: &str) -> Result<DownloadedMedia>;
}
