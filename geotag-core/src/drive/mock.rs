//! In-memory Drive implementation for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{
    DriveApi, DriveFile, FetchedLink, FileListPage, ImageMediaMetadata, ListFilesRequest, Location,
};
use crate::error::{GeotagError, Result};
use crate::model::DownloadedMedia;

/// Scripted outcome of a direct link fetch.
#[derive(Debug, Clone)]
enum LinkOutcome {
    Respond(FetchedLink),
    TransportError,
    Hang,
}

/// Mock Drive backed by in-memory pages, links and media.
///
/// Pages are chained with tokens `page-1`, `page-2`, ... Every remote call is
/// counted so tests can assert which fallbacks ran.
/// WARNING: Do not use in production - nothing leaves the process!
#[derive(Default)]
pub struct MockDrive {
    pages: Vec<Vec<DriveFile>>,
    endless: bool,
    fail_listing: bool,
    fail_metadata: bool,
    metadata_links: HashMap<String, String>,
    link_outcomes: HashMap<String, LinkOutcome>,
    media: HashMap<String, DownloadedMedia>,
    list_calls: AtomicUsize,
    metadata_calls: AtomicUsize,
    link_calls: AtomicUsize,
    download_calls: AtomicUsize,
    list_requests: Mutex<Vec<ListFilesRequest>>,
    link_tokens: Mutex<Vec<String>>,
}

impl MockDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `pages` in order from `files.list`.
    pub fn with_pages(mut self, pages: Vec<Vec<DriveFile>>) -> Self {
        self.pages = pages;
        self
    }

    /// Always report another page; used to exercise the page guard.
    pub fn with_endless_pages(mut self) -> Self {
        self.endless = true;
        self
    }

    /// Make every `files.list` call fail.
    pub fn with_listing_failure(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Make every metadata lookup fail.
    pub fn with_metadata_failure(mut self) -> Self {
        self.fail_metadata = true;
        self
    }

    /// Report `link` from the metadata lookup of `file_id`.
    pub fn with_metadata_link(mut self, file_id: &str, link: &str) -> Self {
        self.metadata_links
            .insert(file_id.to_string(), link.to_string());
        self
    }

    /// Answer a fetch of `link` with the given status, body and content type.
    pub fn with_link_response(
        mut self,
        link: &str,
        status: StatusCode,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Self {
        self.link_outcomes.insert(
            link.to_string(),
            LinkOutcome::Respond(FetchedLink {
                status,
                body,
                content_type: content_type.map(str::to_string),
            }),
        );
        self
    }

    /// Fail a fetch of `link` at the transport level.
    pub fn with_link_error(mut self, link: &str) -> Self {
        self.link_outcomes
            .insert(link.to_string(), LinkOutcome::TransportError);
        self
    }

    /// Never answer a fetch of `link`.
    pub fn with_hanging_link(mut self, link: &str) -> Self {
        self.link_outcomes.insert(link.to_string(), LinkOutcome::Hang);
        self
    }

    /// Serve `bytes` from the media download of `file_id`.
    pub fn with_media(mut self, file_id: &str, bytes: Vec<u8>, content_type: Option<&str>) -> Self {
        self.media.insert(
            file_id.to_string(),
            DownloadedMedia {
                bytes,
                content_type: content_type.map(str::to_string),
            },
        );
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn link_calls(&self) -> usize {
        self.link_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    /// Every `files.list` request received, in order.
    pub fn list_requests(&self) -> Vec<ListFilesRequest> {
        self.list_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Bearer tokens sent with link fetches, in order.
    pub fn link_tokens(&self) -> Vec<String> {
        self.link_tokens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn page_index(token: Option<&str>) -> Result<usize> {
        match token {
            None => Ok(0),
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| GeotagError::DriveError(format!("Invalid page token: {token}"))),
        }
    }
}

/// Build a file with a GPS location.
pub fn geotagged_file(id: &str, lat: f64, lon: f64, altitude: Option<f64>) -> DriveFile {
    DriveFile {
        id: id.to_string(),
        name: format!("{id}.jpg"),
        thumbnail_link: Some(format!("https://thumbs.test/{id}")),
        image_media_metadata: Some(ImageMediaMetadata {
            location: Some(Location {
                latitude: Some(lat),
                longitude: Some(lon),
                altitude,
            }),
        }),
    }
}

/// Build a file without any location metadata.
pub fn untagged_file(id: &str) -> DriveFile {
    DriveFile {
        id: id.to_string(),
        name: format!("{id}.jpg"),
        thumbnail_link: Some(format!("https://thumbs.test/{id}")),
        image_media_metadata: None,
    }
}

#[async_trait]
impl DriveApi for MockDrive {
    async fn list_files(&self, request: &ListFilesRequest) -> Result<FileListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.list_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        if self.fail_listing {
            return Err(GeotagError::DriveError(
                "files.list returned status 403 Forbidden".into(),
            ));
        }

        let index = Self::page_index(request.page_token.as_deref())?;

        if self.endless {
            return Ok(FileListPage {
                files: vec![geotagged_file(&format!("E{index}"), 0.0, 0.0, None)],
                next_page_token: Some(format!("page-{}", index + 1)),
            });
        }

        let files = self.pages.get(index).cloned().unwrap_or_default();
        let next_page_token = (index + 1 < self.pages.len()).then(|| format!("page-{}", index + 1));

        Ok(FileListPage {
            files,
            next_page_token,
        })
    }

    async fn thumbnail_link(&self, file_id: &str) -> Result<Option<String>> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_metadata {
            return Err(GeotagError::DriveError(
                "files.get returned status 500 Internal Server Error".into(),
            ));
        }
        Ok(self.metadata_links.get(file_id).cloned())
    }

    async fn fetch_link(&self, link: &str, bearer_token: &str) -> Result<FetchedLink> {
        self.link_calls.fetch_add(1, Ordering::SeqCst);
        self.link_tokens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(bearer_token.to_string());

        match self.link_outcomes.get(link) {
            Some(LinkOutcome::Respond(fetched)) => Ok(fetched.clone()),
            Some(LinkOutcome::TransportError) => Err(GeotagError::DriveError(format!(
                "connection reset fetching {link}"
            ))),
            Some(LinkOutcome::Hang) => std::future::pending().await,
            None => Ok(FetchedLink {
                status: StatusCode::NOT_FOUND,
                body: Vec::new(),
                content_type: None,
            }),
        }
    }

    async fn download_media(&self, file_id: &str) -> Result<DownloadedMedia> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        self.media.get(file_id).cloned().ok_or_else(|| {
            GeotagError::DriveError(format!(
                "files.get_media returned status 404 Not Found: File not found: {file_id}."
            ))
        })
    }
}
