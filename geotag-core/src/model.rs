//! Records handed from the core to the HTTP front.

use serde::{Deserialize, Serialize};

/// Default MIME type used when a thumbnail response omits `Content-Type`.
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// A geotagged image found in a Drive folder.
///
/// `lat` and `lon` are always present on records emitted by discovery.
/// A missing altitude stays `None` and serializes as `null`, never `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Drive file identifier
    pub id: String,
    /// Display name of the file
    pub name: String,
    /// Short-lived link to a pre-rendered thumbnail, if Drive reported one
    #[serde(rename = "thumbnailLink")]
    pub thumbnail_link: Option<String>,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Altitude in meters
    pub altitude: Option<f64>,
}

/// Thumbnail payload ready to be written as an HTTP body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailBytes {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ThumbnailBytes {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// Label bytes as JPEG.
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, DEFAULT_CONTENT_TYPE)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Complete file contents returned by the media download endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedMedia {
    pub bytes: Vec<u8>,
    /// `Content-Type` declared by the download response
    pub content_type: Option<String>,
}
