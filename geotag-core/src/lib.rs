//! Geotag Core - discovery and thumbnails for geotagged images in Google Drive
//!
//! This crate finds the images in a Drive folder that carry GPS metadata and
//! serves lightweight thumbnails for them without downloading full-resolution
//! originals whenever Drive can provide a pre-rendered thumbnail.
//!
//! # Features
//!
//! - Paginated discovery of geotagged images with an optional page guard
//! - Thumbnail link cache populated from discovery results
//! - Thumbnail pipeline: cached link, live lookup, direct fetch, full download
//! - Local JPEG re-encoding of full downloads (`reencode` feature)
//! - Bearer credentials with transparent refresh
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use geotag_core::{
//!     AuthorizedUserCredentials, DriveClient, DriveConfig, ImageDiscovery, ThumbnailCache,
//!     ThumbnailResolver,
//! };
//!
//! # async fn example() -> geotag_core::Result<()> {
//! let creds = Arc::new(AuthorizedUserCredentials::from_file("token.json").await?);
//! let drive = Arc::new(DriveClient::new(DriveConfig::default(), creds.clone())?);
//! let cache = Arc::new(ThumbnailCache::new());
//!
//! let discovery = ImageDiscovery::new(drive.clone());
//! let images = discovery.list_geotagged_images("1AbCdEfGhIj").await?;
//! cache.record_images(&images);
//!
//! let resolver = ThumbnailResolver::new(drive, creds, cache);
//! if let Some(first) = images.first() {
//!     let thumbnail = resolver.resolve_thumbnail(&first.id).await?;
//!     println!("{} bytes of {}", thumbnail.len(), thumbnail.content_type);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod credentials;
pub mod discovery;
pub mod drive;
pub mod error;
pub mod model;
pub mod thumbnail;

// Re-export main types for convenience
pub use cache::ThumbnailCache;
pub use credentials::{
    ensure_fresh, AuthorizedUserCredentials, CredentialProvider, StaticCredentials,
    DRIVE_READONLY_SCOPE,
};
pub use discovery::{DiscoveryConfig, ImageDiscovery};
pub use drive::{DriveApi, DriveClient, DriveConfig, MockDrive};
pub use error::{GeotagError, Result};
pub use model::{DownloadedMedia, ImageRecord, ThumbnailBytes};
pub use thumbnail::{Reencoder, ResolverConfig, ThumbnailResolver, ThumbnailSource};
