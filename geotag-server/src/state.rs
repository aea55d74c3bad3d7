//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use geotag_core::{
    CredentialProvider, DriveApi, ImageDiscovery, ThumbnailCache, ThumbnailResolver,
};

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Folder listing
    pub discovery: Arc<ImageDiscovery>,
    /// Thumbnail pipeline
    pub resolver: Arc<ThumbnailResolver>,
    /// Links seen during discovery; written here, read by the resolver
    pub cache: Arc<ThumbnailCache>,
    /// `Cache-Control` header value for thumbnail responses
    pub thumbnail_cache_control: String,
}

impl AppState {
    /// Wire discovery and resolver around one Drive backend and one shared cache.
    pub fn new(
        drive: Arc<dyn DriveApi>,
        credentials: Arc<dyn CredentialProvider>,
        thumbnail_cache_control: impl Into<String>,
    ) -> Self {
        let cache = Arc::new(ThumbnailCache::new());
        let discovery = ImageDiscovery::new(drive.clone());
        let resolver = ThumbnailResolver::new(drive, credentials, cache.clone());
        Self::from_parts(discovery, resolver, cache, thumbnail_cache_control)
    }

    /// Assemble state from individually configured components.
    pub fn from_parts(
        discovery: ImageDiscovery,
        resolver: ThumbnailResolver,
        cache: Arc<ThumbnailCache>,
        thumbnail_cache_control: impl Into<String>,
    ) -> Self {
        Self {
            discovery: Arc::new(discovery),
            resolver: Arc::new(resolver),
            cache,
            thumbnail_cache_control: thumbnail_cache_control.into(),
        }
    }
}
