//! Example demonstrating discovery and thumbnail tracing instrumentation.
//!
//! Run with: cargo run -p geotag-core --example drive_tracing -- <folder_id> [token.json]

use std::sync::Arc;

use geotag_core::{
    AuthorizedUserCredentials, DriveClient, DriveConfig, ImageDiscovery, ThumbnailCache,
    ThumbnailResolver,
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::new("geotag_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Drive Tracing Demo ===\n");

    let mut args = std::env::args().skip(1);
    let Some(folder_id) = args.next() else {
        eprintln!("Usage: drive_tracing <folder_id> [token.json]");
        return;
    };
    let token_file = args.next().unwrap_or_else(|| "token.json".to_string());

    let credentials = match AuthorizedUserCredentials::from_file(&token_file).await {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Failed to load credentials: {}", e);
            return;
        }
    };

    let config = DriveConfig::from_env();
    println!("Config: {:?}\n", config);

    let drive = match DriveClient::new(config, credentials.clone()) {
        Ok(d) => Arc::new(d),
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };

    let cache = Arc::new(ThumbnailCache::new());
    let discovery = ImageDiscovery::new(drive.clone());

    println!("\nListing folder {}...\n", folder_id);

    let images = match discovery.list_geotagged_images(&folder_id).await {
        Ok(images) => images,
        Err(e) => {
            println!("\n❌ Listing failed: {}", e);
            return;
        }
    };
    println!("\n✅ {} geotagged image(s)", images.len());
    cache.record_images(&images);

    let Some(first) = images.first() else {
        return;
    };

    let resolver = ThumbnailResolver::new(drive, credentials, cache);
    match resolver.resolve_with_source(&first.id).await {
        Ok((thumbnail, source)) => {
            println!("\n✅ Thumbnail for {}", first.name);
            println!("   Source: {:?}", source);
            println!("   Bytes:  {}", thumbnail.len());
            println!("   Type:   {}", thumbnail.content_type);
        }
        Err(e) => {
            println!("\n❌ Thumbnail failed: {}", e);
        }
    }
}
