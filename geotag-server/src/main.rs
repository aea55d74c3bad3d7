//! Geotag Server - REST API for geotagged images stored in Google Drive
//!
//! Exposes geotag-core functionality via HTTP endpoints:
//! - GET /api/images?folder_id= - List geotagged images in a folder
//! - GET /api/thumbnail/{file_id} - Thumbnail bytes for one image

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use geotag_core::{
    AuthorizedUserCredentials, DiscoveryConfig, DriveClient, DriveConfig, ImageDiscovery,
    ResolverConfig, ThumbnailCache, ThumbnailResolver,
};
use geotag_server::{create_router_with_config, AppState, Config};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "geotag_server=info,geotag_core=info,tower_http=info";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    let config = Config::from_env();

    println!("╔════════════════════════════════════════════╗");
    println!("║        GEOTAG MAP API Server v{:<8}     ║", env!("CARGO_PKG_VERSION"));
    println!("║   Geotagged Google Drive images on a map   ║");
    println!("╚════════════════════════════════════════════╝");

    if let Err(message) = check_setup_files(&config) {
        eprintln!("\n{message}");
        std::process::exit(1);
    }

    let credentials = match AuthorizedUserCredentials::from_file(&config.token_file).await {
        Ok(credentials) => Arc::new(credentials),
        Err(e) => {
            eprintln!("\nCould not load {}: {e}", config.token_file.display());
            eprintln!("Delete the file and complete the authorization flow again.");
            std::process::exit(1);
        }
    };

    let drive = match DriveClient::new(DriveConfig::from_env(), credentials.clone()) {
        Ok(drive) => Arc::new(drive),
        Err(e) => {
            eprintln!("\nInvalid Drive configuration: {e}");
            std::process::exit(1);
        }
    };

    let resolver_config = ResolverConfig::default();
    tracing::info!(
        reencoder = resolver_config.reencoder.name(),
        "Thumbnail fallback configured"
    );

    let cache = Arc::new(ThumbnailCache::new());
    let discovery = ImageDiscovery::with_config(drive.clone(), DiscoveryConfig::from_env());
    let resolver =
        ThumbnailResolver::with_config(drive, credentials, cache.clone(), resolver_config);
    let state = AppState::from_parts(discovery, resolver, cache, config.thumbnail_cache_control());

    let app = create_router_with_config(state, &config);
    let addr = config.socket_addr();

    println!("\nListening on http://{}", addr);
    println!("\nEndpoints:");
    println!("  GET /api/images?folder_id=<id>  - List geotagged images");
    println!("  GET /api/thumbnail/<file_id>    - Thumbnail bytes");
    println!("  GET /health                     - Health check");
    println!("  GET /swagger-ui                 - API documentation");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("\nFailed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
    tracing::info!("Server stopped");
}

/// Both files must exist before the server can talk to Drive.
fn check_setup_files(config: &Config) -> Result<(), String> {
    if !Path::new(&config.credentials_file).exists() {
        return Err(format!(
            "ERROR: {} not found.\n\n\
             To set up Google Drive access:\n\
             1. Open https://console.cloud.google.com/ and create or select a project\n\
             2. Enable the Google Drive API\n\
             3. Create an OAuth client ID of type \"Desktop app\"\n\
             4. Download the client secrets and save them as {}\n\
             5. Run the authorization flow once to produce {}",
            config.credentials_file.display(),
            config.credentials_file.display(),
            config.token_file.display(),
        ));
    }

    if !Path::new(&config.token_file).exists() {
        return Err(format!(
            "ERROR: {} not found.\n\n\
             Complete the OAuth consent flow with the client in {} and the\n\
             read-only Drive scope ({}), then save the authorized-user token\n\
             (token, refresh_token, client_id, client_secret, expiry) as {}.",
            config.token_file.display(),
            config.credentials_file.display(),
            geotag_core::DRIVE_READONLY_SCOPE,
            config.token_file.display(),
        ));
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
