//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 5050)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 50)
    pub rate_limit_burst: u32,
    /// `Cache-Control` max-age for thumbnail responses (default: 3600)
    pub thumbnail_max_age_secs: u64,
    /// OAuth client secrets downloaded from the cloud console
    pub credentials_file: PathBuf,
    /// Authorized-user token file produced by the consent flow
    pub token_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5050,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            timeout_secs: 120,
            rate_limit_enabled: false,
            rate_limit_per_sec: 10,
            rate_limit_burst: 50,
            thumbnail_max_age_secs: 3600,
            credentials_file: PathBuf::from("credentials.json"),
            token_file: PathBuf::from("token.json"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(defaults.rate_limit_enabled);

        let rate_limit_per_sec = std::env::var("RATE_LIMIT_PER_SEC")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rate_limit_per_sec);

        let rate_limit_burst = std::env::var("RATE_LIMIT_BURST")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rate_limit_burst);

        let thumbnail_max_age_secs = std::env::var("THUMBNAIL_MAX_AGE_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.thumbnail_max_age_secs);

        let credentials_file = std::env::var("GEOTAG_CREDENTIALS_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.credentials_file);

        let token_file = std::env::var("GEOTAG_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.token_file);

        Self {
            port,
            host,
            allowed_origins,
            timeout_secs,
            rate_limit_enabled,
            rate_limit_per_sec,
            rate_limit_burst,
            thumbnail_max_age_secs,
            credentials_file,
            token_file,
        }
    }

    /// Get the socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Value of the `Cache-Control` header sent with thumbnails.
    pub fn thumbnail_cache_control(&self) -> String {
        format!("public, max-age={}", self.thumbnail_max_age_secs)
    }
}
