//! Bearer credentials for authenticated Drive calls.
//!
//! The OAuth consent flow that produces the initial token lives outside this
//! crate. What the core needs is a provider that hands out a bearer token,
//! knows whether it has expired, and can refresh it.
//!
//! ## Providers
//!
//! - **AuthorizedUserCredentials** - token file with a refresh token (production)
//! - **StaticCredentials** - fixed token with controllable expiry (testing)
//!
//! ## Example
//!
//! ```no_run
//! use geotag_core::credentials::{ensure_fresh, AuthorizedUserCredentials, CredentialProvider};
//!
//! # async fn example() -> geotag_core::Result<()> {
//! let creds = AuthorizedUserCredentials::from_file("token.json").await?;
//! ensure_fresh(&creds).await?;
//! let header = format!("Bearer {}", creds.token());
//! # Ok(())
//! # }
//! ```

mod authorized_user;
mod fixed;

pub use authorized_user::{AuthorizedUserCredentials, AuthorizedUserFile, DEFAULT_TOKEN_URI};
pub use fixed::StaticCredentials;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;

/// OAuth scope needed to list folders and read file contents.
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// Trait for bearer credential sources.
///
/// Implementations must be thread-safe (`Send + Sync`); a single provider is
/// shared by every in-flight request.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Whether the current token is expired (or about to expire).
    fn is_expired(&self) -> bool;

    /// Obtain a new access token from the authorization server.
    async fn refresh(&self) -> Result<()>;

    /// The current access token.
    fn token(&self) -> String;
}

/// Refresh `provider` once if it reports expiry.
///
/// Called before any authenticated fetch so the token sent is valid.
pub async fn ensure_fresh(provider: &dyn CredentialProvider) -> Result<()> {
    if provider.is_expired() {
        debug!("Access token expired, refreshing");
        provider.refresh().await?;
    }
    Ok(())
}
