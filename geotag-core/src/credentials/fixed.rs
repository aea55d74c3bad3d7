//! Fixed-token credentials for testing and local development.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use super::CredentialProvider;
use crate::error::{GeotagError, Result};

/// Credential provider with a fixed token and controllable expiry.
///
/// A refresh appends `-refreshed-<n>` to the token so tests can observe which
/// token an authenticated request carried.
/// WARNING: Do not use in production - the token is never validated!
pub struct StaticCredentials {
    base_token: String,
    token: RwLock<String>,
    expired: AtomicBool,
    fail_refresh: AtomicBool,
    refresh_count: AtomicUsize,
}

impl StaticCredentials {
    /// Create credentials holding a valid token.
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            base_token: token.clone(),
            token: RwLock::new(token),
            expired: AtomicBool::new(false),
            fail_refresh: AtomicBool::new(false),
            refresh_count: AtomicUsize::new(0),
        }
    }

    /// Create credentials whose token is already expired.
    pub fn expired(token: impl Into<String>) -> Self {
        let creds = Self::new(token);
        creds.expire();
        creds
    }

    /// Mark the current token as expired.
    pub fn expire(&self) {
        self.expired.store(true, Ordering::SeqCst);
    }

    /// Make subsequent refresh attempts fail.
    pub fn fail_refresh(&self, fail: bool) {
        self.fail_refresh.store(fail, Ordering::SeqCst);
    }

    /// Number of successful refreshes so far.
    pub fn refresh_count(&self) -> usize {
        self.refresh_count.load(Ordering::SeqCst)
    }
}

impl Default for StaticCredentials {
    fn default() -> Self {
        Self::new("test-token")
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    async fn refresh(&self) -> Result<()> {
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(GeotagError::CredentialError(
                "Refresh rejected by test credentials".into(),
            ));
        }

        let n = self.refresh_count.fetch_add(1, Ordering::SeqCst) + 1;
        let mut token = self.token.write().unwrap_or_else(|e| e.into_inner());
        *token = format!("{}-refreshed-{n}", self.base_token);
        self.expired.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn token(&self) -> String {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
