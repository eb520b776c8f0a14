//! Credential store adapters
//!
//! Token storage and refresh belong to the session subsystem. These adapters
//! cover the two cases the client handles on its own: no session at all, and
//! a token the host hands over and rotates explicitly.

use async_trait::async_trait;
use parking_lot::RwLock;
use tether_core::CredentialStore;

/// Credential store for anonymous clients
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

#[async_trait]
impl CredentialStore for NoCredentials {
    async fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// Credential store holding a host-supplied bearer token
#[derive(Debug, Default)]
pub struct StaticCredentials {
    token: RwLock<Option<String>>,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: RwLock::new(Some(token.into())) }
    }

    /// Replace the token, e.g. after the session subsystem refreshed it
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }
}

#[async_trait]
impl CredentialStore for StaticCredentials {
    async fn bearer_token(&self) -> Option<String> {
        self.token.read().clone().filter(|token| !token.is_empty())
    }
}
