//! Backend endpoints and the registry that orders them

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::DEFAULT_HEALTH_PATH;
use crate::errors::{Result, TetherError};
use crate::impl_wire_name_conversions;

/// Whether an endpoint is the preferred instance or an alternate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    Primary,
    Backup,
}

impl_wire_name_conversions!(EndpointRole {
    Primary => "primary",
    Backup => "backup",
});

/// A single backend base URL
///
/// The URL is stored without a trailing slash so request paths can be
/// appended directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub url: String,
    pub role: EndpointRole,
}

impl Endpoint {
    /// Create an endpoint after validating the base URL
    ///
    /// # Errors
    ///
    /// Returns `TetherError::Config` if the URL is not an absolute
    /// http(s) URL.
    pub fn new(url: impl AsRef<str>, role: EndpointRole) -> Result<Self> {
        let raw = url.as_ref().trim();
        let parsed = Url::parse(raw)
            .map_err(|e| TetherError::Config(format!("Invalid endpoint URL '{raw}': {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TetherError::Config(format!(
                "Endpoint URL '{raw}' must use http or https"
            )));
        }

        Ok(Self { url: raw.trim_end_matches('/').to_string(), role })
    }

    /// Shorthand for a primary endpoint
    pub fn primary(url: impl AsRef<str>) -> Result<Self> {
        Self::new(url, EndpointRole::Primary)
    }

    /// Shorthand for a backup endpoint
    pub fn backup(url: impl AsRef<str>) -> Result<Self> {
        Self::new(url, EndpointRole::Backup)
    }

    pub fn is_backup(&self) -> bool {
        self.role == EndpointRole::Backup
    }

    /// Join a request path onto this endpoint's base URL
    pub fn join(&self, path: &str) -> String {
        if path.is_empty() {
            return self.url.clone();
        }
        if path.starts_with('/') {
            format!("{}{}", self.url, path)
        } else {
            format!("{}/{}", self.url, path)
        }
    }
}

/// Static list of one primary and N backup endpoints plus the health path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRegistry {
    primary: Endpoint,
    backups: Vec<Endpoint>,
    health_path: String,
}

impl EndpointRegistry {
    /// Build a registry from raw URLs
    ///
    /// # Errors
    ///
    /// Returns `TetherError::Config` if any URL is invalid or a backup
    /// duplicates another endpoint.
    pub fn new<S: AsRef<str>>(
        primary_url: &str,
        backup_urls: &[S],
        health_path: &str,
    ) -> Result<Self> {
        let primary = Endpoint::primary(primary_url)?;
        let mut backups: Vec<Endpoint> = Vec::with_capacity(backup_urls.len());

        for raw in backup_urls {
            let backup = Endpoint::backup(raw)?;
            if backup.url == primary.url || backups.iter().any(|b| b.url == backup.url) {
                return Err(TetherError::Config(format!(
                    "Duplicate endpoint URL '{}'",
                    backup.url
                )));
            }
            backups.push(backup);
        }

        let health_path = normalize_health_path(health_path);

        Ok(Self { primary, backups, health_path })
    }

    pub fn primary(&self) -> &Endpoint {
        &self.primary
    }

    pub fn backups(&self) -> &[Endpoint] {
        &self.backups
    }

    pub fn health_path(&self) -> &str {
        &self.health_path
    }

    /// Endpoints in probe order: primary first, then backups as configured
    pub fn ordered(&self) -> Vec<Endpoint> {
        std::iter::once(self.primary.clone()).chain(self.backups.iter().cloned()).collect()
    }

    /// Health check URL for an endpoint
    pub fn health_url(&self, endpoint: &Endpoint) -> String {
        endpoint.join(&self.health_path)
    }

    /// Look up a configured endpoint by its base URL
    pub fn find(&self, url: &str) -> Option<&Endpoint> {
        let url = url.trim_end_matches('/');
        std::iter::once(&self.primary).chain(self.backups.iter()).find(|e| e.url == url)
    }
}

fn normalize_health_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        DEFAULT_HEALTH_PATH.to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
