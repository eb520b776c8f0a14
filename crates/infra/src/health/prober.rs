//! HTTP health prober
//!
//! Issues a bounded `GET {endpoint}{health_path}` and treats exactly HTTP 200
//! as healthy. The body is ignored. Every failure mode (other statuses,
//! refused connections, timeouts) is reported as unreachable rather than as
//! an error.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Method;
use tether_core::HealthProbe;
use tether_domain::constants::DEFAULT_PROBE_TIMEOUT_SECS;
use tether_domain::{Endpoint, HealthCheckResult};
use tracing::{debug, instrument};

use crate::api::errors::ApiResult;
use crate::http::HttpClient;

/// [`HealthProbe`] backed by the shared HTTP transport
#[derive(Clone)]
pub struct HttpHealthProber {
    http: HttpClient,
    health_path: String,
}

impl HttpHealthProber {
    /// Create a prober with the default 5 s probe timeout
    pub fn new(health_path: impl Into<String>) -> ApiResult<Self> {
        Self::with_timeout(health_path, Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS))
    }

    pub fn with_timeout(health_path: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { http, health_path: health_path.into() })
    }

    pub fn health_path(&self) -> &str {
        &self.health_path
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProber {
    #[instrument(skip(self), fields(url = %endpoint.url))]
    async fn probe(&self, endpoint: &Endpoint) -> HealthCheckResult {
        let url = endpoint.join(&self.health_path);
        let started = Instant::now();

        match self.http.send(self.http.request(Method::GET, &url)).await {
            Ok(response) => {
                let status = response.status().as_u16();
                let latency = started.elapsed();
                if status == 200 {
                    debug!(status, latency_ms = latency.as_millis() as u64, "Endpoint healthy");
                    HealthCheckResult::reachable(endpoint.clone(), status, latency)
                } else {
                    debug!(status, "Endpoint answered health check with non-200 status");
                    HealthCheckResult::unreachable(endpoint.clone(), Some(status), latency)
                }
            }
            Err(err) => {
                debug!(error = %err, "Health check failed");
                HealthCheckResult::unreachable(endpoint.clone(), None, started.elapsed())
            }
        }
    }
}
