use std::time::Duration;

use chrono::Utc;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tether_domain::constants::{CACHE_BUST_PARAM, DEFAULT_REQUEST_TIMEOUT_SECS};
use tracing::debug;

use crate::api::errors::{ApiError, ApiResult};

/// Single-attempt HTTP transport with timeout and cache busting.
///
/// Retries, failover and backoff live in the executor; this client only
/// performs one request and classifies the outcome.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    timeout: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> ApiResult<Self> {
        Self::builder().build()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create a request builder with the `_t=<epoch millis>` cache-busting
    /// query parameter already attached.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        let stamp = Utc::now().timestamp_millis().to_string();
        self.client.request(method, url).query(&[(CACHE_BUST_PARAM, stamp)])
    }

    /// Execute the request once.
    ///
    /// Any HTTP status is returned as `Ok`; only transport failures map to
    /// errors. Use [`error_for_status`] to classify non-2xx responses.
    pub async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let request = builder
            .build()
            .map_err(|err| ApiError::Internal(format!("failed to build request: {err}")))?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(self.map_transport_error(&err))
            }
        }
    }

    fn map_transport_error(&self, err: &reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else if err.is_builder() {
            ApiError::Config(format!("invalid request: {err}"))
        } else if err.is_decode() {
            ApiError::Serialization(err.to_string())
        } else {
            ApiError::Network(format!("HTTP request failed: {err}"))
        }
    }
}

/// Turn a non-2xx response into the matching [`ApiError`].
///
/// The response body (if any) becomes the error message.
pub async fn error_for_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("no response body").to_string()
    } else {
        body
    };
    Err(ApiError::from_status(status.as_u16(), message))
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: None,
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> ApiResult<HttpClient> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder
            .build()
            .map_err(|err| ApiError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(HttpClient { client, timeout: self.timeout })
    }
}
