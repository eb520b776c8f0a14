//! Request dispatch
//!
//! Turns a serializable [`RequestDescriptor`] into an HTTP call against a
//! specific endpoint. Both live calls and queue replay go through the same
//! method-keyed route table, so a replayed request is byte-for-byte the
//! request the caller would have sent.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tether_core::CredentialStore;
use tether_domain::{Endpoint, HttpMethod, RequestDescriptor};
use tracing::{debug, instrument};

use super::auth::NoCredentials;
use super::errors::{ApiError, ApiResult};
use crate::http::{error_for_status, HttpClient};

/// Sends a described request to one endpoint
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Send `request` to `endpoint` and return the decoded JSON body
    ///
    /// Empty bodies (including 204) decode to `Value::Null`.
    async fn dispatch(&self, endpoint: &Endpoint, request: &RequestDescriptor) -> ApiResult<Value>;
}

/// How a method's request is shaped on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
struct Route {
    verb: Method,
    sends_body: bool,
}

fn route(method: HttpMethod) -> Route {
    match method {
        HttpMethod::Get => Route { verb: Method::GET, sends_body: false },
        HttpMethod::Delete => Route { verb: Method::DELETE, sends_body: false },
        HttpMethod::Post => Route { verb: Method::POST, sends_body: true },
        HttpMethod::Put => Route { verb: Method::PUT, sends_body: true },
        HttpMethod::Patch => Route { verb: Method::PATCH, sends_body: true },
    }
}

/// [`Dispatch`] over the shared HTTP transport with bearer authentication
pub struct HttpDispatcher {
    http: HttpClient,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpDispatcher {
    pub fn new(http: HttpClient) -> Self {
        Self { http, credentials: Arc::new(NoCredentials) }
    }

    pub fn with_credentials(http: HttpClient, credentials: Arc<dyn CredentialStore>) -> Self {
        Self { http, credentials }
    }
}

#[async_trait]
impl Dispatch for HttpDispatcher {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.endpoint, url = %endpoint.url))]
    async fn dispatch(&self, endpoint: &Endpoint, request: &RequestDescriptor) -> ApiResult<Value> {
        let route = route(request.method);
        let url = endpoint.join(&request.endpoint);

        let mut builder = self.http.request(route.verb, &url);
        if let Some(token) = self.credentials.bearer_token().await {
            builder = builder.bearer_auth(token);
        }
        if route.sends_body {
            builder = builder.json(request.payload.as_ref().unwrap_or(&Value::Null));
        }

        let response = error_for_status(self.http.send(builder).await?).await?;
        if response.status() == StatusCode::NO_CONTENT {
            debug!("Request succeeded with no content");
            return Ok(Value::Null);
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::Network(format!("failed to read response body: {err}")))?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::auth::StaticCredentials;

    fn dispatcher() -> HttpDispatcher {
        HttpDispatcher::with_credentials(
            HttpClient::new().unwrap(),
            Arc::new(StaticCredentials::new("secret-token")),
        )
    }

    #[test]
    fn route_table_matches_method_semantics() {
        for method in [
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Patch,
            HttpMethod::Delete,
        ] {
            let route = route(method);
            assert_eq!(route.sends_body, method.carries_body(), "{method}");
            assert_eq!(route.verb.as_str(), method.to_string());
        }
    }

    #[tokio::test]
    async fn post_sends_json_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .and(header("authorization", "Bearer secret-token"))
            .and(body_json(json!({"title": "water plants"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = Endpoint::primary(server.uri()).unwrap();
        let request = RequestDescriptor::post("/tasks", json!({"title": "water plants"}));
        let body = dispatcher().dispatch(&endpoint, &request).await.unwrap();
        assert_eq!(body, json!({"id": 7}));
    }

    #[tokio::test]
    async fn get_sends_no_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Ada"})))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = Endpoint::primary(server.uri()).unwrap();
        let body = dispatcher().dispatch(&endpoint, &RequestDescriptor::get("/profile")).await.unwrap();
        assert_eq!(body["name"], "Ada");

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].body.is_empty());
    }

    #[tokio::test]
    async fn no_content_decodes_to_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/tasks/7"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let endpoint = Endpoint::primary(server.uri()).unwrap();
        let request = RequestDescriptor::new(HttpMethod::Delete, "/tasks/7", None);
        assert_eq!(dispatcher().dispatch(&endpoint, &request).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn anonymous_dispatch_omits_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let endpoint = Endpoint::primary(server.uri()).unwrap();
        let anonymous = HttpDispatcher::new(HttpClient::new().unwrap());
        let body = anonymous.dispatch(&endpoint, &RequestDescriptor::get("/feed")).await.unwrap();
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn status_errors_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(409).set_body_string("conflict"))
            .mount(&server)
            .await;

        let endpoint = Endpoint::primary(server.uri()).unwrap();
        let request = RequestDescriptor::new(HttpMethod::Put, "/tasks/1", Some(json!({})));
        let err = dispatcher().dispatch(&endpoint, &request).await.unwrap_err();
        assert!(matches!(err, ApiError::ClientRequest { status: 409, .. }));
    }
}
