use std::net::TcpListener;

use tether_domain::ClientConfig;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Base URL of a local port with nothing listening on it.
pub fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

/// Client configuration with short timers suitable for tests.
pub fn fast_config(primary: &str, backups: &[&str]) -> ClientConfig {
    let mut config = ClientConfig::with_primary(primary);
    config.endpoints.backup_urls = backups.iter().map(|url| url.to_string()).collect();
    config.http.request_timeout_secs = 2;
    config.http.probe_timeout_secs = 1;
    config.retry.base_delay_ms = 10;
    config.polling.online_settle_ms = 20;
    config.queue.batch_pause_ms = 5;
    config
}

/// Mock server whose health endpoint answers 200.
pub async fn healthy_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}
