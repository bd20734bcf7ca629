//! Mock upstream image host.
//!
//! wiremock listens on 127.0.0.1, which the proxy refuses by name, so the
//! host is addressed as `images.test` and clients pin that name to the mock
//! server's socket.

use reqwest::Client;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use srcl::models::ProxyConfig;
use srcl::services::ImageProxy;

pub const HOST: &str = "images.test";

/// Wrapper around wiremock MockServer with convenience methods
pub struct MockImageHost {
    pub server: MockServer,
}

impl MockImageHost {
    /// Start a new mock image host
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    pub fn port(&self) -> u16 {
        self.server.address().port()
    }

    /// Public-looking URL for a path on this host
    pub fn url_for(&self, path: &str) -> String {
        format!("http://{HOST}:{}{path}", self.port())
    }

    /// Client configured like the proxy's, with `images.test` pinned here
    pub fn client(&self, config: &ProxyConfig) -> Client {
        ImageProxy::client_builder(config)
            .resolve(HOST, *self.server.address())
            .build()
            .expect("Failed to build pinned client")
    }

    /// Proxy whose upstream fetches reach this host
    pub fn proxy(&self, config: &ProxyConfig) -> ImageProxy {
        ImageProxy::with_client(self.client(config), config.streaming)
    }

    /// Serve `body` at `endpoint` with the given content type
    pub async fn mock_image(&self, endpoint: &str, body: Vec<u8>, content_type: &str) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body, content_type),
            )
            .mount(&self.server)
            .await;
    }

    /// Serve a custom response at `endpoint`
    pub async fn mock_response(&self, endpoint: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Respond with a bare status at `endpoint`
    pub async fn mock_status(&self, endpoint: &str, status: u16) {
        self.mock_response(endpoint, ResponseTemplate::new(status))
            .await;
    }

    /// Requests received so far
    pub async fn received(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}
