//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use srcl::models::AppConfig;
use srcl::server::{build_router, AppState};

use super::mock_server::MockImageHost;

/// Test application wrapping the production router
pub struct TestApp {
    router: axum::Router,
}

impl TestApp {
    /// App with the default config; upstream fetches go to the real network
    pub fn new() -> Self {
        let state = AppState::from_config(AppConfig::default()).expect("Failed to create app state");
        Self {
            router: build_router(state),
        }
    }

    /// App whose outbound requests for `images.test` reach `host`
    pub fn with_host(host: &MockImageHost, config: AppConfig) -> Self {
        let proxy = host.proxy(&config.proxy);
        let client = host.client(&config.proxy);
        let state = AppState::with_parts(config, proxy, client).expect("Failed to create app state");
        Self::with_state(state)
    }

    /// App around prepared state
    pub fn with_state(state: AppState) -> Self {
        Self {
            router: build_router(state),
        }
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Method::GET, path).await
    }

    /// Make a request with an arbitrary method and empty body
    pub async fn send(&self, method: Method, path: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method(method)
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Get raw body bytes
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Header value as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Check if response is a PNG image
    pub fn is_png(&self) -> bool {
        self.body.len() >= 8 && &self.body[0..8] == b"\x89PNG\r\n\x1a\n"
    }
}
