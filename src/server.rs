//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::api::{self, HalftoneQuery, ProxyQuery};
use crate::assets::AssetLoader;
use crate::error::{ApiError, ProxyError};
use crate::models::{AppConfig, ThemeSheet};
use crate::services::safe_source::DEFAULT_PROXY_ENDPOINT;
use crate::services::{HttpImageLoader, ImageLoader, ImageProxy};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub proxy: Arc<ImageProxy>,
    pub loader: Arc<dyn ImageLoader>,
    pub themes: Arc<ThemeSheet>,
    pub page: Arc<Url>,
}

impl AppState {
    /// State with an outbound client built from the proxy config.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let proxy = ImageProxy::new(&config.proxy)?;
        Self::with_proxy(config, proxy)
    }

    /// State around an existing proxy; the preview loader shares it.
    pub fn with_proxy(config: AppConfig, proxy: ImageProxy) -> anyhow::Result<Self> {
        let client = ImageProxy::client_builder(&config.proxy).build()?;
        Self::with_parts(config, proxy, client)
    }

    /// State around an existing proxy and the client used for direct loads.
    ///
    /// The preview loader runs on behalf of remote callers, so it refuses
    /// `file:` sources and private hosts.
    pub fn with_parts(
        config: AppConfig,
        proxy: ImageProxy,
        loader_client: reqwest::Client,
    ) -> anyhow::Result<Self> {
        let page = config.server.page_url()?;
        let proxy = Arc::new(proxy);
        let loader = HttpImageLoader::new(loader_client, page.clone())
            .with_proxy(proxy.clone(), proxy_route(&config))
            .allow_file_urls(false)
            .deny_private_hosts(true);

        Ok(Self {
            themes: Arc::new(config.themes.clone()),
            config: Arc::new(config),
            proxy,
            loader: Arc::new(loader),
            page: Arc::new(page),
        })
    }
}

/// Create application state from an asset loader.
pub fn create_app_state(asset_loader: Arc<AssetLoader>) -> anyhow::Result<AppState> {
    let config = AppConfig::load_from_assets(&asset_loader);
    AppState::from_config(config)
}

/// Path the proxy is mounted at.
fn proxy_route(config: &AppConfig) -> String {
    let path = config.proxy.safe_source_options().proxy_path();
    if path.starts_with('/') {
        path
    } else {
        tracing::warn!(endpoint = %config.proxy.endpoint, "Unusable proxy endpoint, mounting at default path");
        DEFAULT_PROXY_ENDPOINT.to_string()
    }
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    let proxy_path = proxy_route(&state.config);

    Router::new()
        .route(
            &proxy_path,
            get(handle_image_proxy)
                .options(api::handle_image_proxy_preflight)
                .fallback(api::handle_method_not_allowed),
        )
        .route("/api/halftone", get(handle_halftone))
        // Health check
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// Wrapper handlers to extract state components for the underlying API handlers

async fn handle_image_proxy(
    State(state): State<AppState>,
    query: Query<ProxyQuery>,
) -> Result<Response, ProxyError> {
    api::handle_image_proxy(State(state.proxy), query).await
}

async fn handle_halftone(
    State(state): State<AppState>,
    query: Query<HalftoneQuery>,
) -> Result<Response, ApiError> {
    api::handle_halftone(
        State(state.config),
        State(state.themes),
        State(state.loader),
        State(state.page),
        query,
    )
    .await
}
