use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::headers::{cors_headers, HeaderMapExt, ALLOWED_METHODS};
use crate::error::ProxyError;
use crate::services::ImageProxy;

/// Query parameters for the image proxy
#[derive(Debug, Default, Deserialize)]
pub struct ProxyQuery {
    /// Absolute http(s) URL of the remote image
    #[serde(default)]
    pub url: Option<String>,
}

/// Fetch a remote image on behalf of the page
///
/// Streams the upstream body back with permissive CORS headers so the
/// browser treats the image as same-origin and its pixels stay readable.
#[utoipa::path(
    get,
    path = "/api/image-proxy",
    responses(
        (status = 200, description = "Upstream image bytes"),
        (status = 400, description = "Missing, invalid or disallowed url", content_type = "text/plain"),
        (status = 502, description = "Upstream fetch failed or returned an error", content_type = "text/plain"),
    ),
    params(
        ("url" = String, Query, description = "Absolute http(s) URL of the image"),
    ),
    tag = "Images"
)]
pub async fn handle_image_proxy(
    State(proxy): State<Arc<ImageProxy>>,
    Query(query): Query<ProxyQuery>,
) -> Result<Response, ProxyError> {
    let image = proxy.resolve(query.url.as_deref()).await?;

    tracing::info!(
        content_type = image.content_type().unwrap_or("unknown"),
        bytes = ?image.headers().get_parsed::<u64>(header::CONTENT_LENGTH),
        streaming = image.is_streaming(),
        "Proxied image"
    );

    Ok(image.into_response())
}

/// CORS preflight for the image proxy
#[utoipa::path(
    options,
    path = "/api/image-proxy",
    responses(
        (status = 204, description = "CORS headers, empty body"),
    ),
    tag = "Images"
)]
pub async fn handle_image_proxy_preflight() -> Response {
    (StatusCode::NO_CONTENT, cors_headers()).into_response()
}

/// Any method other than GET and OPTIONS.
pub async fn handle_method_not_allowed() -> Response {
    let mut response = ProxyError::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
        .into_response();
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_preflight_is_empty_204_with_cors() {
        let response = handle_image_proxy_preflight().await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_METHODS)
                .unwrap(),
            "GET, OPTIONS"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let response = handle_method_not_allowed().await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET, OPTIONS");
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Method Not Allowed");
    }

    #[tokio::test]
    async fn test_missing_url_is_rejected() {
        let proxy = Arc::new(ImageProxy::with_client(reqwest::Client::new(), true));
        let err = handle_image_proxy(State(proxy), Query(ProxyQuery::default()))
            .await
            .unwrap_err();
        assert_eq!(err, ProxyError::missing_url());
    }
}
