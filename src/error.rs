use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::headers::cors_headers;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Image proxy failure with the HTTP status it maps to.
///
/// Input errors are 400s, upstream transport errors are 502s. The message is
/// sent verbatim as a plain-text body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProxyError {
    pub status: StatusCode,
    pub message: String,
}

impl ProxyError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn missing_url() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Missing required url parameter")
    }

    pub fn invalid_url() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid URL")
    }

    pub fn unsupported_protocol() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Only http and https protocols are allowed",
        )
    }

    pub fn disallowed_host() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Refusing to proxy disallowed host")
    }

    pub fn fetch_failed() -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "Failed to fetch the remote resource")
    }

    /// Non-success or bodiless upstream response.
    pub fn upstream(status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or("");
        Self::new(
            StatusCode::BAD_GATEWAY,
            format!("Upstream responded with {} {}", status.as_u16(), reason),
        )
    }

    /// Whether the error was caused by the request rather than the upstream.
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        plain_text_response(self.status, self.message)
    }
}

/// Errors from the halftone preview endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Failed to load image: {0}")]
    LoadFailed(String),

    #[error("Image pixels are not readable")]
    Unreadable,

    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownTheme(_) => StatusCode::BAD_REQUEST,
            ApiError::LoadFailed(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unreadable => StatusCode::BAD_GATEWAY,
            ApiError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        plain_text_response(status, self.to_string())
    }
}

/// A theme color could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Undefined theme variable --{0}")]
    UndefinedVariable(String),

    #[error("Theme variable --{0} references itself")]
    Cycle(String),

    #[error("Theme variable --{0} nests var() too deeply")]
    TooDeep(String),

    #[error("Theme has no ambient {0} color")]
    NoAmbient(&'static str),

    #[error("Color resolver unavailable: {0}")]
    Unavailable(String),
}

/// An image candidate could not be fetched or decoded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unsupported image source: {0}")]
    UnsupportedSource(String),

    #[error("Invalid data URI")]
    InvalidDataUri,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Upstream responded with {0}")]
    Status(reqwest::StatusCode),

    #[error("Cross-origin response for {0} is not CORS-enabled")]
    CorsRejected(String),

    #[error("Proxy rejected the request: {0}")]
    Proxy(#[from] ProxyError),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pixels of a drawn image cannot be read back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadbackError {
    #[error("The image was drawn from a cross-origin source without CORS approval")]
    Tainted,

    #[error("Image has no pixels: {width}x{height}")]
    Empty { width: u32, height: u32 },

    #[error("Pixel buffer error: {0}")]
    Buffer(#[from] srcl_halftone::BufferError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PNG encode error: {0}")]
    PngEncode(String),

    #[error("Empty image: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Plain-text error body carrying the permissive CORS headers, so browser
/// callers can read the message.
fn plain_text_response(status: StatusCode, message: String) -> Response {
    let mut response = (status, message).into_response();
    let headers = response.headers_mut();
    headers.extend(cors_headers());
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    response
}
