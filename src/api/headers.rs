//! Header helpers for the image proxy: the CORS set and upstream passthrough.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

/// `Access-Control-Max-Age` and CDN freshness, in seconds.
pub const ONE_DAY_SECS: &str = "86400";

pub const CACHE_CONTROL_VALUE: &str =
    "public, max-age=0, s-maxage=86400, stale-while-revalidate=86400";

pub const ALLOWED_METHODS: &str = "GET, OPTIONS";

const ALLOWED_HEADERS: &str = "Content-Type, Authorization, X-Requested-With, Range";

static TIMING_ALLOW_ORIGIN: HeaderName = HeaderName::from_static("timing-allow-origin");

/// Permissive CORS headers attached to every proxy response, errors included.
pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(5);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(ONE_DAY_SECS),
    );
    headers.insert(TIMING_ALLOW_ORIGIN.clone(), HeaderValue::from_static("*"));
    headers
}

/// Extension trait for reading and forwarding header values.
pub trait HeaderMapExt {
    /// Get a header value as a string, returning None if missing or not visible ASCII.
    fn get_str(&self, name: impl header::AsHeaderName) -> Option<&str>;

    /// Get a header value parsed as a type, returning None if missing or invalid.
    fn get_parsed<T: std::str::FromStr>(&self, name: impl header::AsHeaderName) -> Option<T>;

    /// Copy `name` into `target` when present.
    fn forward_to(&self, target: &mut HeaderMap, name: HeaderName);
}

impl HeaderMapExt for HeaderMap {
    fn get_str(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }

    fn get_parsed<T: std::str::FromStr>(&self, name: impl header::AsHeaderName) -> Option<T> {
        self.get_str(name).and_then(|v| v.parse().ok())
    }

    fn forward_to(&self, target: &mut HeaderMap, name: HeaderName) {
        if let Some(value) = self.get(&name) {
            target.insert(name, value.clone());
        }
    }
}
