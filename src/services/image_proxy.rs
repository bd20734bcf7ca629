//! Same-origin image proxy.
//!
//! Validates the target URL, refuses loopback/private/link-local hosts,
//! fetches the resource and hands back the body with permissive CORS and
//! CDN cache headers. The proxy keeps no content cache of its own.
//!
//! The host check is a best-effort match on the hostname string. DNS is not
//! consulted, so a public name that resolves to a private address (DNS
//! rebinding) is fetched.

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::TryStreamExt;
use regex::RegexSet;
use std::sync::OnceLock;
use url::Url;

use crate::api::headers::{cors_headers, HeaderMapExt, CACHE_CONTROL_VALUE};
use crate::error::ProxyError;
use crate::models::ProxyConfig;

const ACCEPT_VALUE: &str = "image/*,*/*;q=0.8";
const MAX_REDIRECTS: usize = 10;
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const DISALLOWED_HOST_PATTERNS: &[&str] = &[
    r"(?i)^localhost$",
    r"(?i)^127\.\d{1,3}\.\d{1,3}\.\d{1,3}$",
    r"(?i)^\[?::1\]?$",
    r"(?i)^0\.0\.0\.0$",
    r"(?i)^10\.\d{1,3}\.\d{1,3}\.\d{1,3}$",
    r"(?i)^192\.168\.\d{1,3}\.\d{1,3}$",
    r"(?i)^172\.(1[6-9]|2\d|3[0-1])\.\d{1,3}\.\d{1,3}$",
    r"(?i)^169\.254\.\d{1,3}\.\d{1,3}$",
    r"(?i)\.local$",
];

fn disallowed_hosts() -> &'static RegexSet {
    static HOSTS: OnceLock<RegexSet> = OnceLock::new();
    HOSTS.get_or_init(|| {
        RegexSet::new(DISALLOWED_HOST_PATTERNS).expect("host patterns are valid regexes")
    })
}

/// Whether `hostname` is loopback, private, link-local or mDNS by name.
pub fn is_disallowed_host(hostname: &str) -> bool {
    disallowed_hosts().is_match(hostname)
}

/// Check a proxy target without fetching it.
pub fn validate_target(target: Option<&str>) -> Result<Url, ProxyError> {
    let target = target
        .filter(|t| !t.is_empty())
        .ok_or_else(ProxyError::missing_url)?;

    let remote = Url::parse(target).map_err(|_| ProxyError::invalid_url())?;

    if !matches!(remote.scheme(), "http" | "https") {
        return Err(ProxyError::unsupported_protocol());
    }

    if is_disallowed_host(remote.host_str().unwrap_or_default()) {
        return Err(ProxyError::disallowed_host());
    }

    Ok(remote)
}

/// Upstream body, either still streaming or fully read.
pub enum ProxiedBody {
    Stream(reqwest::Response),
    Buffered(Bytes),
}

impl std::fmt::Debug for ProxiedBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxiedBody::Stream(_) => f.write_str("Stream"),
            ProxiedBody::Buffered(bytes) => write!(f, "Buffered({} bytes)", bytes.len()),
        }
    }
}

/// A successful proxy resolution: response headers plus the upstream body.
#[derive(Debug)]
pub struct ProxiedImage {
    headers: HeaderMap,
    body: ProxiedBody,
}

impl ProxiedImage {
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get_str(header::CONTENT_TYPE)
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.body, ProxiedBody::Stream(_))
    }

    /// Read the whole body.
    pub async fn bytes(self) -> Result<Bytes, ProxyError> {
        match self.body {
            ProxiedBody::Buffered(bytes) => Ok(bytes),
            ProxiedBody::Stream(upstream) => upstream.bytes().await.map_err(|e| {
                tracing::warn!(error = %e, "Upstream body failed");
                ProxyError::fetch_failed()
            }),
        }
    }
}

impl IntoResponse for ProxiedImage {
    fn into_response(self) -> Response {
        let body = match self.body {
            ProxiedBody::Buffered(bytes) => Body::from(bytes),
            ProxiedBody::Stream(upstream) => {
                let url = upstream.url().to_string();
                Body::from_stream(upstream.bytes_stream().inspect_err(move |e| {
                    tracing::warn!(url = %url, error = %e, "Upstream stream ended with an error");
                }))
            }
        };

        let mut response = Response::new(body);
        *response.headers_mut() = self.headers;
        response
    }
}

/// Image proxy over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ImageProxy {
    client: reqwest::Client,
    streaming: bool,
}

impl ImageProxy {
    pub fn new(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        let client = Self::client_builder(config).build()?;
        Ok(Self::with_client(client, config.streaming))
    }

    /// Client settings used for upstream fetches: user agent, timeout and
    /// a bounded redirect chain.
    pub fn client_builder(config: &ProxyConfig) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
    }

    pub fn with_client(client: reqwest::Client, streaming: bool) -> Self {
        Self { client, streaming }
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Validate `target`, fetch it and prepare the passthrough response.
    pub async fn resolve(&self, target: Option<&str>) -> Result<ProxiedImage, ProxyError> {
        let remote = validate_target(target)?;

        tracing::debug!(url = %remote, "Proxying image");

        let upstream = self
            .client
            .get(remote.as_str())
            .header(header::ACCEPT, ACCEPT_VALUE)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %remote, error = %e, "Upstream fetch failed");
                ProxyError::fetch_failed()
            })?;

        let status = upstream.status();
        if !status.is_success() || is_bodiless(status) {
            tracing::warn!(url = %remote, status = %status, "Upstream rejected proxy request");
            return Err(ProxyError::upstream(status));
        }

        let headers = success_headers(upstream.headers());

        let body = if self.streaming {
            ProxiedBody::Stream(upstream)
        } else {
            let bytes = upstream.bytes().await.map_err(|e| {
                tracing::warn!(url = %remote, error = %e, "Upstream body failed");
                ProxyError::fetch_failed()
            })?;
            ProxiedBody::Buffered(bytes)
        };

        Ok(ProxiedImage { headers, body })
    }
}

fn is_bodiless(status: StatusCode) -> bool {
    matches!(status, StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT)
}

/// CORS set, cache hints and the forwarded upstream metadata.
pub fn success_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = cors_headers();

    let content_type = upstream
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(CACHE_CONTROL_VALUE),
    );

    upstream.forward_to(&mut headers, header::CONTENT_LENGTH);
    upstream.forward_to(&mut headers, header::ETAG);
    upstream.forward_to(&mut headers, header::LAST_MODIFIED);

    headers
}
