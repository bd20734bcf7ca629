//! Rewrites image URLs so their pixels stay readable after drawing.
//!
//! Cross-origin http(s) images are routed through the same-origin image
//! proxy. Relative paths, same-origin URLs, `data:`/`blob:` URIs and
//! already-proxied URLs pass through untouched, which keeps the rewrite
//! idempotent.
//!
//! When the input cannot be resolved as a URL it is returned unchanged
//! (fail open). Such a source may taint the drawing surface; the renderer
//! then shows it undithered.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub const DEFAULT_PROXY_ENDPOINT: &str = "/api/image-proxy";

/// Base used to resolve sources when there is no page location.
const FALLBACK_BASE: &str = "http://localhost/";

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeSourceOptions {
    /// Proxy location, relative (`/api/image-proxy`) or absolute.
    pub proxy_endpoint: String,
    /// When false, cross-origin sources are returned unchanged.
    pub allow_proxy: bool,
}

impl Default for SafeSourceOptions {
    fn default() -> Self {
        Self {
            proxy_endpoint: DEFAULT_PROXY_ENDPOINT.to_string(),
            allow_proxy: true,
        }
    }
}

impl SafeSourceOptions {
    pub fn without_proxy() -> Self {
        Self {
            allow_proxy: false,
            ..Self::default()
        }
    }

    /// Path component the proxy is served under, e.g. `/api/image-proxy`.
    pub fn proxy_path(&self) -> String {
        ProxyEndpoint::normalize(&self.proxy_endpoint).path
    }
}

/// Proxy endpoint split into the prefix used for rewriting and its path.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProxyEndpoint {
    endpoint: String,
    path: String,
}

impl ProxyEndpoint {
    fn normalize(endpoint: &str) -> Self {
        if endpoint.is_empty() {
            return Self {
                endpoint: String::new(),
                path: String::new(),
            };
        }

        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return match Url::parse(endpoint) {
                Ok(url) => {
                    let path = trim_trailing_slash(url.path());
                    Self {
                        endpoint: format!("{}{}", url.origin().ascii_serialization(), path),
                        path: if path.is_empty() { "/" } else { path }.to_string(),
                    }
                }
                Err(_) => Self {
                    endpoint: endpoint.to_string(),
                    path: endpoint.to_string(),
                },
            };
        }

        let endpoint = if endpoint.starts_with('/') {
            endpoint.to_string()
        } else {
            format!("/{endpoint}")
        };
        let path = trim_trailing_slash(&endpoint);
        Self {
            path: if path.is_empty() { "/" } else { path }.to_string(),
            endpoint,
        }
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    if path.len() > 1 && path.ends_with('/') {
        path.trim_end_matches('/')
    } else {
        path
    }
}

fn absolute_scheme() -> &'static Regex {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME.get_or_init(|| {
        Regex::new(r"^[a-zA-Z][a-zA-Z\d+.-]*:").expect("scheme pattern is a valid regex")
    })
}

fn has_prefix_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// `encodeURIComponent` over UTF-8.
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Return a source that is safe to read back after drawing, or `None` when
/// `src` is empty.
///
/// `page` is the location of the page that will draw the image. Without
/// one, sources resolve against `http://localhost/` and nothing counts as
/// same-origin.
pub fn get_safe_image_src(
    src: Option<&str>,
    page: Option<&Url>,
    options: &SafeSourceOptions,
) -> Option<String> {
    let trimmed = src?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let proxy = ProxyEndpoint::normalize(&options.proxy_endpoint);
    let has_endpoint = !options.proxy_endpoint.is_empty();

    if has_endpoint && (trimmed.starts_with(&proxy.endpoint) || trimmed.starts_with(&proxy.path)) {
        return Some(trimmed.to_string());
    }

    if has_prefix_ignore_case(trimmed, "data:") || has_prefix_ignore_case(trimmed, "blob:") {
        return Some(trimmed.to_string());
    }

    let has_scheme = absolute_scheme().is_match(trimmed);
    let protocol_relative = trimmed.starts_with("//");
    if !has_scheme && !protocol_relative {
        return Some(trimmed.to_string());
    }

    let resolved = match page {
        Some(page) => page.join(trimmed),
        None => Url::parse(FALLBACK_BASE).and_then(|base| base.join(trimmed)),
    };
    let Ok(resolved) = resolved else {
        tracing::debug!(src = %trimmed, "Source does not resolve, passing through");
        return Some(trimmed.to_string());
    };

    if has_endpoint && resolved.path().starts_with(&proxy.path) {
        return Some(trimmed.to_string());
    }

    if !matches!(resolved.scheme(), "http" | "https") {
        return Some(trimmed.to_string());
    }

    if page.is_some_and(|page| page.origin() == resolved.origin()) {
        return Some(trimmed.to_string());
    }

    if !options.allow_proxy {
        return Some(trimmed.to_string());
    }

    let target = if proxy.endpoint.is_empty() {
        options.proxy_endpoint.as_str()
    } else {
        proxy.endpoint.as_str()
    };
    Some(format!(
        "{target}?url={}",
        encode_uri_component(resolved.as_str())
    ))
}
