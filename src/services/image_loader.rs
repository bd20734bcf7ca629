//! Image loading strategies for the dither renderer.
//!
//! A [`LoadCandidate`] is a URL plus the cross-origin mode it is requested
//! with. [`HttpImageLoader`] follows the browser model for readability: a
//! cross-origin image fetched without a cross-origin mode can be drawn but
//! its pixels cannot be read back, and one fetched in `Anonymous` mode only
//! loads at all when the response opts in with `Access-Control-Allow-Origin`.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::header;
use base64::Engine;
use image::{imageops::FilterType, RgbaImage};
use percent_encoding::percent_decode_str;
use srcl_halftone::PixelBuffer;
use std::sync::Arc;
use url::{Origin, Url};

use crate::api::headers::HeaderMapExt;
use crate::error::{LoadError, ReadbackError};
use crate::models::ProxyConfig;
use crate::services::image_proxy::{is_disallowed_host, ImageProxy};

/// How an image request identifies itself to cross-origin hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrossOrigin {
    /// No CORS request; cross-origin pixels stay unreadable.
    None,
    /// CORS request without credentials.
    Anonymous,
}

/// One entry of the ordered fallback list tried for a source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadCandidate {
    pub url: String,
    pub cross_origin: CrossOrigin,
}

impl LoadCandidate {
    pub fn new(url: impl Into<String>, cross_origin: CrossOrigin) -> Self {
        Self {
            url: url.into(),
            cross_origin,
        }
    }
}

/// A decoded bitmap and whether drawing it taints the surface.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    image: RgbaImage,
    tainted: bool,
}

impl DecodedImage {
    pub fn new(image: RgbaImage, tainted: bool) -> Self {
        Self { image, tainted }
    }

    /// Decode PNG, JPEG, GIF, WebP or BMP bytes.
    pub fn decode(bytes: &[u8], tainted: bool) -> Result<Self, LoadError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| LoadError::Decode(e.to_string()))?
            .to_rgba8();
        Ok(Self::new(image, tainted))
    }

    pub fn natural_size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn is_tainted(&self) -> bool {
        self.tainted
    }

    /// Draw at `width × height`, resampling with a triangle filter.
    pub fn draw(&self, width: u32, height: u32) -> Drawing {
        let image = if self.image.dimensions() == (width, height) {
            self.image.clone()
        } else {
            image::imageops::resize(&self.image, width, height, FilterType::Triangle)
        };
        Drawing {
            image,
            tainted: self.tainted,
        }
    }
}

/// An image drawn at its target size.
#[derive(Debug, Clone)]
pub struct Drawing {
    image: RgbaImage,
    tainted: bool,
}

impl Drawing {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Read the drawn pixels; fails for tainted drawings.
    pub fn read_pixels(&self) -> Result<PixelBuffer, ReadbackError> {
        if self.tainted {
            return Err(ReadbackError::Tainted);
        }
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return Err(ReadbackError::Empty { width, height });
        }
        Ok(PixelBuffer::from_raw(width, height, self.image.as_raw().clone())?)
    }
}

/// Loads and decodes one candidate.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, candidate: &LoadCandidate) -> Result<DecodedImage, LoadError>;
}

/// Loader for `data:`, `file:` and http(s) sources, relative to a page.
///
/// Same-origin requests to the proxy path are answered in-process when a
/// proxy is attached.
#[derive(Debug, Clone)]
pub struct HttpImageLoader {
    client: reqwest::Client,
    page: Url,
    proxy: Option<(Arc<ImageProxy>, String)>,
    allow_file_urls: bool,
    deny_private_hosts: bool,
}

impl HttpImageLoader {
    pub fn new(client: reqwest::Client, page: Url) -> Self {
        Self {
            client,
            page,
            proxy: None,
            allow_file_urls: true,
            deny_private_hosts: false,
        }
    }

    /// Loader with the proxy's timeout and user agent.
    pub fn from_config(config: &ProxyConfig, page: Url) -> Result<Self, reqwest::Error> {
        let client = ImageProxy::client_builder(config).build()?;
        Ok(Self::new(client, page))
    }

    /// Serve requests for `proxy_path` on the page origin through `proxy`.
    pub fn with_proxy(mut self, proxy: Arc<ImageProxy>, proxy_path: impl Into<String>) -> Self {
        self.proxy = Some((proxy, proxy_path.into()));
        self
    }

    /// Allow or refuse `file:` sources.
    pub fn allow_file_urls(mut self, allow: bool) -> Self {
        self.allow_file_urls = allow;
        self
    }

    /// Apply the proxy host denylist to direct cross-origin fetches.
    pub fn deny_private_hosts(mut self, deny: bool) -> Self {
        self.deny_private_hosts = deny;
        self
    }

    pub fn page(&self) -> &Url {
        &self.page
    }

    fn page_origin(&self) -> Origin {
        self.page.origin()
    }

    async fn load_http(&self, url: Url, cross_origin: CrossOrigin) -> Result<DecodedImage, LoadError> {
        let same_origin = url.origin() == self.page_origin();

        if same_origin {
            if let Some((proxy, path)) = &self.proxy {
                if url.path().trim_end_matches('/') == path.trim_end_matches('/') {
                    let target = url
                        .query_pairs()
                        .find(|(key, _)| key == "url")
                        .map(|(_, value)| value.into_owned());
                    tracing::debug!(proxied = ?target, "Loading through in-process proxy");
                    let bytes = proxy.resolve(target.as_deref()).await?.bytes().await?;
                    return decode_blocking(bytes, false).await;
                }
            }
        } else if self.deny_private_hosts && is_disallowed_host(url.host_str().unwrap_or_default()) {
            return Err(LoadError::UnsupportedSource(format!(
                "refusing to load from disallowed host {}",
                url.host_str().unwrap_or_default()
            )));
        }

        let cors = !same_origin && cross_origin == CrossOrigin::Anonymous;
        let page_origin = self.page_origin().ascii_serialization();

        let mut request = self
            .client
            .get(url.as_str())
            .header(header::ACCEPT, "image/*,*/*;q=0.8");
        if cors {
            request = request.header(header::ORIGIN, page_origin.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| LoadError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status(status));
        }

        if cors {
            let allowed = response
                .headers()
                .get_str(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_some_and(|value| value == "*" || value == page_origin);
            if !allowed {
                return Err(LoadError::CorsRejected(url.to_string()));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LoadError::Request(e.to_string()))?;

        decode_blocking(bytes, !same_origin && !cors).await
    }

    async fn load_file(&self, url: &Url) -> Result<DecodedImage, LoadError> {
        if !self.allow_file_urls {
            return Err(LoadError::UnsupportedSource(url.to_string()));
        }
        let path = url
            .to_file_path()
            .map_err(|_| LoadError::UnsupportedSource(url.to_string()))?;
        let bytes = tokio::fs::read(&path).await?;
        decode_blocking(Bytes::from(bytes), false).await
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, candidate: &LoadCandidate) -> Result<DecodedImage, LoadError> {
        if has_data_scheme(&candidate.url) {
            let bytes = decode_data_uri(&candidate.url)?;
            return decode_blocking(Bytes::from(bytes), false).await;
        }

        let url = self
            .page
            .join(candidate.url.trim())
            .map_err(|_| LoadError::UnsupportedSource(candidate.url.clone()))?;

        if matches!(url.scheme(), "http" | "https") {
            return self.load_http(url, candidate.cross_origin).await;
        }
        if url.scheme() == "file" {
            return self.load_file(&url).await;
        }
        Err(LoadError::UnsupportedSource(candidate.url.clone()))
    }
}

/// Decode off the async runtime.
async fn decode_blocking(bytes: Bytes, tainted: bool) -> Result<DecodedImage, LoadError> {
    tokio::task::spawn_blocking(move || DecodedImage::decode(&bytes, tainted))
        .await
        .map_err(|e| LoadError::Decode(format!("Decode task failed: {e}")))?
}

fn has_data_scheme(src: &str) -> bool {
    src.trim()
        .get(..5)
        .is_some_and(|head| head.eq_ignore_ascii_case("data:"))
}

/// Payload of a `data:` URI, base64 or percent-encoded.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, LoadError> {
    let uri = uri.trim();
    if !has_data_scheme(uri) {
        return Err(LoadError::InvalidDataUri);
    }
    let (meta, payload) = uri[5..].split_once(',').ok_or(LoadError::InvalidDataUri)?;

    let is_base64 = meta
        .rsplit(';')
        .next()
        .is_some_and(|last| last.trim().eq_ignore_ascii_case("base64"));

    if is_base64 {
        let cleaned: String = percent_decode_str(payload)
            .decode_utf8_lossy()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        base64::engine::general_purpose::STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|_| LoadError::InvalidDataUri)
    } else {
        Ok(percent_decode_str(payload).collect())
    }
}
