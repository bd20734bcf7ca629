//! Load-once, re-dither-often image rendering.
//!
//! A [`DitherRenderer`] owns one drawing surface. Setting a source resolves
//! it through the safe-source rules, tries each load candidate in turn and
//! keeps the pristine pixels of the first success. Changing only the dither
//! options re-runs the halftone engine on a copy of those pixels without
//! touching the loader.
//!
//! ```text
//!            set_source            decode + read back
//!   Idle ───────────────▶ Loading ───────────────────▶ Ready
//!    ▲                      │  all candidates fail       │
//!    │ empty source         └──────────────▶ Failed      │ set_options
//!    └──────────────────────────────────────────────────┘ (re-dither only)
//! ```
//!
//! Every identity change bumps a generation counter; a load that finishes
//! under an older generation is dropped. State changes are published while
//! the lock that guards the generation is held.

use srcl_halftone::{apply_dither, DitherOptions, PixelBuffer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use url::Url;

use crate::error::ReadbackError;
use crate::services::image_loader::{CrossOrigin, DecodedImage, ImageLoader, LoadCandidate};
use crate::services::safe_source::{get_safe_image_src, SafeSourceOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderState {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// What the drawing surface currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surface {
    Blank,
    /// The undithered image is drawn but its pixels cannot be read.
    Tainted { width: u32, height: u32 },
    Pixels(PixelBuffer),
}

impl Surface {
    pub fn pixels(&self) -> Option<&PixelBuffer> {
        match self {
            Surface::Pixels(pixels) => Some(pixels),
            _ => None,
        }
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Surface::Blank => None,
            Surface::Tainted { width, height } => Some((*width, *height)),
            Surface::Pixels(pixels) => Some((pixels.width(), pixels.height())),
        }
    }
}

/// `(safe source, width, height)`; a change of any part reloads.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceIdentity {
    src: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Pristine pixels of the current identity.
#[derive(Debug)]
struct BaseImageCache {
    pixels: PixelBuffer,
}

#[derive(Debug)]
struct Inner {
    identity: Option<SourceIdentity>,
    generation: u64,
    options: DitherOptions,
    base: Option<BaseImageCache>,
    surface: Surface,
    task: Option<AbortHandle>,
}

impl Inner {
    /// Restore the pristine pixels and dither them with the current options.
    fn render_current(&mut self) {
        if let Some(base) = &self.base {
            let mut pixels = base.pixels.clone();
            apply_dither(&mut pixels, &self.options);
            self.surface = Surface::Pixels(pixels);
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    state: watch::Sender<RenderState>,
    loads: AtomicUsize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Largest surface a load may draw, in pixels.
pub const MAX_SURFACE_PIXELS: u64 = 4096 * 4096;

pub struct DitherRenderer {
    loader: Arc<dyn ImageLoader>,
    page: Url,
    safe_options: SafeSourceOptions,
    max_pixels: u64,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for DitherRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DitherRenderer")
            .field("page", &self.page.as_str())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl DitherRenderer {
    pub fn new(loader: Arc<dyn ImageLoader>, page: Url, safe_options: SafeSourceOptions) -> Self {
        let (state, _) = watch::channel(RenderState::Idle);
        Self {
            loader,
            page,
            safe_options,
            max_pixels: MAX_SURFACE_PIXELS,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    identity: None,
                    generation: 0,
                    options: DitherOptions::default(),
                    base: None,
                    surface: Surface::Blank,
                    task: None,
                }),
                state,
                loads: AtomicUsize::new(0),
            }),
        }
    }

    /// Cap the drawn area; larger targets shrink keeping their aspect ratio.
    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels.max(1);
        self
    }

    /// Point the renderer at a new source and size.
    ///
    /// Returns the spawned load, or `None` when nothing needs loading
    /// (unchanged identity or empty source). Must be called inside a tokio
    /// runtime.
    pub fn set_source(
        &self,
        src: Option<&str>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Option<JoinHandle<()>> {
        let safe_src = get_safe_image_src(src, Some(&self.page), &self.safe_options);
        let identity = SourceIdentity {
            src: safe_src.clone(),
            width,
            height,
        };

        let mut inner = self.shared.lock();
        if inner.identity.as_ref() == Some(&identity) {
            return None;
        }

        inner.identity = Some(identity);
        inner.generation += 1;
        inner.base = None;
        inner.surface = Surface::Blank;
        if let Some(task) = inner.task.take() {
            task.abort();
        }
        let generation = inner.generation;

        let Some(safe_src) = safe_src else {
            self.shared.state.send_replace(RenderState::Idle);
            return None;
        };

        let candidates = load_candidates(&safe_src, src.map(str::trim).unwrap_or_default());
        tracing::debug!(src = %safe_src, candidates = candidates.len(), generation, "Loading image");

        self.shared.state.send_replace(RenderState::Loading);

        let shared = self.shared.clone();
        let loader = self.loader.clone();
        let max_pixels = self.max_pixels;
        let handle = tokio::spawn(async move {
            let decoded = load_first(loader.as_ref(), &shared, &candidates).await;
            finish_load(&shared, generation, decoded, (width, height), max_pixels).await;
        });
        inner.task = Some(handle.abort_handle());
        Some(handle)
    }

    /// Replace the dither options; re-renders from the cached pixels when ready.
    pub fn set_options(&self, options: DitherOptions) {
        let mut inner = self.shared.lock();
        if inner.options == options {
            return;
        }
        inner.options = options;
        if *self.shared.state.borrow() == RenderState::Ready {
            inner.render_current();
        }
    }

    pub fn options(&self) -> DitherOptions {
        self.shared.lock().options.clone()
    }

    pub fn state(&self) -> RenderState {
        *self.shared.state.borrow()
    }

    pub fn surface(&self) -> Surface {
        self.shared.lock().surface.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RenderState> {
        self.shared.state.subscribe()
    }

    /// Wait until the renderer is not loading.
    pub async fn settled(&self) -> RenderState {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(|state| *state != RenderState::Loading)
            .await
            .map(|state| *state);
        settled.unwrap_or_else(|_| *rx.borrow())
    }

    /// Number of loader invocations so far.
    pub fn load_count(&self) -> usize {
        self.shared.loads.load(Ordering::SeqCst)
    }
}

impl Drop for DitherRenderer {
    fn drop(&mut self) {
        if let Some(task) = self.shared.lock().task.take() {
            task.abort();
        }
    }
}

/// Primary safe source first; when it was rewritten, the raw source with
/// and then without a CORS request.
pub fn load_candidates(safe_src: &str, raw_src: &str) -> Vec<LoadCandidate> {
    let mut candidates = vec![LoadCandidate::new(safe_src, CrossOrigin::None)];
    if !raw_src.is_empty() && safe_src != raw_src {
        candidates.push(LoadCandidate::new(raw_src, CrossOrigin::Anonymous));
        candidates.push(LoadCandidate::new(raw_src, CrossOrigin::None));
    }
    candidates
}

async fn load_first(
    loader: &dyn ImageLoader,
    shared: &Shared,
    candidates: &[LoadCandidate],
) -> Option<DecodedImage> {
    for candidate in candidates {
        shared.loads.fetch_add(1, Ordering::SeqCst);
        match loader.load(candidate).await {
            Ok(decoded) => return Some(decoded),
            Err(e) => {
                tracing::debug!(
                    url = %candidate.url,
                    cross_origin = ?candidate.cross_origin,
                    error = %e,
                    "Load candidate failed"
                );
            }
        }
    }
    None
}

/// Target size for a drawing: explicit sizes win, zero or missing falls
/// back to the natural size, and the area is capped at `max_pixels`.
pub fn target_size(
    natural: (u32, u32),
    requested: (Option<u32>, Option<u32>),
    max_pixels: u64,
) -> (u32, u32) {
    let width = requested.0.filter(|w| *w > 0).unwrap_or(natural.0.max(1));
    let height = requested.1.filter(|h| *h > 0).unwrap_or(natural.1.max(1));
    fit_area(width, height, max_pixels)
}

fn fit_area(width: u32, height: u32, max_pixels: u64) -> (u32, u32) {
    let max_pixels = max_pixels.max(1);
    let area = u64::from(width) * u64::from(height);
    if area <= max_pixels {
        return (width, height);
    }
    let scale = (max_pixels as f64 / area as f64).sqrt();
    let width = ((f64::from(width) * scale).floor() as u32).max(1);
    let height = ((f64::from(height) * scale).floor() as u32).max(1);
    let height = height.min((max_pixels / u64::from(width)).max(1) as u32);
    (width, height)
}

/// Resized pristine pixels plus their dithered rendering under `options`.
type Drawn = (PixelBuffer, PixelBuffer, DitherOptions);

async fn finish_load(
    shared: &Shared,
    generation: u64,
    decoded: Option<DecodedImage>,
    requested: (Option<u32>, Option<u32>),
    max_pixels: u64,
) {
    let Some(decoded) = decoded else {
        let mut inner = shared.lock();
        if inner.generation != generation {
            tracing::debug!(generation, current = inner.generation, "Dropping stale load");
            return;
        }
        tracing::warn!(
            src = ?inner.identity.as_ref().and_then(|id| id.src.as_deref()),
            "All load candidates failed"
        );
        inner.task = None;
        inner.surface = Surface::Blank;
        shared.state.send_replace(RenderState::Failed);
        return;
    };

    let options = {
        let inner = shared.lock();
        if inner.generation != generation {
            tracing::debug!(generation, current = inner.generation, "Dropping stale load");
            return;
        }
        inner.options.clone()
    };

    let (width, height) = target_size(decoded.natural_size(), requested, max_pixels);
    let drawn = tokio::task::spawn_blocking(move || -> Result<Drawn, ReadbackError> {
        let pixels = decoded.draw(width, height).read_pixels()?;
        let mut dithered = pixels.clone();
        apply_dither(&mut dithered, &options);
        Ok((pixels, dithered, options))
    })
    .await;

    let mut inner = shared.lock();
    if inner.generation != generation {
        tracing::debug!(generation, current = inner.generation, "Dropping stale load");
        return;
    }
    inner.task = None;

    let state = match drawn {
        Ok(Ok((pixels, dithered, options))) => {
            inner.base = Some(BaseImageCache { pixels });
            if inner.options == options {
                inner.surface = Surface::Pixels(dithered);
            } else {
                // Options changed while drawing
                inner.render_current();
            }
            RenderState::Ready
        }
        Ok(Err(ReadbackError::Tainted)) => {
            tracing::warn!("Unable to read pixel data, rendering unfiltered image");
            inner.base = None;
            inner.surface = Surface::Tainted { width, height };
            RenderState::Ready
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Drawn image has no usable pixels");
            inner.base = None;
            inner.surface = Surface::Blank;
            RenderState::Failed
        }
        Err(e) => {
            tracing::error!(error = %e, "Draw task failed");
            inner.base = None;
            inner.surface = Surface::Blank;
            RenderState::Failed
        }
    };
    shared.state.send_replace(state);
}
