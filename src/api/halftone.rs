use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use srcl_halftone::DitherOptions;
use std::sync::Arc;
use url::Url;

use crate::error::ApiError;
use crate::models::{AppConfig, ThemeSheet};
use crate::rendering::encode_png;
use crate::services::{
    sample_theme_two_color, DitherRenderer, ImageLoader, RenderState, StaticThemeResolver,
    Surface, ThemeTwoColorState,
};

// Larger explicit sizes are ignored and the natural size is used instead
const MAX_DIMENSION: u32 = 4096;

/// Query parameters for the halftone preview
#[derive(Debug, Default, Deserialize)]
pub struct HalftoneQuery {
    /// Image source, resolved like an `<img src>` on the configured page
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub w: Option<u32>,
    #[serde(default)]
    pub h: Option<u32>,
    /// Theme name from config (default: `default_theme`)
    #[serde(default)]
    pub theme: Option<String>,
    /// Use the theme's focused foreground as ink
    #[serde(default)]
    pub hover: bool,
    /// Black and white instead of the theme pair
    #[serde(default)]
    pub monochrome: bool,
    /// Per-channel color levels instead of the theme pair
    #[serde(default)]
    pub levels: Option<u32>,
}

/// Dither options for a preview request.
///
/// `monochrome` and `levels` switch away from the theme two-color halftone.
pub fn preview_options(
    theme: &ThemeTwoColorState,
    hover: bool,
    monochrome: bool,
    levels: Option<u32>,
) -> DitherOptions {
    let mut options = DitherOptions::new();
    if let Some(levels) = levels {
        options = options.levels(levels);
    }
    if monochrome {
        return options.monochrome(true);
    }
    if levels.is_some() {
        return options;
    }
    match theme.two_color(hover) {
        Some(pair) => options.two_color(pair),
        None => options.monochrome(true),
    }
}

/// Render an image as a theme-colored halftone PNG
///
/// The image is loaded the same way a page would load it: remote sources
/// go through the image proxy, local ones are fetched directly.
#[utoipa::path(
    get,
    path = "/api/halftone",
    responses(
        (status = 200, description = "Dithered PNG", content_type = "image/png"),
        (status = 400, description = "Missing src or unknown theme", content_type = "text/plain"),
        (status = 502, description = "Image could not be loaded or read", content_type = "text/plain"),
    ),
    params(
        ("src" = String, Query, description = "Image URL, path or data: URI"),
        ("w" = Option<u32>, Query, description = "Output width (default: natural width)"),
        ("h" = Option<u32>, Query, description = "Output height (default: natural height)"),
        ("theme" = Option<String>, Query, description = "Theme name"),
        ("hover" = Option<bool>, Query, description = "Use the hover ink"),
        ("monochrome" = Option<bool>, Query, description = "Black and white output"),
        ("levels" = Option<u32>, Query, description = "Color levels per channel"),
    ),
    tag = "Images"
)]
pub async fn handle_halftone(
    State(config): State<Arc<AppConfig>>,
    State(themes): State<Arc<ThemeSheet>>,
    State(loader): State<Arc<dyn ImageLoader>>,
    State(page): State<Arc<Url>>,
    Query(query): Query<HalftoneQuery>,
) -> Result<Response, ApiError> {
    let src = query
        .src
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingParameter("src"))?;

    let theme = query
        .theme
        .clone()
        .unwrap_or_else(|| config.default_theme.clone());
    if !themes.contains(&theme) {
        return Err(ApiError::UnknownTheme(theme));
    }

    // The renderer also caps the drawn area when one side falls back to the natural size
    let width = query.w.filter(|&w| w <= MAX_DIMENSION);
    let height = query.h.filter(|&h| h <= MAX_DIMENSION);

    let colors = sample_theme_two_color(&StaticThemeResolver::fixed(themes.clone(), &theme));
    let options = preview_options(&colors, query.hover, query.monochrome, query.levels);

    tracing::info!(
        src = %src,
        theme = %theme,
        width = ?width,
        height = ?height,
        mode = ?options.mode(),
        "Halftone request received"
    );

    let renderer = DitherRenderer::new(
        loader,
        page.as_ref().clone(),
        config.proxy.safe_source_options(),
    );
    renderer.set_options(options);
    renderer.set_source(Some(src), width, height);

    match renderer.settled().await {
        RenderState::Ready => {}
        RenderState::Idle => return Err(ApiError::MissingParameter("src")),
        RenderState::Failed | RenderState::Loading => {
            return Err(ApiError::LoadFailed(src.to_string()))
        }
    }

    let pixels = match renderer.surface() {
        Surface::Pixels(pixels) => pixels,
        Surface::Tainted { .. } => return Err(ApiError::Unreadable),
        Surface::Blank => return Err(ApiError::LoadFailed(src.to_string())),
    };

    let png = tokio::task::spawn_blocking(move || encode_png(&pixels))
        .await
        .map_err(|e| ApiError::Internal(format!("Task join error: {e}")))??;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        png,
    )
        .into_response())
}
