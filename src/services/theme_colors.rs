//! Theme-derived two-color palettes.
//!
//! The sampler asks a [`ColorResolver`] for the computed values of three
//! theme colors and turns them into a `(paper, ink)` palette plus a hover
//! ink. It always ends up `ready`: unparseable values fall back to the
//! theme's ambient colors, and any resolver error falls back to black on
//! white.
//!
//! Each [`ThemeTwoColor`] consumer owns its state and recomputes it on every
//! theme change. Nothing is cached across consumers.

use srcl_halftone::{parse_color, Rgb, TwoColorPalette};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::ResolveError;
use crate::models::ThemeSheet;

/// The named theme colors the sampler probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeColor {
    /// Paper.
    Background,
    /// Base ink.
    Text,
    /// Hover ink.
    FocusedForeground,
}

impl ThemeColor {
    /// CSS custom property backing this color, without the leading `--`.
    pub fn variable(self) -> &'static str {
        match self {
            ThemeColor::Background => "theme-background",
            ThemeColor::Text => "theme-text",
            ThemeColor::FocusedForeground => "theme-focused-foreground",
        }
    }
}

/// Computes concrete color strings for symbolic theme colors.
pub trait ColorResolver: Send + Sync {
    fn resolve(&self, color: ThemeColor) -> Result<String, ResolveError>;

    /// Background color of the page itself.
    fn ambient_background(&self) -> Result<String, ResolveError>;

    /// Foreground (text) color of the page itself.
    fn ambient_foreground(&self) -> Result<String, ResolveError>;
}

/// Sampler output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThemeTwoColorState {
    pub palette: Option<TwoColorPalette>,
    pub hover_ink: Option<Rgb>,
    /// False only before the first computation.
    pub ready: bool,
}

impl ThemeTwoColorState {
    /// Black ink on white paper.
    pub fn fallback() -> Self {
        Self {
            palette: Some(TwoColorPalette::new(Rgb::WHITE, Rgb::BLACK)),
            hover_ink: Some(Rgb::BLACK),
            ready: true,
        }
    }

    pub fn paper(&self) -> Option<Rgb> {
        self.palette.map(|p| p.paper)
    }

    pub fn ink(&self) -> Option<Rgb> {
        self.palette.map(|p| p.ink)
    }

    /// Palette with the hover ink swapped in when `hovered`.
    pub fn two_color(&self, hovered: bool) -> Option<TwoColorPalette> {
        let palette = self.palette?;
        match (hovered, self.hover_ink) {
            (true, Some(hover)) => Some(palette.with_ink(hover)),
            _ => Some(palette),
        }
    }
}

/// Sample the current theme once.
pub fn sample_theme_two_color(resolver: &dyn ColorResolver) -> ThemeTwoColorState {
    match try_sample(resolver) {
        Ok(Some(state)) => state,
        Ok(None) => {
            tracing::debug!("Theme colors unparseable, using black on white");
            ThemeTwoColorState::fallback()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Theme color resolution failed, using black on white");
            ThemeTwoColorState::fallback()
        }
    }
}

fn try_sample(resolver: &dyn ColorResolver) -> Result<Option<ThemeTwoColorState>, ResolveError> {
    let mut paper = parse_color(&resolver.resolve(ThemeColor::Background)?);
    let mut ink = parse_color(&resolver.resolve(ThemeColor::Text)?);
    let mut hover = parse_color(&resolver.resolve(ThemeColor::FocusedForeground)?);

    if paper.is_none() || ink.is_none() || hover.is_none() {
        if paper.is_none() {
            paper = parse_color(&resolver.ambient_background()?);
        }
        if ink.is_none() {
            ink = parse_color(&resolver.ambient_foreground()?);
        }
        hover = hover.or(ink);
    }

    let (Some(paper), Some(ink)) = (paper, ink) else {
        return Ok(None);
    };

    Ok(Some(ThemeTwoColorState {
        palette: Some(TwoColorPalette::new(paper, ink)),
        hover_ink: Some(hover.unwrap_or(ink)),
        ready: true,
    }))
}

/// Push-based "current theme" indicator shared by all consumers.
#[derive(Debug)]
pub struct ThemeIndicator {
    tx: watch::Sender<String>,
}

impl ThemeIndicator {
    pub fn new(initial: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(initial.into());
        Self { tx }
    }

    pub fn current(&self) -> String {
        self.tx.borrow().clone()
    }

    /// Switch themes. Setting the active theme again is not a change.
    pub fn set(&self, theme: impl Into<String>) -> bool {
        let theme = theme.into();
        let changed = self.tx.send_if_modified(|current| {
            if *current == theme {
                false
            } else {
                *current = theme;
                true
            }
        });
        if changed {
            tracing::debug!(theme = %self.current(), "Theme changed");
        }
        changed
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }
}

/// A single consumer of theme palettes.
///
/// Computes once on spawn and again after each theme change. Dropping it
/// stops the background task.
#[derive(Debug)]
pub struct ThemeTwoColor {
    rx: watch::Receiver<ThemeTwoColorState>,
    task: JoinHandle<()>,
}

impl ThemeTwoColor {
    /// Must be called inside a tokio runtime.
    pub fn spawn(resolver: Arc<dyn ColorResolver>, mut theme_rx: watch::Receiver<String>) -> Self {
        let (tx, rx) = watch::channel(ThemeTwoColorState::default());

        let task = tokio::spawn(async move {
            loop {
                let state = sample_theme_two_color(resolver.as_ref());
                if tx.send(state).is_err() {
                    break;
                }
                if theme_rx.changed().await.is_err() {
                    break;
                }
            }
        });

        Self { rx, task }
    }

    pub fn state(&self) -> ThemeTwoColorState {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ThemeTwoColorState> {
        self.rx.clone()
    }

    /// Wait for the first computation.
    pub async fn ready(&self) -> ThemeTwoColorState {
        let mut rx = self.rx.clone();
        let ready = rx.wait_for(|state| state.ready).await.map(|state| *state);
        ready.unwrap_or_else(|_| *rx.borrow())
    }
}

impl Drop for ThemeTwoColor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// [`ColorResolver`] over a [`ThemeSheet`], following the theme selected
/// by a [`ThemeIndicator`].
#[derive(Debug, Clone)]
pub struct StaticThemeResolver {
    sheet: Arc<ThemeSheet>,
    theme: watch::Receiver<String>,
}

impl StaticThemeResolver {
    pub fn new(sheet: Arc<ThemeSheet>, theme: watch::Receiver<String>) -> Self {
        Self { sheet, theme }
    }

    /// Resolver pinned to a single theme.
    pub fn fixed(sheet: Arc<ThemeSheet>, theme: &str) -> Self {
        let (_tx, rx) = watch::channel(theme.to_string());
        Self::new(sheet, rx)
    }

    fn with_theme<T>(
        &self,
        f: impl FnOnce(&crate::models::ThemeDefinition) -> Result<T, ResolveError>,
    ) -> Result<T, ResolveError> {
        let name = self.theme.borrow().clone();
        let theme = self
            .sheet
            .get(&name)
            .ok_or(ResolveError::UnknownTheme(name))?;
        f(theme)
    }

    fn ambient(&self, which: &'static str) -> Result<String, ResolveError> {
        self.with_theme(|theme| {
            let value = match which {
                "background" => theme.ambient_background.as_deref(),
                _ => theme.ambient_foreground.as_deref(),
            };
            let value = value.ok_or(ResolveError::NoAmbient(which))?;
            theme.resolve_value(value)
        })
    }
}

impl ColorResolver for StaticThemeResolver {
    fn resolve(&self, color: ThemeColor) -> Result<String, ResolveError> {
        self.with_theme(|theme| theme.variable(color.variable()))
    }

    fn ambient_background(&self) -> Result<String, ResolveError> {
        self.ambient("background")
    }

    fn ambient_foreground(&self) -> Result<String, ResolveError> {
        self.ambient("foreground")
    }
}
