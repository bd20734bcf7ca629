pub mod dither_renderer;
pub mod image_loader;
pub mod image_proxy;
pub mod safe_source;
pub mod theme_colors;

pub use dither_renderer::{DitherRenderer, RenderState, Surface};
pub use image_loader::{CrossOrigin, DecodedImage, HttpImageLoader, ImageLoader, LoadCandidate};
pub use image_proxy::{ImageProxy, ProxiedImage};
pub use safe_source::{get_safe_image_src, SafeSourceOptions};
pub use theme_colors::{
    sample_theme_two_color, ColorResolver, StaticThemeResolver, ThemeIndicator, ThemeTwoColor,
    ThemeTwoColorState,
};
