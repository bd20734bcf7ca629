pub mod config;
pub mod theme_sheet;

pub use config::{AppConfig, ProxyConfig, ServerConfig};
pub use theme_sheet::{ThemeDefinition, ThemeSheet};
