use crate::assets::AssetLoader;
use crate::error::ConfigError;
use crate::models::ThemeSheet;
use crate::services::SafeSourceOptions;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Theme name -> CSS variable table
    #[serde(default = "ThemeSheet::builtin")]
    pub themes: ThemeSheet,

    /// Theme used when a request or command does not name one
    #[serde(default = "default_theme")]
    pub default_theme: String,
}

fn default_theme() -> String {
    "light".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address (overridden by BIND_ADDR / PORT)
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Origin pages are served from; decides which image URLs count as same-origin
    #[serde(default = "default_page_origin")]
    pub page_origin: String,
}

fn default_bind() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_page_origin() -> String {
    "http://localhost:3001".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            page_origin: default_page_origin(),
        }
    }
}

impl ServerConfig {
    pub fn page_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.page_origin).map_err(|e| {
            ConfigError::Invalid(format!("server.page_origin {:?}: {e}", self.page_origin))
        })
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Path (or absolute URL) the image proxy is mounted at
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// When false, cross-origin images are never rewritten to the proxy
    #[serde(default = "default_true")]
    pub allow_proxy: bool,

    /// User-Agent sent on upstream fetches
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upstream request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Stream upstream bodies instead of buffering them
    #[serde(default = "default_true")]
    pub streaming: bool,
}

fn default_endpoint() -> String {
    crate::services::safe_source::DEFAULT_PROXY_ENDPOINT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; SacredComputerImageProxy/1.0; +https://internet.dev)".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            allow_proxy: true,
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            streaming: true,
        }
    }
}

impl ProxyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn safe_source_options(&self) -> SafeSourceOptions {
        SafeSourceOptions {
            proxy_endpoint: self.endpoint.clone(),
            allow_proxy: self.allow_proxy,
        }
    }
}

impl AppConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from AssetLoader (embedded or external)
    pub fn load_from_assets(loader: &AssetLoader) -> Self {
        let loaded = loader
            .read_config_string()
            .map_err(ConfigError::from)
            .and_then(|content| Self::from_yaml(&content));

        match loaded {
            Ok(config) => {
                tracing::info!(
                    themes = config.themes.len(),
                    default_theme = %config.default_theme,
                    proxy_endpoint = %config.proxy.endpoint,
                    "Loaded configuration"
                );
                config
            }
            Err(e) => {
                tracing::warn!(%e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.themes.contains(&self.default_theme) {
            return Err(ConfigError::Invalid(format!(
                "default_theme {:?} is not defined in themes",
                self.default_theme
            )));
        }
        if self.proxy.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("proxy.endpoint is empty".to_string()));
        }
        self.server.page_url()?;
        Ok(())
    }

    /// Listen address, honoring BIND_ADDR and PORT.
    pub fn bind_addr(&self) -> String {
        resolve_bind_addr(
            std::env::var("BIND_ADDR").ok(),
            std::env::var("PORT").ok(),
            &self.server.bind,
        )
    }
}

fn resolve_bind_addr(bind_addr: Option<String>, port: Option<String>, configured: &str) -> String {
    if let Some(addr) = bind_addr.filter(|a| !a.trim().is_empty()) {
        return addr;
    }
    match port.and_then(|p| p.trim().parse::<u16>().ok()) {
        Some(port) => {
            let host = configured
                .rsplit_once(':')
                .map(|(host, _)| host)
                .unwrap_or("0.0.0.0");
            format!("{host}:{port}")
        }
        None => configured.to_string(),
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            proxy: ProxyConfig::default(),
            themes: ThemeSheet::builtin(),
            default_theme: default_theme(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.default_theme, "light");
        assert!(config.themes.contains("light"));
        assert!(config.themes.contains("dark"));
        assert_eq!(config.server.bind, "0.0.0.0:3001");
        assert_eq!(config.proxy.endpoint, "/api/image-proxy");
        assert!(config.proxy.allow_proxy);
        assert!(config.proxy.streaming);
        assert_eq!(config.proxy.timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_embedded_config_parses() {
        let config = AppConfig::load_from_assets(&AssetLoader::default());
        assert!(config.themes.contains("light"));
        assert!(config.themes.contains("dark"));
        assert!(config.themes.contains("blue"));
        assert!(config.proxy.user_agent.contains("ImageProxy"));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let yaml = r#"
proxy:
  allow_proxy: false
  timeout_secs: 5
"#;

        let config = AppConfig::from_yaml(yaml).unwrap();

        assert!(!config.proxy.allow_proxy);
        assert_eq!(config.proxy.timeout(), Duration::from_secs(5));
        assert_eq!(config.proxy.endpoint, "/api/image-proxy");
        assert!(config.proxy.streaming);
        // Themes fall back to the built-in sheet
        assert!(config.themes.contains("dark"));
    }

    #[test]
    fn test_unknown_default_theme_is_invalid() {
        let yaml = "default_theme: neon\n";
        let err = AppConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_bad_page_origin_is_invalid() {
        let yaml = "server:\n  page_origin: \"not a url\"\n";
        assert!(matches!(
            AppConfig::from_yaml(yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        assert!(matches!(
            AppConfig::from_yaml("proxy: [unclosed"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_safe_source_options_follow_proxy_config() {
        let config = ProxyConfig {
            endpoint: "/proxy".to_string(),
            allow_proxy: false,
            ..Default::default()
        };
        let options = config.safe_source_options();
        assert_eq!(options.proxy_endpoint, "/proxy");
        assert!(!options.allow_proxy);
    }

    #[test]
    fn test_zero_timeout_is_raised_to_one_second() {
        let config = ProxyConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_resolve_bind_addr() {
        assert_eq!(resolve_bind_addr(None, None, "0.0.0.0:3001"), "0.0.0.0:3001");
        assert_eq!(
            resolve_bind_addr(Some("127.0.0.1:9000".into()), Some("80".into()), "0.0.0.0:3001"),
            "127.0.0.1:9000"
        );
        assert_eq!(
            resolve_bind_addr(None, Some("8080".into()), "0.0.0.0:3001"),
            "0.0.0.0:8080"
        );
        assert_eq!(
            resolve_bind_addr(None, Some("not-a-port".into()), "0.0.0.0:3001"),
            "0.0.0.0:3001"
        );
    }
}
