//! Config loading with an embedded fallback
//!
//! - If `CONFIG_FILE` is NOT set: use the embedded `config.yaml` only
//! - If `CONFIG_FILE` IS set and the file exists: read it from the filesystem
//! - If `CONFIG_FILE` IS set but the file is missing: fall back to embedded,
//!   and `init` can write the embedded default there

use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Embedded default config
#[derive(RustEmbed)]
#[folder = "."]
#[include = "config.yaml"]
struct EmbeddedConfig;

const CONFIG_NAME: &str = "config.yaml";

/// Outcome of writing the embedded config to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Written(PathBuf),
    Skipped(PathBuf),
}

/// Config loader with optional filesystem override
#[derive(Debug, Clone, Default)]
pub struct AssetLoader {
    /// External config file path (from CONFIG_FILE env var)
    config_file: Option<PathBuf>,
}

impl AssetLoader {
    /// `config_file` should be `Some` only if `CONFIG_FILE` was set.
    pub fn new(config_file: Option<PathBuf>) -> Self {
        Self { config_file }
    }

    /// Build from the process environment.
    pub fn from_env() -> Self {
        Self::new(std::env::var("CONFIG_FILE").ok().map(PathBuf::from))
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Read the config file
    ///
    /// If an external path is configured and exists, uses that.
    /// Otherwise falls back to embedded config.
    pub fn read_config(&self) -> io::Result<Cow<'static, [u8]>> {
        if let Some(ref path) = self.config_file {
            if path.exists() {
                tracing::trace!(path = %path.display(), "Loading config from filesystem");
                return Ok(Cow::Owned(fs::read(path)?));
            }
        }

        Self::embedded_config().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Embedded config.yaml not found")
        })
    }

    /// Read config as a UTF-8 string
    pub fn read_config_string(&self) -> io::Result<String> {
        let bytes = self.read_config()?;
        String::from_utf8(bytes.into_owned())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Write the embedded config to the configured path (or `./config.yaml`).
    ///
    /// An existing file is left alone unless `force` is set.
    pub fn init(&self, force: bool) -> io::Result<InitOutcome> {
        let path = self
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_NAME));

        if !force && path.exists() {
            return Ok(InitOutcome::Skipped(path));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = Self::embedded_config().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Embedded config.yaml not found")
        })?;
        fs::write(&path, &*data)?;
        tracing::info!(path = %path.display(), "Wrote embedded default config");
        Ok(InitOutcome::Written(path))
    }

    fn embedded_config() -> Option<Cow<'static, [u8]>> {
        EmbeddedConfig::get(CONFIG_NAME).map(|f| {
            tracing::trace!("Loading config from embedded assets");
            f.data
        })
    }
}
