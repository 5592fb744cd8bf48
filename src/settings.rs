//! User settings for the `dropsource` binary.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use dropsource_core::{ConfigError, SourceConfig};

/// Environment variable holding the Dropbox access token.
pub const TOKEN_ENV: &str = "DROPBOX_TOKEN";

/// Settings loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// What to ingest.
    pub source: SourceConfig,

    /// Dropbox access token. Usually supplied through the environment instead.
    pub token: Option<String>,

    /// Payload cache file.
    pub cache_file: Option<PathBuf>,

    /// Payload store directory.
    pub store_dir: Option<PathBuf>,

    /// Override for the Dropbox RPC endpoint base.
    pub api_base: Option<String>,
}

impl Settings {
    /// Default settings file location.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("dropsource").join("config.toml"))
    }

    /// Load settings.
    ///
    /// An explicit path must exist. The default location is optional and
    /// yields default settings when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read settings from {}", path.display()))?;
        Self::parse(&content)
            .wrap_err_with(|| format!("Invalid settings in {}", path.display()))
    }

    /// Parse settings from TOML, validating the source section.
    pub fn parse(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        validate_source(&settings.source)?;
        Ok(settings)
    }

    /// Payload cache file, defaulting to the user cache directory.
    pub fn cache_file(&self) -> PathBuf {
        self.cache_file
            .clone()
            .unwrap_or_else(|| data_root().join("payloads.json"))
    }

    /// Payload store directory, defaulting to the user cache directory.
    pub fn store_dir(&self) -> PathBuf {
        self.store_dir
            .clone()
            .unwrap_or_else(|| data_root().join("store"))
    }

    /// Access token, if one was configured.
    pub fn token(&self) -> Result<&str, ConfigError> {
        self.token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing { name: TOKEN_ENV })
    }
}

/// Check a deserialized source section with the builder's validation.
pub fn validate_source(source: &SourceConfig) -> Result<(), ConfigError> {
    SourceConfig::builder()
        .path(source.path.clone())
        .recursive(source.recursive)
        .extensions(source.extensions.clone())
        .create_folder_nodes(source.create_folder_nodes)
        .folder_match(source.folder_match)
        .build()
        .map(|_| ())
        .map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })
}

fn data_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dropsource")
}
