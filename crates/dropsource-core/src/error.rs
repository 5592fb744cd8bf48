//! Error types for provider calls, payload storage and configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by a remote storage provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Path or object not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The access token was rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Too many requests; the provider asked to back off.
    #[error("Rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    /// Transport-level failure.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Any other API error.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
}

/// Errors while persisting a materialized payload.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Download failed.
    #[error("Download failed for {url}: {message}")]
    Download { url: String, message: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temporary link could not be obtained.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl StoreError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors while loading or flushing a persistent cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache file is not valid JSON.
    #[error("Corrupt cache file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    /// Required value is missing.
    #[error("Missing configuration value: {name}")]
    Missing { name: &'static str },
}
