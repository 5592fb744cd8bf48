//! Source configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Extensions ingested when none are configured.
pub const DEFAULT_EXTENSIONS: [&str; 3] = [".jpg", ".png", ".md"];

/// How file records are matched to the folder that contains them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderMatch {
    /// The file's parent path must equal the folder path.
    #[default]
    ParentPath,
    /// The file's parent segment must equal the folder name. Folders that
    /// share a name at different depths all receive the file.
    ParentName,
}

/// Configuration for an ingestion run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq, Eq)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SourceConfig {
    /// Remote folder to scan; empty means the provider root.
    #[builder(default)]
    #[serde(default)]
    pub path: String,

    /// List subfolders recursively.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Allow-list of dot-prefixed, case-sensitive file extensions.
    #[builder(default = "default_extensions()")]
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Produce folder records and link files into them.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub create_folder_nodes: bool,

    /// Folder membership rule.
    #[builder(default)]
    #[serde(default)]
    pub folder_match: FolderMatch,
}

fn default_true() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl SourceConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref extensions) = self.extensions {
            for ext in extensions {
                if ext.len() < 2 || !ext.starts_with('.') {
                    return Err(format!("Extension must be dot-prefixed: {ext:?}"));
                }
            }
        }
        Ok(())
    }
}

impl SourceConfig {
    /// Create a new config builder.
    pub fn builder() -> SourceConfigBuilder {
        SourceConfigBuilder::default()
    }

    /// Create a default config for scanning a remote path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Check if files with this extension are ingested.
    pub fn allows_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }

    /// Normalized remote path: no trailing slash, leading slash unless root.
    pub fn remote_path(&self) -> String {
        let trimmed = self.path.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            recursive: true,
            extensions: default_extensions(),
            create_folder_nodes: true,
            folder_match: FolderMatch::default(),
        }
    }
}
