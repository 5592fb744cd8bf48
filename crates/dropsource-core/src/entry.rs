//! Raw listing entries as reported by the storage provider.

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Kind of listing item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryTag {
    /// Regular file.
    File,
    /// Folder.
    Folder,
    /// Anything else the provider reports (deleted entries, for example).
    #[serde(other)]
    Other,
}

/// A single unprocessed item from a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Kind of item.
    #[serde(rename = ".tag")]
    pub tag: EntryTag,

    /// Provider-assigned identifier, stable across runs.
    #[serde(default)]
    pub id: CompactString,

    /// Bare name (last path segment).
    pub name: CompactString,

    /// Full path with display casing, e.g. `/docs/a.md`.
    #[serde(default)]
    pub path_display: String,

    /// Modification time as set by the uploading client (files only).
    #[serde(default)]
    pub client_modified: Option<DateTime<Utc>>,
}

impl RemoteEntry {
    /// Create a file entry.
    pub fn file(
        id: impl Into<CompactString>,
        name: impl Into<CompactString>,
        path_display: impl Into<String>,
    ) -> Self {
        Self {
            tag: EntryTag::File,
            id: id.into(),
            name: name.into(),
            path_display: path_display.into(),
            client_modified: None,
        }
    }

    /// Create a folder entry.
    pub fn folder(
        id: impl Into<CompactString>,
        name: impl Into<CompactString>,
        path_display: impl Into<String>,
    ) -> Self {
        Self {
            tag: EntryTag::Folder,
            id: id.into(),
            name: name.into(),
            path_display: path_display.into(),
            client_modified: None,
        }
    }

    /// Set the client modification time.
    pub fn modified_at(mut self, modified: DateTime<Utc>) -> Self {
        self.client_modified = Some(modified);
        self
    }

    /// Check if this entry is a file.
    pub fn is_file(&self) -> bool {
        self.tag == EntryTag::File
    }

    /// Check if this entry is a folder.
    pub fn is_folder(&self) -> bool {
        self.tag == EntryTag::Folder
    }

    /// Dot-prefixed extension of the entry name, if any.
    ///
    /// A leading dot (`.bashrc`) does not start an extension.
    pub fn extension(&self) -> Option<&str> {
        match self.name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&self.name[idx..]),
        }
    }
}

/// Metadata returned when resolving a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Provider-assigned identifier.
    pub id: CompactString,
}

/// Identifier of a folder to list. The empty id denotes the provider root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FolderId(pub CompactString);

impl FolderId {
    /// Create a folder id.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    /// The provider root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Check if this id denotes the provider root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
