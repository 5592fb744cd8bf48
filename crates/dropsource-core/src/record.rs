//! Typed, content-addressed records emitted by a run.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

/// Parent reference shared by every record: the records come from an
/// external source, not from another record.
pub const SOURCE_PARENT: &str = "__SOURCE__";

/// Id of the synthetic folder record standing for the app's home directory.
pub const ROOT_FOLDER_ID: &str = "dropbox-root";

/// Name of the synthetic root folder record.
pub const ROOT_FOLDER_NAME: &str = "root";

/// Stable record identifier (the provider-assigned object id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub CompactString);

impl RecordId {
    /// Create a new RecordId.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    /// Id of the synthetic root folder.
    pub fn root() -> Self {
        Self::new(ROOT_FOLDER_ID)
    }

    /// Borrow the id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
pub enum RecordKind {
    /// Markdown file.
    #[serde(rename = "DropboxMarkdown")]
    #[strum(serialize = "DropboxMarkdown")]
    Markdown,
    /// Image file.
    #[serde(rename = "DropboxImage")]
    #[strum(serialize = "DropboxImage")]
    Image,
    /// Any other allowed file.
    #[serde(rename = "DropboxNode")]
    #[strum(serialize = "DropboxNode")]
    Default,
    /// Folder.
    #[serde(rename = "DropboxFolder")]
    #[strum(serialize = "DropboxFolder")]
    Folder,
}

impl RecordKind {
    /// Check if this kind describes a file.
    pub fn is_file(&self) -> bool {
        !matches!(self, RecordKind::Folder)
    }

    /// Check if records of this kind are listed in folder relation lists.
    pub fn is_linkable(&self) -> bool {
        matches!(self, RecordKind::Markdown | RecordKind::Image)
    }
}

/// BLAKE3 digest of a record's semantic fields, used for change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ContentDigest(pub [u8; 32]);

impl ContentDigest {
    /// Create a new ContentDigest from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Digest the semantic fields of a record.
    ///
    /// The fields are rendered as a JSON object with sorted keys, so equal
    /// inputs always produce equal digests.
    pub fn of(name: &str, path: &str, last_modified: Option<&DateTime<Utc>>) -> Self {
        let canonical = serde_json::json!({
            "lastModified": last_modified.map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            "name": name,
            "path": path,
        });
        Self(*blake3::hash(canonical.to_string().as_bytes()).as_bytes())
    }

    /// Get the digest as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 || !hex.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl From<ContentDigest> for String {
    fn from(digest: ContentDigest) -> Self {
        digest.to_hex()
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid content digest: {value}"))
    }
}

/// Opaque handle to a locally materialized copy of a remote file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadRef {
    /// Store-assigned identifier (content hash for the local store).
    pub id: CompactString,
    /// Location of the materialized bytes.
    pub path: PathBuf,
    /// Payload size in bytes.
    #[serde(default)]
    pub size: u64,
}

impl PayloadRef {
    /// Create a new payload reference.
    pub fn new(id: impl Into<CompactString>, path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            size,
        }
    }
}

/// Per-type child lists of a folder record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRelations {
    /// Ids of image records in this folder.
    pub image_child_ids: Vec<RecordId>,
    /// Ids of markdown records in this folder.
    pub markdown_child_ids: Vec<RecordId>,
}

impl FolderRelations {
    /// Check if the folder has no linked children.
    pub fn is_empty(&self) -> bool {
        self.image_child_ids.is_empty() && self.markdown_child_ids.is_empty()
    }

    /// Check if a record id appears in either list.
    pub fn contains(&self, id: &RecordId) -> bool {
        self.image_child_ids.contains(id) || self.markdown_child_ids.contains(id)
    }
}

/// Type-specific record fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RecordBody {
    /// File record.
    #[serde(rename_all = "camelCase")]
    File {
        /// Client modification time, if the provider reported one.
        last_modified: Option<DateTime<Utc>>,
    },
    /// Folder record.
    Folder(FolderRelations),
}

/// A single record handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Stable identifier.
    pub id: RecordId,

    /// Always [`SOURCE_PARENT`].
    pub parent: CompactString,

    /// Generic child list; empty for every record this crate produces.
    pub children: Vec<RecordId>,

    /// Record type.
    #[serde(rename = "type")]
    pub kind: RecordKind,

    /// Digest of `name`, `path` and `lastModified`.
    pub content_digest: ContentDigest,

    /// Bare name.
    pub name: CompactString,

    /// Full display path.
    pub path: String,

    /// Type-specific fields.
    #[serde(flatten)]
    pub body: RecordBody,

    /// Materialized payload, when one was attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<PayloadRef>,
}

impl Record {
    /// Create a file record. `kind` must not be [`RecordKind::Folder`].
    pub fn new_file(
        id: RecordId,
        name: impl Into<CompactString>,
        path: impl Into<String>,
        last_modified: Option<DateTime<Utc>>,
        kind: RecordKind,
    ) -> Self {
        debug_assert!(kind.is_file());
        let name = name.into();
        let path = path.into();
        Self {
            content_digest: ContentDigest::of(&name, &path, last_modified.as_ref()),
            id,
            parent: SOURCE_PARENT.into(),
            children: Vec::new(),
            kind,
            name,
            path,
            body: RecordBody::File { last_modified },
            payload: None,
        }
    }

    /// Create a folder record with empty relation lists.
    pub fn new_folder(id: RecordId, name: impl Into<CompactString>, path: impl Into<String>) -> Self {
        let name = name.into();
        let path = path.into();
        Self {
            content_digest: ContentDigest::of(&name, &path, None),
            id,
            parent: SOURCE_PARENT.into(),
            children: Vec::new(),
            kind: RecordKind::Folder,
            name,
            path,
            body: RecordBody::Folder(FolderRelations::default()),
            payload: None,
        }
    }

    /// Create the synthetic root folder record.
    pub fn root_folder() -> Self {
        Self::new_folder(RecordId::root(), ROOT_FOLDER_NAME, "")
    }

    /// Check if this record is a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self.body, RecordBody::Folder(_))
    }

    /// Check if this record is a file.
    pub fn is_file(&self) -> bool {
        !self.is_folder()
    }

    /// Check if this is the synthetic root folder.
    pub fn is_root(&self) -> bool {
        self.id.as_str() == ROOT_FOLDER_ID
    }

    /// Relation lists for folders.
    pub fn relations(&self) -> Option<&FolderRelations> {
        match &self.body {
            RecordBody::Folder(relations) => Some(relations),
            RecordBody::File { .. } => None,
        }
    }

    /// Client modification time for files.
    pub fn last_modified(&self) -> Option<&DateTime<Utc>> {
        match &self.body {
            RecordBody::File { last_modified } => last_modified.as_ref(),
            RecordBody::Folder(_) => None,
        }
    }

    /// Dot-prefixed extension of the record name, if any.
    pub fn extension(&self) -> Option<&str> {
        match self.name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&self.name[idx..]),
        }
    }

    /// Name without its extension.
    pub fn base_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(0) | None => &self.name,
            Some(idx) => &self.name[..idx],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_content_digest_hex() {
        let digest = ContentDigest::new([0xab; 32]);
        assert_eq!(digest.to_hex().len(), 64);
        assert!(digest.to_hex().starts_with("abab"));
        assert_eq!(ContentDigest::from_hex(&digest.to_hex()), Some(digest));
        assert_eq!(ContentDigest::from_hex("xyz"), None);
    }

    #[test]
    fn test_digest_ignores_id() {
        let a = Record::new_file(RecordId::new("1"), "a.md", "/a.md", None, RecordKind::Markdown);
        let b = Record::new_file(RecordId::new("2"), "a.md", "/a.md", None, RecordKind::Default);
        assert_eq!(a.content_digest, b.content_digest);
    }

    #[test]
    fn test_digest_tracks_last_modified() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let a = ContentDigest::of("a.md", "/a.md", None);
        let b = ContentDigest::of("a.md", "/a.md", Some(&t));
        assert_ne!(a, b);
    }

    #[test]
    fn test_root_folder() {
        let root = Record::root_folder();
        assert!(root.is_root());
        assert!(root.is_folder());
        assert_eq!(root.name.as_str(), ROOT_FOLDER_NAME);
        assert!(root.relations().unwrap().is_empty());
    }

    #[test]
    fn test_base_name_and_extension() {
        let record = Record::new_file(
            RecordId::new("1"),
            "photo.final.png",
            "/photo.final.png",
            None,
            RecordKind::Image,
        );
        assert_eq!(record.extension(), Some(".png"));
        assert_eq!(record.base_name(), "photo.final");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(RecordKind::Markdown.to_string(), "DropboxMarkdown");
        assert_eq!(RecordKind::Default.as_ref(), "DropboxNode");
        assert!(RecordKind::Image.is_linkable());
        assert!(!RecordKind::Default.is_linkable());
        assert!(!RecordKind::Folder.is_file());
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = Record::new_folder(RecordId::new("2"), "docs", "/docs");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "DropboxFolder");
        assert_eq!(value["parent"], SOURCE_PARENT);
        assert!(value["imageChildIds"].as_array().unwrap().is_empty());
        assert!(value.get("payload").is_none());
        assert_eq!(value["contentDigest"].as_str().unwrap().len(), 64);
    }
}
