//! Core types and traits for dropsource.
//!
//! This crate provides the fundamental data structures used throughout
//! the dropsource ecosystem: raw listing entries, typed records, the record
//! set produced by a run, configuration, and the collaborator traits the
//! pipeline talks to.

mod collab;
mod config;
mod entry;
mod error;
mod graph;
mod record;

pub use collab::{PayloadCache, RecordSink, RemoteFileRequest, RemoteStorage, ResourceStore};
pub use config::{
    DEFAULT_EXTENSIONS, FolderMatch, SourceConfig, SourceConfigBuilder, SourceConfigBuilderError,
};
pub use entry::{EntryMetadata, EntryTag, FolderId, RemoteEntry};
pub use error::{CacheError, ConfigError, ProviderError, StoreError};
pub use graph::{IngestStats, RecordSet};
pub use record::{
    ContentDigest, FolderRelations, PayloadRef, ROOT_FOLDER_ID, ROOT_FOLDER_NAME, Record,
    RecordBody, RecordId, RecordKind, SOURCE_PARENT,
};
