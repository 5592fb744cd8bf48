//! Collaborator traits consumed by the ingestion pipeline.

use async_trait::async_trait;

use crate::entry::{EntryMetadata, FolderId, RemoteEntry};
use crate::error::{ProviderError, StoreError};
use crate::record::{PayloadRef, Record};

/// Remote storage API.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Resolve a path to its metadata.
    async fn get_metadata(&self, path: &str) -> Result<EntryMetadata, ProviderError>;

    /// List every entry of a folder, following pagination to the end.
    async fn list_folder(
        &self,
        folder: &FolderId,
        recursive: bool,
    ) -> Result<Vec<RemoteEntry>, ProviderError>;

    /// Obtain a short-lived download URL for a file.
    async fn temporary_link(&self, path: &str) -> Result<String, ProviderError>;
}

/// Key/value cache of materialized payloads.
///
/// Implementations must tolerate concurrent access for distinct keys.
pub trait PayloadCache: Send + Sync {
    /// Look up a cached payload reference.
    fn get(&self, key: &str) -> Option<PayloadRef>;

    /// Store a payload reference.
    fn set(&self, key: &str, payload: PayloadRef);
}

/// Request to materialize a remote file locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileRequest {
    /// Download URL.
    pub url: String,
    /// Dot-prefixed extension of the target file (may be empty).
    pub extension: String,
    /// File name without extension.
    pub base_name: String,
}

/// Local store for downloaded payloads.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Download and persist a remote file.
    async fn create_from_remote(&self, request: RemoteFileRequest)
    -> Result<PayloadRef, StoreError>;

    /// Mark a previously created resource as still in use this run.
    fn touch(&self, payload: &PayloadRef);

    /// Check if a cached resource still exists in the store.
    async fn is_present(&self, _payload: &PayloadRef) -> bool {
        true
    }
}

/// Destination for finished records.
pub trait RecordSink {
    /// Accept one record.
    fn register(&mut self, record: Record);
}

impl RecordSink for Vec<Record> {
    fn register(&mut self, record: Record) {
        self.push(record);
    }
}
