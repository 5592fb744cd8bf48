//! Remote folder listing with a fail-open error policy.

use dropsource_core::{FolderId, ProviderError, RemoteEntry, RemoteStorage, SourceConfig};

/// Lists the configured remote folder through a [`RemoteStorage`].
pub struct RemoteLister<'a, S: RemoteStorage + ?Sized> {
    storage: &'a S,
}

impl<'a, S: RemoteStorage + ?Sized> RemoteLister<'a, S> {
    /// Create a lister over a storage backend.
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Resolve a remote path to a folder id. The empty path is the provider
    /// root and is resolved without a provider call.
    pub async fn resolve_path(&self, path: &str) -> Result<FolderId, ProviderError> {
        if path.is_empty() {
            return Ok(FolderId::root());
        }
        let metadata = self.storage.get_metadata(path).await?;
        Ok(FolderId::new(metadata.id))
    }

    /// List the entries of a folder.
    pub async fn list_entries(
        &self,
        folder: &FolderId,
        recursive: bool,
    ) -> Result<Vec<RemoteEntry>, ProviderError> {
        self.storage.list_folder(folder, recursive).await
    }

    /// List the configured path.
    ///
    /// Provider errors are logged and turned into an empty listing, so a
    /// failed listing looks exactly like an empty folder to the caller.
    pub async fn list(&self, config: &SourceConfig) -> Vec<RemoteEntry> {
        let path = config.remote_path();
        let result: Result<Vec<RemoteEntry>, ProviderError> = async {
            let folder = self.resolve_path(&path).await?;
            self.list_entries(&folder, config.recursive).await
        }
        .await;

        match result {
            Ok(entries) => {
                tracing::debug!(target: "lister", path = %path, count = entries.len(), "listed remote folder");
                entries
            }
            Err(err) => {
                tracing::warn!(target: "lister", path = %path, error = %err, "listing failed, continuing with no entries");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dropsource_core::EntryMetadata;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStorage {
        entries: Vec<RemoteEntry>,
        fail_listing: bool,
        metadata_calls: Mutex<Vec<String>>,
        listed: Mutex<Vec<(FolderId, bool)>>,
    }

    #[async_trait]
    impl RemoteStorage for RecordingStorage {
        async fn get_metadata(&self, path: &str) -> Result<EntryMetadata, ProviderError> {
            self.metadata_calls.lock().unwrap().push(path.to_string());
            if path == "/missing" {
                return Err(ProviderError::NotFound(path.to_string()));
            }
            Ok(EntryMetadata {
                id: format!("id:{}", path.trim_start_matches('/')).into(),
            })
        }

        async fn list_folder(
            &self,
            folder: &FolderId,
            recursive: bool,
        ) -> Result<Vec<RemoteEntry>, ProviderError> {
            self.listed.lock().unwrap().push((folder.clone(), recursive));
            if self.fail_listing {
                return Err(ProviderError::Connection("reset by peer".into()));
            }
            Ok(self.entries.clone())
        }

        async fn temporary_link(&self, path: &str) -> Result<String, ProviderError> {
            Ok(format!("https://dl.example/{path}"))
        }
    }

    #[tokio::test]
    async fn test_empty_path_skips_resolution() {
        let storage = RecordingStorage::default();
        let lister = RemoteLister::new(&storage);

        let folder = lister.resolve_path("").await.unwrap();
        assert!(folder.is_root());
        assert!(storage.metadata_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_path_resolves_to_id() {
        let storage = RecordingStorage {
            entries: vec![RemoteEntry::file("1", "a.md", "/docs/a.md")],
            ..Default::default()
        };
        let lister = RemoteLister::new(&storage);

        let entries = lister.list(&SourceConfig::new("docs")).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(*storage.metadata_calls.lock().unwrap(), vec!["/docs".to_string()]);
        assert_eq!(
            *storage.listed.lock().unwrap(),
            vec![(FolderId::new("id:docs"), true)]
        );
    }

    #[tokio::test]
    async fn test_resolution_failure_is_empty_listing() {
        let storage = RecordingStorage {
            entries: vec![RemoteEntry::file("1", "a.md", "/a.md")],
            ..Default::default()
        };
        let lister = RemoteLister::new(&storage);

        let entries = lister.list(&SourceConfig::new("/missing")).await;
        assert!(entries.is_empty());
        assert!(storage.listed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_is_empty_listing() {
        let storage = RecordingStorage {
            fail_listing: true,
            ..Default::default()
        };
        let lister = RemoteLister::new(&storage);

        assert!(lister.list(&SourceConfig::default()).await.is_empty());
        assert!(lister.list_entries(&FolderId::root(), true).await.is_err());
    }
}
