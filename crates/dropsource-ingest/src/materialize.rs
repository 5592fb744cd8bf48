//! Concurrent, cache-aware payload materialization.

use futures::future::join_all;

use dropsource_core::{
    IngestStats, PayloadCache, PayloadRef, Record, RemoteFileRequest, RemoteStorage,
    ResourceStore, StoreError,
};

use crate::cache::cache_key;

/// Result of materializing one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterializeOutcome {
    /// Reused from the cache without a network call.
    Cached(PayloadRef),
    /// Downloaded this run and stored in the cache.
    Downloaded(PayloadRef),
    /// Materialization failed; the record carries no payload.
    Failed,
    /// The record has no downloadable content (folders).
    Skipped,
}

impl MaterializeOutcome {
    /// The attached payload, if any.
    pub fn payload(&self) -> Option<&PayloadRef> {
        match self {
            Self::Cached(payload) | Self::Downloaded(payload) => Some(payload),
            Self::Failed | Self::Skipped => None,
        }
    }

    fn record_into(&self, stats: &mut IngestStats) {
        match self {
            Self::Cached(payload) => stats.record_cache_hit(payload.size),
            Self::Downloaded(payload) => stats.record_download(payload.size),
            Self::Failed => stats.record_failure(),
            Self::Skipped => {}
        }
    }
}

/// Attaches local copies of remote file content to records.
pub struct PayloadMaterializer<'a> {
    storage: &'a dyn RemoteStorage,
    cache: &'a dyn PayloadCache,
    store: &'a dyn ResourceStore,
}

impl<'a> PayloadMaterializer<'a> {
    /// Create a materializer over its collaborators.
    pub fn new(
        storage: &'a dyn RemoteStorage,
        cache: &'a dyn PayloadCache,
        store: &'a dyn ResourceStore,
    ) -> Self {
        Self {
            storage,
            cache,
            store,
        }
    }

    /// Check if a record has downloadable content.
    pub fn applies_to(record: &Record) -> bool {
        record.kind.is_file()
    }

    /// Materialize one record's payload.
    ///
    /// Failures are logged and reported as [`MaterializeOutcome::Failed`];
    /// they never propagate.
    pub async fn materialize(&self, record: &Record) -> MaterializeOutcome {
        if !Self::applies_to(record) {
            return MaterializeOutcome::Skipped;
        }

        let key = cache_key(&record.id);
        if let Some(payload) = self.cache.get(&key) {
            if self.store.is_present(&payload).await {
                self.store.touch(&payload);
                return MaterializeOutcome::Cached(payload);
            }
            tracing::debug!(target: "materializer", id = %record.id, "cached payload missing from store");
        }

        match self.download(record).await {
            Ok(payload) => {
                self.cache.set(&key, payload.clone());
                tracing::debug!(target: "materializer", id = %record.id, size = payload.size, "downloaded payload");
                MaterializeOutcome::Downloaded(payload)
            }
            Err(err) => {
                tracing::error!(target: "materializer", id = %record.id, path = %record.path, error = %err, "failed to materialize payload");
                MaterializeOutcome::Failed
            }
        }
    }

    async fn download(&self, record: &Record) -> Result<PayloadRef, StoreError> {
        let url = self.storage.temporary_link(&record.path).await?;
        let request = RemoteFileRequest {
            url,
            extension: record.extension().unwrap_or_default().to_string(),
            base_name: record.base_name().to_string(),
        };
        self.store.create_from_remote(request).await
    }

    /// Materialize every record concurrently and attach the payloads.
    ///
    /// Returns once every attempt has settled. Record order is preserved.
    pub async fn materialize_all(&self, records: Vec<Record>, stats: &mut IngestStats) -> Vec<Record> {
        let outcomes = join_all(records.iter().map(|record| self.materialize(record))).await;

        records
            .into_iter()
            .zip(outcomes)
            .map(|(record, outcome)| {
                outcome.record_into(stats);
                Record {
                    payload: outcome.payload().cloned(),
                    ..record
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dropsource_core::{EntryMetadata, FolderId, ProviderError, RecordId, RecordKind, RemoteEntry};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::cache::MemoryCache;

    #[derive(Default)]
    struct LinkStorage {
        links: AtomicUsize,
    }

    #[async_trait]
    impl RemoteStorage for LinkStorage {
        async fn get_metadata(&self, path: &str) -> Result<EntryMetadata, ProviderError> {
            Err(ProviderError::NotFound(path.to_string()))
        }

        async fn list_folder(&self, _: &FolderId, _: bool) -> Result<Vec<RemoteEntry>, ProviderError> {
            Ok(Vec::new())
        }

        async fn temporary_link(&self, path: &str) -> Result<String, ProviderError> {
            self.links.fetch_add(1, Ordering::SeqCst);
            Ok(format!("https://dl.example{path}"))
        }
    }

    #[derive(Default)]
    struct FakeStore {
        requests: Mutex<Vec<RemoteFileRequest>>,
        touched: Mutex<Vec<PayloadRef>>,
        fail_for: Option<&'static str>,
    }

    #[async_trait]
    impl ResourceStore for FakeStore {
        async fn create_from_remote(
            &self,
            request: RemoteFileRequest,
        ) -> Result<PayloadRef, StoreError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail_for.is_some_and(|f| request.url.ends_with(f)) {
                return Err(StoreError::Download {
                    url: request.url,
                    message: "503".into(),
                });
            }
            let id = request.url.rsplit('/').next().unwrap_or_default().to_string();
            Ok(PayloadRef::new(id, format!("/store/{}{}", request.base_name, request.extension), 4))
        }

        fn touch(&self, payload: &PayloadRef) {
            self.touched.lock().unwrap().push(payload.clone());
        }
    }

    fn markdown(id: &str, path: &str) -> Record {
        let name = path.rsplit('/').next().unwrap();
        Record::new_file(RecordId::new(id), name, path, None, RecordKind::Markdown)
    }

    #[tokio::test]
    async fn test_download_then_cache() {
        let storage = LinkStorage::default();
        let cache = MemoryCache::new();
        let store = FakeStore::default();
        let materializer = PayloadMaterializer::new(&storage, &cache, &store);

        let outcome = materializer.materialize(&markdown("1", "/docs/a.md")).await;
        let payload = match outcome {
            MaterializeOutcome::Downloaded(payload) => payload,
            other => panic!("expected a download, got {other:?}"),
        };
        assert_eq!(cache.get("dropbox-file-1"), Some(payload));

        let request = &store.requests.lock().unwrap()[0];
        assert_eq!(request.url, "https://dl.example/docs/a.md");
        assert_eq!(request.extension, ".md");
        assert_eq!(request.base_name, "a");
    }

    #[tokio::test]
    async fn test_cache_hit_touches_without_network() {
        let storage = LinkStorage::default();
        let cache = MemoryCache::new();
        let cached = PayloadRef::new("h", "/store/a.md", 4);
        cache.set("dropbox-file-1", cached.clone());
        let store = FakeStore::default();
        let materializer = PayloadMaterializer::new(&storage, &cache, &store);

        let outcome = materializer.materialize(&markdown("1", "/a.md")).await;
        assert_eq!(outcome, MaterializeOutcome::Cached(cached.clone()));
        assert_eq!(storage.links.load(Ordering::SeqCst), 0);
        assert!(store.requests.lock().unwrap().is_empty());
        assert_eq!(*store.touched.lock().unwrap(), vec![cached]);
    }

    #[tokio::test]
    async fn test_folders_are_skipped() {
        let storage = LinkStorage::default();
        let cache = MemoryCache::new();
        let store = FakeStore::default();
        let materializer = PayloadMaterializer::new(&storage, &cache, &store);

        let outcome = materializer.materialize(&Record::root_folder()).await;
        assert_eq!(outcome, MaterializeOutcome::Skipped);
        assert_eq!(storage.links.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_is_soft() {
        let storage = LinkStorage::default();
        let cache = MemoryCache::new();
        let store = FakeStore {
            fail_for: Some("b.md"),
            ..Default::default()
        };
        let materializer = PayloadMaterializer::new(&storage, &cache, &store);

        let mut stats = IngestStats::new();
        let records = vec![markdown("1", "/a.md"), markdown("2", "/b.md"), markdown("3", "/c.md")];
        let records = materializer.materialize_all(records, &mut stats).await;

        assert_eq!(records.len(), 3);
        assert_eq!(records.iter().filter(|r| r.payload.is_some()).count(), 2);
        assert!(records[1].payload.is_none());
        assert_eq!(stats.downloads, 2);
        assert_eq!(stats.failures, 1);
        assert!(cache.get("dropbox-file-2").is_none());
    }
}
