//! End-to-end ingestion: list, scan, then materialize.

use std::sync::Arc;
use std::time::Instant;

use dropsource_core::{PayloadCache, RecordSet, RemoteStorage, ResourceStore, SourceConfig};
use dropsource_scan::RecordScanner;

use crate::materialize::PayloadMaterializer;

/// Runs the ingestion pipeline against its collaborators.
#[derive(Clone)]
pub struct Ingestor {
    config: SourceConfig,
    storage: Arc<dyn RemoteStorage>,
    cache: Arc<dyn PayloadCache>,
    store: Arc<dyn ResourceStore>,
}

impl Ingestor {
    /// Create an ingestor.
    pub fn new(
        config: SourceConfig,
        storage: Arc<dyn RemoteStorage>,
        cache: Arc<dyn PayloadCache>,
        store: Arc<dyn ResourceStore>,
    ) -> Self {
        Self {
            config,
            storage,
            cache,
            store,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// List and build the linked record graph without materializing payloads.
    pub async fn scan(&self) -> RecordSet {
        RecordScanner::new(self.config.clone())
            .scan(self.storage.as_ref())
            .await
    }

    /// Run the full pipeline.
    ///
    /// The record graph is complete before any payload is requested; payloads
    /// are then materialized concurrently. Neither listing nor payload
    /// failures abort the run: they only shrink the output.
    pub async fn run(&self) -> RecordSet {
        let start = Instant::now();
        let mut set = self.scan().await;

        let materializer =
            PayloadMaterializer::new(self.storage.as_ref(), self.cache.as_ref(), self.store.as_ref());
        let records = std::mem::take(&mut set.records);
        set.records = materializer.materialize_all(records, &mut set.stats).await;
        set.duration = start.elapsed();

        tracing::info!(
            target: "ingest",
            records = set.len(),
            cache_hits = set.stats.cache_hits,
            downloads = set.stats.downloads,
            failures = set.stats.failures,
            "ingestion finished"
        );
        set
    }
}
