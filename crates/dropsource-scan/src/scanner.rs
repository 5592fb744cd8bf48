//! Listing-to-graph scanner.

use std::time::Instant;

use dropsource_core::{RecordSet, RemoteEntry, RemoteStorage, SourceConfig};

use crate::builder::build_records;
use crate::lister::RemoteLister;
use crate::link::link;

/// Turns a remote listing into a linked [`RecordSet`].
#[derive(Debug, Clone, Default)]
pub struct RecordScanner {
    config: SourceConfig,
}

impl RecordScanner {
    /// Create a scanner for a configuration.
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Build and link records from an already fetched listing.
    pub fn scan_entries(&self, entries: &[RemoteEntry]) -> RecordSet {
        let start = Instant::now();

        let mut records = build_records(entries, &self.config);
        if self.config.create_folder_nodes {
            records = link(records, self.config.folder_match);
        }

        let set = RecordSet::new(records, self.config.clone(), start.elapsed());
        tracing::info!(
            target: "scanner",
            entries = entries.len(),
            files = set.stats.total_files(),
            folders = set.stats.folders,
            "built record graph"
        );
        set
    }

    /// List the configured remote path and build the record graph.
    ///
    /// Listing failures yield an empty listing, so this never fails.
    pub async fn scan<S: RemoteStorage + ?Sized>(&self, storage: &S) -> RecordSet {
        let start = Instant::now();
        let entries = RemoteLister::new(storage).list(&self.config).await;
        let mut set = self.scan_entries(&entries);
        set.duration = start.elapsed();
        set
    }
}
