//! Record set container and statistics.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::collab::RecordSink;
use crate::config::SourceConfig;
use crate::record::{Record, RecordId, RecordKind};

/// Summary statistics for an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Number of markdown records.
    pub markdown_files: u64,
    /// Number of image records.
    pub image_files: u64,
    /// Number of default records.
    pub default_files: u64,
    /// Number of folder records, including the synthetic root.
    pub folders: u64,
    /// Payloads reused from the cache.
    pub cache_hits: u64,
    /// Payloads downloaded this run.
    pub downloads: u64,
    /// Payloads that failed to materialize.
    pub failures: u64,
    /// Total size of attached payloads.
    pub payload_bytes: u64,
}

impl IngestStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a built record.
    pub fn record(&mut self, kind: RecordKind) {
        match kind {
            RecordKind::Markdown => self.markdown_files += 1,
            RecordKind::Image => self.image_files += 1,
            RecordKind::Default => self.default_files += 1,
            RecordKind::Folder => self.folders += 1,
        }
    }

    /// Count a payload served from the cache.
    pub fn record_cache_hit(&mut self, size: u64) {
        self.cache_hits += 1;
        self.payload_bytes += size;
    }

    /// Count a downloaded payload.
    pub fn record_download(&mut self, size: u64) {
        self.downloads += 1;
        self.payload_bytes += size;
    }

    /// Count a failed materialization.
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Total number of file records.
    pub fn total_files(&self) -> u64 {
        self.markdown_files + self.image_files + self.default_files
    }
}

/// Complete, linked record set with run metadata.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSet {
    /// All records: files first in listing order, then folders, then the
    /// synthetic root.
    pub records: Vec<Record>,

    /// When the listing snapshot was taken.
    pub scanned_at: DateTime<Utc>,

    /// Duration of the run.
    pub duration: Duration,

    /// Configuration used.
    pub config: SourceConfig,

    /// Summary statistics.
    pub stats: IngestStats,
}

impl RecordSet {
    /// Create a record set, counting records into fresh stats.
    pub fn new(records: Vec<Record>, config: SourceConfig, duration: Duration) -> Self {
        let mut stats = IngestStats::new();
        for record in &records {
            stats.record(record.kind);
        }
        Self {
            records,
            scanned_at: Utc::now(),
            duration,
            config,
            stats,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no records were produced.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find a record by id.
    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Iterate over records of one kind.
    pub fn of_kind(&self, kind: RecordKind) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(move |r| r.kind == kind)
    }

    /// Iterate over folder records.
    pub fn folders(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.is_folder())
    }

    /// Iterate over file records.
    pub fn files(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.is_file())
    }

    /// The synthetic root folder, when folder records were produced.
    pub fn root(&self) -> Option<&Record> {
        self.records.iter().find(|r| r.is_root())
    }

    /// Hand every record to a sink, consuming the set.
    pub fn emit(self, sink: &mut dyn RecordSink) -> IngestStats {
        for record in self.records {
            sink.register(record);
        }
        self.stats
    }
}
