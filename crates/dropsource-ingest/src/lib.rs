//! Payload materialization and provider integration for dropsource.
//!
//! This crate completes a run after the record graph is built:
//!
//! - **Materialization** - download each file's content once, concurrently
//! - **Caching** - remember payloads by remote id so reruns skip downloads
//! - **Local store** - content-addressed payload storage with a sweep pass
//! - **Dropbox client** - the [`RemoteStorage`] used in production
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dropsource_ingest::{DropboxClient, Ingestor, JsonFileCache, LocalStore};
//! use dropsource_core::SourceConfig;
//!
//! let ingestor = Ingestor::new(
//!     SourceConfig::new("/notes"),
//!     Arc::new(DropboxClient::new(token)),
//!     Arc::new(JsonFileCache::open("cache.json")?),
//!     Arc::new(LocalStore::new("payloads")),
//! );
//! let set = ingestor.run().await;
//! println!("{} records, {} downloads", set.len(), set.stats.downloads);
//! ```

mod cache;
mod dropbox;
mod materialize;
mod pipeline;
mod store;

pub use cache::{CACHE_KEY_PREFIX, JsonFileCache, MemoryCache, cache_key};
pub use dropbox::{API_BASE, DropboxClient, REQUEST_TIMEOUT};
pub use materialize::{MaterializeOutcome, PayloadMaterializer};
pub use pipeline::Ingestor;
pub use store::{CONNECT_TIMEOUT, LocalStore, STALL_TIMEOUT, SweepReport};

// Re-export core types
pub use dropsource_core::{
    PayloadCache, PayloadRef, RecordSet, RecordSink, RemoteFileRequest, RemoteStorage,
    ResourceStore,
};
