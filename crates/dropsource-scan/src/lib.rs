//! Remote listing and record graph construction for dropsource.
//!
//! This crate turns a folder listing from the storage provider into a
//! linked set of typed records. Key features:
//!
//! - **Fail-open listing**: provider errors become an empty listing
//! - **Extension-based classification** into markdown, image and default files
//! - **Content digests** over each record's semantic fields
//! - **Folder linking** via a pure fold over the built records
//!
//! # Example
//!
//! ```rust,ignore
//! use dropsource_scan::{RecordScanner, SourceConfig};
//!
//! let scanner = RecordScanner::new(SourceConfig::new("/photos"));
//! let set = scanner.scan(&storage).await;
//!
//! println!("Files: {}", set.stats.total_files());
//! println!("Folders: {}", set.stats.folders);
//! ```

mod builder;
mod classify;
mod link;
mod lister;
mod scanner;

pub use builder::{build_file_records, build_folder_records, build_records};
pub use classify::{IMAGE_EXTENSIONS, MARKDOWN_EXTENSION, classify, extract_files, extract_folders};
pub use link::{link, parent_path, parent_segment};
pub use lister::RemoteLister;
pub use scanner::RecordScanner;

// Re-export core types for convenience
pub use dropsource_core::{
    FolderMatch, FolderRelations, IngestStats, Record, RecordBody, RecordId, RecordKind, RecordSet,
    RemoteEntry, SourceConfig,
};
