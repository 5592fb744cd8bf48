//! Conversion of classified entries into typed records.

use itertools::Itertools;

use dropsource_core::{Record, RecordId, RemoteEntry, SourceConfig};

use crate::classify::{classify, extract_files, extract_folders};

/// Build one file record per entry.
pub fn build_file_records(entries: &[&RemoteEntry], folders_enabled: bool) -> Vec<Record> {
    entries
        .iter()
        .map(|entry| {
            Record::new_file(
                RecordId::new(entry.id.clone()),
                entry.name.clone(),
                entry.path_display.clone(),
                entry.client_modified,
                classify(entry, folders_enabled),
            )
        })
        .collect()
}

/// Build one folder record per entry, followed by the synthetic root.
pub fn build_folder_records(entries: &[&RemoteEntry]) -> Vec<Record> {
    entries
        .iter()
        .map(|entry| {
            Record::new_folder(
                RecordId::new(entry.id.clone()),
                entry.name.clone(),
                entry.path_display.clone(),
            )
        })
        .chain(std::iter::once(Record::root_folder()))
        .collect()
}

/// Build every record a listing produces under the given configuration.
///
/// File records come first in listing order, then folder records, then the
/// synthetic root. Entries repeating an id already seen are dropped.
pub fn build_records(entries: &[RemoteEntry], config: &SourceConfig) -> Vec<Record> {
    let files = extract_files(entries, &config.extensions);
    let mut records = build_file_records(&files, config.create_folder_nodes);

    if config.create_folder_nodes {
        let folders = extract_folders(entries);
        records.extend(build_folder_records(&folders));
    }

    let total = records.len();
    let records: Vec<Record> = records.into_iter().unique_by(|r| r.id.clone()).collect();
    if records.len() != total {
        tracing::debug!(target: "builder", dropped = total - records.len(), "dropped entries with duplicate ids");
    }
    records
}
