//! Folder membership and relation lists.

use indexmap::IndexMap;

use dropsource_core::{
    FolderMatch, FolderRelations, ROOT_FOLDER_NAME, Record, RecordBody, RecordKind,
};

/// Parent path of a display path; empty for root-level items.
pub fn parent_path(path: &str) -> &str {
    match path.trim_end_matches('/').rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Bare name of the parent directory, if the path has one.
pub fn parent_segment(path: &str) -> Option<&str> {
    let parent = parent_path(path);
    if parent.is_empty() {
        return None;
    }
    parent.rsplit('/').next().filter(|s| !s.is_empty())
}

/// Key a file is grouped under for the given rule.
fn file_key(record: &Record, rule: FolderMatch) -> String {
    match rule {
        FolderMatch::ParentPath => parent_path(&record.path).to_ascii_lowercase(),
        FolderMatch::ParentName => parent_segment(&record.path)
            .unwrap_or(ROOT_FOLDER_NAME)
            .to_string(),
    }
}

/// Key a folder collects files under for the given rule.
fn folder_key(record: &Record, rule: FolderMatch) -> String {
    match rule {
        FolderMatch::ParentPath => record.path.trim_end_matches('/').to_ascii_lowercase(),
        FolderMatch::ParentName => record.name.to_string(),
    }
}

/// Group linkable file ids by membership key, preserving listing order.
fn group_children(records: &[Record], rule: FolderMatch) -> IndexMap<String, FolderRelations> {
    records
        .iter()
        .filter(|r| r.kind.is_linkable())
        .fold(IndexMap::new(), |mut groups, record| {
            let relations: &mut FolderRelations = groups.entry(file_key(record, rule)).or_default();
            match record.kind {
                RecordKind::Image => relations.image_child_ids.push(record.id.clone()),
                RecordKind::Markdown => relations.markdown_child_ids.push(record.id.clone()),
                RecordKind::Default | RecordKind::Folder => {}
            }
            groups
        })
}

/// Attach relation lists to every folder record.
///
/// Only Image and Markdown records are linked; Default records stay
/// reachable through the flat record set alone. Non-folder records pass
/// through unchanged.
pub fn link(records: Vec<Record>, rule: FolderMatch) -> Vec<Record> {
    let groups = group_children(&records, rule);

    records
        .into_iter()
        .map(|record| {
            if !record.is_folder() {
                return record;
            }
            let relations = groups
                .get(&folder_key(&record, rule))
                .cloned()
                .unwrap_or_default();
            Record {
                body: RecordBody::Folder(relations),
                ..record
            }
        })
        .collect()
}
