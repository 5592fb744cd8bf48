use chrono::{TimeZone, Utc};
use dropsource_core::{
    ContentDigest, FolderRelations, PayloadRef, ROOT_FOLDER_ID, Record, RecordId, RecordKind,
    RemoteEntry, SOURCE_PARENT, SourceConfig,
};

#[test]
fn test_record_kind_names() {
    assert_eq!(RecordKind::Markdown.to_string(), "DropboxMarkdown");
    assert_eq!(RecordKind::Image.to_string(), "DropboxImage");
    assert_eq!(RecordKind::Default.to_string(), "DropboxNode");
    assert_eq!(RecordKind::Folder.to_string(), "DropboxFolder");
}

#[test]
fn test_content_digest_hex() {
    let digest = ContentDigest::new([0xab; 32]);
    let hex = digest.to_hex();
    assert_eq!(hex.len(), 64);
    assert!(hex.starts_with("ab"));
    assert_eq!(ContentDigest::from_hex(&hex), Some(digest));
    assert_eq!(ContentDigest::from_hex("zz"), None);
}

#[test]
fn test_content_digest_tracks_semantic_fields() {
    let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap();

    let base = ContentDigest::of("a.md", "/docs/a.md", Some(&t1));
    assert_eq!(base, ContentDigest::of("a.md", "/docs/a.md", Some(&t1)));
    assert_ne!(base, ContentDigest::of("a.md", "/docs/a.md", Some(&t2)));
    assert_ne!(base, ContentDigest::of("b.md", "/docs/a.md", Some(&t1)));
    assert_ne!(base, ContentDigest::of("a.md", "/other/a.md", Some(&t1)));
    assert_ne!(base, ContentDigest::of("a.md", "/docs/a.md", None));
}

#[test]
fn test_file_record_json_shape() {
    let modified = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    let record = Record::new_file(
        RecordId::new("id:1"),
        "a.md",
        "/docs/a.md",
        Some(modified),
        RecordKind::Markdown,
    );

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["id"], "id:1");
    assert_eq!(json["parent"], SOURCE_PARENT);
    assert_eq!(json["children"], serde_json::json!([]));
    assert_eq!(json["type"], "DropboxMarkdown");
    assert_eq!(json["name"], "a.md");
    assert_eq!(json["path"], "/docs/a.md");
    assert_eq!(json["lastModified"], "2024-03-01T10:00:00Z");
    assert_eq!(json["contentDigest"].as_str().unwrap().len(), 64);
    assert!(json.get("payload").is_none());
    assert!(json.get("markdownChildIds").is_none());
}

#[test]
fn test_folder_record_json_shape() {
    let mut folder = Record::new_folder(RecordId::new("id:2"), "docs", "/docs");
    folder.body = dropsource_core::RecordBody::Folder(FolderRelations {
        image_child_ids: vec![],
        markdown_child_ids: vec![RecordId::new("id:1")],
    });

    let json = serde_json::to_value(&folder).unwrap();
    assert_eq!(json["type"], "DropboxFolder");
    assert_eq!(json["markdownChildIds"], serde_json::json!(["id:1"]));
    assert_eq!(json["imageChildIds"], serde_json::json!([]));
    assert!(json.get("lastModified").is_none());
}

#[test]
fn test_root_folder() {
    let root = Record::root_folder();
    assert!(root.is_root());
    assert!(root.is_folder());
    assert_eq!(root.id.as_str(), ROOT_FOLDER_ID);
    assert_eq!(root.name, "root");
    assert_eq!(root.path, "");
    assert!(root.relations().unwrap().is_empty());
}

#[test]
fn test_payload_attached_in_json() {
    let mut record = Record::new_file(RecordId::new("1"), "p.png", "/p.png", None, RecordKind::Image);
    record.payload = Some(PayloadRef::new("abc", "/store/abc/p.png", 3));

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["payload"]["id"], "abc");
    assert_eq!(json["payload"]["size"], 3);
}

#[test]
fn test_remote_entry_parses_provider_json() {
    let json = r#"{".tag": "file", "id": "id:9", "name": "x.png", "path_display": "/Pics/x.png",
                   "client_modified": "2023-01-05T08:30:00Z", "size": 12}"#;
    let entry: RemoteEntry = serde_json::from_str(json).unwrap();
    assert!(entry.is_file());
    assert_eq!(entry.extension(), Some(".png"));
    assert!(entry.client_modified.is_some());

    let deleted: RemoteEntry =
        serde_json::from_str(r#"{".tag": "deleted", "id": "", "name": "gone", "path_display": "/gone"}"#)
            .unwrap();
    assert!(!deleted.is_file());
    assert!(!deleted.is_folder());
}

#[test]
fn test_config_partial_fields() {
    let config: SourceConfig = serde_json::from_value(serde_json::json!({
        "path": "/notes",
        "extensions": [".md"],
        "create_folder_nodes": false,
    }))
    .unwrap();

    assert_eq!(config.remote_path(), "/notes");
    assert!(config.recursive);
    assert!(config.allows_extension(".md"));
    assert!(!config.allows_extension(".png"));
    assert!(!config.create_folder_nodes);
}
