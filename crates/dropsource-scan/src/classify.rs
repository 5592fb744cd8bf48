//! Entry filtering and extension-based classification.

use dropsource_core::{RecordKind, RemoteEntry};

/// Extension of markdown files.
pub const MARKDOWN_EXTENSION: &str = ".md";

/// Extensions classified as images. Matching is case-sensitive.
pub const IMAGE_EXTENSIONS: [&str; 10] = [
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".tif", ".tiff", ".svg", ".avif",
];

/// Keep file entries whose extension is in the allow-list.
pub fn extract_files<'a, S: AsRef<str>>(
    entries: &'a [RemoteEntry],
    allowed_extensions: &[S],
) -> Vec<&'a RemoteEntry> {
    entries
        .iter()
        .filter(|e| e.is_file())
        .filter(|e| {
            e.extension()
                .is_some_and(|ext| allowed_extensions.iter().any(|a| a.as_ref() == ext))
        })
        .collect()
}

/// Keep folder entries.
pub fn extract_folders(entries: &[RemoteEntry]) -> Vec<&RemoteEntry> {
    entries.iter().filter(|e| e.is_folder()).collect()
}

/// Map an entry to its record type.
///
/// With folder records disabled every file is [`RecordKind::Default`].
pub fn classify(entry: &RemoteEntry, folders_enabled: bool) -> RecordKind {
    if entry.is_folder() {
        return RecordKind::Folder;
    }
    if !folders_enabled {
        return RecordKind::Default;
    }
    match entry.extension() {
        Some(MARKDOWN_EXTENSION) => RecordKind::Markdown,
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => RecordKind::Image,
        _ => RecordKind::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Vec<RemoteEntry> {
        vec![
            RemoteEntry::file("1", "a.md", "/a.md"),
            RemoteEntry::file("2", "b.png", "/b.png"),
            RemoteEntry::file("3", "c.txt", "/c.txt"),
            RemoteEntry::file("4", "D.MD", "/D.MD"),
            RemoteEntry::folder("5", "docs", "/docs"),
        ]
    }

    #[test]
    fn test_extract_files_filters_by_extension() {
        let entries = listing();
        let files = extract_files(&entries, &[".md", ".png"]);
        let ids: Vec<_> = files.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_extract_folders_unfiltered() {
        let entries = listing();
        let folders = extract_folders(&entries);
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name.as_str(), "docs");
    }

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(classify(&RemoteEntry::file("1", "a.md", "/a.md"), true), RecordKind::Markdown);
        assert_eq!(classify(&RemoteEntry::file("1", "a.txt", "/a.txt"), true), RecordKind::Default);
        assert_eq!(classify(&RemoteEntry::file("1", "a", "/a"), true), RecordKind::Default);
        assert_eq!(classify(&RemoteEntry::folder("1", "a", "/a"), true), RecordKind::Folder);
    }

    // Every known image extension maps to Image, not only the first one.
    #[test]
    fn test_classify_every_image_extension() {
        for ext in IMAGE_EXTENSIONS {
            let name = format!("pic{ext}");
            let entry = RemoteEntry::file("1", name.as_str(), format!("/{name}"));
            assert_eq!(classify(&entry, true), RecordKind::Image, "{ext}");
        }
    }

    #[test]
    fn test_classify_without_folders_is_default() {
        assert_eq!(classify(&RemoteEntry::file("1", "a.md", "/a.md"), false), RecordKind::Default);
        assert_eq!(classify(&RemoteEntry::file("1", "a.png", "/a.png"), false), RecordKind::Default);
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        assert_eq!(classify(&RemoteEntry::file("1", "A.PNG", "/A.PNG"), true), RecordKind::Default);
    }
}
