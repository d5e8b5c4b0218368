//! Archive fixtures shared by integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writes a zip archive at `dir/name` holding `entries` verbatim.
pub fn write_archive(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    write_archive_with(dir, name, entries, CompressionMethod::Deflated)
}

/// Same as `write_archive` but stores entries uncompressed.
pub fn write_stored_archive(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    write_archive_with(dir, name, entries, CompressionMethod::Stored)
}

fn write_archive_with(
    dir: &Path,
    name: &str,
    entries: &[(&str, &str)],
    method: CompressionMethod,
) -> PathBuf {
    let path = dir.join(name);
    let file = fs::File::create(&path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(method);
    for (entry_name, text) in entries {
        writer.start_file(*entry_name, options).unwrap();
        writer.write_all(text.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path
}

/// Writes a `.xmind` archive whose `content.json` is `content`.
pub fn write_document(dir: &Path, name: &str, content: &Value) -> PathBuf {
    let text = serde_json::to_string(content).unwrap();
    write_archive(dir, name, &[("content.json", text.as_str())])
}

/// Modern payload: object root with `sheets`, children under
/// `children.attached`, object markers and structured notes.
pub fn modern_content() -> Value {
    json!({
        "sheets": [
            {
                "id": "sheet-1",
                "title": "Login",
                "rootTopic": {
                    "id": "root-1",
                    "title": "Login module",
                    "children": {
                        "attached": [
                            {
                                "id": "case-1",
                                "title": "Valid credentials",
                                "markers": [{ "markerId": "priority-1" }],
                                "notes": { "plain": { "content": "precondition: user exists" } },
                                "children": {
                                    "attached": [
                                        { "title": "Step: submit form" }
                                    ]
                                }
                            },
                            { "title": "Locked account" }
                        ]
                    }
                }
            },
            {
                "title": "Empty sheet"
            }
        ]
    })
}

/// Legacy payload: array root, inline `topics`, string markers, plain notes.
pub fn legacy_content() -> Value {
    json!([
        {
            "id": "sheet-1",
            "title": "Search",
            "topic": {
                "id": "root-1",
                "title": "Search module",
                "topics": [
                    {
                        "id": "case-1",
                        "title": "Keyword search",
                        "markers": ["priority-2", "task-start"],
                        "note": "index must be warm",
                        "topics": [{ "title": "Step: type keyword" }]
                    },
                    { "title": "Empty query" }
                ]
            }
        }
    ])
}

/// Asserts every topic id in the document tree is non-empty.
pub fn assert_all_topic_ids_present(document: &mindmap_core::Document) {
    for topic in document.topics() {
        assert!(!topic.id.is_empty(), "topic without id: {topic:?}");
    }
}

/// Lists extraction directories left under `tmp_root`.
pub fn extraction_dirs_in(tmp_root: &Path) -> Vec<PathBuf> {
    fs::read_dir(tmp_root)
        .unwrap()
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("mindmap_extract_"))
        })
        .collect()
}
