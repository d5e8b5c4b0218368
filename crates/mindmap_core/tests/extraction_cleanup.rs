//! Runs alone in its own test binary because it redirects `TMPDIR`.

mod common;

use common::{extraction_dirs_in, modern_content, write_archive, write_document};
use mindmap_core::{DocumentLoader, LoadErrorKind, LoaderConfig};
use serde_json::json;
use std::fs;

#[test]
fn extraction_directories_are_removed_on_every_exit_path() {
    let scratch = tempfile::tempdir().unwrap();
    let docs = scratch.path().join("docs");
    let tmp_root = scratch.path().join("tmp");
    fs::create_dir_all(&docs).unwrap();
    fs::create_dir_all(&tmp_root).unwrap();
    std::env::set_var("TMPDIR", &tmp_root);
    assert_eq!(std::env::temp_dir(), tmp_root);

    let loader = DocumentLoader::new(LoaderConfig {
        cache_capacity: 0,
        debug: true,
    });

    let ok = write_document(&docs, "ok.xmind", &modern_content());
    let outcome = loader.load_with_report(&ok).unwrap();
    let used_dir = outcome.report.unwrap().temp_dir.unwrap();
    assert!(used_dir.starts_with(&tmp_root));
    assert!(extraction_dirs_in(&tmp_root).is_empty());

    let malformed = write_archive(&docs, "malformed.xmind", &[("content.json", "{ nope")]);
    let err = loader.load(&malformed).unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::MalformedJson);
    assert!(extraction_dirs_in(&tmp_root).is_empty());

    let invalid = write_document(&docs, "invalid.xmind", &json!({ "sheets": "none" }));
    let err = loader.load(&invalid).unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::SchemaInvalid);
    assert!(extraction_dirs_in(&tmp_root).is_empty());

    let escaping = write_archive(
        &docs,
        "escaping.xmind",
        &[("content.json", "[{}]"), ("../outside.txt", "x")],
    );
    let err = loader.load(&escaping).unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::ExtractionFailed);
    assert!(extraction_dirs_in(&tmp_root).is_empty());
    assert!(!tmp_root.join("outside.txt").exists());
}
