//! Structural archive checks performed before extraction.
//!
//! # Responsibility
//! - Map every structural defect to its own error kind.
//! - Run the archive checksum test without writing anything to disk.
//!
//! # Invariants
//! - Checks run in a fixed order and stop at the first failure.
//! - No filesystem state is created or modified.

use super::{CONTENT_ENTRY, DOCUMENT_EXTENSION, MAX_ENTRY_SIZE};
use crate::error::{LoadError, LoadErrorKind, LoadResult, LoadStage};
use crate::logging::sanitize_message;
use log::{debug, warn};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek};
use std::path::Path;
use std::time::Instant;
use zip::result::ZipError;
use zip::ZipArchive;

/// Validates that `path` is a readable, intact mind document archive.
///
/// # Errors
/// - `FILE_NOT_FOUND` when the path does not exist or is not a file.
/// - `BAD_EXTENSION` when the suffix is not `.xmind`.
/// - `EMPTY_FILE` when the file, or its `content.json` entry, is empty.
/// - `BAD_ARCHIVE` when the zip cannot be opened or an entry fails its CRC.
/// - `MISSING_PAYLOAD` when `content.json` is absent.
pub fn validate_archive(path: &Path) -> LoadResult<()> {
    let started_at = Instant::now();
    match run_checks(path) {
        Ok(entries) => {
            debug!(
                "event=archive_validate module=archive status=ok duration_ms={} entries={}",
                started_at.elapsed().as_millis(),
                entries
            );
            Ok(())
        }
        Err(err) => {
            warn!(
                "event=archive_validate module=archive status=error duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.kind(),
                sanitize_message(&err.to_string(), 240)
            );
            Err(err)
        }
    }
}

fn run_checks(path: &Path) -> LoadResult<usize> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(failure(LoadErrorKind::FileNotFound, path, "archive file does not exist"));
        }
        Err(err) => {
            return Err(
                failure(LoadErrorKind::LoadFailed, path, "archive file cannot be inspected")
                    .with_source(err),
            );
        }
    };
    if !metadata.is_file() {
        return Err(failure(
            LoadErrorKind::FileNotFound,
            path,
            "archive path is not a regular file",
        ));
    }

    if !has_document_extension(path) {
        return Err(
            failure(LoadErrorKind::BadExtension, path, "unexpected file extension")
                .with_detail("expected", format!(".{DOCUMENT_EXTENSION}")),
        );
    }

    if metadata.len() == 0 {
        return Err(failure(LoadErrorKind::EmptyFile, path, "archive file is empty"));
    }

    let file = File::open(path).map_err(|err| {
        failure(LoadErrorKind::BadArchive, path, "archive file cannot be opened").with_source(err)
    })?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|err| {
        failure(LoadErrorKind::BadArchive, path, "file is not a valid zip archive").with_source(err)
    })?;

    test_entries(&mut archive, path)?;

    let content_size = match archive.by_name(CONTENT_ENTRY) {
        Ok(entry) => entry.size(),
        Err(ZipError::FileNotFound) => {
            return Err(
                failure(LoadErrorKind::MissingPayload, path, "archive has no primary payload")
                    .with_detail("entry", CONTENT_ENTRY),
            );
        }
        Err(err) => {
            return Err(failure(
                LoadErrorKind::BadArchive,
                path,
                "primary payload entry cannot be read",
            )
            .with_source(err));
        }
    };
    if content_size == 0 {
        return Err(
            failure(LoadErrorKind::EmptyFile, path, "primary payload is empty")
                .with_detail("entry", CONTENT_ENTRY),
        );
    }

    Ok(archive.len())
}

/// Reads every entry through to its end so the zip reader verifies CRCs.
///
/// Entries above `MAX_ENTRY_SIZE` are only read up to the limit; extraction
/// rejects them later.
fn test_entries<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &Path) -> LoadResult<()> {
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|err| {
            failure(LoadErrorKind::BadArchive, path, "archive entry cannot be opened")
                .with_detail("index", index)
                .with_source(err)
        })?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        io::copy(&mut (&mut entry).take(MAX_ENTRY_SIZE + 1), &mut io::sink()).map_err(|err| {
            failure(
                LoadErrorKind::BadArchive,
                path,
                "archive contains corrupted compressed data",
            )
            .with_detail("entry", name)
            .with_source(err)
        })?;
    }
    Ok(())
}

fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
}

fn failure(kind: LoadErrorKind, path: &Path, message: &str) -> LoadError {
    LoadError::new(kind, LoadStage::Validate, message).with_detail("file", path.display())
}
