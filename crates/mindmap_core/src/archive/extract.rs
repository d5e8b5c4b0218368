//! Scoped extraction of archives into temporary directories.
//!
//! # Responsibility
//! - Extract every archive entry into a fresh, uniquely named directory.
//! - Tie the directory lifetime to an owned guard value.
//!
//! # Invariants
//! - Entry names must stay inside the extraction root.
//! - The directory is removed when the guard is closed or dropped, including
//!   when extraction fails halfway.

use super::MAX_ENTRY_SIZE;
use crate::error::{LoadError, LoadErrorKind, LoadResult, LoadStage};
use log::{debug, warn};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use zip::ZipArchive;

const EXTRACT_DIR_PREFIX: &str = "mindmap_extract_";

/// Extracted archive contents owned by one in-flight load.
#[derive(Debug)]
pub struct ExtractedArchive {
    dir: TempDir,
    entries: Vec<String>,
}

impl ExtractedArchive {
    /// Root of the extracted tree.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Names of extracted file entries in archive order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Removes the extraction directory now.
    ///
    /// Removal failure is logged and returned; dropping the guard instead
    /// performs the same removal silently.
    pub fn close(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => {
                debug!(
                    "event=extract_cleanup module=archive status=ok dir={}",
                    path.display()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=extract_cleanup module=archive status=error dir={} error={}",
                    path.display(),
                    err
                );
                Err(err)
            }
        }
    }
}

/// Extracts a validated archive into a new temporary directory.
///
/// # Errors
/// - `EXTRACTION_FAILED` when the directory cannot be created, the archive
///   cannot be opened, an entry escapes the extraction root, an entry is
///   larger than `MAX_ENTRY_SIZE`, or writing an entry fails.
pub fn extract_archive(path: &Path) -> LoadResult<ExtractedArchive> {
    let started_at = Instant::now();
    let dir = tempfile::Builder::new()
        .prefix(EXTRACT_DIR_PREFIX)
        .tempdir()
        .map_err(|err| failure(path, "cannot create extraction directory").with_source(err))?;

    // Why: `dir` is a guard; any `?` below drops it and removes the
    // partially extracted tree.
    let file = File::open(path)
        .map_err(|err| failure(path, "archive file cannot be opened").with_source(err))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(|err| failure(path, "archive cannot be opened for extraction").with_source(err))?;
    let entries = extract_entries(&mut archive, dir.path(), path)?;

    debug!(
        "event=archive_extract module=archive status=ok duration_ms={} entries={} dir={}",
        started_at.elapsed().as_millis(),
        entries.len(),
        dir.path().display()
    );
    Ok(ExtractedArchive { dir, entries })
}

fn extract_entries<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    root: &Path,
    path: &Path,
) -> LoadResult<Vec<String>> {
    let mut entries = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|err| {
            failure(path, "archive entry cannot be opened")
                .with_detail("index", index)
                .with_source(err)
        })?;
        let name = entry.name().to_string();

        let relative: PathBuf = match entry.enclosed_name() {
            Some(relative) => relative.to_path_buf(),
            None => {
                return Err(
                    failure(path, "archive entry escapes the extraction directory")
                        .with_detail("entry", name),
                );
            }
        };
        let target = root.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|err| {
                failure(path, "cannot create entry directory")
                    .with_detail("entry", &name)
                    .with_source(err)
            })?;
            continue;
        }

        if entry.size() > MAX_ENTRY_SIZE {
            return Err(failure(path, "archive entry exceeds size limit")
                .with_detail("entry", name)
                .with_detail("size", entry.size())
                .with_detail("limit", MAX_ENTRY_SIZE));
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                failure(path, "cannot create entry directory")
                    .with_detail("entry", &name)
                    .with_source(err)
            })?;
        }

        let mut out = File::create(&target).map_err(|err| {
            failure(path, "cannot create extracted file")
                .with_detail("entry", &name)
                .with_source(err)
        })?;
        // Why: declared sizes come from the archive itself and can lie, so the
        // written byte count is capped as well.
        let written = io::copy(&mut (&mut entry).take(MAX_ENTRY_SIZE + 1), &mut out)
            .map_err(|err| {
                failure(path, "cannot write extracted file")
                    .with_detail("entry", &name)
                    .with_source(err)
            })?;
        if written > MAX_ENTRY_SIZE {
            return Err(failure(path, "archive entry exceeds size limit")
                .with_detail("entry", name)
                .with_detail("limit", MAX_ENTRY_SIZE));
        }

        entries.push(name);
    }

    Ok(entries)
}

fn failure(path: &Path, message: &str) -> LoadError {
    LoadError::new(LoadErrorKind::ExtractionFailed, LoadStage::Extract, message)
        .with_detail("file", path.display())
}
