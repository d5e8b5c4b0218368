//! Document loading orchestration.
//!
//! # Responsibility
//! - Run validate, extract, parse and normalize behind one `load` call.
//! - Serve unchanged files from the injected `DocumentCache`.
//! - Emit `load` logging events with duration and status.
//!
//! # Invariants
//! - Every failure leaves as a `LoadError`; panics inside a stage surface as
//!   `LOAD_FAILED`.
//! - The extraction directory is released before `load` returns, on every
//!   path.
//! - Cache hits perform no archive I/O.

use crate::archive::{extract_archive, validate_archive};
use crate::cache::{DocumentCache, Fingerprint};
use crate::config::LoaderConfig;
use crate::content::parse_content;
use crate::diagnostics::{LoadProbe, LoadReport};
use crate::error::{LoadError, LoadErrorKind, LoadResult, LoadStage};
use crate::logging::{panic_payload_summary, sanitize_message};
use crate::model::document::Document;
use crate::normalize::normalize_document;
use log::{debug, error, info};
use once_cell::sync::Lazy;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

const MAX_LOGGED_ERROR_CHARS: usize = 240;

static SHARED_LOADER: Lazy<DocumentLoader> =
    Lazy::new(|| DocumentLoader::new(LoaderConfig::default()));

/// Returns the process-wide loader with default configuration.
pub fn shared_loader() -> &'static DocumentLoader {
    &SHARED_LOADER
}

/// Loads `path` through the process-wide loader.
pub fn load(path: impl AsRef<Path>) -> LoadResult<Arc<Document>> {
    shared_loader().load(path)
}

/// Result of one load with its optional diagnostic report.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub document: Arc<Document>,
    pub cache_hit: bool,
    /// Present only when instrumentation was enabled.
    pub report: Option<LoadReport>,
}

/// Loads mind document archives into canonical documents.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    config: LoaderConfig,
    cache: Arc<DocumentCache>,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl DocumentLoader {
    /// Creates a loader owning a fresh cache sized by `config`.
    pub fn new(config: LoaderConfig) -> Self {
        let cache = Arc::new(DocumentCache::new(config.cache_capacity));
        Self { config, cache }
    }

    /// Creates a loader that shares `cache` with other loaders.
    ///
    /// The cache keeps its own capacity; `config.cache_capacity` is ignored.
    pub fn with_cache(config: LoaderConfig, cache: Arc<DocumentCache>) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<DocumentCache> {
        &self.cache
    }

    /// Loads one archive, serving it from cache when unchanged.
    ///
    /// # Errors
    /// Returns a tagged `LoadError` for any stage failure; see `LoadErrorKind`.
    pub fn load(&self, path: impl AsRef<Path>) -> LoadResult<Arc<Document>> {
        self.run(path.as_ref(), self.config.debug)
            .map(|outcome| outcome.document)
    }

    /// Loads one archive and returns the report when `config.debug` is set.
    pub fn load_with_report(&self, path: impl AsRef<Path>) -> LoadResult<LoadOutcome> {
        self.run(path.as_ref(), self.config.debug)
    }

    /// Loads one archive with instrumentation forced on.
    pub fn load_debug(&self, path: impl AsRef<Path>) -> LoadResult<LoadOutcome> {
        self.run(path.as_ref(), true)
    }

    fn run(&self, path: &Path, debug_enabled: bool) -> LoadResult<LoadOutcome> {
        let started_at = Instant::now();
        let mut probe = if debug_enabled {
            LoadProbe::new(true, path)
        } else {
            LoadProbe::disabled()
        };

        // Why: a fingerprint failure must not hide the real cause; validation
        // reports it from the uncached path.
        let fingerprint = Fingerprint::of(path).ok();
        if let Some(document) = fingerprint.as_ref().and_then(|fp| self.cache.get(fp)) {
            debug!(
                "event=load module=loader status=hit file={} duration_ms={}",
                path.display(),
                started_at.elapsed().as_millis()
            );
            probe.cache_hit(document.stats());
            return Ok(LoadOutcome {
                document,
                cache_hit: true,
                report: probe.finish(),
            });
        }

        info!(
            "event=load module=loader status=start file={}",
            path.display()
        );
        let result = guard_stages(path, |stage| load_uncached(path, &mut probe, stage));

        match result {
            Ok(document) => {
                let document = Arc::new(document);
                if let Some(fingerprint) = fingerprint {
                    self.cache.insert(fingerprint, Arc::clone(&document));
                }
                info!(
                    "event=load module=loader status=ok file={} sheets={} duration_ms={}",
                    path.display(),
                    document.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(LoadOutcome {
                    document,
                    cache_hit: false,
                    report: probe.finish(),
                })
            }
            Err(err) => {
                error!(
                    "event=load module=loader status=error file={} duration_ms={} error_code={} stage={} error={}",
                    path.display(),
                    started_at.elapsed().as_millis(),
                    err.kind(),
                    err.stage(),
                    sanitize_message(&err.to_string(), MAX_LOGGED_ERROR_CHARS)
                );
                Err(err)
            }
        }
    }
}

/// Runs the uncached stages, turning a panic into `LOAD_FAILED` tagged with
/// the stage `body` last entered.
fn guard_stages<T>(
    path: &Path,
    body: impl FnOnce(&mut LoadStage) -> LoadResult<T>,
) -> LoadResult<T> {
    let mut stage = LoadStage::Validate;
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&mut stage)));
    outcome.unwrap_or_else(|payload| {
        Err(LoadError::new(
            LoadErrorKind::LoadFailed,
            stage,
            "unexpected failure while loading document",
        )
        .with_detail("file", path.display())
        .with_detail("error", panic_payload_summary(payload.as_ref())))
    })
}

/// Cache-miss path. `extracted` is dropped, removing its directory, on any
/// early return.
fn load_uncached(
    path: &Path,
    probe: &mut LoadProbe,
    stage: &mut LoadStage,
) -> LoadResult<Document> {
    *stage = LoadStage::Validate;
    validate_archive(path)?;

    *stage = LoadStage::Extract;
    let stage_started = Instant::now();
    let extracted = extract_archive(path)?;
    probe.extracted(stage_started.elapsed(), extracted.path(), extracted.entries());

    *stage = LoadStage::Parse;
    let stage_started = Instant::now();
    let parsed = parse_content(extracted.path())?;
    probe.parsed(
        stage_started.elapsed(),
        parsed.payload.generation(),
        parsed.metadata.is_some(),
    );

    *stage = LoadStage::Normalize;
    let stage_started = Instant::now();
    let document = normalize_document(&parsed.payload);
    probe.normalized(stage_started.elapsed(), document.stats());

    if let Err(err) = extracted.close() {
        probe.error(format!("extraction cleanup failed: {err}"));
    }
    Ok(document)
}
