//! Mind-map document loading core.
//! Turns `.xmind` archives of either payload generation into one canonical
//! `Document` tree for downstream test-case exporters.

pub mod archive;
pub mod cache;
pub mod config;
pub mod content;
pub mod diagnostics;
pub mod error;
pub mod loader;
pub mod logging;
pub mod model;
pub mod normalize;

pub use archive::{extract_archive, validate_archive, ExtractedArchive};
pub use cache::{CacheEntry, CacheStats, DocumentCache, Fingerprint, DEFAULT_CACHE_CAPACITY};
pub use config::LoaderConfig;
pub use content::{parse_content, ContentPayload, ParsedContent, RawSheet};
pub use diagnostics::{LoadProbe, LoadReport};
pub use error::{LoadError, LoadErrorKind, LoadResult, LoadStage};
pub use loader::{load, shared_loader, DocumentLoader, LoadOutcome};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::document::{Document, DocumentStats, Sheet, Topic};
pub use normalize::{normalize_document, normalize_sheet, normalize_topic};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
