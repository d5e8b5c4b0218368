//! Archive-level handling of mind document containers.
//!
//! # Responsibility
//! - Reject structurally broken or hostile archives before extraction.
//! - Extract archives into scoped temporary directories.
//!
//! # Invariants
//! - Validation is read-only.
//! - Extraction directories never outlive the load that created them.

mod extract;
mod validate;

pub use extract::{extract_archive, ExtractedArchive};
pub use validate::validate_archive;

/// File suffix of mind document archives, compared case-insensitively.
pub const DOCUMENT_EXTENSION: &str = "xmind";
/// Mandatory primary JSON payload entry.
pub const CONTENT_ENTRY: &str = "content.json";
/// Optional secondary metadata entry.
pub const METADATA_ENTRY: &str = "metadata.json";
/// Largest uncompressed entry accepted during extraction.
pub const MAX_ENTRY_SIZE: u64 = 100 * 1024 * 1024;
