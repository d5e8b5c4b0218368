//! Load error taxonomy shared by every loading stage.
//!
//! # Responsibility
//! - Give callers one error type with a stable machine tag per failure kind.
//! - Carry the failing stage and a human-readable detail map.
//!
//! # Invariants
//! - Stage-local failures are translated before they leave the stage.
//! - Low-level error types are only reachable through `Error::source`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by all loader operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadErrorKind {
    FileNotFound,
    BadExtension,
    EmptyFile,
    /// Archive cannot be opened or fails its checksum test.
    BadArchive,
    /// Required `content.json` entry is absent.
    MissingPayload,
    MalformedJson,
    /// Payload parses but matches neither supported document generation.
    SchemaInvalid,
    ExtractionFailed,
    /// Catch-all for unexpected lower-level failures.
    LoadFailed,
}

impl LoadErrorKind {
    /// Returns the stable tag used in logs and error messages.
    pub fn code(self) -> &'static str {
        match self {
            Self::FileNotFound => "FILE_NOT_FOUND",
            Self::BadExtension => "BAD_EXTENSION",
            Self::EmptyFile => "EMPTY_FILE",
            Self::BadArchive => "BAD_ARCHIVE",
            Self::MissingPayload => "MISSING_PAYLOAD",
            Self::MalformedJson => "MALFORMED_JSON",
            Self::SchemaInvalid => "SCHEMA_INVALID",
            Self::ExtractionFailed => "EXTRACTION_FAILED",
            Self::LoadFailed => "LOAD_FAILED",
        }
    }
}

impl Display for LoadErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Loading stage in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStage {
    Validate,
    Extract,
    Parse,
    Normalize,
}

impl LoadStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Extract => "extract",
            Self::Parse => "parse",
            Self::Normalize => "normalize",
        }
    }
}

impl Display for LoadStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged loader error.
///
/// Rendered as `[TAG] message (key=value, ...)`.
#[derive(Debug)]
pub struct LoadError {
    kind: LoadErrorKind,
    stage: LoadStage,
    message: String,
    details: BTreeMap<String, String>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl LoadError {
    pub fn new(kind: LoadErrorKind, stage: LoadStage, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage,
            message: message.into(),
            details: BTreeMap::new(),
            source: None,
        }
    }

    /// Adds one entry to the detail map, replacing an existing key.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.details.insert(key.into(), value.to_string());
        self
    }

    /// Attaches the lower-level cause and records its text under `error`.
    pub fn with_source(mut self, source: impl Error + Send + Sync + 'static) -> Self {
        self.details
            .entry("error".to_string())
            .or_insert_with(|| source.to_string());
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> LoadErrorKind {
        self.kind
    }

    pub fn stage(&self) -> LoadStage {
        self.stage
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }

    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind.code(), self.message)?;
        if !self.details.is_empty() {
            let rendered = self
                .details
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, " ({rendered})")?;
        }
        Ok(())
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| err.as_ref() as &(dyn Error + 'static))
    }
}
