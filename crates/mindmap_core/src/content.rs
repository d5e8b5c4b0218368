//! Primary payload loading and schema resolution.
//!
//! # Responsibility
//! - Read `content.json` from an extraction directory.
//! - Resolve the payload into exactly one supported document generation.
//! - Load optional `metadata.json` without letting it fail the load.
//!
//! # Invariants
//! - A returned `ContentPayload` always holds at least one sheet object.
//! - Metadata problems are logged, never returned as errors.

use crate::archive::{CONTENT_ENTRY, METADATA_ENTRY};
use crate::error::{LoadError, LoadErrorKind, LoadResult, LoadStage};
use crate::logging::sanitize_message;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::Path;

/// Raw sheet object as found in the payload.
pub type RawSheet = Map<String, Value>;

/// Payload resolved into one of the two supported generations.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPayload {
    /// Root is a non-empty array of sheet objects.
    Legacy(Vec<RawSheet>),
    /// Root is an object holding a non-empty `sheets` array.
    Modern(Vec<RawSheet>),
}

impl ContentPayload {
    /// Resolves a parsed JSON value into a payload generation.
    ///
    /// # Errors
    /// - `SCHEMA_INVALID` for an empty array, a scalar root, an object
    ///   without a non-empty `sheets` array, or a non-object sheet element.
    pub fn from_value(value: Value) -> LoadResult<Self> {
        match value {
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(schema_error("content root array must not be empty"));
                }
                Ok(Self::Legacy(sheet_objects(items)?))
            }
            Value::Object(mut root) => {
                let sheets = match root.remove("sheets") {
                    Some(Value::Array(items)) => items,
                    Some(other) => {
                        return Err(schema_error("`sheets` field must be an array")
                            .with_detail("found", json_type_name(&other)));
                    }
                    None => return Err(schema_error("content object has no `sheets` field")),
                };
                if sheets.is_empty() {
                    return Err(schema_error("`sheets` array must not be empty"));
                }
                Ok(Self::Modern(sheet_objects(sheets)?))
            }
            other => Err(
                schema_error("content root must be an object or an array")
                    .with_detail("found", json_type_name(&other)),
            ),
        }
    }

    pub fn sheets(&self) -> &[RawSheet] {
        match self {
            Self::Legacy(sheets) | Self::Modern(sheets) => sheets,
        }
    }

    /// Short generation name used in logs and reports.
    pub fn generation(&self) -> &'static str {
        match self {
            Self::Legacy(_) => "legacy",
            Self::Modern(_) => "modern",
        }
    }
}

/// Output of a successful payload parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedContent {
    pub payload: ContentPayload,
    /// Parsed `metadata.json`, absent when missing or unreadable.
    pub metadata: Option<Value>,
}

/// Reads and schema-checks the payload inside an extraction directory.
///
/// # Errors
/// - `MISSING_PAYLOAD` when `content.json` does not exist.
/// - `LOAD_FAILED` when it exists but cannot be read.
/// - `MALFORMED_JSON` when it is not valid JSON.
/// - `SCHEMA_INVALID` when the shape matches neither generation.
pub fn parse_content(dir: &Path) -> LoadResult<ParsedContent> {
    let content_path = dir.join(CONTENT_ENTRY);
    let bytes = match fs::read(&content_path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(LoadError::new(
                LoadErrorKind::MissingPayload,
                LoadStage::Parse,
                "primary payload file does not exist",
            )
            .with_detail("path", content_path.display()));
        }
        Err(err) => {
            return Err(LoadError::new(
                LoadErrorKind::LoadFailed,
                LoadStage::Parse,
                "primary payload file cannot be read",
            )
            .with_detail("path", content_path.display())
            .with_source(err));
        }
    };

    let value: Value = serde_json::from_slice(&bytes).map_err(|err| {
        LoadError::new(
            LoadErrorKind::MalformedJson,
            LoadStage::Parse,
            "primary payload is not valid JSON",
        )
        .with_detail("line", err.line())
        .with_detail("column", err.column())
        .with_source(err)
    })?;

    let payload = ContentPayload::from_value(value)?;
    debug!(
        "event=content_parse module=content status=ok generation={} sheets={}",
        payload.generation(),
        payload.sheets().len()
    );

    Ok(ParsedContent {
        payload,
        metadata: load_metadata(dir),
    })
}

fn load_metadata(dir: &Path) -> Option<Value> {
    let metadata_path = dir.join(METADATA_ENTRY);
    let bytes = match fs::read(&metadata_path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(
                "event=metadata_load module=content status=error error_code=metadata_unreadable error={}",
                sanitize_message(&err.to_string(), 160)
            );
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                "event=metadata_load module=content status=error error_code=metadata_malformed error={}",
                sanitize_message(&err.to_string(), 160)
            );
            None
        }
    }
}

fn sheet_objects(items: Vec<Value>) -> LoadResult<Vec<RawSheet>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(sheet) => Ok(sheet),
            other => Err(schema_error("sheet entry must be an object")
                .with_detail("index", index)
                .with_detail("found", json_type_name(&other))),
        })
        .collect()
}

fn schema_error(message: &str) -> LoadError {
    LoadError::new(LoadErrorKind::SchemaInvalid, LoadStage::Parse, message)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_content, ContentPayload};
    use crate::error::LoadErrorKind;
    use serde_json::json;
    use std::fs;

    #[test]
    fn resolves_legacy_array_root() {
        let payload = ContentPayload::from_value(json!([{ "id": "s1" }])).unwrap();
        assert_eq!(payload.generation(), "legacy");
        assert_eq!(payload.sheets().len(), 1);
    }

    #[test]
    fn resolves_modern_object_root() {
        let payload =
            ContentPayload::from_value(json!({ "sheets": [{ "id": "s1" }, { "id": "s2" }] }))
                .unwrap();
        assert_eq!(payload.generation(), "modern");
        assert_eq!(payload.sheets().len(), 2);
    }

    #[test]
    fn rejects_unsupported_shapes() {
        let cases = [
            json!([]),
            json!({}),
            json!({ "sheets": [] }),
            json!({ "sheets": { "id": "s1" } }),
            json!("sheets"),
            json!(42),
            json!(null),
            json!([{ "id": "s1" }, "not a sheet"]),
        ];

        for case in cases {
            let err = ContentPayload::from_value(case.clone()).unwrap_err();
            assert_eq!(err.kind(), LoadErrorKind::SchemaInvalid, "case: {case}");
        }
    }

    #[test]
    fn missing_payload_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_content(dir.path()).unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::MissingPayload);
    }

    #[test]
    fn malformed_payload_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("content.json"), "{\"sheets\": [").unwrap();

        let err = parse_content(dir.path()).unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::MalformedJson);
        assert!(err.detail("line").is_some());
    }

    #[test]
    fn broken_metadata_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("content.json"), r#"{"sheets":[{"id":"s1"}]}"#).unwrap();
        fs::write(dir.path().join("metadata.json"), "not json").unwrap();

        let parsed = parse_content(dir.path()).unwrap();
        assert!(parsed.metadata.is_none());
        assert_eq!(parsed.payload.sheets().len(), 1);
    }

    #[test]
    fn valid_metadata_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("content.json"), r#"[{"id":"s1"}]"#).unwrap();
        fs::write(
            dir.path().join("metadata.json"),
            r#"{"creator":{"name":"Vana"}}"#,
        )
        .unwrap();

        let parsed = parse_content(dir.path()).unwrap();
        assert_eq!(parsed.metadata.unwrap()["creator"]["name"], "Vana");
    }
}
