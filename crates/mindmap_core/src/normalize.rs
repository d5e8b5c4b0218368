//! Rewrites raw sheets and topics of either generation into canonical types.
//!
//! # Responsibility
//! - Map legacy and modern topic encodings onto one `Topic` shape.
//! - Guarantee every sheet carries a well-formed root topic.
//!
//! # Invariants
//! - Pure transformation: no I/O, never fails.
//! - Children order is legacy inline `topics` first, then
//!   `children.attached`.
//! - Every produced topic has a non-empty id.

use crate::content::{ContentPayload, RawSheet};
use crate::model::document::{synthesize_topic_id, Document, Sheet, Topic};
use serde_json::{Map, Value};

const LEGACY_TOPIC_KEY: &str = "topic";
const MODERN_TOPIC_KEY: &str = "rootTopic";
const LEGACY_CHILDREN_KEY: &str = "topics";
const MODERN_CHILDREN_KEY: &str = "children";
const ATTACHED_CHILDREN_KEY: &str = "attached";
const MARKER_ID_KEY: &str = "markerId";
const MARKER_FALLBACK_KEY: &str = "id";

/// Normalizes every sheet of a resolved payload, keeping sheet order.
pub fn normalize_document(payload: &ContentPayload) -> Document {
    let sheets = match payload {
        ContentPayload::Legacy(sheets) | ContentPayload::Modern(sheets) => sheets,
    };
    Document::new(sheets.iter().map(normalize_sheet).collect())
}

/// Normalizes one raw sheet object.
///
/// A present `topic` key wins whatever its value; `rootTopic` is read only
/// when `topic` is absent. A null or empty root becomes a placeholder topic.
pub fn normalize_sheet(raw: &RawSheet) -> Sheet {
    let topic = raw
        .get(LEGACY_TOPIC_KEY)
        .or_else(|| raw.get(MODERN_TOPIC_KEY));

    Sheet {
        id: string_field(raw, "id").unwrap_or_default(),
        title: string_field(raw, "title"),
        topic: topic.map_or_else(Topic::empty, normalize_topic),
    }
}

/// Normalizes one raw topic value.
///
/// Anything other than a non-empty object yields `Topic::empty()`.
pub fn normalize_topic(value: &Value) -> Topic {
    match value {
        Value::Object(raw) if !raw.is_empty() => normalize_topic_object(raw),
        _ => Topic::empty(),
    }
}

fn normalize_topic_object(raw: &Map<String, Value>) -> Topic {
    let id = string_field(raw, "id")
        .filter(|id| !id.is_empty())
        .unwrap_or_else(synthesize_topic_id);

    let mut topics = legacy_children(raw);
    topics.extend(attached_children(raw));

    Topic {
        id,
        link: string_field(raw, "link").or_else(|| string_field(raw, "href")),
        title: string_field(raw, "title"),
        note: resolve_note(raw),
        label: string_field(raw, "label"),
        comment: string_field(raw, "comment"),
        markers: resolve_markers(raw),
        topics,
    }
}

/// Explicit non-empty `note` wins over `notes.plain.content`.
fn resolve_note(raw: &Map<String, Value>) -> Option<String> {
    if let Some(note) = string_field(raw, "note").filter(|note| !note.is_empty()) {
        return Some(note);
    }

    raw.get("notes")
        .and_then(Value::as_object)
        .and_then(|notes| notes.get("plain"))
        .and_then(Value::as_object)
        .and_then(|plain| string_field(plain, "content"))
}

fn resolve_markers(raw: &Map<String, Value>) -> Vec<String> {
    let Some(entries) = raw.get("markers").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(marker) => Some(marker.clone()),
            Value::Object(marker) => match marker.get(MARKER_ID_KEY) {
                // Why: a set `markerId` is authoritative; a non-string one
                // drops the marker instead of falling back to `id`.
                Some(id) if is_set(id) => id.as_str().map(str::to_string),
                _ => string_field(marker, MARKER_FALLBACK_KEY),
            },
            _ => None,
        })
        .collect()
}

/// Legacy inline child list: `topics: [...]`.
fn legacy_children(raw: &Map<String, Value>) -> Vec<Topic> {
    raw.get(LEGACY_CHILDREN_KEY)
        .and_then(Value::as_array)
        .map(|children| normalize_children(children))
        .unwrap_or_default()
}

/// Modern attached child list: `children: { attached: [...] }`.
fn attached_children(raw: &Map<String, Value>) -> Vec<Topic> {
    raw.get(MODERN_CHILDREN_KEY)
        .and_then(Value::as_object)
        .and_then(|children| children.get(ATTACHED_CHILDREN_KEY))
        .and_then(Value::as_array)
        .map(|children| normalize_children(children))
        .unwrap_or_default()
}

/// Objects and nulls become topics; scalar and array entries are dropped.
fn normalize_children(children: &[Value]) -> Vec<Topic> {
    children
        .iter()
        .filter(|child| child.is_object() || child.is_null())
        .map(normalize_topic)
        .collect()
}

/// False for null, `false`, zero, and empty strings, arrays or objects.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn string_field(raw: &Map<String, Value>, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}
