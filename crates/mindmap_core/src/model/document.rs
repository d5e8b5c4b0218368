//! Document, sheet and topic types.
//!
//! # Responsibility
//! - Hold the normalized mind-map tree produced by one load.
//! - Provide structural statistics for diagnostics and summaries.
//!
//! # Invariants
//! - `Topic::id` is never empty; missing ids are synthesized per load.
//! - `Topic::topics` keeps source order; no de-duplication.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SYNTHESIZED_ID_LEN: usize = 26;

/// Returns a fresh topic id for sources that omit one.
///
/// Ids are random (v4 UUID hex, truncated), so the same file loaded twice
/// without caching yields different synthesized ids.
pub fn synthesize_topic_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(SYNTHESIZED_ID_LEN);
    id
}

/// One node of the mind-map tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub link: Option<String>,
    pub title: Option<String>,
    pub note: Option<String>,
    pub label: Option<String>,
    pub comment: Option<String>,
    /// Marker identifiers in source order. Duplicates are kept.
    pub markers: Vec<String>,
    /// Child topics: legacy inline children first, then attached children.
    pub topics: Vec<Topic>,
}

impl Topic {
    /// Creates a topic with the given id and every other field empty.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            link: None,
            title: None,
            note: None,
            label: None,
            comment: None,
            markers: Vec::new(),
            topics: Vec::new(),
        }
    }

    /// Creates the minimal placeholder topic used when a sheet has none.
    pub fn empty() -> Self {
        Self::with_id(synthesize_topic_id())
    }

    /// Number of topics in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.topics.iter().map(Topic::subtree_len).sum::<usize>()
    }

    /// Depth of the deepest descendant, with `self` at depth 0.
    pub fn max_depth(&self) -> usize {
        self.topics
            .iter()
            .map(|child| child.max_depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// One canvas of a document with its root topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    /// Empty when the source sheet has no id.
    pub id: String,
    pub title: Option<String>,
    pub topic: Topic,
}

/// Normalized document: an ordered list of sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    sheets: Vec<Sheet>,
}

impl Document {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sheet> {
        self.sheets.iter()
    }

    /// Walks every topic of every sheet, depth-first in source order.
    pub fn topics(&self) -> impl Iterator<Item = &Topic> + '_ {
        let mut stack: Vec<&Topic> = self.sheets.iter().rev().map(|sheet| &sheet.topic).collect();
        std::iter::from_fn(move || {
            let topic = stack.pop()?;
            stack.extend(topic.topics.iter().rev());
            Some(topic)
        })
    }

    pub fn stats(&self) -> DocumentStats {
        DocumentStats {
            sheet_count: self.sheets.len(),
            topic_count: self
                .sheets
                .iter()
                .map(|sheet| sheet.topic.subtree_len())
                .sum(),
            max_depth: self
                .sheets
                .iter()
                .map(|sheet| sheet.topic.max_depth())
                .max()
                .unwrap_or(0),
        }
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Sheet;
    type IntoIter = std::slice::Iter<'a, Sheet>;

    fn into_iter(self) -> Self::IntoIter {
        self.sheets.iter()
    }
}

/// Structural counts of one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub sheet_count: usize,
    /// Root topics included.
    pub topic_count: usize,
    /// Root topics sit at depth 0.
    pub max_depth: usize,
}

#[cfg(test)]
mod tests {
    use super::{synthesize_topic_id, Document, Sheet, Topic};

    fn titled(id: &str, children: Vec<Topic>) -> Topic {
        let mut topic = Topic::with_id(id);
        topic.title = Some(id.to_uppercase());
        topic.topics = children;
        topic
    }

    #[test]
    fn synthesized_ids_are_non_empty_and_distinct() {
        let first = synthesize_topic_id();
        let second = synthesize_topic_id();
        assert_eq!(first.len(), 26);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn stats_count_topics_and_depth_across_sheets() {
        let document = Document::new(vec![
            Sheet {
                id: "s1".to_string(),
                title: None,
                topic: titled("a", vec![titled("b", vec![titled("c", vec![])])]),
            },
            Sheet {
                id: "s2".to_string(),
                title: Some("Second".to_string()),
                topic: titled("d", vec![titled("e", vec![]), titled("f", vec![])]),
            },
        ]);

        let stats = document.stats();
        assert_eq!(stats.sheet_count, 2);
        assert_eq!(stats.topic_count, 6);
        assert_eq!(stats.max_depth, 2);
    }

    #[test]
    fn topics_iterates_depth_first_in_source_order() {
        let document = Document::new(vec![Sheet {
            id: String::new(),
            title: None,
            topic: titled("a", vec![titled("b", vec![titled("c", vec![])]), titled("d", vec![])]),
        }]);

        let ids: Vec<&str> = document.topics().map(|topic| topic.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn serializes_with_stable_field_names() {
        let document = Document::new(vec![Sheet {
            id: "s1".to_string(),
            title: None,
            topic: Topic::with_id("root"),
        }]);

        let json = serde_json::to_value(&document).unwrap();
        let topic = &json[0]["topic"];
        assert_eq!(topic["id"], "root");
        assert!(topic["note"].is_null());
        assert_eq!(topic["markers"], serde_json::json!([]));
        assert_eq!(topic["topics"], serde_json::json!([]));
    }
}
