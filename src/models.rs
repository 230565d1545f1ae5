//! Core data models used throughout flowdex.
//!
//! These types represent the workflow templates, index records, and context
//! chunks that flow through the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Category assigned to documents whose source did not provide one.
pub const DEFAULT_CATEGORY: &str = "General";

/// Canonical unit of the corpus: one automation-workflow template.
///
/// The typed fields are the ones the pipeline understands; everything else a
/// source sends (including the nested workflow body) is captured in `extra`
/// so re-serialization preserves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, alias = "usedApps")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub usage: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Compact projection of a [`Document`] stored in the index artifact.
///
/// The `usage` counter is projected so the query engine can derive the
/// complexity tier at read time without touching per-document files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub usage: u64,
}

/// Complexity tier inferred from a record's popularity counter at read time.
///
/// Deterministic function of one field, never stored; changing the
/// thresholds reclassifies every record without a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    Beginner,
    Intermediate,
    Advanced,
}

impl Complexity {
    pub fn from_usage(usage: u64) -> Self {
        if usage > 1000 {
            Complexity::Advanced
        } else if usage > 100 {
            Complexity::Intermediate
        } else {
            Complexity::Beginner
        }
    }

    /// Case-insensitive parse of a tier name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "beginner" => Some(Complexity::Beginner),
            "intermediate" => Some(Complexity::Intermediate),
            "advanced" => Some(Complexity::Advanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Beginner => "Beginner",
            Complexity::Intermediate => "Intermediate",
            Complexity::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One formatted retrieval-context chunk, tagged with the slug it came from
/// for traceability in the assembled prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ContextChunk {
    pub slug: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_thresholds() {
        assert_eq!(Complexity::from_usage(0), Complexity::Beginner);
        assert_eq!(Complexity::from_usage(100), Complexity::Beginner);
        assert_eq!(Complexity::from_usage(101), Complexity::Intermediate);
        assert_eq!(Complexity::from_usage(1000), Complexity::Intermediate);
        assert_eq!(Complexity::from_usage(1001), Complexity::Advanced);
    }

    #[test]
    fn test_complexity_parse_case_insensitive() {
        assert_eq!(Complexity::parse("advanced"), Some(Complexity::Advanced));
        assert_eq!(Complexity::parse("BEGINNER"), Some(Complexity::Beginner));
        assert_eq!(Complexity::parse("nope"), None);
    }

    #[test]
    fn test_document_preserves_unknown_fields() {
        let raw = serde_json::json!({
            "id": "t-1",
            "name": "Lead Capture",
            "usedApps": ["hubspot", "slack"],
            "workflow": { "nodes": [{"type": "trigger"}] },
            "customField": "keep-me"
        });
        let doc: Document = serde_json::from_value(raw).unwrap();
        assert_eq!(doc.tags, vec!["hubspot", "slack"]);
        assert!(doc.extra.contains_key("workflow"));
        assert!(doc.extra.contains_key("customField"));

        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["customField"], "keep-me");
        assert_eq!(back["workflow"]["nodes"][0]["type"], "trigger");
    }

    #[test]
    fn test_document_without_name_rejected() {
        let raw = serde_json::json!({ "id": "t-2", "price": 5 });
        assert!(serde_json::from_value::<Document>(raw).is_err());
    }
}
