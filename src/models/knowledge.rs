use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AgeGroup, Gender};

/// An anonymized training-signal record derived from a completed
/// diagnosis. Carries no patient id or name; append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseEntry {
    pub id: Uuid,
    pub symptoms: Vec<String>,
    pub age_group: AgeGroup,
    pub gender: Gender,
    pub diagnosis: String,
    pub confidence: u8,
    /// Reserved for a future feedback loop; never populated by the
    /// current flow.
    #[serde(default)]
    pub outcome: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a knowledge-base append. Id and timestamp are assigned by
/// the record store.
#[derive(Debug, Clone)]
pub struct NewKnowledgeEntry {
    pub symptoms: Vec<String>,
    pub age_group: AgeGroup,
    pub gender: Gender,
    pub diagnosis: String,
    pub confidence: u8,
}

/// A guideline snippet surfaced by the fallback backend alongside a
/// diagnosis, for supplementary display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeSnippet {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}
