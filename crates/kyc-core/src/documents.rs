//! Document requests and due-diligence questions.
//!
//! The engine treats both as read-only inputs: document requirements shape
//! the upload form, question response schemas shape the questions form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identity::{ClientId, DocumentRequestId, PartyId};

/// A request for supporting documents raised by the back office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequestResponse {
    pub id: DocumentRequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    /// Set when the request targets a specific party rather than the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<PartyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub requirements: Vec<DocumentRequirement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One requirement of a document request: upload `min_required` documents
/// whose type is any of `document_types`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequirement {
    #[serde(default)]
    pub document_types: Vec<String>,
    /// `0` marks the requirement optional. Absent is treated as `1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_required: Option<u32>,
}

impl DocumentRequirement {
    /// Whether the requirement may be skipped entirely.
    pub fn is_optional(&self) -> bool {
        self.min_required == Some(0)
    }

    /// Number of upload slots shown for this requirement.
    pub fn slots(&self) -> u32 {
        self.min_required.filter(|n| *n > 0).unwrap_or(1)
    }
}

/// Response of the question listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionList {
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// A due-diligence question and the shape of its expected answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Sub-questions are only asked when the parent answer matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_question_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<ResponseSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_questions: Vec<SubQuestion>,
}

/// JSON-schema-like description of a question's answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSchema {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub min_items: Option<u64>,
    #[serde(default)]
    pub max_items: Option<u64>,
    #[serde(default)]
    pub items: Option<ResponseItems>,
}

/// Item constraints of an array answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseItems {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, rename = "enum")]
    pub allowed: Option<Vec<String>>,
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Gate linking a parent answer to the sub-questions it unlocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubQuestion {
    /// A single value or a list of values; any match unlocks.
    #[serde(default)]
    pub any_values_match: Option<Value>,
    #[serde(default)]
    pub question_ids: Vec<String>,
}

impl SubQuestion {
    /// Whether any of `answers` unlocks this sub-question group.
    pub fn is_unlocked_by(&self, answers: &[String]) -> bool {
        match &self.any_values_match {
            Some(Value::String(expected)) => answers.iter().any(|a| a == expected),
            Some(Value::Array(expected)) => answers
                .iter()
                .any(|a| expected.iter().any(|e| e.as_str() == Some(a.as_str()))),
            _ => false,
        }
    }
}
