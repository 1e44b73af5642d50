//! # Dynamic Schemas
//!
//! Schemas built at runtime from server data rather than loaded from the
//! schema registry: the upload form of a document request and the
//! due-diligence question form.
//!
//! ## Document requests
//!
//! Requirement `i` with `n` upload slots contributes the fields
//! `requirement_{i}_docType` / `requirement_{i}_files` for the first slot
//! and `requirement_{i}_docType_{k}` / `requirement_{i}_files_{k}` for slot
//! `k` (1-based) after that. Requirements already satisfied contribute
//! nothing. All upload fields are optional in the schema; completeness is
//! tracked by [`requirement_progress`].
//!
//! ## Questions
//!
//! Question `id` answers go to `question_{id}`. Top-level questions are
//! required. Sub-questions are optional in the schema and gated by a
//! [`SubQuestionGate`] refinement that requires them only while the parent
//! answer unlocks them.

use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use kyc_core::{DocumentRequestResponse, FormValues, Question, SubQuestion};

use crate::error::SchemaError;
use crate::form::FormSchema;
use crate::refine::{is_blank, Refinement};
use crate::validate::{Violation, ViolationKind};

/// Form field holding the answer to question `id`.
pub fn question_field(id: &str) -> String {
    format!("question_{id}")
}

/// Suffix of upload slot `slot` (0-based).
fn slot_suffix(slot: u32) -> String {
    if slot == 0 {
        String::new()
    } else {
        format!("_{}", slot + 1)
    }
}

/// `(docType field, files field)` of slot `slot` of requirement `index`.
pub fn requirement_fields(index: usize, slot: u32) -> (String, String) {
    let suffix = slot_suffix(slot);
    (
        format!("requirement_{index}_docType{suffix}"),
        format!("requirement_{index}_files{suffix}"),
    )
}

// ─── Requirement progress ───────────────────────────────────────────

/// Progress of one requirement of a document request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementProgress {
    pub index: usize,
    pub optional: bool,
    /// Documents of an accepted type uploaded so far.
    pub uploaded: u32,
    /// Documents needed before the requirement counts as satisfied.
    pub needed: u32,
}

impl RequirementProgress {
    pub fn is_satisfied(&self) -> bool {
        self.optional || self.uploaded >= self.needed
    }

    /// Upload slots still to fill.
    pub fn remaining(&self) -> u32 {
        self.needed.saturating_sub(self.uploaded)
    }
}

/// Progress of every requirement of `request`, given the document types
/// already uploaded against it (one entry per uploaded document).
pub fn requirement_progress(
    request: &DocumentRequestResponse,
    uploaded_types: &[String],
) -> Vec<RequirementProgress> {
    request
        .requirements
        .iter()
        .enumerate()
        .map(|(index, requirement)| {
            let uploaded = uploaded_types
                .iter()
                .filter(|t| requirement.document_types.contains(*t))
                .count();
            RequirementProgress {
                index,
                optional: requirement.is_optional(),
                uploaded: u32::try_from(uploaded).unwrap_or(u32::MAX),
                needed: requirement.slots(),
            }
        })
        .collect()
}

/// Index of the first requirement not yet satisfied.
pub fn active_requirement(progress: &[RequirementProgress]) -> Option<usize> {
    progress.iter().find(|p| !p.is_satisfied()).map(|p| p.index)
}

/// Upload form schema for `request`.
pub fn document_request_schema(
    request: &DocumentRequestResponse,
    uploaded_types: &[String],
) -> Result<FormSchema, SchemaError> {
    let mut properties = Map::new();
    for progress in requirement_progress(request, uploaded_types) {
        if progress.is_satisfied() && !progress.optional {
            continue;
        }
        let types = &request.requirements[progress.index].document_types;
        let slots = if progress.optional { 1 } else { progress.remaining() };
        for slot in 0..slots {
            let (doc_type, files) = requirement_fields(progress.index, slot);
            properties.insert(doc_type, json!({ "type": "string", "enum": allowing_blank(types) }));
            properties.insert(
                files,
                json!({ "type": "array", "items": { "type": "string", "minLength": 1 } }),
            );
        }
    }
    FormSchema::new(
        format!("document-request:{}", request.id),
        json!({ "type": "object", "properties": properties }),
    )
}

fn allowing_blank(types: &[String]) -> Vec<Value> {
    types
        .iter()
        .map(|t| Value::String(t.clone()))
        .chain(std::iter::once(Value::String(String::new())))
        .collect()
}

// ─── Questions ──────────────────────────────────────────────────────

/// Question form schema for `questions`.
pub fn question_schema(questions: &[Question]) -> Result<FormSchema, SchemaError> {
    let mut properties = Map::new();
    let mut required = Vec::new();
    let mut gates = Vec::new();

    for question in questions {
        let key = question_field(&question.id);
        let top_level = question.parent_question_id.is_none();
        properties.insert(key.clone(), answer_schema(question, top_level));
        if top_level {
            required.push(Value::String(key.clone()));
        }
        for sub in &question.sub_questions {
            gates.push(SubQuestionGate {
                parent: key.clone(),
                gate: sub.clone(),
                bounds: sub
                    .question_ids
                    .iter()
                    .filter_map(|id| questions.iter().find(|q| &q.id == id))
                    .map(|q| (question_field(&q.id), answer_bounds(q)))
                    .collect(),
            });
        }
    }

    let mut schema = FormSchema::new(
        "questions",
        json!({ "type": "object", "properties": properties, "required": required }),
    )?;
    for gate in gates {
        schema = schema.with_refinement(gate);
    }
    Ok(schema)
}

fn item_schema(question: &Question) -> Value {
    let items = question
        .response_schema
        .as_ref()
        .and_then(|r| r.items.as_ref());
    let kind = items.and_then(|i| i.kind.as_deref()).unwrap_or("string");
    match kind {
        "boolean" => json!({ "type": "string", "enum": ["true", "false"] }),
        "integer" => json!({ "type": "string", "pattern": "^\\d+$" }),
        _ => match items.and_then(|i| i.allowed.as_ref()) {
            Some(allowed) => json!({ "type": "string", "enum": allowed }),
            None => {
                let mut schema = json!({ "type": "string", "minLength": 1 });
                if let Some(pattern) = items.and_then(|i| i.pattern.as_ref()) {
                    schema["pattern"] = json!(pattern);
                }
                schema
            }
        },
    }
}

/// `(min, max)` answer count; both default to one.
fn answer_bounds(question: &Question) -> (u64, u64) {
    let schema = question.response_schema.as_ref();
    (
        schema.and_then(|s| s.min_items).unwrap_or(1),
        schema.and_then(|s| s.max_items).unwrap_or(1),
    )
}

fn answer_schema(question: &Question, bounded: bool) -> Value {
    let mut schema = json!({ "type": "array", "items": item_schema(question) });
    if bounded {
        let (min, max) = answer_bounds(question);
        schema["minItems"] = json!(min);
        schema["maxItems"] = json!(max);
    }
    schema
}

/// Requires the sub-questions of `gate` while the parent answer unlocks
/// them.
#[derive(Debug, Clone)]
pub struct SubQuestionGate {
    parent: String,
    gate: SubQuestion,
    /// Field and `(min, max)` answer count of each gated sub-question.
    bounds: Vec<(String, (u64, u64))>,
}

impl Refinement for SubQuestionGate {
    fn name(&self) -> &str {
        "sub_question_gate"
    }

    fn fields(&self) -> Vec<&str> {
        self.bounds.iter().map(|(f, _)| f.as_str()).collect()
    }

    fn check(&self, values: &FormValues, _today: NaiveDate) -> Vec<Violation> {
        let answers: Vec<String> = values
            .get(&self.parent)
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        if !self.gate.is_unlocked_by(&answers) {
            return Vec::new();
        }
        let mut violations = Vec::new();
        for (field, (min, max)) in &self.bounds {
            let value = values.get(field);
            let count = value.and_then(Value::as_array).map_or(0, |a| {
                a.iter().filter(|v| !is_blank(Some(*v))).count() as u64
            });
            let kind = if is_blank(value) || count == 0 {
                ViolationKind::Required
            } else if count < *min {
                ViolationKind::TooFew { limit: *min }
            } else if count > *max {
                ViolationKind::TooMany { limit: *max }
            } else {
                continue;
            };
            violations.push(Violation::refinement(
                self.name(),
                field.clone(),
                kind,
                format!("{field} must be answered"),
            ));
        }
        violations
    }
}
