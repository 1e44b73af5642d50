//! # Form Schemas
//!
//! A [`FormSchema`] is a compiled JSON Schema (Draft 2020-12) for one form,
//! plus its cross-field refinements and the set of fields the current
//! context hides.
//!
//! ## Validation Order
//!
//! 1. The base schema is checked and every violation collected.
//! 2. Only when the base schema accepts the values do the refinements run,
//!    skipping any refinement whose fields are all hidden.
//!
//! Compilation happens once per schema; the compiled validator is shared
//! behind an `Arc`, so cloning a `FormSchema` is cheap and clones may be
//! used from several threads.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use jsonschema::Validator;
use serde_json::Value;

use kyc_core::FormValues;

use crate::error::SchemaError;
use crate::refine::{BuiltinRefinement, Refinement};
use crate::validate::{collect_violations, ValidationViolations};

/// Schema keyword carrying declarative refinements.
pub const REFINEMENTS_KEYWORD: &str = "x-refinements";

/// A compiled form schema.
#[derive(Clone)]
pub struct FormSchema {
    name: String,
    json: Value,
    validator: Arc<Validator>,
    refinements: Vec<Arc<dyn Refinement>>,
    hidden: BTreeSet<String>,
}

impl fmt::Debug for FormSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSchema")
            .field("name", &self.name)
            .field("fields", &self.field_names().collect::<Vec<_>>())
            .field("refinements", &self.refinements)
            .field("hidden", &self.hidden)
            .finish()
    }
}

impl FormSchema {
    /// Compile `json` and read its `x-refinements`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidFormSchema`] if the schema has no `properties`
    /// object or its refinements do not parse, and
    /// [`SchemaError::ValidatorBuildError`] if it is not valid JSON Schema.
    pub fn new(name: impl Into<String>, json: Value) -> Result<Self, SchemaError> {
        let name = name.into();
        let refinements = declared_refinements(&name, &json)?;
        Self::assemble(name, json, refinements, BTreeSet::new())
    }

    pub(crate) fn assemble(
        name: String,
        json: Value,
        refinements: Vec<Arc<dyn Refinement>>,
        hidden: BTreeSet<String>,
    ) -> Result<Self, SchemaError> {
        if !json.get("properties").is_some_and(Value::is_object) {
            return Err(SchemaError::InvalidFormSchema {
                schema_name: name,
                reason: "missing 'properties' object".into(),
            });
        }
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        let validator = opts.build(&json).map_err(|e| SchemaError::ValidatorBuildError {
            schema_name: name.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            name,
            json,
            validator: Arc::new(validator),
            refinements,
            hidden,
        })
    }

    /// Attach an additional refinement.
    pub fn with_refinement(mut self, refinement: impl Refinement + 'static) -> Self {
        self.refinements.push(Arc::new(refinement));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schema document.
    pub fn json(&self) -> &Value {
        &self.json
    }

    /// Top-level field names.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.json
            .get("properties")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|props| props.keys().map(String::as_str))
    }

    /// Top-level fields listed as required.
    pub fn required(&self) -> Vec<&str> {
        self.json
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Subschema of the top-level field `name`.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.json.get("properties")?.get(name)
    }

    pub fn refinements(&self) -> &[Arc<dyn Refinement>] {
        &self.refinements
    }

    /// Dotted paths of fields hidden by the context this schema was
    /// filtered for.
    pub fn hidden(&self) -> &BTreeSet<String> {
        &self.hidden
    }

    pub fn is_hidden(&self, field: &str) -> bool {
        self.hidden.contains(field)
    }

    /// Validate `values` as of today (UTC).
    pub fn safe_parse(&self, values: &FormValues) -> Result<(), SchemaError> {
        self.safe_parse_on(values, Utc::now().date_naive())
    }

    /// Validate `values`, evaluating date refinements as of `today`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::ValidationFailed`] listing every violation found.
    pub fn safe_parse_on(&self, values: &FormValues, today: NaiveDate) -> Result<(), SchemaError> {
        let instance = Value::Object(values.clone());
        let mut violations = collect_violations(&self.validator, &instance);
        if violations.is_empty() {
            for refinement in &self.refinements {
                let fields = refinement.fields();
                if !fields.is_empty() && fields.iter().all(|f| self.is_hidden(f)) {
                    continue;
                }
                violations.extend(refinement.check(values, today));
            }
        }
        if violations.is_empty() {
            return Ok(());
        }
        tracing::debug!(schema = %self.name, count = violations.len(), "form values rejected");
        Err(SchemaError::ValidationFailed {
            schema_name: self.name.clone(),
            violations: ValidationViolations::from(violations),
        })
    }

    /// Whether `values` pass [`safe_parse`](Self::safe_parse).
    pub fn is_valid(&self, values: &FormValues) -> bool {
        self.safe_parse(values).is_ok()
    }
}

fn declared_refinements(name: &str, json: &Value) -> Result<Vec<Arc<dyn Refinement>>, SchemaError> {
    let Some(raw) = json.get(REFINEMENTS_KEYWORD) else {
        return Ok(Vec::new());
    };
    let parsed: Vec<BuiltinRefinement> =
        serde_json::from_value(raw.clone()).map_err(|e| SchemaError::InvalidFormSchema {
            schema_name: name.to_string(),
            reason: format!("{REFINEMENTS_KEYWORD}: {e}"),
        })?;
    Ok(parsed
        .into_iter()
        .map(|r| Arc::new(r) as Arc<dyn Refinement>)
        .collect())
}
