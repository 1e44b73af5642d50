//! # Step Validity Replay
//!
//! Decides whether each step of a stepper is complete by replaying the
//! step's validation against data the server already holds, without the
//! user opening the form.
//!
//! For a form step:
//!
//! 1. map the party (if any) to form values, overlaid on values saved in
//!    the form session store;
//! 2. fill in context-aware defaults for every field of the step schema;
//! 3. filter the step schema for the client context on the stepper's
//!    screen, adding the step's own refinements;
//! 4. safe-parse. The step is valid iff that succeeds.
//!
//! Static and check-answers steps are always valid. A stepper is valid iff
//! all its steps are.

use serde::{Serialize, Serializer};

use kyc_core::{ClientContext, ClientResponse, FormValues, PartyResponse};
use kyc_fields::{default_form_values, FieldRegistry};
use kyc_mapping::ValueMapper;
use kyc_schema::{filter_schema, FormSchema, SchemaError, SchemaRegistry, ValidationViolations};

use crate::config::{StepConfig, StepType};
use crate::error::FlowError;

/// Validity of one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepValidation {
    pub is_valid: bool,
    /// Why the step is invalid; empty when valid.
    #[serde(skip_serializing_if = "ValidationViolations::is_empty")]
    pub violations: ValidationViolations,
    /// Whether the step collects data. Static and check-answers steps are
    /// vacuously valid and never show progress.
    #[serde(skip)]
    pub is_form: bool,
}

impl StepValidation {
    /// A form step whose values parse.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            violations: ValidationViolations::default(),
            is_form: true,
        }
    }

    /// A form step whose values do not parse.
    pub fn invalid(violations: ValidationViolations) -> Self {
        Self {
            is_valid: false,
            violations,
            is_form: true,
        }
    }

    /// A static or check-answers step.
    pub fn not_a_form() -> Self {
        Self {
            is_valid: true,
            violations: ValidationViolations::default(),
            is_form: false,
        }
    }
}

/// Validity of every step of a stepper, in step order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepperValidation {
    #[serde(rename = "stepValidationMap", serialize_with = "ordered_map")]
    pub steps: Vec<(String, StepValidation)>,
    pub all_steps_valid: bool,
}

impl StepperValidation {
    pub fn from_steps(steps: impl IntoIterator<Item = (String, StepValidation)>) -> Self {
        let steps: Vec<_> = steps.into_iter().collect();
        let all_steps_valid = steps.iter().all(|(_, v)| v.is_valid);
        Self {
            steps,
            all_steps_valid,
        }
    }

    pub fn get(&self, step_id: &str) -> Option<&StepValidation> {
        self.steps
            .iter()
            .find(|(id, _)| id == step_id)
            .map(|(_, v)| v)
    }

    /// Whether some form step already holds valid data.
    pub fn any_step_valid(&self) -> bool {
        self.steps.iter().any(|(_, v)| v.is_form && v.is_valid)
    }

    /// Ids of the steps that are not valid.
    pub fn invalid_steps(&self) -> impl Iterator<Item = &str> {
        self.steps
            .iter()
            .filter(|(_, v)| !v.is_valid)
            .map(|(id, _)| id.as_str())
    }
}

fn ordered_map<S: Serializer>(
    steps: &[(String, StepValidation)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(steps.iter().map(|(id, v)| (id, v)))
}

/// Replays step validation against registries loaded once per wizard.
#[derive(Debug, Clone, Copy)]
pub struct StepValidator<'r> {
    fields: &'r FieldRegistry,
    schemas: &'r SchemaRegistry,
}

impl<'r> StepValidator<'r> {
    pub fn new(fields: &'r FieldRegistry, schemas: &'r SchemaRegistry) -> Self {
        Self { fields, schemas }
    }

    pub fn fields(&self) -> &'r FieldRegistry {
        self.fields
    }

    pub fn schemas(&self) -> &'r SchemaRegistry {
        self.schemas
    }

    /// The step's schema filtered for `ctx`, with the step's refinements.
    ///
    /// # Errors
    ///
    /// [`FlowError::Schema`] when a form step has no schema or names one
    /// the registry lacks; configuration errors from filtering.
    pub fn step_schema(&self, step: &StepConfig, ctx: &ClientContext) -> Result<FormSchema, FlowError> {
        let name = step.schema.as_deref().ok_or_else(|| SchemaError::SchemaLoadError {
            schema_name: step.id.clone(),
            reason: "form step has no schema".into(),
        })?;
        let schema = self.schemas.get(name)?;
        let refine = |mut schema: FormSchema| {
            for refinement in &step.refinements {
                schema = schema.with_refinement(refinement.clone());
            }
            schema
        };
        let refine: &dyn Fn(FormSchema) -> FormSchema = &refine;
        let refine = (!step.refinements.is_empty()).then_some(refine);
        Ok(filter_schema(schema, self.fields, ctx, refine)?)
    }

    /// Form values a step would open with for `party`.
    pub fn step_values(
        &self,
        schema: &FormSchema,
        party: Option<&PartyResponse>,
        saved: &FormValues,
        ctx: &ClientContext,
    ) -> Result<FormValues, FlowError> {
        let mut existing = saved.clone();
        if let Some(party) = party {
            let from_party = ValueMapper::new(self.fields).party_to_form_values(party)?;
            existing.extend(from_party);
        }
        Ok(default_form_values(self.fields, schema.field_names(), ctx, &existing)?)
    }

    /// Validity of a single step.
    pub fn validate_step(
        &self,
        step: &StepConfig,
        party: Option<&PartyResponse>,
        saved: &FormValues,
        ctx: &ClientContext,
    ) -> Result<StepValidation, FlowError> {
        if step.step_type != StepType::Form {
            return Ok(StepValidation::not_a_form());
        }
        let schema = self.step_schema(step, ctx)?;
        let values = self.step_values(&schema, party, saved, ctx)?;
        match schema.safe_parse(&values) {
            Ok(()) => Ok(StepValidation::valid()),
            Err(SchemaError::ValidationFailed { violations, .. }) => {
                Ok(StepValidation::invalid(violations))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Validity of every step of a stepper on `screen_id` editing `party`.
    ///
    /// # Errors
    ///
    /// Configuration and schema errors only; invalid data is reported in
    /// the result, never as an error.
    pub fn get_stepper_validation(
        &self,
        steps: &[StepConfig],
        party: Option<&PartyResponse>,
        client: Option<&ClientResponse>,
        saved: &FormValues,
        screen_id: &str,
    ) -> Result<StepperValidation, FlowError> {
        let ctx = ClientContext::resolve(client).with_screen(screen_id);
        let mut results = Vec::with_capacity(steps.len());
        for step in steps {
            let validation = self.validate_step(step, party, saved, &ctx)?;
            if !validation.is_valid {
                tracing::debug!(
                    screen = %screen_id,
                    step = %step.id,
                    violations = validation.violations.len(),
                    "step incomplete"
                );
            }
            results.push((step.id.clone(), validation));
        }
        Ok(StepperValidation::from_steps(results))
    }
}
