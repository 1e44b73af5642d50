//! # Flow Configuration
//!
//! Static description of the wizard: screens, the sections among them,
//! and the ordered steps of every stepper screen.
//!
//! ## Design
//!
//! A screen is either a plain component screen or a stepper. Sections are
//! screens that also appear on the overview, carry a label, and resolve a
//! [`SectionStatus`](crate::SectionStatus) through their
//! [`StatusStrategy`]. A few screens play fixed roles in navigation (the
//! overview, the owners list, the review section); [`Landmarks`] names
//! them so the stepper never hardcodes screen ids.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use kyc_core::{ClientResponse, PartyFilter, PartyId, PartyRole, PartyType};
use kyc_mapping::PreSubmitHook;
use kyc_schema::BuiltinRefinement;

use crate::error::FlowError;
use crate::status::StatusStrategy;

// ─── Steps ───────────────────────────────────────────────────────────

/// The kind of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepType {
    /// A form validated against a step schema.
    Form,
    /// Informational content; always valid.
    Static,
    /// Summary of the stepper's forms with links back into them.
    CheckAnswers,
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Form => "form",
            Self::Static => "static",
            Self::CheckAnswers => "check-answers",
        };
        f.write_str(s)
    }
}

/// One step of a stepper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepConfig {
    pub id: String,
    pub title: String,
    pub step_type: StepType,
    /// Step schema name in the schema registry. Form steps only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Cross-field checks added on top of the filtered schema.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refinements: Vec<BuiltinRefinement>,
    /// Adjustments applied to the values before they are mapped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_submit: Vec<PreSubmitHook>,
}

impl StepConfig {
    pub fn form(id: impl Into<String>, title: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            step_type: StepType::Form,
            schema: Some(schema.into()),
            refinements: Vec::new(),
            pre_submit: Vec::new(),
        }
    }

    pub fn static_step(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            step_type: StepType::Static,
            schema: None,
            refinements: Vec::new(),
            pre_submit: Vec::new(),
        }
    }

    pub fn check_answers() -> Self {
        Self {
            id: "check-answers".into(),
            title: "Check your answers".into(),
            step_type: StepType::CheckAnswers,
            schema: None,
            refinements: Vec::new(),
            pre_submit: Vec::new(),
        }
    }

    pub fn with_refinement(mut self, refinement: BuiltinRefinement) -> Self {
        self.refinements.push(refinement);
        self
    }

    pub fn with_pre_submit(mut self, hook: PreSubmitHook) -> Self {
        self.pre_submit.push(hook);
        self
    }

    /// Run the step's pre-submit hooks in order.
    pub fn prepare_submission(&self, values: kyc_core::FormValues) -> kyc_core::FormValues {
        self.pre_submit
            .iter()
            .fold(values, |values, hook| hook.apply(values))
    }
}

// ─── Steppers ────────────────────────────────────────────────────────

/// Party created when a stepper's first form is submitted and no party
/// exists yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyTemplate {
    pub party_type: PartyType,
    pub roles: Vec<PartyRole>,
    /// Roles that replace `roles` for particular organization types.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub roles_by_entity_type: BTreeMap<String, Vec<PartyRole>>,
}

impl PartyTemplate {
    pub fn new(party_type: PartyType, roles: impl IntoIterator<Item = PartyRole>) -> Self {
        Self {
            party_type,
            roles: roles.into_iter().collect(),
            roles_by_entity_type: BTreeMap::new(),
        }
    }

    pub fn with_roles_for(
        mut self,
        entity_type: impl Into<String>,
        roles: impl IntoIterator<Item = PartyRole>,
    ) -> Self {
        self.roles_by_entity_type
            .insert(entity_type.into(), roles.into_iter().collect());
        self
    }

    /// Base request body for a new party of an organization of
    /// `entity_type`.
    pub fn request_body(&self, entity_type: Option<&str>) -> Value {
        let roles = entity_type
            .and_then(|t| self.roles_by_entity_type.get(t))
            .unwrap_or(&self.roles);
        json!({ "partyType": self.party_type, "roles": roles })
    }
}

/// Steps of a stepper screen and the party they edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepperConfig {
    pub steps: Vec<StepConfig>,
    /// Locates the party the stepper edits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_filter: Option<PartyFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_party: Option<PartyTemplate>,
}

impl StepperConfig {
    pub fn new(steps: Vec<StepConfig>) -> Self {
        Self {
            steps,
            party_filter: None,
            default_party: None,
        }
    }

    pub fn for_party(mut self, filter: PartyFilter, template: PartyTemplate) -> Self {
        self.party_filter = Some(filter);
        self.default_party = Some(template);
        self
    }

    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }

    /// Id of the party this stepper edits within `client`.
    pub fn associated_party<'c>(&self, client: Option<&'c ClientResponse>) -> Option<&'c PartyId> {
        let filter = self.party_filter.as_ref()?;
        client?.find_party(filter).map(|p| &p.id)
    }
}

// ─── Screens and sections ────────────────────────────────────────────

/// Overview metadata and status resolution of a section screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionConfig {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_label: Option<String>,
    /// Organization types for which the section is left out entirely.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_for_entity_types: Vec<String>,
    #[serde(default)]
    pub status: StatusStrategy,
    /// Stepper screen replayed for every party it edits, for sections
    /// that list several parties (the owners list).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_stepper: Option<String>,
}

impl SectionConfig {
    pub fn new(label: impl Into<String>, status: StatusStrategy) -> Self {
        Self {
            label: label.into(),
            short_label: None,
            excluded_for_entity_types: Vec::new(),
            status,
            member_stepper: None,
        }
    }

    pub fn is_excluded_for(&self, entity_type: Option<&str>) -> bool {
        entity_type.is_some_and(|t| self.excluded_for_entity_types.iter().any(|e| e == t))
    }
}

/// One screen of the flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenConfig {
    pub id: String,
    /// Present for stepper screens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stepper: Option<StepperConfig>,
    /// Present for section screens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionConfig>,
}

impl ScreenConfig {
    pub fn component(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stepper: None,
            section: None,
        }
    }

    pub fn stepper(id: impl Into<String>, stepper: StepperConfig) -> Self {
        Self {
            id: id.into(),
            stepper: Some(stepper),
            section: None,
        }
    }

    pub fn as_section(mut self, section: SectionConfig) -> Self {
        self.section = Some(section);
        self
    }

    pub fn is_section(&self) -> bool {
        self.section.is_some()
    }

    /// The stepper's steps, empty for component screens.
    pub fn steps(&self) -> &[StepConfig] {
        self.stepper
            .as_ref()
            .map(|s| s.steps.as_slice())
            .unwrap_or_default()
    }
}

/// Result of looking up a screen id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen<'f> {
    Known(&'f ScreenConfig),
    /// No screen has this id. Rendered as a labeled fallback.
    Unknown(&'f str),
}

impl fmt::Display for Screen<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(screen) => f.write_str(&screen.id),
            Self::Unknown(id) => write!(f, "Unknown screen id: {id}"),
        }
    }
}

/// Screens with a fixed role in navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Landmarks {
    /// Asks for the organization type before anything else.
    pub gateway: String,
    pub overview: String,
    /// Lists beneficial owners; owner steppers return here.
    pub owners_section: String,
    /// Steppers opened from here return here on save.
    pub review_section: String,
    /// Last step of the review section; finishing it returns to the
    /// overview.
    pub final_review_step: String,
    /// The only section reachable in document-upload-only mode.
    pub upload_section: String,
    /// Other screens allowed in document-upload-only mode.
    #[serde(default)]
    pub upload_screens: Vec<String>,
}

impl Default for Landmarks {
    fn default() -> Self {
        Self {
            gateway: "gateway".into(),
            overview: "overview".into(),
            owners_section: "owners-section".into(),
            review_section: "review-attest-section".into(),
            final_review_step: "documents".into(),
            upload_section: "upload-documents-section".into(),
            upload_screens: vec!["document-upload-form".into()],
        }
    }
}

/// The whole wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowConfig {
    pub(crate) screens: Vec<ScreenConfig>,
    #[serde(default)]
    pub(crate) landmarks: Landmarks,
}

impl FlowConfig {
    /// # Errors
    ///
    /// [`FlowError::DuplicateScreen`] when two screens share an id.
    pub fn new(screens: Vec<ScreenConfig>, landmarks: Landmarks) -> Result<Self, FlowError> {
        let mut seen = HashSet::new();
        for screen in &screens {
            if !seen.insert(screen.id.as_str()) {
                return Err(FlowError::DuplicateScreen {
                    screen_id: screen.id.clone(),
                });
            }
        }
        Ok(Self { screens, landmarks })
    }

    pub fn landmarks(&self) -> &Landmarks {
        &self.landmarks
    }

    pub fn screens(&self) -> &[ScreenConfig] {
        &self.screens
    }

    pub fn get(&self, id: &str) -> Option<&ScreenConfig> {
        self.screens.iter().find(|s| s.id == id)
    }

    /// Resolve `id`, falling back to [`Screen::Unknown`].
    pub fn screen<'f>(&'f self, id: &'f str) -> Screen<'f> {
        match self.get(id) {
            Some(screen) => Screen::Known(screen),
            None => {
                tracing::warn!(screen = %id, "unknown screen id");
                Screen::Unknown(id)
            }
        }
    }

    /// Section screens shown for an organization of `entity_type`, in
    /// declaration order.
    pub fn sections(&self, entity_type: Option<&str>) -> Vec<&ScreenConfig> {
        self.screens
            .iter()
            .filter(|s| s.section.as_ref().is_some_and(|c| !c.is_excluded_for(entity_type)))
            .collect()
    }

    /// Screen a fresh wizard opens on.
    pub fn entry_screen(&self, entity_type: Option<&str>, documents_only: bool) -> &str {
        if documents_only {
            &self.landmarks.upload_section
        } else if entity_type.is_some() {
            &self.landmarks.overview
        } else {
            &self.landmarks.gateway
        }
    }

    /// Screen the wizard must be redirected to from `current`, if any.
    ///
    /// Document-upload-only mode confines the user to the upload screens;
    /// without an organization type only the gateway is reachable.
    pub fn redirect_for(
        &self,
        current: &str,
        entity_type: Option<&str>,
        documents_only: bool,
    ) -> Option<&str> {
        let landmarks = &self.landmarks;
        if documents_only {
            let allowed = current == landmarks.upload_section
                || landmarks.upload_screens.iter().any(|s| s == current);
            return (!allowed).then_some(landmarks.upload_section.as_str());
        }
        if entity_type.is_none() && current != landmarks.gateway {
            return Some(landmarks.gateway.as_str());
        }
        None
    }
}
