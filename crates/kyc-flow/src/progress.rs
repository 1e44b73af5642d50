//! # Flow Progress
//!
//! Status and step validity of every section shown on the overview,
//! computed from the latest client data and the session.

use serde::Serialize;

use kyc_core::{ClientContext, ClientResponse, FormValues};

use crate::config::{FlowConfig, ScreenConfig};
use crate::error::FlowError;
use crate::session::FlowSessionData;
use crate::status::{SectionStatus, StatusInputs};
use crate::validity::{StepValidator, StepperValidation};

/// One section's row on the overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionProgress {
    pub section_id: String,
    pub label: String,
    pub status: SectionStatus,
    pub validation: StepperValidation,
}

/// Progress of every visible section, in flow order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlowProgress {
    sections: Vec<SectionProgress>,
}

impl FlowProgress {
    /// Resolve every section of `flow` for the organization in `client`.
    ///
    /// # Errors
    ///
    /// Configuration and schema errors from step validity replay.
    pub fn compute(
        validator: &StepValidator<'_>,
        flow: &FlowConfig,
        session: &FlowSessionData,
        client: Option<&ClientResponse>,
        saved: &FormValues,
    ) -> Result<Self, FlowError> {
        let ctx = ClientContext::resolve(client);
        let mut sections = Vec::new();
        for screen in flow.sections(ctx.entity_type.as_deref()) {
            let Some(section) = &screen.section else {
                continue;
            };
            let validation = stepper_validation(validator, screen, client, saved)?;
            let owners_valid = match &section.member_stepper {
                Some(member) => members_valid(validator, flow, member, client, saved)?,
                None => true,
            };
            let status = section.status.resolve(&StatusInputs {
                section_id: &screen.id,
                session,
                client,
                validation: &validation,
                owners_valid,
            });
            tracing::debug!(section = %screen.id, %status, "section status");
            sections.push(SectionProgress {
                section_id: screen.id.clone(),
                label: section.label.clone(),
                status,
                validation,
            });
        }
        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[SectionProgress] {
        &self.sections
    }

    pub fn get(&self, section_id: &str) -> Option<&SectionProgress> {
        self.sections.iter().find(|s| s.section_id == section_id)
    }

    pub fn status(&self, section_id: &str) -> Option<SectionStatus> {
        self.get(section_id).map(|s| s.status)
    }

    /// Whether every visible section is completed or verifying.
    pub fn all_done(&self) -> bool {
        self.sections
            .iter()
            .filter(|s| s.status.is_visible())
            .all(|s| s.status.is_done())
    }
}

/// Validity of the section's own stepper against its associated party.
fn stepper_validation(
    validator: &StepValidator<'_>,
    screen: &ScreenConfig,
    client: Option<&ClientResponse>,
    saved: &FormValues,
) -> Result<StepperValidation, FlowError> {
    let Some(stepper) = &screen.stepper else {
        return Ok(StepperValidation::from_steps([]));
    };
    let party = stepper
        .party_filter
        .as_ref()
        .and_then(|filter| client?.find_party(filter));
    validator.get_stepper_validation(&stepper.steps, party, client, saved, &screen.id)
}

/// Whether every party edited by the `member` stepper passes its steps.
fn members_valid(
    validator: &StepValidator<'_>,
    flow: &FlowConfig,
    member: &str,
    client: Option<&ClientResponse>,
    saved: &FormValues,
) -> Result<bool, FlowError> {
    let (Some(client), Some(screen)) = (client, flow.get(member)) else {
        return Ok(true);
    };
    let Some(filter) = screen.stepper.as_ref().and_then(|s| s.party_filter.as_ref()) else {
        return Ok(true);
    };
    for party in client.parties.iter().filter(|p| filter.matches(p)) {
        let validation =
            validator.get_stepper_validation(screen.steps(), Some(party), Some(client), saved, member)?;
        if !validation.all_steps_valid {
            return Ok(false);
        }
    }
    Ok(true)
}
