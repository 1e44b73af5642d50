//! # Section Status
//!
//! Each section resolves its status through a [`StatusStrategy`] declared
//! next to the section in the flow configuration. The orchestrator never
//! special-cases a section id; it gathers [`StatusInputs`] and asks the
//! strategy.
//!
//! ## Strategies
//!
//! | Strategy              | Resolution                                                     |
//! |-----------------------|----------------------------------------------------------------|
//! | `all_steps_valid`     | `completed` iff every step is valid, else `not_started`        |
//! | `party_details`       | hidden after submission; `completed`, `missing_details` if some step is valid, else `not_started` |
//! | `owners`              | hidden after submission; `missing_details` if any active owner is invalid; `completed` once the owners list is confirmed |
//! | `additional_questions`| hidden after submission; `completed` when no question is outstanding |
//! | `review_attest`       | hidden after submission, else `not_started`                    |
//! | `upload_documents`    | `on_hold` while NEW; `not_started` when documents are requested; `hidden` when decided; else `completed` |
//!
//! A section named in the session's `verifying_section_id` is reported as
//! `verifying` unless its strategy hides it.

use serde::{Deserialize, Serialize};

use kyc_core::{ClientResponse, ClientStatus};

use crate::session::FlowSessionData;
use crate::validity::StepperValidation;

/// Progress of one section as shown on the overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    NotStarted,
    InProgress,
    Verifying,
    Completed,
    MissingDetails,
    OnHold,
    Hidden,
}

impl SectionStatus {
    pub fn is_visible(&self) -> bool {
        *self != Self::Hidden
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Completed | Self::Verifying)
    }
}

impl std::fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Verifying => "verifying",
            Self::Completed => "completed",
            Self::MissingDetails => "missing_details",
            Self::OnHold => "on_hold",
            Self::Hidden => "hidden",
        };
        f.write_str(s)
    }
}

/// Everything a strategy may consult.
#[derive(Debug, Clone, Copy)]
pub struct StatusInputs<'a> {
    pub section_id: &'a str,
    pub session: &'a FlowSessionData,
    pub client: Option<&'a ClientResponse>,
    /// Step validity of the section's own stepper.
    pub validation: &'a StepperValidation,
    /// Whether every active beneficial owner passes the owner steps.
    /// Only computed for sections using [`StatusStrategy::Owners`].
    pub owners_valid: bool,
}

impl StatusInputs<'_> {
    fn status(&self) -> Option<ClientStatus> {
        self.client.and_then(|c| c.status)
    }

    /// Data-collection sections disappear once the client is submitted
    /// or KYC was completed in this session.
    fn collection_closed(&self) -> bool {
        self.session.kyc_completed || self.status().is_some_and(|s| s.is_post_submission())
    }
}

/// How a section computes its status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusStrategy {
    #[default]
    AllStepsValid,
    PartyDetails,
    Owners,
    AdditionalQuestions,
    ReviewAttest,
    UploadDocuments,
}

impl StatusStrategy {
    pub fn resolve(&self, inputs: &StatusInputs<'_>) -> SectionStatus {
        let status = self.resolve_base(inputs);
        if status.is_visible() && inputs.session.is_verifying(inputs.section_id) {
            return SectionStatus::Verifying;
        }
        status
    }

    fn resolve_base(&self, inputs: &StatusInputs<'_>) -> SectionStatus {
        let validation = inputs.validation;
        match self {
            Self::AllStepsValid => {
                if validation.all_steps_valid {
                    SectionStatus::Completed
                } else {
                    SectionStatus::NotStarted
                }
            }
            Self::PartyDetails => {
                if inputs.collection_closed() {
                    SectionStatus::Hidden
                } else if validation.all_steps_valid {
                    SectionStatus::Completed
                } else if validation.any_step_valid() {
                    SectionStatus::MissingDetails
                } else {
                    SectionStatus::NotStarted
                }
            }
            Self::Owners => {
                if inputs.collection_closed() {
                    SectionStatus::Hidden
                } else if !inputs.owners_valid {
                    SectionStatus::MissingDetails
                } else if inputs.session.owners_section_done {
                    SectionStatus::Completed
                } else {
                    SectionStatus::NotStarted
                }
            }
            Self::AdditionalQuestions => {
                if inputs.collection_closed() {
                    SectionStatus::Hidden
                } else if inputs
                    .client
                    .is_some_and(|c| c.outstanding.question_ids.is_empty())
                {
                    SectionStatus::Completed
                } else {
                    SectionStatus::NotStarted
                }
            }
            Self::ReviewAttest => {
                if inputs.collection_closed() {
                    SectionStatus::Hidden
                } else {
                    SectionStatus::NotStarted
                }
            }
            Self::UploadDocuments => {
                let outstanding = inputs
                    .client
                    .is_some_and(ClientResponse::has_outstanding_document_requests);
                match inputs.status() {
                    None | Some(ClientStatus::New) => SectionStatus::OnHold,
                    Some(ClientStatus::InformationRequested) if outstanding => {
                        SectionStatus::NotStarted
                    }
                    Some(ClientStatus::Approved | ClientStatus::Declined) => SectionStatus::Hidden,
                    Some(_) => SectionStatus::Completed,
                }
            }
        }
    }
}
