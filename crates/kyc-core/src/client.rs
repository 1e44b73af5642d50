//! # Client and Party Data Model
//!
//! Response shapes of the client-management API as consumed by the
//! onboarding engine. Only the fields the engine reasons about are typed;
//! everything else is preserved in flattened `extra` maps so that
//! responses survive a serialize/deserialize cycle unchanged.
//!
//! Fields use `#[serde(default)]` for resilience against schema evolution.
//! `deny_unknown_fields` is intentionally not used.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identity::{ClientId, PartyId};

// ─── Enumerations ────────────────────────────────────────────────────

/// Lifecycle status of an onboarding client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientStatus {
    /// Created, not yet submitted for review.
    New,
    /// Submitted; the back office is reviewing it.
    ReviewInProgress,
    /// The reviewer asked for more information or documents.
    InformationRequested,
    /// Onboarding approved.
    Approved,
    /// Onboarding declined.
    Declined,
    /// Suspended after approval.
    Suspended,
    /// Terminated.
    Terminated,
    /// Forward-compatible catch-all.
    #[serde(other)]
    Unknown,
}

impl ClientStatus {
    /// Whether the client has left the editable data-collection phase.
    ///
    /// Data-collection sections are hidden once any of these is reached.
    pub fn is_post_submission(&self) -> bool {
        matches!(
            self,
            Self::InformationRequested | Self::ReviewInProgress | Self::Approved | Self::Declined
        )
    }
}

impl std::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "NEW",
            Self::ReviewInProgress => "REVIEW_IN_PROGRESS",
            Self::InformationRequested => "INFORMATION_REQUESTED",
            Self::Approved => "APPROVED",
            Self::Declined => "DECLINED",
            Self::Suspended => "SUSPENDED",
            Self::Terminated => "TERMINATED",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Kind of party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyType {
    /// A legal entity.
    Organization,
    /// A natural person.
    Individual,
    /// Forward-compatible catch-all.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for PartyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Organization => write!(f, "ORGANIZATION"),
            Self::Individual => write!(f, "INDIVIDUAL"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Role a party plays on a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyRole {
    /// The organization being onboarded.
    Client,
    /// The individual controlling the organization.
    Controller,
    /// An individual owning a significant share.
    BeneficialOwner,
    AuthorizedUser,
    DecisionMaker,
    PrimaryContact,
    /// Forward-compatible catch-all.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for PartyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Client => "CLIENT",
            Self::Controller => "CONTROLLER",
            Self::BeneficialOwner => "BENEFICIAL_OWNER",
            Self::AuthorizedUser => "AUTHORIZED_USER",
            Self::DecisionMaker => "DECISION_MAKER",
            Self::PrimaryContact => "PRIMARY_CONTACT",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

// ─── Responses ───────────────────────────────────────────────────────

/// A client as returned by `GET /clients/{id}` and by client updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub id: ClientId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ClientStatus>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub parties: Vec<PartyResponse>,
    #[serde(default)]
    pub outstanding: Outstanding,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub question_responses: Vec<QuestionAnswer>,
    /// Keys not modeled above, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClientResponse {
    /// Position of the party with `id` in [`parties`](Self::parties).
    pub fn party_index(&self, id: &PartyId) -> Option<usize> {
        self.parties.iter().position(|p| &p.id == id)
    }

    /// The party with `id`, if present.
    pub fn party(&self, id: &PartyId) -> Option<&PartyResponse> {
        self.parties.iter().find(|p| &p.id == id)
    }

    /// First active party matching `filter`.
    pub fn find_party(&self, filter: &PartyFilter) -> Option<&PartyResponse> {
        self.parties.iter().find(|p| filter.matches(p))
    }

    /// The organization being onboarded: the first organization party with
    /// the `CLIENT` role, else the first organization party.
    pub fn organization_party(&self) -> Option<&PartyResponse> {
        self.find_party(&PartyFilter::new(PartyType::Organization, [PartyRole::Client]))
            .or_else(|| {
                self.parties
                    .iter()
                    .find(|p| p.party_type == Some(PartyType::Organization))
            })
    }

    /// Active parties holding the `BENEFICIAL_OWNER` role.
    pub fn active_owners(&self) -> impl Iterator<Item = &PartyResponse> {
        self.parties
            .iter()
            .filter(|p| p.is_active() && p.has_role(PartyRole::BeneficialOwner))
    }

    /// Whether the server still expects document uploads.
    pub fn has_outstanding_document_requests(&self) -> bool {
        !self.outstanding.document_request_ids.is_empty()
    }
}

/// A party as embedded in a client response or returned by a party update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyResponse {
    pub id: PartyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_type: Option<PartyType>,
    #[serde(default)]
    pub roles: Vec<PartyRole>,
    /// Deactivated parties are kept with `active: false`, never deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_party_id: Option<PartyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_details: Option<OrganizationDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub individual_details: Option<Map<String, Value>>,
    /// Keys not modeled above, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartyResponse {
    /// A party with only identity, type and roles set.
    pub fn new(id: impl Into<PartyId>, party_type: PartyType, roles: Vec<PartyRole>) -> Self {
        Self {
            id: id.into(),
            party_type: Some(party_type),
            roles,
            active: None,
            parent_party_id: None,
            email: None,
            organization_details: None,
            individual_details: None,
            extra: Map::new(),
        }
    }

    /// Parties are active unless explicitly deactivated.
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }

    /// Whether the party holds `role`.
    pub fn has_role(&self, role: PartyRole) -> bool {
        self.roles.contains(&role)
    }
}

/// Organization-specific party details.
///
/// `organizationType` and `jurisdiction` drive the client context; the
/// remaining keys are addressed by field-registry paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Items the server still needs before the client can progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outstanding {
    #[serde(default)]
    pub attestation_document_ids: Vec<String>,
    #[serde(default)]
    pub document_request_ids: Vec<String>,
    #[serde(default)]
    pub party_ids: Vec<String>,
    #[serde(default)]
    pub party_roles: Vec<String>,
    #[serde(default)]
    pub question_ids: Vec<String>,
}

/// A recorded answer to a due-diligence question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswer {
    pub question_id: String,
    #[serde(default)]
    pub values: Vec<String>,
}

// ─── Party filters ───────────────────────────────────────────────────

/// Locates the party a wizard section edits: an active party of the given
/// type holding every listed role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyFilter {
    pub party_type: PartyType,
    pub roles: Vec<PartyRole>,
}

impl PartyFilter {
    pub fn new(party_type: PartyType, roles: impl IntoIterator<Item = PartyRole>) -> Self {
        Self {
            party_type,
            roles: roles.into_iter().collect(),
        }
    }

    /// Whether `party` is active, of the filter's type, and holds all its roles.
    pub fn matches(&self, party: &PartyResponse) -> bool {
        party.is_active()
            && party.party_type == Some(self.party_type)
            && self.roles.iter().all(|r| party.has_role(*r))
    }
}

// ─── Errors returned by the API ──────────────────────────────────────

/// One field-level reason inside an API error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorReason {
    /// Pointer-like path of the offending field (`$.parties[0].email`).
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiErrorReason {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
            code: None,
        }
    }
}

/// Body of a non-2xx response from the client-management API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub http_status: Option<u16>,
    /// Field-level validation reasons.
    #[serde(default)]
    pub context: Vec<ApiErrorReason>,
}
