//! # Step Submission
//!
//! Sends one form step to the API and folds the result back into the
//! [`ClientCache`].
//!
//! ## Strategies
//!
//! - **Update**: the step edits an existing party. The form values are
//!   written into a partial party body and sent to `POST /parties/{id}`.
//!   A pristine form sends nothing.
//! - **Create**: the step has no party yet. The values are written over
//!   the section's default party body at `addParties.0` and sent to
//!   `POST /clients/{id}`. The new party is the last party of the response
//!   that was not on the cached client.
//!
//! ## Invariants
//!
//! - At most one submission per client/party pair is in flight. A second
//!   call while one is pending fails with
//!   [`ApiClientError::MutationInFlight`] and sends nothing.
//! - The cache is updated only from a successful response: a spliced party
//!   on update, the whole client on create.
//! - A rejected request with field-level reasons becomes
//!   [`SubmitOutcome::Rejected`] carrying the translated errors. Reasons
//!   that match no field stay in the report's `unhandled` list.

use std::collections::HashSet;

use parking_lot::Mutex;
use serde_json::{json, Value};

use kyc_core::{ClientId, ClientResponse, FormValues, PartyId, PartyResponse};
use kyc_fields::FieldRegistry;
use kyc_mapping::{ArrayKey, ErrorTranslator, TranslationReport, ValueMapper};

use crate::cache::ClientCache;
use crate::clients::{ClientApi, PartyApi};
use crate::error::ApiClientError;

/// One step's submission.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSubmission {
    pub client_id: ClientId,
    /// The party the step edits; `None` creates one.
    pub party_id: Option<PartyId>,
    pub values: FormValues,
    /// Whether the user changed anything since the form was loaded.
    pub dirty: bool,
    /// Field names on the active form. Server errors attach only to these
    /// when non-empty.
    pub form_fields: Vec<String>,
    /// Base party body used when creating (`partyType`, `roles`, ...).
    pub new_party: Value,
}

/// Result of a submission that reached a decision.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Pristine form for an existing party: nothing was sent.
    Unchanged,
    /// The party was updated and spliced into the cache.
    Updated { party: PartyResponse },
    /// A party was created; the client in the cache was replaced.
    Created {
        client: ClientResponse,
        party_id: Option<PartyId>,
    },
    /// The server rejected the values.
    Rejected {
        status: u16,
        report: TranslationReport,
    },
}

impl SubmitOutcome {
    /// The party the step now refers to, if known.
    pub fn party_id(&self) -> Option<&PartyId> {
        match self {
            Self::Updated { party } => Some(&party.id),
            Self::Created { party_id, .. } => party_id.as_ref(),
            Self::Unchanged | Self::Rejected { .. } => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

/// Submits form steps with a single-flight guard per client/party pair.
#[derive(Debug)]
pub struct StepSubmitter<'a> {
    registry: &'a FieldRegistry,
    clients: &'a ClientApi,
    parties: &'a PartyApi,
    cache: &'a ClientCache,
    in_flight: Mutex<HashSet<String>>,
}

impl<'a> StepSubmitter<'a> {
    pub fn new(
        registry: &'a FieldRegistry,
        clients: &'a ClientApi,
        parties: &'a PartyApi,
        cache: &'a ClientCache,
    ) -> Self {
        Self {
            registry,
            clients,
            parties,
            cache,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Whether a submission for this client/party pair is pending.
    pub fn is_in_flight(&self, client_id: &ClientId, party_id: Option<&PartyId>) -> bool {
        self.in_flight.lock().contains(&flight_key(client_id, party_id))
    }

    /// Send `submission`.
    ///
    /// # Errors
    ///
    /// [`ApiClientError::MutationInFlight`] for a concurrent duplicate,
    /// transport and decoding errors, request-building errors, and API
    /// errors that carry no field-level reasons.
    pub async fn submit(&self, submission: StepSubmission) -> Result<SubmitOutcome, ApiClientError> {
        if submission.party_id.is_some() && !submission.dirty {
            tracing::debug!(client_id = %submission.client_id, "form unchanged, nothing to submit");
            return Ok(SubmitOutcome::Unchanged);
        }
        let key = flight_key(&submission.client_id, submission.party_id.as_ref());
        let _guard = FlightGuard::acquire(&self.in_flight, key)?;

        match &submission.party_id {
            Some(party_id) => self.update(&submission, party_id).await,
            None => self.create(&submission).await,
        }
    }

    async fn update(
        &self,
        submission: &StepSubmission,
        party_id: &PartyId,
    ) -> Result<SubmitOutcome, ApiClientError> {
        let body = ValueMapper::new(self.registry)
            .to_party_request_body(&submission.values, Value::Null)
            .map_err(|e| ApiClientError::Request {
                endpoint: format!("POST /parties/{party_id}"),
                reason: e.to_string(),
            })?;

        match self.parties.update_party(party_id, &body).await {
            Ok(party) => {
                self.cache.splice_party(&submission.client_id, party.clone());
                Ok(SubmitOutcome::Updated { party })
            }
            Err(err) => self.rejected(err, submission, |t, reasons| t.translate_party_errors(reasons)),
        }
    }

    async fn create(&self, submission: &StepSubmission) -> Result<SubmitOutcome, ApiClientError> {
        let endpoint = format!("POST /clients/{}", submission.client_id);
        let base = json!({ "addParties": [submission.new_party.clone()] });
        let body = ValueMapper::new(self.registry)
            .to_request_body(&submission.values, 0, ArrayKey::AddParties, base)
            .map_err(|e| ApiClientError::Request {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        let known: HashSet<PartyId> = self
            .cache
            .get(&submission.client_id)
            .map(|c| c.parties.into_iter().map(|p| p.id).collect())
            .unwrap_or_default();

        match self.clients.update_client(&submission.client_id, &body).await {
            Ok(client) => {
                let party_id = client
                    .parties
                    .iter()
                    .rev()
                    .find(|p| !known.contains(&p.id))
                    .map(|p| p.id.clone());
                tracing::info!(
                    client_id = %client.id,
                    party_id = party_id.as_ref().map(PartyId::as_str).unwrap_or(""),
                    "party created"
                );
                self.cache.replace(client.clone());
                Ok(SubmitOutcome::Created { client, party_id })
            }
            Err(err) => self.rejected(err, submission, |t, reasons| {
                t.translate_errors(reasons, 0, ArrayKey::AddParties)
            }),
        }
    }

    fn rejected(
        &self,
        err: ApiClientError,
        submission: &StepSubmission,
        translate: impl FnOnce(&ErrorTranslator<'_>, &[kyc_core::ApiErrorReason]) -> TranslationReport,
    ) -> Result<SubmitOutcome, ApiClientError> {
        let (status, reasons) = match err {
            ApiClientError::Api {
                status, reasons, ..
            } if !reasons.is_empty() => (status, reasons),
            other => return Err(other),
        };
        let mut translator = ErrorTranslator::new(self.registry);
        if !submission.form_fields.is_empty() {
            translator = translator.restrict_to(submission.form_fields.iter().map(String::as_str));
        }
        let report = translate(&translator, &reasons);
        if let Some(notice) = report.unhandled_notice() {
            tracing::warn!(client_id = %submission.client_id, "{notice}");
        }
        Ok(SubmitOutcome::Rejected { status, report })
    }
}

fn flight_key(client_id: &ClientId, party_id: Option<&PartyId>) -> String {
    match party_id {
        Some(party_id) => format!("{client_id}/{party_id}"),
        None => format!("{client_id}/new"),
    }
}

/// Holds a slot in the in-flight set until dropped.
struct FlightGuard<'m> {
    set: &'m Mutex<HashSet<String>>,
    key: String,
}

impl<'m> FlightGuard<'m> {
    fn acquire(set: &'m Mutex<HashSet<String>>, key: String) -> Result<Self, ApiClientError> {
        if !set.lock().insert(key.clone()) {
            return Err(ApiClientError::MutationInFlight { key });
        }
        Ok(Self { set, key })
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_blocks_duplicates_until_dropped() {
        let set = Mutex::new(HashSet::new());
        let guard = FlightGuard::acquire(&set, "c-1/p-1".into()).unwrap();
        assert!(matches!(
            FlightGuard::acquire(&set, "c-1/p-1".into()),
            Err(ApiClientError::MutationInFlight { .. })
        ));
        assert!(FlightGuard::acquire(&set, "c-1/p-2".into()).is_ok());
        drop(guard);
        assert!(FlightGuard::acquire(&set, "c-1/p-1".into()).is_ok());
    }

    #[test]
    fn keys_distinguish_new_parties() {
        let client = ClientId::new("c-1");
        assert_eq!(flight_key(&client, None), "c-1/new");
        assert_eq!(flight_key(&client, Some(&PartyId::new("p-1"))), "c-1/p-1");
    }
}
