//! Typed client for the client and party resources.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/ef/do/v1/clients/{clientId}` | Fetch a client with its parties |
//! | POST   | `/ef/do/v1/clients/{clientId}` | Update a client (`parties`, `addParties`, `removeParties`) |
//! | POST   | `/ef/do/v1/parties/{partyId}`  | Update a single party |
//!
//! Updates take the JSON body built by the value mapper as-is.

use serde_json::Value;

use kyc_core::{ClientId, ClientResponse, PartyId, PartyResponse};

use crate::error::ApiClientError;
use crate::http::{check_status, read_json, transport, API_PREFIX};
use crate::read::{Read, ReadPolicy};

/// Client for `clients/*`.
#[derive(Debug, Clone)]
pub struct ClientApi {
    http: reqwest::Client,
    base_url: url::Url,
}

impl ClientApi {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }

    /// Fetch a client. Retries transport failures.
    ///
    /// Calls `GET {base_url}/ef/do/v1/clients/{id}`.
    pub async fn get_client(&self, id: &ClientId) -> Result<ClientResponse, ApiClientError> {
        ReadPolicy::default()
            .fetch(&self.http, &self.base_url, Read::Client(id))
            .await
    }

    /// Update a client. Never retried.
    ///
    /// Calls `POST {base_url}/ef/do/v1/clients/{id}`.
    pub async fn update_client(
        &self,
        id: &ClientId,
        body: &Value,
    ) -> Result<ClientResponse, ApiClientError> {
        let endpoint = format!("POST /clients/{id}");
        let url = format!("{}{}/clients/{id}", self.base_url, API_PREFIX);
        tracing::debug!(client_id = %id, "updating client");

        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport(&endpoint))?;
        read_json(resp, &endpoint).await
    }
}

/// Client for `parties/*`.
#[derive(Debug, Clone)]
pub struct PartyApi {
    http: reqwest::Client,
    base_url: url::Url,
}

impl PartyApi {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }

    /// Update a party with a partial party body. Never retried.
    ///
    /// Calls `POST {base_url}/ef/do/v1/parties/{id}`.
    pub async fn update_party(
        &self,
        id: &PartyId,
        body: &Value,
    ) -> Result<PartyResponse, ApiClientError> {
        let endpoint = format!("POST /parties/{id}");
        let url = format!("{}{}/parties/{id}", self.base_url, API_PREFIX);
        tracing::debug!(party_id = %id, "updating party");

        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport(&endpoint))?;
        read_json(resp, &endpoint).await
    }

    /// Deactivate a party. Never retried.
    ///
    /// Calls `POST {base_url}/ef/do/v1/parties/{id}` with `{"active": false}`.
    pub async fn deactivate_party(&self, id: &PartyId) -> Result<(), ApiClientError> {
        let endpoint = format!("POST /parties/{id}");
        let url = format!("{}{}/parties/{id}", self.base_url, API_PREFIX);

        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "active": false }))
            .send()
            .await
            .map_err(transport(&endpoint))?;
        check_status(resp, &endpoint).await.map(|_| ())
    }
}
