//! # kyc-client -- Typed Rust client for the client-management API
//!
//! Provides typed access to the resources the onboarding wizard reads and
//! writes:
//! - **Clients** (`clients/{id}`): fetch, and update with `parties` /
//!   `addParties` / `removeParties` bodies
//! - **Parties** (`parties/{id}`): partial updates, deactivation
//! - **Document requests and documents**: listing, base64 uploads,
//!   submission
//! - **Questions**: read-only listing by id
//!
//! On top of the raw resources sit the [`ClientCache`] (latest client per
//! id, with party splicing), the [`StepSubmitter`] (update-or-create with a
//! single-flight guard and server-error translation) and
//! [`upload_documents`] (sequential uploads with per-file results).
//!
//! ## Retry Policy
//!
//! Reads retry transport failures with exponential backoff (see `read`). Mutations are
//! sent exactly once; retrying them is the user's decision.
//!
//! ## API Path Convention
//!
//! All paths are `{base_url}ef/do/v1/{resource}`, e.g.
//! `https://api.example.com/ef/do/v1/clients/0030000131`.

pub mod cache;
pub mod clients;
pub mod config;
pub mod documents;
pub mod error;
pub(crate) mod http;
pub(crate) mod read;
pub mod submit;
pub mod upload;

pub use cache::ClientCache;
pub use clients::{ClientApi, PartyApi};
pub use config::ApiConfig;
pub use documents::{DocumentApi, DocumentResponse, DocumentUpload, QuestionApi};
pub use error::ApiClientError;
pub use submit::{StepSubmission, StepSubmitter, SubmitOutcome};
pub use upload::{upload_and_submit, upload_documents, UploadOutcome, UploadReport};

use std::time::Duration;

/// Top-level API client. Holds one sub-client per resource.
#[derive(Debug, Clone)]
pub struct KycClient {
    clients: ClientApi,
    parties: PartyApi,
    documents: DocumentApi,
    questions: QuestionApi,
}

impl KycClient {
    /// Create a new API client from configuration.
    pub fn new(config: ApiConfig) -> Result<Self, ApiClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                let mut auth =
                    reqwest::header::HeaderValue::from_str(&format!("Bearer {}", config.api_token.as_str()))
                        .map_err(|_| ApiClientError::Config(config::ConfigError::MissingToken))?;
                auth.set_sensitive(true);
                headers.insert(reqwest::header::AUTHORIZATION, auth);
                headers
            })
            .build()
            .map_err(|e| ApiClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            clients: ClientApi::new(http.clone(), config.base_url.clone()),
            parties: PartyApi::new(http.clone(), config.base_url.clone()),
            documents: DocumentApi::new(http.clone(), config.base_url.clone()),
            questions: QuestionApi::new(http, config.base_url),
        })
    }

    /// Access the clients resource.
    pub fn clients(&self) -> &ClientApi {
        &self.clients
    }

    /// Access the parties resource.
    pub fn parties(&self) -> &PartyApi {
        &self.parties
    }

    /// Access document requests and uploads.
    pub fn documents(&self) -> &DocumentApi {
        &self.documents
    }

    /// Access the questions resource.
    pub fn questions(&self) -> &QuestionApi {
        &self.questions
    }

    /// A step submitter writing through this client into `cache`.
    pub fn submitter<'a>(
        &'a self,
        registry: &'a kyc_fields::FieldRegistry,
        cache: &'a ClientCache,
    ) -> StepSubmitter<'a> {
        StepSubmitter::new(registry, &self.clients, &self.parties, cache)
    }
}
