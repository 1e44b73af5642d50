//! Typed client for document requests, document uploads and questions.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/ef/do/v1/document-requests/{id}` | Get a document request |
//! | GET    | `/ef/do/v1/document-requests?clientId={id}` | List a client's document requests |
//! | POST   | `/ef/do/v1/documents` | Upload one document (base64 content) |
//! | POST   | `/ef/do/v1/document-requests/{id}/submit` | Submit a document request |
//! | GET    | `/ef/do/v1/questions?questionIds={ids}` | List questions by id |

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use kyc_core::{ClientId, DocumentRequestId, DocumentRequestResponse, QuestionList};

use crate::error::ApiClientError;
use crate::http::{check_status, read_json, transport, API_PREFIX};
use crate::read::{Read, ReadPolicy};

// -- Request/Response types ---------------------------------------------------

/// A file to upload against a document request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    /// Document type chosen for the upload slot (`EIN_LETTER`, `PASSPORT`, ...).
    pub document_type: String,
    /// Original file name.
    pub file_name: String,
    /// Raw file bytes.
    pub content: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(
        document_type: impl Into<String>,
        file_name: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            document_type: document_type.into(),
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

/// Body of `POST /documents`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadDocumentRequest<'a> {
    /// Idempotency key for the upload.
    request_id: Uuid,
    /// Base64 file content without a data-URL prefix.
    document_content: String,
    document_name: &'a str,
    document_type: &'a str,
    document_metadata: DocumentMetadata<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentMetadata<'a> {
    document_request_id: &'a DocumentRequestId,
}

/// A stored document as returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Envelope of the document-request listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRequestList {
    #[serde(default)]
    document_requests: Vec<DocumentRequestResponse>,
}

// -- Client -------------------------------------------------------------------

/// Client for `document-requests/*` and `documents`.
#[derive(Debug, Clone)]
pub struct DocumentApi {
    http: reqwest::Client,
    base_url: url::Url,
}

impl DocumentApi {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }

    /// Calls `GET {base_url}/ef/do/v1/document-requests/{id}`.
    pub async fn get_document_request(
        &self,
        id: &DocumentRequestId,
    ) -> Result<DocumentRequestResponse, ApiClientError> {
        ReadPolicy::default()
            .fetch(&self.http, &self.base_url, Read::DocumentRequest(id))
            .await
    }

    /// Calls `GET {base_url}/ef/do/v1/document-requests?clientId={id}`.
    pub async fn list_document_requests(
        &self,
        client_id: &ClientId,
    ) -> Result<Vec<DocumentRequestResponse>, ApiClientError> {
        let list: DocumentRequestList = ReadPolicy::default()
            .fetch(&self.http, &self.base_url, Read::DocumentRequests(client_id))
            .await?;
        Ok(list.document_requests)
    }

    /// Upload one document for `request_id`. Never retried.
    ///
    /// Calls `POST {base_url}/ef/do/v1/documents`.
    pub async fn upload_document(
        &self,
        request_id: &DocumentRequestId,
        upload: &DocumentUpload,
    ) -> Result<DocumentResponse, ApiClientError> {
        let endpoint = "POST /documents";
        let url = format!("{}{}/documents", self.base_url, API_PREFIX);
        let body = UploadDocumentRequest {
            request_id: Uuid::new_v4(),
            document_content: base64::engine::general_purpose::STANDARD.encode(&upload.content),
            document_name: &upload.file_name,
            document_type: &upload.document_type,
            document_metadata: DocumentMetadata {
                document_request_id: request_id,
            },
        };
        tracing::debug!(
            document_request_id = %request_id,
            document_type = %upload.document_type,
            bytes = upload.content.len(),
            "uploading document"
        );

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(transport(endpoint))?;
        read_json(resp, endpoint).await
    }

    /// Mark a document request as complete. Never retried.
    ///
    /// Calls `POST {base_url}/ef/do/v1/document-requests/{id}/submit`.
    pub async fn submit_document_request(
        &self,
        id: &DocumentRequestId,
    ) -> Result<(), ApiClientError> {
        let endpoint = format!("POST /document-requests/{id}/submit");
        let url = format!("{}{}/document-requests/{id}/submit", self.base_url, API_PREFIX);

        let resp = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(transport(&endpoint))?;
        check_status(resp, &endpoint).await.map(|_| ())
    }
}

/// Client for `questions`.
#[derive(Debug, Clone)]
pub struct QuestionApi {
    http: reqwest::Client,
    base_url: url::Url,
}

impl QuestionApi {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }

    /// Calls `GET {base_url}/ef/do/v1/questions?questionIds={ids}`.
    ///
    /// An empty id list short-circuits to an empty result.
    pub async fn list_questions(
        &self,
        question_ids: &[String],
    ) -> Result<QuestionList, ApiClientError> {
        if question_ids.is_empty() {
            return Ok(QuestionList::default());
        }
        ReadPolicy::default()
            .fetch(&self.http, &self.base_url, Read::Questions(question_ids))
            .await
    }
}
