//! Client-management API error types.

use kyc_core::{ApiErrorBody, ApiErrorReason};

/// Errors from client-management API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The API returned a non-2xx status.
    ///
    /// `reasons` holds the field-level entries of the body's `context`
    /// array when the body is a structured API error; it is empty
    /// otherwise.
    #[error("API {endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
        reasons: Vec<ApiErrorReason>,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// A request body could not be built.
    #[error("failed to build request for {endpoint}: {reason}")]
    Request { endpoint: String, reason: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    /// A second submission was attempted while one is still pending.
    #[error("a submission for {key} is already in flight")]
    MutationInFlight { key: String },
}

impl ApiClientError {
    /// Build an [`ApiClientError::Api`] from a status and raw body.
    pub(crate) fn api(endpoint: impl Into<String>, status: u16, body: String) -> Self {
        let reasons = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|parsed| parsed.context)
            .unwrap_or_default();
        Self::Api {
            endpoint: endpoint.into(),
            status,
            body,
            reasons,
        }
    }

    /// Field-level reasons of a rejected request, if any.
    pub fn reasons(&self) -> &[ApiErrorReason] {
        match self {
            Self::Api { reasons, .. } => reasons,
            _ => &[],
        }
    }

    /// Whether retrying the same request could succeed without changes.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_body_yields_reasons() {
        let body = r#"{"title":"Bad Request","httpStatus":400,"context":[{"field":"$.parties[0].individualDetails.firstName","message":"must not be blank"}]}"#;
        let err = ApiClientError::api("POST /clients/1", 400, body.to_string());
        assert_eq!(err.reasons().len(), 1);
        assert_eq!(err.reasons()[0].message, "must not be blank");
        assert!(!err.is_transient());
    }

    #[test]
    fn unstructured_body_has_no_reasons() {
        let err = ApiClientError::api("GET /clients/1", 503, "upstream timeout".into());
        assert!(err.reasons().is_empty());
        assert!(err.is_transient());
        assert!(err.to_string().contains("503"));
    }
}
