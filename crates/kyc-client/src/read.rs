//! # Idempotent Reads
//!
//! The GET endpoints the wizard re-fetches, as a closed set. Only these go
//! through [`ReadPolicy::fetch`], which retries transport failures
//! (connection refused, timeouts) with doubling delays. A response of any
//! status ends the loop: non-2xx becomes [`ApiClientError::Api`] at once.
//!
//! Client and party updates, uploads and submissions have no variant here
//! and so cannot be retried by accident.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use kyc_core::{ClientId, DocumentRequestId};

use crate::error::ApiClientError;
use crate::http::{read_json, API_PREFIX};

/// A read-only request against the client-management API.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Read<'a> {
    /// `GET clients/{id}`
    Client(&'a ClientId),
    /// `GET document-requests/{id}`
    DocumentRequest(&'a DocumentRequestId),
    /// `GET document-requests?clientId={id}`
    DocumentRequests(&'a ClientId),
    /// `GET questions?questionIds={a,b,...}`
    Questions(&'a [String]),
}

impl Read<'_> {
    /// Label used in errors and logs.
    pub(crate) fn endpoint(&self) -> String {
        match self {
            Self::Client(id) => format!("GET /clients/{id}"),
            Self::DocumentRequest(id) => format!("GET /document-requests/{id}"),
            Self::DocumentRequests(_) => "GET /document-requests".into(),
            Self::Questions(_) => "GET /questions".into(),
        }
    }

    fn url(&self, base: &Url) -> String {
        let resource = match self {
            Self::Client(id) => format!("clients/{id}"),
            Self::DocumentRequest(id) => format!("document-requests/{id}"),
            Self::DocumentRequests(_) => "document-requests".into(),
            Self::Questions(_) => "questions".into(),
        };
        format!("{base}{API_PREFIX}/{resource}")
    }

    fn query(&self) -> Option<(&'static str, String)> {
        match self {
            Self::DocumentRequests(client_id) => Some(("clientId", client_id.to_string())),
            Self::Questions(ids) => Some(("questionIds", ids.join(","))),
            Self::Client(_) | Self::DocumentRequest(_) => None,
        }
    }

    fn request(&self, http: &reqwest::Client, base: &Url) -> reqwest::RequestBuilder {
        let request = http.get(self.url(base));
        match self.query() {
            Some((key, value)) => request.query(&[(key, value)]),
            None => request,
        }
    }
}

/// How often and how patiently a read is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReadPolicy {
    /// Attempts after the first one.
    pub(crate) retries: u32,
    /// Delay before the first retry; doubles for each further one.
    pub(crate) base_delay: Duration,
}

impl Default for ReadPolicy {
    /// Three retries after 200ms, 400ms and 800ms.
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl ReadPolicy {
    pub(crate) fn delay(&self, retry: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry)
    }

    /// Send `read` and decode its JSON body.
    ///
    /// # Errors
    ///
    /// [`ApiClientError::Http`] once every attempt failed in transport;
    /// [`ApiClientError::Api`] or [`ApiClientError::Deserialization`] for
    /// the first response received.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        http: &reqwest::Client,
        base: &Url,
        read: Read<'_>,
    ) -> Result<T, ApiClientError> {
        let endpoint = read.endpoint();
        let mut retry = 0;
        loop {
            match read.request(http, base).send().await {
                Ok(resp) => return read_json(resp, &endpoint).await,
                Err(source) if retry >= self.retries => {
                    return Err(ApiClientError::Http { endpoint, source });
                }
                Err(e) => {
                    let delay = self.delay(retry);
                    retry += 1;
                    tracing::warn!(
                        endpoint = %endpoint,
                        retry,
                        of = self.retries,
                        "read failed, retrying in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_waits_200_400_800() {
        let policy = ReadPolicy::default();
        let delays: Vec<_> = (0..policy.retries).map(|r| policy.delay(r)).collect();
        assert_eq!(
            delays,
            [
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800)
            ]
        );
    }

    #[test]
    fn reads_resolve_under_the_api_prefix() {
        let base = Url::parse("https://api.test/").unwrap();
        let client = ClientId::new("0030000131");
        assert_eq!(
            Read::Client(&client).url(&base),
            "https://api.test/ef/do/v1/clients/0030000131"
        );
        assert_eq!(Read::Client(&client).endpoint(), "GET /clients/0030000131");
        assert_eq!(Read::Client(&client).query(), None);

        let ids = ["30005".to_string(), "30158".to_string()];
        assert_eq!(
            Read::Questions(&ids).query(),
            Some(("questionIds", "30005,30158".to_string()))
        );
        assert_eq!(
            Read::DocumentRequests(&client).query(),
            Some(("clientId", "0030000131".to_string()))
        );
    }

    #[tokio::test]
    async fn exhausted_transport_failures_name_the_endpoint() {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        // Port 1 is closed: connection refused.
        let base = Url::parse("http://127.0.0.1:1/").unwrap();
        let policy = ReadPolicy {
            retries: 2,
            base_delay: Duration::from_millis(1),
        };
        let id = DocumentRequestId::new("68805");

        let err = policy
            .fetch::<serde_json::Value>(&http, &base, Read::DocumentRequest(&id))
            .await
            .unwrap_err();

        assert!(
            matches!(err, ApiClientError::Http { ref endpoint, .. } if endpoint == "GET /document-requests/68805")
        );
        assert!(err.is_transient());
    }
}
