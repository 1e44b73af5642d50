//! Response handling shared by the resource clients.

use serde::de::DeserializeOwned;

use crate::error::ApiClientError;

/// API version path segment, relative to the configured base URL.
pub(crate) const API_PREFIX: &str = "ef/do/v1";

/// Turn a non-2xx response into [`ApiClientError::Api`] and decode the
/// body of a successful one.
pub(crate) async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    endpoint: &str,
) -> Result<T, ApiClientError> {
    let resp = check_status(resp, endpoint).await?;
    resp.json().await.map_err(|e| ApiClientError::Deserialization {
        endpoint: endpoint.to_string(),
        source: e,
    })
}

/// Fail on a non-2xx response, keeping its body for error translation.
pub(crate) async fn check_status(
    resp: reqwest::Response,
    endpoint: &str,
) -> Result<reqwest::Response, ApiClientError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(endpoint, status, "API request rejected");
    Err(ApiClientError::api(endpoint, status, body))
}

/// Map a transport failure onto the endpoint that raised it.
pub(crate) fn transport(endpoint: &str) -> impl FnOnce(reqwest::Error) -> ApiClientError + '_ {
    move |source| ApiClientError::Http {
        endpoint: endpoint.to_string(),
        source,
    }
}
