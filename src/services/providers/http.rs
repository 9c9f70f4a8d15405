//! HTTP helpers shared by the provider clients

use super::error::ProviderError;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build a reqwest client with the given request timeout
pub fn build_client(timeout_seconds: u64) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(ProviderError::Http)
}

/// Send a request and decode a JSON success body
///
/// Non-success statuses become [`ProviderError::Api`], classified against
/// `retryable_statuses`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    retryable_statuses: &[u16],
) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::from_status(
            status.as_u16(),
            &body,
            retryable_statuses,
        ));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse provider response");
        ProviderError::Parse(e.to_string())
    })
}

/// Join a base URL and a path without doubling the slash
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
