//! Response handling shared by the backend API clients.

use serde::de::DeserializeOwned;

use crate::error::{ProviderError, ProviderResult};

/// Sends `request` and decodes a JSON body.
///
/// `401` maps to `NotAuthorized` (the token was revoked behind our back);
/// every other failure is `FetchFailed`.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> ProviderResult<T> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::fetch("request timeout").with_source(e)
        } else if e.is_connect() {
            ProviderError::fetch("connection failed").with_source(e)
        } else {
            ProviderError::fetch("request failed").with_source(e)
        }
    })?;

    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ProviderError::not_authorized(
            "access token rejected by the calendar API",
        ));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::fetch(format!("API error ({}): {}", status, body)));
    }

    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::fetch("failed to read response").with_source(e))?;

    serde_json::from_str(&body)
        .map_err(|e| ProviderError::fetch("failed to parse response").with_source(e))
}
