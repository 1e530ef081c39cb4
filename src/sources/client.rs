use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::coins::SourceId;

use super::{SourceError, SourceResult};

const USER_AGENT: &str = concat!("bloxchaser-api/", env!("CARGO_PKG_VERSION"));

/// One shared client for every adapter: bounded total timeout so a hung
/// provider cannot stall a resolution, and a stable User-Agent some providers
/// require.
pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Send a prepared request and decode a JSON body, mapping every failure mode
/// (connect error, timeout, non-2xx, undecodable body) into `SourceError`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: SourceId,
    request: reqwest::RequestBuilder,
) -> SourceResult<T> {
    let response = request
        .send()
        .await
        .map_err(|source| SourceError::Request { provider, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status { provider, status });
    }

    response
        .json::<T>()
        .await
        .map_err(|err| SourceError::MalformedResponse {
            provider,
            detail: err.to_string(),
        })
}
