//! HTTP client wrapper for the registry REST API.
//!
//! Requests are not retried: a failed call fails the whole page and the
//! caller decides what to do.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{HarvesterError, Result};

/// User agent string identifying this harvester.
const USER_AGENT: &str = concat!("metaharvest-harvester/", env!("CARGO_PKG_VERSION"));

/// Create a configured HTTP client.
///
/// # Arguments
/// * `timeout_secs` - Whole-request timeout
pub fn create_client(timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// GET a URL and decode its JSON body.
///
/// Any non-success status becomes [`HarvesterError::RegistryStatus`].
pub fn get_json<T: DeserializeOwned>(client: &Client, url: &Url) -> Result<T> {
    match get_json_optional(client, url)? {
        Some(value) => Ok(value),
        None => Err(HarvesterError::RegistryStatus {
            url: url.to_string(),
            status: StatusCode::NOT_FOUND.as_u16(),
        }),
    }
}

/// GET a URL and decode its JSON body, mapping `404 Not Found` to `None`.
pub fn get_json_optional<T: DeserializeOwned>(client: &Client, url: &Url) -> Result<Option<T>> {
    tracing::debug!(url = %url, "GET");
    let response = client.get(url.clone()).send()?;
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        tracing::warn!(url = %url, status = %status, "Registry returned an error status");
        return Err(HarvesterError::RegistryStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes()?;
    Ok(Some(serde_json::from_slice(&body)?))
}
