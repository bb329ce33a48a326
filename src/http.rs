//! Shared plumbing for the Google REST clients.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use crate::error::ProviderError;

pub(crate) fn build_client() -> Result<Client, ProviderError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .build()?)
}

/// Turns non-2xx responses into [`ProviderError::Status`] with the body text.
pub(crate) fn checked(resp: Response) -> Result<Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}

pub(crate) fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, ProviderError> {
    let text = resp.text()?;
    Ok(serde_json::from_str(&text)?)
}
