//! Wiring between an [`httpmock::MockServer`] and the API client.

use std::time::Duration;

use anyhow::Result;
use httpmock::MockServer;
use qbweb_api::{API_BASE_PATH, ApiClient, ClientConfig};

/// Client pointed at the mock daemon with a short timeout.
///
/// # Errors
///
/// Returns an error if the mock server URL cannot be parsed or the HTTP client
/// cannot be built.
pub fn client_for(server: &MockServer) -> Result<ApiClient> {
    let config = ClientConfig::parse(&server.base_url())?.with_timeout(Duration::from_secs(5));
    Ok(ApiClient::new(&config)?)
}

/// Absolute mock path for an API endpoint such as `sync/maindata`.
#[must_use]
pub fn api_path(endpoint: &str) -> String {
    format!("{API_BASE_PATH}/{endpoint}")
}
