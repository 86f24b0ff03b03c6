//! Shared blocking HTTP client setup for the service clients.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::MobilityResult;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn build_client() -> MobilityResult<Client> {
    Ok(Client::builder()
        .user_agent(concat!("geodata/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// `host:port/path` gets an `http://` scheme; trailing slashes are dropped.
pub(crate) fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}
