//! Shared HTTP client construction policy.
//!
//! Every collaborator (bioRxiv, doi.org, publisher sites, Hypothesis) goes
//! through one `reqwest::Client` so timeouts, compression, the User-Agent and
//! the polite `From` header stay consistent.

use reqwest::Client;
use reqwest::header::{FROM, HeaderMap, HeaderValue};
use tracing::warn;

use crate::config::HttpSettings;
use crate::user_agent;

use super::ClientError;

/// Builds the shared HTTP client.
///
/// An unusable contact address is dropped with a warning rather than failing
/// client construction.
///
/// # Errors
///
/// Returns [`ClientError::Build`] when reqwest cannot build the client.
pub fn build_http_client(settings: &HttpSettings) -> Result<Client, ClientError> {
    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(settings.contact.trim()) {
        Ok(value) if !settings.contact.trim().is_empty() => {
            headers.insert(FROM, value);
        }
        Ok(_) => {}
        Err(error) => warn!(error = %error, "Ignoring invalid contact address for From header"),
    }

    Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.read_timeout)
        .user_agent(user_agent::default_user_agent())
        .default_headers(headers)
        .gzip(true)
        .build()
        .map_err(ClientError::Build)
}
