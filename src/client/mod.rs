//! HTTP plumbing shared by every external collaborator.
//!
//! - [`build_http_client`] - one configured `reqwest::Client` for the whole run
//! - [`RetryPolicy`] - backoff for doi.org lookups
//! - [`DoiClient`] - DOI redirect resolution and citation metadata
//! - [`ClientError`] - transport, status and decode failures

mod doi;
mod error;
mod http_client;
mod retry;

pub use doi::{CitationMetadata, DoiClient};
pub use error::ClientError;
pub use http_client::build_http_client;
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, FailureType, RetryDecision, RetryPolicy, classify_status,
    classify_transport, send_with_retry,
};
