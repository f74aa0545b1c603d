//! Error types shared by the HTTP collaborators.

use thiserror::Error;

/// Errors raised while talking to bioRxiv, doi.org or Hypothesis.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, connection refused, TLS, timeout).
    #[error("network error calling {url}: {source}")]
    Network {
        /// The URL that was requested.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response from {url}: {message}")]
    Decode {
        /// The URL that was requested.
        url: String,
        /// What went wrong while decoding.
        message: String,
    },

    /// A request URL could not be assembled from the configured base.
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        /// The URL text that failed to parse.
        url: String,
        /// The parse failure.
        #[source]
        source: url::ParseError,
    },

    /// The shared HTTP client could not be built.
    #[error("HTTP client construction failed: {0}")]
    Build(#[source] reqwest::Error),

    /// A required credential is blank or absent.
    #[error("missing credential {0}\n  Suggestion: export it or add it to a .env file")]
    MissingCredentials(&'static str),
}

impl ClientError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message() {
        let err = ClientError::http_status("https://api.biorxiv.org/x", 503);
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("api.biorxiv.org"));
    }

    #[test]
    fn test_decode_message() {
        let err = ClientError::decode("https://doi.org/10.1/x", "missing field `id`");
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_missing_credentials_suggestion() {
        let msg = ClientError::MissingCredentials("HYPOTHESIS_API_KEY").to_string();
        assert!(msg.contains("HYPOTHESIS_API_KEY"));
        assert!(msg.contains("Suggestion"));
    }
}
