//! DOI resolution through doi.org.
//!
//! Two lookups share the same endpoint:
//! - [`DoiClient::resolve`] follows redirects to the landing page URL;
//! - [`DoiClient::citation`] asks for citation metadata through content
//!   negotiation (`Accept: application/json`), which doi.org forwards to the
//!   registration agency (Crossref for journal articles).

use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::retry::{RetryPolicy, send_with_retry};
use super::ClientError;

/// Citation metadata returned for a DOI.
///
/// Empty when the registration agency does not know the DOI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationMetadata {
    /// The journal (container) title.
    pub journal: String,
    /// Subject areas assigned to the journal.
    pub subjects: Vec<String>,
}

/// CSL-JSON subset returned by doi.org content negotiation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct CslRecord {
    #[serde(default)]
    pub container_title: Option<OneOrMany>,
    #[serde(default)]
    pub subject: Option<Vec<String>>,
}

/// Agencies disagree on whether `container-title` is a string or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn first(self) -> Option<String> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(values) => values.into_iter().next(),
        }
    }
}

impl From<CslRecord> for CitationMetadata {
    fn from(record: CslRecord) -> Self {
        Self {
            journal: record
                .container_title
                .and_then(OneOrMany::first)
                .map(|title| title.trim().to_string())
                .unwrap_or_default(),
            subjects: record.subject.unwrap_or_default(),
        }
    }
}

/// Client for doi.org lookups.
#[derive(Debug, Clone)]
pub struct DoiClient {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl DoiClient {
    #[must_use]
    pub fn new(http: Client, base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        }
    }

    fn doi_url(&self, doi: &str) -> String {
        format!("{}/{}", self.base_url, doi.trim())
    }

    /// Resolves a DOI to the URL it finally redirects to.
    ///
    /// Publisher landing pages often answer bots with 403 after the redirect;
    /// the final URL is still returned in that case. `None` is returned only when
    /// the request never left the resolver with a non-success status (unknown DOI).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] when every attempt failed at transport level.
    #[instrument(skip(self), fields(doi = %doi))]
    pub async fn resolve(&self, doi: &str) -> Result<Option<String>, ClientError> {
        let url = self.doi_url(doi);
        let response = send_with_retry(&self.retry, &url, || self.http.get(&url)).await?;

        let final_url = response.url().to_string();
        let status = response.status();
        if !status.is_success() && final_url == url {
            debug!(status = status.as_u16(), "DOI did not resolve");
            return Ok(None);
        }

        debug!(status = status.as_u16(), final_url = %final_url, "DOI resolved");
        Ok(Some(final_url))
    }

    /// Fetches citation metadata for a DOI.
    ///
    /// A non-200 answer yields empty metadata, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] on transport failure and
    /// [`ClientError::Decode`] when the body is not the expected JSON.
    #[instrument(skip(self), fields(doi = %doi))]
    pub async fn citation(&self, doi: &str) -> Result<CitationMetadata, ClientError> {
        let url = self.doi_url(doi);
        let response = send_with_retry(&self.retry, &url, || {
            self.http.get(&url).header(ACCEPT, "application/json")
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "No citation metadata for DOI");
            return Ok(CitationMetadata::default());
        }

        let record = response
            .json::<CslRecord>()
            .await
            .map_err(|e| ClientError::decode(&url, e))?;
        Ok(record.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_csl_container_title_as_string() {
        let record: CslRecord = serde_json::from_value(serde_json::json!({
            "container-title": "Molecular Systems Biology",
            "subject": ["Applied Mathematics", "Computational Theory and Mathematics"]
        }))
        .unwrap();
        let metadata = CitationMetadata::from(record);
        assert_eq!(metadata.journal, "Molecular Systems Biology");
        assert_eq!(metadata.subjects.len(), 2);
    }

    #[test]
    fn test_csl_container_title_as_list_takes_first() {
        let record: CslRecord = serde_json::from_value(serde_json::json!({
            "container-title": ["EMBO reports", "EMBO Rep"]
        }))
        .unwrap();
        let metadata = CitationMetadata::from(record);
        assert_eq!(metadata.journal, "EMBO reports");
        assert!(metadata.subjects.is_empty());
    }

    #[test]
    fn test_csl_missing_container_title_is_empty() {
        let record: CslRecord = serde_json::from_value(serde_json::json!({"title": "x"})).unwrap();
        assert_eq!(CitationMetadata::from(record), CitationMetadata::default());
    }

    #[test]
    fn test_doi_url_trims_base_and_doi() {
        let client = DoiClient::new(Client::new(), "https://doi.org/", RetryPolicy::default());
        assert_eq!(
            client.doi_url(" 10.15252/msb.20198849 "),
            "https://doi.org/10.15252/msb.20198849"
        );
    }
}
