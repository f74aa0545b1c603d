//! Review file links for Life Science Alliance.
//!
//! The DOI carries no volume or issue, so it is resolved to the landing page
//! first and the `volume/issue/eLocator` segment is read from that URL:
//!
//! ```text
//! https://www.life-science-alliance.org/content/2/4/e201900445
//!   -> {base}/2/4/e201900445.reviewer-comments.pdf
//! ```

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use crate::client::DoiClient;

use super::{LinkGrammar, compile_static_regex};

/// Normalized name of the single journal handled here.
pub const LSA_JOURNAL: &str = "life science alliance";

static VOLUME_ISSUE_LOCATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"\d+/\d+/e\d+"));

/// Extracts `volume/issue/eLocator` from a resolved landing page URL.
#[must_use]
pub fn volume_issue_locator(landing_url: &str) -> Option<&str> {
    VOLUME_ISSUE_LOCATOR_RE
        .find(landing_url)
        .map(|found| found.as_str())
}

/// Link grammar for the Life Science Alliance content site.
#[derive(Debug, Clone)]
pub struct LsaGrammar {
    doi: DoiClient,
    content_base: String,
}

impl LsaGrammar {
    #[must_use]
    pub fn new(doi: DoiClient, content_base: impl Into<String>) -> Self {
        Self {
            doi,
            content_base: content_base.into(),
        }
    }
}

#[async_trait]
impl LinkGrammar for LsaGrammar {
    fn name(&self) -> &'static str {
        "life_science_alliance"
    }

    fn handles(&self, journal: &str) -> bool {
        journal == LSA_JOURNAL
    }

    async fn candidate(&self, doi: &str) -> Option<String> {
        let landing = match self.doi.resolve(doi).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                debug!(doi, "LSA DOI did not resolve");
                return None;
            }
            Err(error) => {
                warn!(doi, error = %error, "LSA DOI resolution failed");
                return None;
            }
        };

        let Some(segment) = volume_issue_locator(&landing) else {
            debug!(doi, landing = %landing, "No volume/issue/eLocator in landing URL");
            return None;
        };
        Some(format!("{}/{segment}.reviewer-comments.pdf", self.content_base))
    }
}
