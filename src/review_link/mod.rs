//! Review process file (RPF) link derivation.
//!
//! Review files have no DOI of their own, and their URLs follow a different
//! grammar per publisher platform:
//! - [`EmboPressGrammar`] - four EMBO Press journals, URL built from the DOI alone
//! - [`LsaGrammar`] - Life Science Alliance, URL built from the resolved landing page
//!
//! [`LinkResolver::resolve_link`] picks the grammar from the journal name and
//! then probes the candidate: only a live link serving a PDF is returned.
//!
//! # Example
//!
//! ```no_run
//! use traxiv_core::config::{Endpoints, HttpSettings};
//! use traxiv_core::review_link::LinkResolver;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = HttpSettings::default();
//! let http = traxiv_core::client::build_http_client(&settings)?;
//! let resolver = LinkResolver::new(http, &Endpoints::default(), &settings);
//! let link = resolver
//!     .resolve_link("Molecular Systems Biology", "10.15252/msb.20198849")
//!     .await;
//! # Ok(())
//! # }
//! ```

mod embo;
mod lsa;

pub use embo::{EMBO_PRESS_JOURNALS, EmboPressGrammar, suffix_token};
pub use lsa::{LSA_JOURNAL, LsaGrammar, volume_issue_locator};

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument, warn};

use crate::client::DoiClient;
use crate::config::{Endpoints, HttpSettings};

/// Compiles a regex at static init; panics on invalid pattern.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Journal names are matched trimmed and lower-cased.
#[must_use]
pub fn normalize_journal(journal: &str) -> String {
    journal.trim().to_lowercase()
}

/// One URL grammar for review files.
///
/// Uses `async_trait` so grammars can be held as `Box<dyn LinkGrammar>`.
#[async_trait]
pub trait LinkGrammar: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this grammar applies to the (normalized) journal name.
    fn handles(&self, journal: &str) -> bool;

    /// Builds the unprobed candidate URL, or `None` when the DOI does not fit.
    async fn candidate(&self, doi: &str) -> Option<String>;
}

/// Chooses a grammar per journal and validates candidates with a live probe.
pub struct LinkResolver {
    http: Client,
    grammars: Vec<Box<dyn LinkGrammar>>,
}

impl std::fmt::Debug for LinkResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.grammars.iter().map(|g| g.name()).collect();
        f.debug_struct("LinkResolver")
            .field("grammars", &names)
            .finish_non_exhaustive()
    }
}

impl LinkResolver {
    /// Creates a resolver with the EMBO Press and Life Science Alliance grammars.
    #[must_use]
    pub fn new(http: Client, endpoints: &Endpoints, settings: &HttpSettings) -> Self {
        let doi = DoiClient::new(
            http.clone(),
            endpoints.doi_org.clone(),
            settings.doi_retry.clone(),
        );
        let mut resolver = Self::empty(http);
        resolver.register(Box::new(EmboPressGrammar::new(
            endpoints.embo_supplement.clone(),
        )));
        resolver.register(Box::new(LsaGrammar::new(doi, endpoints.lsa_content.clone())));
        resolver
    }

    /// Creates a resolver without any grammar.
    #[must_use]
    pub fn empty(http: Client) -> Self {
        Self {
            http,
            grammars: Vec::new(),
        }
    }

    /// Adds a grammar; earlier registrations win when several handle a journal.
    pub fn register(&mut self, grammar: Box<dyn LinkGrammar>) {
        self.grammars.push(grammar);
    }

    /// Derives and validates the review file link for a paper.
    ///
    /// Returns `None` without any network call when no grammar handles the
    /// journal. Probe failures of any kind also yield `None`.
    #[instrument(skip(self), fields(journal = %journal, doi = %doi))]
    pub async fn resolve_link(&self, journal: &str, doi: &str) -> Option<String> {
        let journal = normalize_journal(journal);
        let Some(grammar) = self.grammars.iter().find(|g| g.handles(&journal)) else {
            debug!("No review file grammar for journal");
            return None;
        };

        let candidate = grammar.candidate(doi).await?;
        debug!(grammar = grammar.name(), candidate = %candidate, "Probing review file link");

        if self.probe(&candidate).await {
            Some(candidate)
        } else {
            None
        }
    }

    /// GETs the candidate and accepts it only when it serves a PDF.
    async fn probe(&self, url: &str) -> bool {
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(url, error = %error, "Review file probe failed");
                return false;
            }
        };

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let is_pdf = is_pdf_content_type(content_type);
        if !is_pdf {
            debug!(
                url,
                status = response.status().as_u16(),
                content_type,
                "Review file probe did not return a PDF"
            );
        }
        is_pdf
    }
}

fn is_pdf_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("application/pdf")
}
