//! Runtime configuration passed explicitly to every client.
//!
//! Nothing here is global: the CLI builds a [`PipelineConfig`] once and each
//! component receives the pieces it needs at construction. Tests point the
//! [`Endpoints`] at local mock servers.

use std::fmt;
use std::time::Duration;

use crate::client::{ClientError, RetryPolicy};
use crate::user_agent::DEFAULT_CONTACT;

/// bioRxiv public API root.
pub const BIORXIV_API: &str = "https://api.biorxiv.org";

/// DOI resolver used for redirects and citation content negotiation.
pub const DOI_ORG: &str = "https://doi.org";

/// Hypothesis REST API root.
pub const HYPOTHESIS_API: &str = "https://api.hypothes.is/api";

/// EMBO Press supplement download endpoint (review files of four journals).
pub const EMBO_SUPPLEMENT: &str = "https://www.embopress.org/action/downloadSupplement";

/// Life Science Alliance content root.
pub const LSA_CONTENT: &str = "https://www.life-science-alliance.org/content/lsa";

/// Document URI that scopes public bioRxiv annotation groups.
pub const BIORXIV_DOCUMENT_URI: &str = "https://www.biorxiv.org";

/// Default politeness delay after each listing page and each publish call.
pub const DEFAULT_POLITENESS_DELAY: Duration = Duration::from_millis(100);

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

/// Base URLs of every external collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// bioRxiv API root (`/publisher/...`, `/details/...`).
    pub biorxiv_api: String,
    /// bioRxiv server name used by the detail endpoint.
    pub biorxiv_server: String,
    /// DOI resolver root.
    pub doi_org: String,
    /// Hypothesis API root.
    pub hypothesis_api: String,
    /// Document URI used to surface public groups.
    pub group_document_uri: String,
    /// EMBO Press supplement endpoint.
    pub embo_supplement: String,
    /// Life Science Alliance content root.
    pub lsa_content: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            biorxiv_api: BIORXIV_API.to_string(),
            biorxiv_server: "biorxiv".to_string(),
            doi_org: DOI_ORG.to_string(),
            hypothesis_api: HYPOTHESIS_API.to_string(),
            group_document_uri: BIORXIV_DOCUMENT_URI.to_string(),
            embo_supplement: EMBO_SUPPLEMENT.to_string(),
            lsa_content: LSA_CONTENT.to_string(),
        }
    }
}

impl Endpoints {
    /// Points every endpoint at a single mock server root.
    ///
    /// Paths are kept distinct so one server can host all collaborators.
    #[must_use]
    pub fn with_mock_root(root: &str) -> Self {
        let root = root.trim_end_matches('/');
        Self {
            biorxiv_api: format!("{root}/biorxiv"),
            biorxiv_server: "biorxiv".to_string(),
            doi_org: format!("{root}/doi"),
            hypothesis_api: format!("{root}/hypothesis"),
            group_document_uri: BIORXIV_DOCUMENT_URI.to_string(),
            embo_supplement: format!("{root}/embo/action/downloadSupplement"),
            lsa_content: format!("{root}/lsa/content/lsa"),
        }
    }
}

/// Transport and pacing settings.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Sleep after each listing page request.
    pub page_delay: Duration,
    /// Sleep after each create-annotation request.
    pub publish_delay: Duration,
    /// Retry policy for doi.org lookups.
    pub doi_retry: RetryPolicy,
    /// Value of the `From` header.
    pub contact: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
            page_delay: DEFAULT_POLITENESS_DELAY,
            publish_delay: DEFAULT_POLITENESS_DELAY,
            doi_retry: RetryPolicy::default(),
            contact: DEFAULT_CONTACT.to_string(),
        }
    }
}

impl HttpSettings {
    /// Settings with no pacing delays and a single attempt per request.
    #[must_use]
    pub fn without_delays() -> Self {
        Self {
            page_delay: Duration::ZERO,
            publish_delay: Duration::ZERO,
            doi_retry: RetryPolicy::with_max_attempts(1),
            ..Self::default()
        }
    }
}

/// Hypothesis account credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub api_key: String,
}

impl Credentials {
    /// Builds credentials, rejecting blank values.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingCredentials`] when either value is blank.
    pub fn new(user: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ClientError> {
        let user = user.into().trim().to_string();
        let api_key = api_key.into().trim().to_string();
        if user.is_empty() {
            return Err(ClientError::MissingCredentials("HYPOTHESIS_USER"));
        }
        if api_key.is_empty() {
            return Err(ClientError::MissingCredentials("HYPOTHESIS_API_KEY"));
        }
        Ok(Self { user, api_key })
    }

    /// The Hypothesis account URI, `acct:<user>@hypothes.is`.
    #[must_use]
    pub fn account(&self) -> String {
        format!("acct:{}@hypothes.is", self.user)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Everything the pipeline needs to build its clients.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub endpoints: Endpoints,
    pub http: HttpSettings,
    pub credentials: Credentials,
    /// Show progress bars on stderr.
    pub progress: bool,
}

impl PipelineConfig {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            endpoints: Endpoints::default(),
            http: HttpSettings::default(),
            credentials,
            progress: false,
        }
    }
}
