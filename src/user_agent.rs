//! Shared User-Agent and contact header values for outbound HTTP traffic.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/source-data/traxiv";

/// Default contact address sent in the `From` header.
pub const DEFAULT_CONTACT: &str = "traxiv@embo.org";

/// Default User-Agent for every client (single shared format).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("traxiv/{version} (research-tool; +{PROJECT_UA_URL})")
}
