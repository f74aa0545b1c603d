//! Review file links for The EMBO Journal, EMBO reports, EMBO Molecular
//! Medicine and Molecular Systems Biology.
//!
//! ```text
//! 10.15252/embj.2019102578
//!   -> {base}?doi=10.15252/embj.2019102578&file=embj2019102578.reviewer_comments.pdf
//! ```

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{LinkGrammar, compile_static_regex};

/// Journals published on the EMBO Press platform.
pub const EMBO_PRESS_JOURNALS: [&str; 4] = [
    "the embo journal",
    "embo reports",
    "embo molecular medicine",
    "molecular systems biology",
];

/// `10.<registrant>/<journal>.<number>`; the two suffix segments are captured.
static SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"^10\.\d{4,9}/([-_;()/:a-zA-Z0-9]+)\.([-_;()/:a-zA-Z0-9]+)$")
});

/// Builds the compact file token: registrant prefix and separating dot removed.
#[must_use]
pub fn suffix_token(doi: &str) -> Option<String> {
    let captures = SUFFIX_RE.captures(doi.trim())?;
    Some(format!("{}{}", &captures[1], &captures[2]))
}

/// Link grammar for the EMBO Press supplement endpoint.
#[derive(Debug, Clone)]
pub struct EmboPressGrammar {
    supplement_base: String,
}

impl EmboPressGrammar {
    #[must_use]
    pub fn new(supplement_base: impl Into<String>) -> Self {
        Self {
            supplement_base: supplement_base.into(),
        }
    }
}

#[async_trait]
impl LinkGrammar for EmboPressGrammar {
    fn name(&self) -> &'static str {
        "embo_press"
    }

    fn handles(&self, journal: &str) -> bool {
        EMBO_PRESS_JOURNALS.contains(&journal)
    }

    async fn candidate(&self, doi: &str) -> Option<String> {
        let doi = doi.trim();
        let token = suffix_token(doi)?;
        Some(format!(
            "{}?doi={doi}&file={token}.reviewer_comments.pdf",
            self.supplement_base
        ))
    }
}
