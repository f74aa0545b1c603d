//! Annotation text and tags for a preprint whose paper has a review file.
//!
//! The markdown body is embedded at compile time from
//! `templates/embo_press.md`; `$rpf_link`, `$banner` and `$paper_doi` are
//! substituted verbatim.

use crate::record::{AnnotationDraft, PaperRecord};
use crate::review_link::normalize_journal;

const EMBO_PRESS_TEMPLATE: &str = include_str!("../templates/embo_press.md");

/// Transparent peer review banner image per journal.
const BANNERS: [(&str, &str); 5] = [
    (
        "molecular systems biology",
        "https://www.embopress.org/pb-assets/embo-site/images/RevCo_Transparency-MSB.jpg",
    ),
    (
        "the embo journal",
        "https://www.embopress.org/pb-assets/embo-site/images/RevCo_Transparency-EMBOJ.jpg",
    ),
    (
        "embo reports",
        "https://www.embopress.org/pb-assets/embo-site/images/RevCo_Transparency-EMBOR.jpg",
    ),
    (
        "embo molecular medicine",
        "https://www.embopress.org/pb-assets/embo-site/images/RevCo_Transparency-EMM.jpg",
    ),
    (
        "life science alliance",
        "https://www.embopress.org/pb-assets/embo-site/images/RevCo_Transparency-LSA.jpg",
    ),
];

/// Tags every annotation carries before the journal and category tags.
pub const BASE_TAGS: [&str; 2] = ["PeerReviewed", "EMBOPress"];

/// Banner image URL for a journal, matched like review file grammars.
#[must_use]
pub fn banner_for(journal: &str) -> Option<&'static str> {
    let journal = normalize_journal(journal);
    BANNERS
        .iter()
        .find(|(name, _)| *name == journal)
        .map(|(_, url)| *url)
}

/// A markdown template with `$name` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationTemplate {
    source: String,
}

impl Default for AnnotationTemplate {
    fn default() -> Self {
        Self::embo_press()
    }
}

impl AnnotationTemplate {
    /// The built-in EMBO Press template.
    #[must_use]
    pub fn embo_press() -> Self {
        Self::from_source(EMBO_PRESS_TEMPLATE)
    }

    #[must_use]
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Substitutes the three placeholders.
    #[must_use]
    pub fn render(&self, rpf_link: &str, banner: &str, paper_doi: &str) -> String {
        self.source
            .replace("$rpf_link", rpf_link)
            .replace("$banner", banner)
            .replace("$paper_doi", paper_doi)
    }

    /// Builds the draft for a paper whose review link is known.
    ///
    /// Returns `None` when the paper has no review link.
    #[must_use]
    pub fn draft(&self, paper: &PaperRecord, preprint_category: &str) -> Option<AnnotationDraft> {
        let rpf_link = paper.review_link.as_deref()?;
        let banner = banner_for(&paper.journal).unwrap_or_default();
        Some(AnnotationDraft {
            text: self.render(rpf_link, banner, &paper.doi),
            tags: annotation_tags(&paper.journal, preprint_category),
            hypothesis_id: String::new(),
        })
    }
}

/// `PeerReviewed`, `EMBOPress`, the journal, then the preprint category.
#[must_use]
pub fn annotation_tags(journal: &str, category: &str) -> Vec<String> {
    BASE_TAGS
        .iter()
        .map(ToString::to_string)
        .chain([journal.to_string(), category.to_string()])
        .collect()
}
