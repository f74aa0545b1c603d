//! Records flowing through the pipeline and persisted by the store.

use serde::{Deserialize, Deserializer, Serialize};

/// Metadata of one bioRxiv preprint as listed by the publisher endpoint.
///
/// `url` and the corresponding-author fields start empty and are filled by
/// later enrichment steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprintRecord {
    /// DOI of the preprint; the unit of deduplication.
    #[serde(alias = "biorxiv_doi")]
    pub preprint_doi: String,
    /// Canonical landing page, resolved lazily.
    #[serde(alias = "biorxiv_url")]
    pub url: String,
    /// DOI of the peer-reviewed paper.
    pub published_doi: String,
    #[serde(alias = "preprint_title")]
    pub title: String,
    /// bioRxiv subject category.
    #[serde(alias = "preprint_category")]
    pub category: String,
    /// Posting date (`YYYY-MM-DD`).
    #[serde(alias = "preprint_date")]
    pub posted_date: String,
    /// Publication date of the paper (`YYYY-MM-DD`).
    pub published_date: String,
    #[serde(
        alias = "published_citation_count",
        deserialize_with = "lenient_count"
    )]
    pub citation_count: Option<u64>,
    pub corresponding_author: String,
    pub corresponding_institution: String,
}

/// The listing API reports counts as numbers, numeric strings or "NA".
pub(crate) fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// The published paper a preprint turned into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperRecord {
    pub doi: String,
    pub journal: String,
    pub subjects: Vec<String>,
    /// Review process file URL; `None` until derived or when not resolvable.
    pub review_link: Option<String>,
}

/// Annotation text and tags ready to post, plus the id assigned once posted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationDraft {
    pub text: String,
    pub tags: Vec<String>,
    /// Empty until published.
    pub hypothesis_id: String,
}

impl AnnotationDraft {
    #[must_use]
    pub fn is_published(&self) -> bool {
        !self.hypothesis_id.is_empty()
    }
}

/// The unit of durable state, keyed by `preprint.preprint_doi` within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationEntry {
    pub preprint: PreprintRecord,
    pub paper: PaperRecord,
    pub annotation: AnnotationDraft,
}

impl ReconciliationEntry {
    #[must_use]
    pub fn preprint_doi(&self) -> &str {
        &self.preprint.preprint_doi
    }

    /// The page the annotation will be anchored to.
    #[must_use]
    pub fn target(&self) -> Target {
        Target {
            url: self.preprint.url.clone(),
            doi: self.preprint.preprint_doi.clone(),
            title: self.preprint.title.clone(),
        }
    }
}

/// Page an annotation is anchored to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: String,
    pub doi: String,
    pub title: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_preprint_deserializes_from_listing_item() {
        let item = serde_json::json!({
            "biorxiv_doi": "10.1101/2020.01.01.000001",
            "published_doi": "10.15252/msb.20198849",
            "preprint_title": "A preprint",
            "preprint_category": "systems biology",
            "preprint_date": "2019-03-01",
            "published_date": "2019-09-01",
            "published_citation_count": "12"
        });
        let record: PreprintRecord = serde_json::from_value(item).unwrap();
        assert_eq!(record.preprint_doi, "10.1101/2020.01.01.000001");
        assert_eq!(record.title, "A preprint");
        assert_eq!(record.category, "systems biology");
        assert_eq!(record.citation_count, Some(12));
        assert!(record.url.is_empty());
        assert!(record.corresponding_author.is_empty());
    }

    #[test]
    fn test_preprint_citation_count_accepts_numbers_and_garbage() {
        let numeric: PreprintRecord =
            serde_json::from_value(serde_json::json!({"published_citation_count": 3})).unwrap();
        assert_eq!(numeric.citation_count, Some(3));

        let garbage: PreprintRecord =
            serde_json::from_value(serde_json::json!({"published_citation_count": "NA"})).unwrap();
        assert_eq!(garbage.citation_count, None);
    }

    #[test]
    fn test_preprint_serializes_with_canonical_names() {
        let record = PreprintRecord {
            preprint_doi: "10.1101/x".to_string(),
            ..PreprintRecord::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["preprint_doi"], "10.1101/x");
        let back: PreprintRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_entry_target_uses_preprint_fields() {
        let entry = ReconciliationEntry {
            preprint: PreprintRecord {
                preprint_doi: "10.1101/x".to_string(),
                url: "https://www.biorxiv.org/content/10.1101/x".to_string(),
                title: "Title".to_string(),
                ..PreprintRecord::default()
            },
            paper: PaperRecord::default(),
            annotation: AnnotationDraft::default(),
        };
        let target = entry.target();
        assert_eq!(target.doi, "10.1101/x");
        assert_eq!(target.url, "https://www.biorxiv.org/content/10.1101/x");
        assert_eq!(target.title, "Title");
        assert!(!entry.annotation.is_published());
    }
}
