#![allow(dead_code)]

pub mod socket_guard;

use traxiv_core::{
    AnnotationDraft, Credentials, Endpoints, HttpSettings, PaperRecord, PipelineConfig,
    PreprintRecord, ReconciliationEntry,
};

/// Pipeline configuration with every endpoint on the mock server and no pacing.
pub fn mock_config(root: &str) -> PipelineConfig {
    PipelineConfig {
        endpoints: Endpoints::with_mock_root(root),
        http: HttpSettings::without_delays(),
        credentials: Credentials::new("alice", "token-1").expect("valid credentials"),
        progress: false,
    }
}

pub fn drafted_entry(preprint_doi: &str, text: &str) -> ReconciliationEntry {
    ReconciliationEntry {
        preprint: PreprintRecord {
            preprint_doi: preprint_doi.to_string(),
            url: format!("https://www.biorxiv.org/content/{preprint_doi}v1"),
            published_doi: "10.15252/msb.20198849".to_string(),
            title: format!("Preprint {preprint_doi}"),
            category: "systems biology".to_string(),
            ..PreprintRecord::default()
        },
        paper: PaperRecord {
            doi: "10.15252/msb.20198849".to_string(),
            journal: "Molecular Systems Biology".to_string(),
            subjects: vec![],
            review_link: Some("https://www.embopress.org/rpf.pdf".to_string()),
        },
        annotation: AnnotationDraft {
            text: text.to_string(),
            tags: vec!["PeerReviewed".to_string(), "EMBOPress".to_string()],
            hypothesis_id: String::new(),
        },
    }
}

/// A listing item as returned by the publisher endpoint.
pub fn listing_item(preprint_doi: &str, published_doi: &str) -> serde_json::Value {
    serde_json::json!({
        "biorxiv_doi": preprint_doi,
        "published_doi": published_doi,
        "preprint_title": format!("Preprint {preprint_doi}"),
        "preprint_category": "cell biology",
        "preprint_date": "2019-03-01",
        "published_date": "2019-09-01",
        "published_citation_count": "4"
    })
}

/// A listing page body.
pub fn listing_page(count: u64, total: u64, items: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({
        "messages": [{"status": "ok", "count": count, "total": total}],
        "collection": items
    })
}
