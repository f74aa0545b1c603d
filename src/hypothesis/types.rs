//! Request and response shapes of the Hypothesis REST API.

use serde::{Deserialize, Serialize};

use crate::record::{AnnotationDraft, Target};

/// Who may read, edit, delete and administer an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub read: Vec<String>,
    pub update: Vec<String>,
    pub delete: Vec<String>,
    pub admin: Vec<String>,
}

impl Permissions {
    /// Readable by the group, writable only by `account`.
    #[must_use]
    pub fn group_readable(group_id: &str, account: &str) -> Self {
        let owner = vec![account.to_string()];
        Self {
            read: vec![format!("group:{group_id}")],
            update: owner.clone(),
            delete: owner.clone(),
            admin: owner,
        }
    }
}

/// Highwire metadata identifying the annotated document by DOI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highwire {
    pub doi: Vec<String>,
}

/// Document metadata sent with a new annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentDescriptor {
    pub title: Vec<String>,
    pub highwire: Highwire,
}

impl DocumentDescriptor {
    #[must_use]
    pub fn for_target(target: &Target) -> Self {
        Self {
            title: vec![target.title.clone()],
            highwire: Highwire {
                doi: vec![target.doi.clone()],
            },
        }
    }
}

/// Body of `POST /annotations`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewAnnotation<'a> {
    pub uri: &'a str,
    pub group: &'a str,
    pub permissions: &'a Permissions,
    pub text: &'a str,
    pub tags: &'a [String],
    pub document: DocumentDescriptor,
}

impl<'a> NewAnnotation<'a> {
    pub fn new(
        permissions: &'a Permissions,
        group_id: &'a str,
        target: &'a Target,
        draft: &'a AnnotationDraft,
    ) -> Self {
        Self {
            uri: &target.url,
            group: group_id,
            permissions,
            text: &draft.text,
            tags: &draft.tags,
            document: DocumentDescriptor::for_target(target),
        }
    }
}

/// One entry of `GET /groups`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

/// Raw outcome of a create-annotation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResponse {
    pub status: u16,
    pub body: String,
}

impl PublishResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// The id assigned to the new annotation, when the call succeeded.
    #[must_use]
    pub fn annotation_id(&self) -> Option<String> {
        if !self.is_success() {
            return None;
        }
        serde_json::from_str::<Created>(&self.body)
            .ok()
            .map(|created| created.id)
            .filter(|id| !id.is_empty())
    }
}

/// Result page of `GET /search`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub rows: Vec<AnnotationRow>,
}

/// The part of a searched annotation the purge needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnnotationRow {
    pub id: String,
    #[serde(default)]
    pub uri: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn target() -> Target {
        Target {
            url: "https://www.biorxiv.org/content/10.1101/x".to_string(),
            doi: "10.1101/x".to_string(),
            title: "A preprint".to_string(),
        }
    }

    #[test]
    fn test_permissions_group_readable() {
        let perms = Permissions::group_readable("abc123", "acct:alice@hypothes.is");
        assert_eq!(perms.read, vec!["group:abc123"]);
        assert_eq!(perms.update, vec!["acct:alice@hypothes.is"]);
        assert_eq!(perms.delete, perms.admin);
    }

    #[test]
    fn test_new_annotation_payload_shape() {
        let perms = Permissions::group_readable("g", "acct:alice@hypothes.is");
        let draft = AnnotationDraft {
            text: "body".to_string(),
            tags: vec!["PeerReviewed".to_string()],
            hypothesis_id: String::new(),
        };
        let target = target();
        let value = serde_json::to_value(NewAnnotation::new(&perms, "g", &target, &draft)).unwrap();

        assert_eq!(value["uri"], "https://www.biorxiv.org/content/10.1101/x");
        assert_eq!(value["group"], "g");
        assert_eq!(value["text"], "body");
        assert_eq!(value["tags"][0], "PeerReviewed");
        assert_eq!(value["permissions"]["read"][0], "group:g");
        assert_eq!(value["document"]["title"][0], "A preprint");
        assert_eq!(value["document"]["highwire"]["doi"][0], "10.1101/x");
    }

    #[test]
    fn test_annotation_id_only_on_success() {
        let ok = PublishResponse {
            status: 200,
            body: r#"{"id":"xyz123","text":"..."}"#.to_string(),
        };
        assert_eq!(ok.annotation_id().as_deref(), Some("xyz123"));

        let rejected = PublishResponse {
            status: 400,
            body: r#"{"id":"xyz123"}"#.to_string(),
        };
        assert_eq!(rejected.annotation_id(), None);

        let garbled = PublishResponse {
            status: 200,
            body: "not json".to_string(),
        };
        assert_eq!(garbled.annotation_id(), None);
    }

    #[test]
    fn test_search_results_tolerate_missing_fields() {
        let results: SearchResults =
            serde_json::from_value(serde_json::json!({"rows": [{"id": "a1"}]})).unwrap();
        assert_eq!(results.total, 0);
        assert_eq!(results.rows[0].id, "a1");
    }
}
