//! Hypothesis annotation API client.
//!
//! Every call carries the account API key as a bearer token. Only the
//! endpoints the sync and purge flows need are covered:
//!
//! | Call | Endpoint |
//! |------|----------|
//! | [`HypothesisClient::list_groups`] | `GET /groups[?document_uri=]` |
//! | [`HypothesisClient::publish`] | `POST /annotations` |
//! | [`HypothesisClient::search`] | `GET /search?user&group&limit` |
//! | [`HypothesisClient::delete`] | `DELETE /annotations/{id}` |

mod types;

pub use types::{
    AnnotationRow, DocumentDescriptor, Group, Highwire, Permissions, PublishResponse,
    SearchResults,
};

use reqwest::{Client, RequestBuilder, Url};
use tracing::{debug, instrument, warn};

use crate::client::ClientError;
use crate::config::{Credentials, Endpoints};
use crate::record::{AnnotationDraft, Target};
use types::NewAnnotation;

/// The public group; never looked up.
pub const WORLD_GROUP: &str = "__world__";

/// Client for one Hypothesis account.
#[derive(Debug, Clone)]
pub struct HypothesisClient {
    http: Client,
    api_base: String,
    document_uri: String,
    credentials: Credentials,
}

impl HypothesisClient {
    #[must_use]
    pub fn new(http: Client, endpoints: &Endpoints, credentials: Credentials) -> Self {
        Self {
            http,
            api_base: endpoints.hypothesis_api.trim_end_matches('/').to_string(),
            document_uri: endpoints.group_document_uri.clone(),
            credentials,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    fn endpoint_with_params(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ClientError> {
        let raw = self.endpoint(path);
        let parsed = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        parsed.map_err(|e| ClientError::invalid_url(raw, e))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.credentials.api_key)
    }

    /// Permissions for annotations owned by this account and readable by the group.
    #[must_use]
    pub fn permissions(&self, group_id: &str) -> Permissions {
        Permissions::group_readable(group_id, &self.credentials.account())
    }

    /// Lists groups visible to the account, optionally scoped to a document URI.
    ///
    /// Without a URI only private groups are returned; public groups show up
    /// only when a URI within their scope is given.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure, non-200 status or a bad body.
    #[instrument(skip(self))]
    pub async fn list_groups(&self, document_uri: Option<&str>) -> Result<Vec<Group>, ClientError> {
        let url = match document_uri {
            Some(uri) => self.endpoint_with_params("groups", &[("document_uri", uri)])?,
            None => self.endpoint_with_params("groups", &[])?,
        };
        let url_text = url.to_string();

        let response = self
            .authorized(self.http.get(url))
            .send()
            .await
            .map_err(|e| ClientError::network(&url_text, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::http_status(&url_text, status.as_u16()));
        }
        response
            .json::<Vec<Group>>()
            .await
            .map_err(|e| ClientError::decode(&url_text, e))
    }

    /// Maps a group name to its id; the first group with exactly that name wins.
    ///
    /// Private groups are searched before public groups scoped to the bioRxiv
    /// site. [`WORLD_GROUP`] maps to itself without any request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when a group listing fails.
    #[instrument(skip(self))]
    pub async fn find_group_id(&self, name: &str) -> Result<Option<String>, ClientError> {
        if name == WORLD_GROUP {
            return Ok(Some(WORLD_GROUP.to_string()));
        }

        let mut groups = self.list_groups(None).await?;
        groups.extend(self.list_groups(Some(&self.document_uri)).await?);
        debug!(candidates = groups.len(), "Groups listed");

        Ok(groups
            .into_iter()
            .find(|group| group.name == name)
            .map(|group| group.id))
    }

    /// Creates one annotation on `target` in `group_id`.
    ///
    /// The raw status and body are returned so the caller decides what a
    /// rejection means.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] only when the request could not be sent.
    #[instrument(skip(self, permissions, draft), fields(doi = %target.doi))]
    pub async fn publish(
        &self,
        permissions: &Permissions,
        group_id: &str,
        target: &Target,
        draft: &AnnotationDraft,
    ) -> Result<PublishResponse, ClientError> {
        let url = self.endpoint("annotations");
        let payload = NewAnnotation::new(permissions, group_id, target, draft);

        let response = self
            .authorized(self.http.post(&url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ClientError::network(&url, e))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_else(|error| {
            warn!(error = %error, "Could not read annotation response body");
            String::new()
        });
        Ok(PublishResponse { status, body })
    }

    /// Searches this account's annotations in a group.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure, non-200 status or a bad body.
    #[instrument(skip(self))]
    pub async fn search(&self, group_id: &str, limit: u32) -> Result<SearchResults, ClientError> {
        let account = self.credentials.account();
        let limit = limit.to_string();
        let url = self.endpoint_with_params(
            "search",
            &[
                ("user", account.as_str()),
                ("group", group_id),
                ("limit", limit.as_str()),
            ],
        )?;
        let url_text = url.to_string();

        let response = self
            .authorized(self.http.get(url))
            .send()
            .await
            .map_err(|e| ClientError::network(&url_text, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::http_status(&url_text, status.as_u16()));
        }
        response
            .json::<SearchResults>()
            .await
            .map_err(|e| ClientError::decode(&url_text, e))
    }

    /// Deletes one annotation; returns true when the API answered 200.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] only when the request could not be sent.
    #[instrument(skip(self))]
    pub async fn delete(&self, annotation_id: &str) -> Result<bool, ClientError> {
        let url = self.endpoint(&format!("annotations/{annotation_id}"));
        let response = self
            .authorized(self.http.delete(&url))
            .send()
            .await
            .map_err(|e| ClientError::network(&url, e))?;

        let status = response.status().as_u16();
        if status != 200 {
            debug!(status, "Annotation not deleted");
        }
        Ok(status == 200)
    }
}
