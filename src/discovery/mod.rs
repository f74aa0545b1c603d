//! Preprint discovery through the bioRxiv publisher API.
//!
//! The publisher endpoint lists the preprints whose published version carries
//! a given DOI prefix (`10.15252` for EMBO Press):
//!
//! ```text
//! GET {api}/publisher/{prefix}/{start}/{end}/{cursor}
//! {"messages":[{"status":"ok","count":56,"total":58}],"collection":[...]}
//! ```
//!
//! Items are decoded one by one so a malformed entry is dropped alone.
//! Pagination advances the cursor by `count` and stops once `total - count`
//! reaches zero, on a non-"ok" message, or on any failed page; whatever was
//! collected so far is returned.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::client::ClientError;
use crate::config::{Endpoints, HttpSettings};
use crate::record::{PreprintRecord, lenient_count};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
pub(crate) struct ListingResponse {
    #[serde(default)]
    pub messages: Vec<ListingMessage>,
    #[serde(default)]
    pub collection: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingMessage {
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailResponse {
    #[serde(default)]
    pub collection: Vec<DetailItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailItem {
    #[serde(default)]
    pub author_corresponding: String,
    #[serde(default)]
    pub author_corresponding_institution: String,
}

/// One page of the listing, or the reason pagination stops.
#[derive(Debug)]
enum ListingPage {
    Items {
        count: u64,
        total: u64,
        items: Vec<PreprintRecord>,
    },
    Exhausted(String),
}

/// Decodes listing items one by one; malformed items are logged and dropped.
fn decode_items(collection: Vec<serde_json::Value>) -> Vec<PreprintRecord> {
    collection
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let doi = ["preprint_doi", "biorxiv_doi"]
                .iter()
                .find_map(|key| item.get(key).and_then(serde_json::Value::as_str))
                .map(str::to_owned);
            serde_json::from_value::<PreprintRecord>(item)
                .inspect_err(|error| {
                    warn!(index, doi = ?doi, error = %error, "Skipping malformed listing item");
                })
                .ok()
        })
        .collect()
}

/// Client for the bioRxiv listing and detail endpoints.
#[derive(Debug, Clone)]
pub struct PreprintClient {
    http: Client,
    api_base: String,
    server: String,
    page_delay: Duration,
}

impl PreprintClient {
    #[must_use]
    pub fn new(http: Client, endpoints: &Endpoints, settings: &HttpSettings) -> Self {
        Self {
            http,
            api_base: endpoints.biorxiv_api.trim_end_matches('/').to_string(),
            server: endpoints.biorxiv_server.clone(),
            page_delay: settings.page_delay,
        }
    }

    fn listing_url(&self, prefix: &str, start: NaiveDate, end: NaiveDate, cursor: u64) -> String {
        format!(
            "{}/publisher/{}/{}/{}/{cursor}",
            self.api_base,
            prefix.trim(),
            start.format(DATE_FORMAT),
            end.format(DATE_FORMAT),
        )
    }

    fn detail_url(&self, preprint_doi: &str) -> String {
        format!("{}/details/{}/{}", self.api_base, self.server, preprint_doi.trim())
    }

    /// Lists every preprint of a publisher posted between `start` and `end`.
    ///
    /// Never fails: listing problems end pagination early and are logged.
    #[instrument(skip(self), fields(prefix = %prefix, %start, %end))]
    pub async fn discover(
        &self,
        prefix: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<PreprintRecord> {
        let mut results = Vec::new();
        let mut cursor = 0_u64;

        loop {
            let url = self.listing_url(prefix, start, end, cursor);
            debug!(url = %url, "bioRxiv listing request");

            let keep_going = match self.fetch_page(&url).await {
                Ok(ListingPage::Items {
                    count,
                    total,
                    items,
                }) => {
                    results.extend(items);
                    cursor += count;
                    count > 0 && total > count
                }
                Ok(ListingPage::Exhausted(status)) => {
                    debug!(%status, "bioRxiv listing finished");
                    false
                }
                Err(error) => {
                    warn!(error = %error, "Problem with bioRxiv API; keeping partial results");
                    false
                }
            };

            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
            if !keep_going {
                break;
            }
        }

        info!(count = results.len(), prefix, "Preprints retrieved");
        results
    }

    async fn fetch_page(&self, url: &str) -> Result<ListingPage, ClientError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::http_status(url, status.as_u16()));
        }

        let body = response
            .json::<ListingResponse>()
            .await
            .map_err(|e| ClientError::decode(url, e))?;

        let Some(message) = body.messages.first() else {
            return Err(ClientError::decode(url, "no messages in listing response"));
        };
        if message.status != "ok" {
            return Ok(ListingPage::Exhausted(message.status.clone()));
        }

        Ok(ListingPage::Items {
            count: message.count.unwrap_or(0),
            total: message.total.unwrap_or(0),
            items: decode_items(body.collection),
        })
    }

    /// Fills corresponding author and institution for each record.
    ///
    /// Fields stay empty when the lookup fails or yields nothing; returns the
    /// number of records that received details.
    #[instrument(skip_all, fields(records = records.len()))]
    pub async fn enrich_details(&self, records: &mut [PreprintRecord]) -> usize {
        let mut enriched = 0;
        for record in records.iter_mut() {
            match self.fetch_detail(&record.preprint_doi).await {
                Ok(Some(detail)) => {
                    record.corresponding_author = detail.author_corresponding;
                    record.corresponding_institution = detail.author_corresponding_institution;
                    enriched += 1;
                }
                Ok(None) => {
                    record.corresponding_author.clear();
                    record.corresponding_institution.clear();
                }
                Err(error) => {
                    warn!(doi = %record.preprint_doi, error = %error, "Detail lookup failed");
                    record.corresponding_author.clear();
                    record.corresponding_institution.clear();
                }
            }
        }
        enriched
    }

    async fn fetch_detail(&self, preprint_doi: &str) -> Result<Option<DetailItem>, ClientError> {
        let url = self.detail_url(preprint_doi);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::network(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::http_status(&url, status.as_u16()));
        }

        let body = response
            .json::<DetailResponse>()
            .await
            .map_err(|e| ClientError::decode(&url, e))?;
        Ok(body.collection.into_iter().next())
    }
}
