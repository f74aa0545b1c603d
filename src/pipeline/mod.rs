//! The synchronization pipeline.
//!
//! A sync run executes strictly in order:
//!
//! 1. resolve the annotation group name to its id,
//! 2. discover preprints for every publisher prefix,
//! 3. update: filter out stored preprints, derive journal metadata and the
//!    review file link, draft and insert annotations,
//! 4. post: publish every unpublished entry and record its annotation id.
//!
//! Drafts are persisted before anything is posted, so an interrupted run
//! resumes from the store, and a preprint already in the store is never drafted
//! (hence never posted) twice.

mod outcome;
mod progress;

pub use outcome::{
    ItemOutcome, PipelineError, PostReport, PurgeSummary, RunSummary, SkipReason, UpdateReport,
};

use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{DoiClient, build_http_client};
use crate::config::PipelineConfig;
use crate::discovery::PreprintClient;
use crate::hypothesis::HypothesisClient;
use crate::record::{PaperRecord, PreprintRecord, ReconciliationEntry};
use crate::review_link::{LinkResolver, normalize_journal};
use crate::store::ReconciliationStore;
use crate::template::AnnotationTemplate;

/// Publication id stored when the API accepted an annotation without naming it.
///
/// The entry then counts as published and is never posted again; purge cannot
/// match it to a live annotation.
pub const UNKNOWN_ANNOTATION_ID: &str = "unknown";

/// Pause before the single retry of a write that found the database busy.
const STORE_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Parameters of one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub group_name: String,
    pub prefixes: Vec<String>,
    pub journals: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Wires the discoverer, DOI lookups, link resolver, store and publisher together.
#[derive(Debug)]
pub struct Pipeline {
    store: ReconciliationStore,
    preprints: PreprintClient,
    doi: DoiClient,
    links: LinkResolver,
    hypothesis: HypothesisClient,
    template: AnnotationTemplate,
    publish_delay: Duration,
    progress: bool,
}

impl Pipeline {
    /// Builds every client from `config` around one shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Client`] when the HTTP client cannot be built.
    pub fn new(config: &PipelineConfig, store: ReconciliationStore) -> Result<Self, PipelineError> {
        let http = build_http_client(&config.http)?;
        Ok(Self {
            store,
            preprints: PreprintClient::new(http.clone(), &config.endpoints, &config.http),
            doi: DoiClient::new(
                http.clone(),
                config.endpoints.doi_org.clone(),
                config.http.doi_retry.clone(),
            ),
            links: LinkResolver::new(http.clone(), &config.endpoints, &config.http),
            hypothesis: HypothesisClient::new(
                http,
                &config.endpoints,
                config.credentials.clone(),
            ),
            template: AnnotationTemplate::default(),
            publish_delay: config.http.publish_delay,
            progress: config.progress,
        })
    }

    #[must_use]
    pub fn store(&self) -> &ReconciliationStore {
        &self.store
    }

    /// Maps a group name to the annotation group id.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::GroupNotFound`] when no group has that name, or
    /// [`PipelineError::Client`] when the group listing fails.
    pub async fn resolve_group(&self, group_name: &str) -> Result<String, PipelineError> {
        self.hypothesis
            .find_group_id(group_name)
            .await?
            .ok_or_else(|| PipelineError::GroupNotFound(group_name.to_string()))
    }

    /// Discovers preprints for every prefix, concatenated in prefix order.
    #[instrument(skip(self))]
    pub async fn discover(
        &self,
        prefixes: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<PreprintRecord> {
        let mut preprints = Vec::new();
        for prefix in prefixes {
            let found = self.preprints.discover(prefix, start, end).await;
            info!(prefix = %prefix, count = found.len(), "Preprints discovered");
            preprints.extend(found);
        }
        preprints
    }

    /// Filters preprints against the store and drafts annotations for the rest.
    ///
    /// Every preprint yields an [`ItemOutcome`]; a failing item never stops the
    /// batch. The store must have a group selected.
    #[instrument(skip_all, fields(preprints = preprints.len()))]
    pub async fn update(&self, preprints: Vec<PreprintRecord>, journals: &[String]) -> UpdateReport {
        let journals: Vec<String> = journals.iter().map(|j| normalize_journal(j)).collect();
        let bar = progress::item_bar(self.progress, preprints.len(), "update");
        let mut report = UpdateReport::default();

        for preprint in preprints {
            bar.set_message(preprint.preprint_doi.clone());
            let doi = preprint.preprint_doi.clone();
            let outcome = match self.update_one(preprint, &journals).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    warn!(doi = %doi, error = %error, "Preprint not processed");
                    ItemOutcome::Failed(error.to_string())
                }
            };
            if let ItemOutcome::Skipped(reason) = &outcome {
                debug!(doi = %doi, %reason, "Preprint not drafted");
            }
            report.record(&doi, outcome);
            bar.inc(1);
        }
        bar.finish_and_clear();

        info!(
            drafted = report.drafted(),
            skipped = report.skipped().len(),
            failed = report.failed().len(),
            "Update finished"
        );
        report
    }

    async fn update_one(
        &self,
        mut preprint: PreprintRecord,
        journals: &[String],
    ) -> Result<ItemOutcome, PipelineError> {
        if self.store.exists(&preprint.preprint_doi).await? {
            return Ok(ItemOutcome::Skipped(SkipReason::PreExisting));
        }

        let paper = self.describe_paper(&preprint.published_doi).await?;
        let journal_excluded = !journals.contains(&normalize_journal(&paper.journal));
        let Some(draft) = self
            .template
            .draft(&paper, &preprint.category)
            .filter(|_| !journal_excluded)
        else {
            return Ok(ItemOutcome::Skipped(SkipReason::NotDrafted {
                rpf_missing: paper.review_link.is_none(),
                journal_excluded,
            }));
        };

        // Canonical URL only for preprints that will be posted: doi.org is slow.
        match self.doi.resolve(&preprint.preprint_doi).await? {
            Some(url) => preprint.url = url,
            None => {
                return Ok(ItemOutcome::Failed(format!(
                    "preprint DOI {} did not resolve",
                    preprint.preprint_doi
                )));
            }
        }

        let entry = ReconciliationEntry {
            preprint,
            paper,
            annotation: draft,
        };
        match self.store.insert(&entry).await? {
            Some(_) => Ok(ItemOutcome::Drafted),
            None => Ok(ItemOutcome::Skipped(SkipReason::PreExisting)),
        }
    }

    /// Journal, subjects and review link of the published paper.
    async fn describe_paper(&self, paper_doi: &str) -> Result<PaperRecord, PipelineError> {
        let paper_doi = paper_doi.trim();
        if paper_doi.is_empty() {
            return Ok(PaperRecord::default());
        }
        let citation = self.doi.citation(paper_doi).await?;
        let review_link = self.links.resolve_link(&citation.journal, paper_doi).await;
        Ok(PaperRecord {
            doi: paper_doi.to_string(),
            journal: citation.journal,
            subjects: citation.subjects,
            review_link,
        })
    }

    /// Publishes every unpublished entry of the group.
    ///
    /// A successful create records the returned id, or [`UNKNOWN_ANNOTATION_ID`]
    /// when the response carries none. A rejected create is logged and the
    /// entry is marked with an empty id, which leaves it unpublished for the
    /// next run. A transport failure leaves it untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] when the store cannot be read or written.
    #[instrument(skip(self))]
    pub async fn post(&self, group_id: &str) -> Result<PostReport, PipelineError> {
        let (entries, pending) = self.store.find_unpublished().await?;
        info!(pending, "Unpublished entries");

        let permissions = self.hypothesis.permissions(group_id);
        let bar = progress::item_bar(self.progress, pending, "publish");
        let mut report = PostReport {
            pending,
            ..PostReport::default()
        };

        for entry in entries {
            let doi = entry.preprint_doi();
            bar.set_message(doi.to_string());
            let target = entry.target();
            match self
                .hypothesis
                .publish(&permissions, group_id, &target, &entry.annotation)
                .await
            {
                Ok(response) => match response.annotation_id() {
                    Some(id) => {
                        self.record_publication(doi, &id).await?;
                        report.published += 1;
                    }
                    None if response.is_success() => {
                        error!(doi, body = %response.body, "Annotation created without a readable id");
                        self.record_publication(doi, UNKNOWN_ANNOTATION_ID).await?;
                        report.unconfirmed += 1;
                    }
                    None => {
                        warn!(doi, status = response.status, body = %response.body, "Annotation rejected");
                        self.store.set_published(doi, "").await?;
                        report.rejected += 1;
                    }
                },
                Err(error) => {
                    warn!(doi, error = %error, "Annotation not sent");
                    report.failed += 1;
                }
            }

            if !self.publish_delay.is_zero() {
                tokio::time::sleep(self.publish_delay).await;
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        info!(
            published = report.published,
            unconfirmed = report.unconfirmed,
            "Posting finished"
        );
        Ok(report)
    }

    /// Stores the id of a live annotation, retrying once if the file is busy.
    ///
    /// Losing this write would get the annotation posted again next run.
    async fn record_publication(&self, doi: &str, id: &str) -> Result<(), PipelineError> {
        match self.store.set_published(doi, id).await {
            Ok(_) => Ok(()),
            Err(error) if error.is_transient() => {
                warn!(doi, id, error = %error, "Store busy; retrying publication record");
                tokio::time::sleep(STORE_RETRY_DELAY).await;
                self.store.set_published(doi, id).await?;
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Runs group resolution, discovery, update and post in order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::GroupNotFound`] before any discovery when the
    /// group is unknown, or a store/client error that stops a whole step.
    #[instrument(skip(self, request), fields(group = %request.group_name))]
    pub async fn run(&mut self, request: &SyncRequest) -> Result<RunSummary, PipelineError> {
        let group_id = self.resolve_group(&request.group_name).await?;
        self.store.select_group(group_id.clone());

        let preprints = self
            .discover(&request.prefixes, request.start, request.end)
            .await;
        let discovered = preprints.len();

        let update = self.update(preprints, &request.journals).await;
        let post = self.post(&group_id).await?;

        Ok(RunSummary {
            group_id,
            discovered,
            update,
            post,
        })
    }

    /// Deletes up to `limit` of the account's annotations in a group.
    ///
    /// Each deleted annotation also removes its store entry. With `drop`, every
    /// remaining entry of the group is removed from the store afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::GroupNotFound`], a client error when the search
    /// fails, or a store error.
    #[instrument(skip(self))]
    pub async fn purge(
        &mut self,
        group_name: &str,
        limit: u32,
        drop: bool,
    ) -> Result<PurgeSummary, PipelineError> {
        let group_id = self.resolve_group(group_name).await?;
        self.store.select_group(group_id.clone());

        let results = self.hypothesis.search(&group_id, limit).await?;
        info!(total = results.total, group = %group_id, "Deleting annotations");

        let bar = progress::item_bar(self.progress, results.rows.len(), "purge");
        let mut summary = PurgeSummary {
            total: results.total,
            deleted: 0,
            entries_removed: 0,
            dropped: None,
        };

        for row in &results.rows {
            bar.set_message(row.id.clone());
            debug!(id = %row.id, uri = %row.uri, "Deleting annotation");
            match self.hypothesis.delete(&row.id).await {
                Ok(true) => {
                    summary.deleted += 1;
                    summary.entries_removed += self.store.delete_by_publication_id(&row.id).await?;
                }
                Ok(false) => {}
                Err(error) => warn!(id = %row.id, error = %error, "Annotation not deleted"),
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        if drop {
            summary.dropped = Some(self.store.drop_group().await?);
        }

        info!(
            deleted = summary.deleted,
            remaining = summary.remaining(),
            "Purge finished"
        );
        Ok(summary)
    }
}
