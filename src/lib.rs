//! Traxiv Core Library
//!
//! Links bioRxiv preprints to the review process files of their published
//! papers and posts an annotation on each preprint pointing readers to the
//! peer-review record.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`discovery`] - Paginated preprint listing and author enrichment (bioRxiv API)
//! - [`client`] - Shared HTTP client, retry policy and DOI lookups
//! - [`review_link`] - Per-journal review file URL grammars with live probing
//! - [`template`] - Annotation text and tags
//! - [`hypothesis`] - Annotation group lookup, posting, search and deletion
//! - [`store`] - Per-group reconciliation entries in `SQLite`
//! - [`pipeline`] - The discover, update, post sequence and the purge flow
//! - [`config`] - Endpoints, pacing and credentials
//! - [`db`] - Database connection and schema management

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod db;
pub mod discovery;
pub mod hypothesis;
pub mod pipeline;
pub mod record;
pub mod review_link;
pub mod store;
pub mod template;
mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use client::{ClientError, DoiClient, RetryPolicy, build_http_client};
pub use config::{Credentials, Endpoints, HttpSettings, PipelineConfig};
pub use db::{Database, DbError};
pub use discovery::PreprintClient;
pub use hypothesis::HypothesisClient;
pub use pipeline::{
    ItemOutcome, Pipeline, PipelineError, PostReport, PurgeSummary, RunSummary, SkipReason,
    SyncRequest, UNKNOWN_ANNOTATION_ID, UpdateReport,
};
pub use record::{AnnotationDraft, PaperRecord, PreprintRecord, ReconciliationEntry, Target};
pub use review_link::LinkResolver;
pub use store::{ReconciliationStore, StoreError};
