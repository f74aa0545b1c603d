//! Per-item outcomes and run reports.

use std::fmt;

use thiserror::Error;

use crate::client::ClientError;
use crate::store::StoreError;

/// Errors that stop a whole pipeline step.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Client(#[from] ClientError),

    /// No annotation group carries the requested name.
    #[error(
        "could not find group: {0}\n  Suggestion: check the group name, or use __world__ for the public group"
    )]
    GroupNotFound(String),
}

/// Why a preprint was not drafted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// An entry for the preprint is already stored in the group.
    PreExisting,
    /// No usable review file, or the journal is not requested.
    NotDrafted {
        rpf_missing: bool,
        journal_excluded: bool,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreExisting => write!(f, "pre-existing"),
            Self::NotDrafted {
                rpf_missing,
                journal_excluded,
            } => {
                let reasons: Vec<&str> = [
                    rpf_missing.then_some("rpf issue"),
                    journal_excluded.then_some("not in journals"),
                ]
                .into_iter()
                .flatten()
                .collect();
                write!(f, "{}", reasons.join(", "))
            }
        }
    }
}

/// Result of filtering and drafting one preprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// A draft entry was inserted.
    Drafted,
    Skipped(SkipReason),
    /// Lookup or storage failed; the batch continued.
    Failed(String),
}

/// Outcome of the update step, one record per preprint in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub items: Vec<(String, ItemOutcome)>,
}

impl UpdateReport {
    pub(crate) fn record(&mut self, preprint_doi: &str, outcome: ItemOutcome) {
        self.items.push((preprint_doi.to_string(), outcome));
    }

    #[must_use]
    pub fn drafted(&self) -> usize {
        self.items
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ItemOutcome::Drafted))
            .count()
    }

    /// Skipped preprints with their reasons.
    #[must_use]
    pub fn skipped(&self) -> Vec<(&str, SkipReason)> {
        self.items
            .iter()
            .filter_map(|(doi, outcome)| match outcome {
                ItemOutcome::Skipped(reason) => Some((doi.as_str(), *reason)),
                _ => None,
            })
            .collect()
    }

    /// Failed preprints with their error messages.
    #[must_use]
    pub fn failed(&self) -> Vec<(&str, &str)> {
        self.items
            .iter()
            .filter_map(|(doi, outcome)| match outcome {
                ItemOutcome::Failed(message) => Some((doi.as_str(), message.as_str())),
                _ => None,
            })
            .collect()
    }
}

/// Outcome of the publish step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostReport {
    /// Entries found without a publication id.
    pub pending: usize,
    /// Annotations created and recorded.
    pub published: usize,
    /// Created annotations whose id could not be read from the response.
    pub unconfirmed: usize,
    /// Create calls answered with a non-success status.
    pub rejected: usize,
    /// Create calls that never reached the API.
    pub failed: usize,
}

/// Totals of a full sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub group_id: String,
    pub discovered: usize,
    pub update: UpdateReport,
    pub post: PostReport,
}

/// Totals of a purge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSummary {
    /// Annotations the search reported for the account in the group.
    pub total: u64,
    pub deleted: u64,
    /// Store entries removed alongside deleted annotations.
    pub entries_removed: u64,
    /// Entries removed by dropping the group, when requested.
    pub dropped: Option<u64>,
}

impl PurgeSummary {
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.deleted)
    }
}
