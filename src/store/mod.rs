//! Durable reconciliation state, one partition per annotation group.
//!
//! Every operation is scoped by the group chosen with
//! [`ReconciliationStore::select_group`]; calling anything else first fails
//! with [`StoreError::NoGroupSelected`]. Insert-if-absent is atomic thanks to
//! the `UNIQUE(group_id, preprint_doi)` constraint.
//!
//! # Example
//!
//! ```no_run
//! use traxiv_core::Database;
//! use traxiv_core::store::ReconciliationStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new_in_memory().await?;
//! let mut store = ReconciliationStore::new(db);
//! store.select_group("__world__");
//! let (pending, count) = store.find_unpublished().await?;
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::{StoreDbErrorKind, StoreError};

use sqlx::FromRow;
use tracing::{debug, info, instrument};

use crate::db::Database;
use crate::record::{AnnotationDraft, PaperRecord, PreprintRecord, ReconciliationEntry};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Raw row; sub-documents are JSON text.
#[derive(Debug, FromRow)]
struct EntryRow {
    preprint_doi: String,
    preprint: String,
    paper: String,
    annotation_text: String,
    annotation_tags: String,
    hypothesis_id: String,
}

impl EntryRow {
    fn into_entry(self) -> Result<ReconciliationEntry> {
        let doi = self.preprint_doi;
        let preprint: PreprintRecord = serde_json::from_str(&self.preprint)
            .map_err(|e| StoreError::serialization(&doi, &e))?;
        let paper: PaperRecord =
            serde_json::from_str(&self.paper).map_err(|e| StoreError::serialization(&doi, &e))?;
        let tags: Vec<String> = serde_json::from_str(&self.annotation_tags)
            .map_err(|e| StoreError::serialization(&doi, &e))?;
        Ok(ReconciliationEntry {
            preprint,
            paper,
            annotation: AnnotationDraft {
                text: self.annotation_text,
                tags,
                hypothesis_id: self.hypothesis_id,
            },
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT preprint_doi, preprint, paper, annotation_text, annotation_tags, hypothesis_id FROM entries";

/// Reconciliation entries of one annotation group.
#[derive(Debug, Clone)]
pub struct ReconciliationStore {
    db: Database,
    group: Option<String>,
}

impl ReconciliationStore {
    /// Creates a store with no group selected.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db, group: None }
    }

    /// Binds every later operation to `group_id`.
    pub fn select_group(&mut self, group_id: impl Into<String>) {
        let group_id = group_id.into();
        debug!(group = %group_id, "Store group selected");
        self.group = Some(group_id);
    }

    /// The currently selected group id.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    fn current_group(&self) -> Result<&str> {
        self.group.as_deref().ok_or(StoreError::NoGroupSelected)
    }

    /// Returns true when an entry for the preprint exists in the group.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoGroupSelected`] or a database error.
    #[instrument(skip(self))]
    pub async fn exists(&self, preprint_doi: &str) -> Result<bool> {
        let group = self.current_group()?;
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM entries WHERE group_id = ? AND preprint_doi = ?")
                .bind(group)
                .bind(preprint_doi)
                .fetch_optional(self.db.pool())
                .await?;
        Ok(found.is_some())
    }

    /// Loads the stored entry for a preprint.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoGroupSelected`], a database error, or
    /// [`StoreError::Serialization`] when the stored JSON is malformed.
    #[instrument(skip(self))]
    pub async fn find_one(&self, preprint_doi: &str) -> Result<Option<ReconciliationEntry>> {
        let group = self.current_group()?;
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "{SELECT_COLUMNS} WHERE group_id = ? AND preprint_doi = ?"
        ))
        .bind(group)
        .bind(preprint_doi)
        .fetch_optional(self.db.pool())
        .await?;
        row.map(EntryRow::into_entry).transpose()
    }

    /// Inserts the entry unless one with the same preprint already exists.
    ///
    /// Returns the new row id, or `None` when the insert was a no-op. The
    /// existing content is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoGroupSelected`] or a database error.
    #[instrument(skip(self, entry), fields(doi = %entry.preprint_doi()))]
    pub async fn insert(&self, entry: &ReconciliationEntry) -> Result<Option<i64>> {
        let group = self.current_group()?;
        let doi = entry.preprint_doi();
        let preprint = serde_json::to_string(&entry.preprint)
            .map_err(|e| StoreError::serialization(doi, &e))?;
        let paper =
            serde_json::to_string(&entry.paper).map_err(|e| StoreError::serialization(doi, &e))?;
        let tags = serde_json::to_string(&entry.annotation.tags)
            .map_err(|e| StoreError::serialization(doi, &e))?;

        let id: Option<i64> = sqlx::query_scalar(
            r"INSERT INTO entries
                (group_id, preprint_doi, preprint, paper, annotation_text, annotation_tags, hypothesis_id)
              VALUES (?, ?, ?, ?, ?, ?, ?)
              ON CONFLICT (group_id, preprint_doi) DO NOTHING
              RETURNING id",
        )
        .bind(group)
        .bind(doi)
        .bind(preprint)
        .bind(paper)
        .bind(&entry.annotation.text)
        .bind(tags)
        .bind(&entry.annotation.hypothesis_id)
        .fetch_optional(self.db.pool())
        .await?;

        if id.is_none() {
            debug!("Entry already present, insert skipped");
        }
        Ok(id)
    }

    /// Returns the entries whose publication id is empty, oldest first, and their count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoGroupSelected`], a database error, or
    /// [`StoreError::Serialization`].
    #[instrument(skip(self))]
    pub async fn find_unpublished(&self) -> Result<(Vec<ReconciliationEntry>, usize)> {
        let group = self.current_group()?;
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            "{SELECT_COLUMNS} WHERE group_id = ? AND hypothesis_id = '' ORDER BY id ASC"
        ))
        .bind(group)
        .fetch_all(self.db.pool())
        .await?;

        let entries = rows
            .into_iter()
            .map(EntryRow::into_entry)
            .collect::<Result<Vec<_>>>()?;
        let count = entries.len();
        Ok((entries, count))
    }

    /// Records the publication id of an entry. Setting the same value twice is harmless.
    ///
    /// Returns false when no entry matched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoGroupSelected`] or a database error.
    #[instrument(skip(self))]
    pub async fn set_published(&self, preprint_doi: &str, hypothesis_id: &str) -> Result<bool> {
        let group = self.current_group()?;
        let result = sqlx::query(
            r"UPDATE entries
              SET hypothesis_id = ?, updated_at = datetime('now')
              WHERE group_id = ? AND preprint_doi = ?",
        )
        .bind(hypothesis_id)
        .bind(group)
        .bind(preprint_doi)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes the entries carrying a publication id; an empty id deletes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoGroupSelected`] or a database error.
    #[instrument(skip(self))]
    pub async fn delete_by_publication_id(&self, hypothesis_id: &str) -> Result<u64> {
        let group = self.current_group()?;
        if hypothesis_id.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM entries WHERE group_id = ? AND hypothesis_id = ?")
            .bind(group)
            .bind(hypothesis_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }

    /// Removes every entry of the current group and unbinds the group.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoGroupSelected`] or a database error.
    #[instrument(skip(self))]
    pub async fn drop_group(&mut self) -> Result<u64> {
        let group = self.current_group()?;
        let result = sqlx::query("DELETE FROM entries WHERE group_id = ?")
            .bind(group)
            .execute(self.db.pool())
            .await?;
        info!(group, removed = result.rows_affected(), "Group dropped");
        self.group = None;
        Ok(result.rows_affected())
    }

    /// Number of entries in the current group.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoGroupSelected`] or a database error.
    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<u64> {
        let group = self.current_group()?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE group_id = ?")
            .bind(group)
            .fetch_one(self.db.pool())
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
