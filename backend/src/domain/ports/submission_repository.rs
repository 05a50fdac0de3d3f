//! Port for the remote submission table.
//!
//! Rows mirror [`WorkerSubmission`] in snake_case with the defect list held
//! as a nested JSON column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::define_port_error;
use crate::domain::{DefectEntry, LEGACY_MODEL_ID, WorkerSubmission, parse_work_date};

define_port_error! {
    /// Errors raised by submission repository adapters.
    pub enum SubmissionRepositoryError {
        /// The remote service could not be reached.
        Connection { message: String } =>
            "submission repository connection failed: {message}",
        /// The remote service rejected the operation.
        Query { message: String } =>
            "submission repository query failed: {message}",
        /// No row has the given id.
        NotFound { id: Uuid } => "submission {id} not found",
    }
}

/// One remote submission row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRow {
    /// Row id.
    pub id: Uuid,
    /// Owning model; missing on legacy rows.
    #[serde(default)]
    pub model_id: Option<String>,
    /// Worker display name.
    pub worker_name: String,
    /// Worker code.
    #[serde(default)]
    pub worker_code: String,
    /// Work date, `YYYY-MM-DD` or the legacy dotted spelling.
    pub work_date: String,
    /// Time of day.
    #[serde(default)]
    pub work_time: String,
    /// Process name.
    pub process: String,
    /// Units produced.
    pub production_qty: u32,
    /// Task labels.
    #[serde(default)]
    pub tasks: Vec<String>,
    /// Defect entries.
    #[serde(default)]
    pub defects: Vec<DefectEntry>,
    /// Memo.
    #[serde(default)]
    pub memo: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&WorkerSubmission> for SubmissionRow {
    fn from(submission: &WorkerSubmission) -> Self {
        Self {
            id: submission.id,
            model_id: Some(submission.model.clone()),
            worker_name: submission.worker_name.clone(),
            worker_code: submission.worker_code.clone(),
            work_date: submission.date_key(),
            work_time: submission.time.clone(),
            process: submission.process.clone(),
            production_qty: submission.production_qty,
            tasks: submission.tasks.clone(),
            defects: submission.defects.clone(),
            memo: submission.memo.clone(),
            created_at: submission.created_at,
        }
    }
}

/// Raised when a row carries an unparseable work date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("submission {id} has invalid work date '{value}'")]
pub struct InvalidWorkDate {
    /// Row id.
    pub id: Uuid,
    /// Rejected date.
    pub value: String,
}

impl TryFrom<SubmissionRow> for WorkerSubmission {
    type Error = InvalidWorkDate;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let date = parse_work_date(&row.work_date).ok_or_else(|| InvalidWorkDate {
            id: row.id,
            value: row.work_date.clone(),
        })?;
        Ok(Self {
            id: row.id,
            worker_name: row.worker_name,
            worker_code: row.worker_code,
            date,
            time: row.work_time,
            process: row.process,
            production_qty: row.production_qty,
            tasks: row.tasks,
            defects: row.defects,
            memo: row.memo,
            model: row
                .model_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| LEGACY_MODEL_ID.to_owned()),
            created_at: row.created_at,
        })
    }
}

/// Remote storage of submission rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Store a new row and return it as persisted.
    async fn insert(&self, row: SubmissionRow) -> Result<SubmissionRow, SubmissionRepositoryError>;

    /// Delete one row.
    async fn delete(&self, id: Uuid) -> Result<(), SubmissionRepositoryError>;

    /// Every row, newest first.
    async fn list_all(&self) -> Result<Vec<SubmissionRow>, SubmissionRepositoryError>;
}

/// Repository that holds no rows and echoes inserts.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSubmissionRepository;

#[async_trait]
impl SubmissionRepository for FixtureSubmissionRepository {
    async fn insert(&self, row: SubmissionRow) -> Result<SubmissionRow, SubmissionRepositoryError> {
        Ok(row)
    }

    async fn delete(&self, _id: Uuid) -> Result<(), SubmissionRepositoryError> {
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<SubmissionRow>, SubmissionRepositoryError> {
        Ok(Vec::new())
    }
}
