//! Driving port for recording and deleting submissions.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Error, Persisted, RefreshOutcome, SubmissionDraft, WorkerSubmission};

/// Submission pool mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionCommand: Send + Sync {
    /// Validate and record a draft.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when validation fails; the pool is left unchanged.
    async fn add(&self, draft: SubmissionDraft) -> Result<Persisted<WorkerSubmission>, Error>;

    /// Delete a submission and return it.
    ///
    /// # Errors
    ///
    /// `NotFound` when no submission has this id.
    async fn delete(&self, id: Uuid) -> Result<Persisted<WorkerSubmission>, Error>;

    /// Reconcile the cached pool with the remote data service.
    async fn refresh(&self) -> RefreshOutcome;
}

/// Command fixture that rejects everything as missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSubmissionCommand;

#[async_trait]
impl SubmissionCommand for FixtureSubmissionCommand {
    async fn add(&self, _draft: SubmissionDraft) -> Result<Persisted<WorkerSubmission>, Error> {
        Err(Error::service_unavailable("submissions are not configured"))
    }

    async fn delete(&self, id: Uuid) -> Result<Persisted<WorkerSubmission>, Error> {
        Err(Error::not_found(format!("submission {id} not found")))
    }

    async fn refresh(&self) -> RefreshOutcome {
        RefreshOutcome::Empty
    }
}
