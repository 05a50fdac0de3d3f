//! Driving port for reading submissions and their statistics.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{DailySummary, DateRange, StatFilters, SubmissionStats, WorkerSubmission};

/// Read access to the submission pool.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionQuery: Send + Sync {
    /// Submissions newest first, optionally restricted to one model.
    async fn list(&self, model_id: Option<String>) -> Vec<WorkerSubmission>;

    /// Aggregate statistics for one model.
    async fn stats(
        &self,
        model_id: &str,
        range: DateRange,
        filters: StatFilters,
    ) -> SubmissionStats;

    /// Totals of one model on one day.
    async fn daily_summary(&self, model_id: &str, date: NaiveDate) -> DailySummary;
}

/// Query fixture over an empty pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSubmissionQuery;

#[async_trait]
impl SubmissionQuery for FixtureSubmissionQuery {
    async fn list(&self, _model_id: Option<String>) -> Vec<WorkerSubmission> {
        Vec::new()
    }

    async fn stats(
        &self,
        _model_id: &str,
        _range: DateRange,
        _filters: StatFilters,
    ) -> SubmissionStats {
        SubmissionStats::default()
    }

    async fn daily_summary(&self, model_id: &str, date: NaiveDate) -> DailySummary {
        DailySummary::compute(&[], model_id, date)
    }
}
