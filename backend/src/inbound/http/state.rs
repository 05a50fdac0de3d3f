//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use chrono::NaiveDate;
use mockable::{Clock, DefaultClock};

use crate::domain::Error;
use crate::domain::ports::{
    CodeTableCommand, CodeTableQuery, FixtureCodeTableCommand, FixtureCodeTableQuery,
    FixtureModelCatalog, FixtureSubmissionCommand, FixtureSubmissionQuery, ModelCatalog,
    SubmissionCommand, SubmissionQuery,
};
use crate::domain::ModelConfig;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub models: Arc<dyn ModelCatalog>,
    pub tables: Arc<dyn CodeTableCommand>,
    pub tables_query: Arc<dyn CodeTableQuery>,
    pub submissions: Arc<dyn SubmissionCommand>,
    pub submissions_query: Arc<dyn SubmissionQuery>,
    /// Source of "today" for date presets.
    pub clock: Arc<dyn Clock>,
}

impl Default for HttpState {
    /// State backed by the port fixtures.
    fn default() -> Self {
        Self {
            models: Arc::new(FixtureModelCatalog),
            tables: Arc::new(FixtureCodeTableCommand),
            tables_query: Arc::new(FixtureCodeTableQuery),
            submissions: Arc::new(FixtureSubmissionCommand),
            submissions_query: Arc::new(FixtureSubmissionQuery),
            clock: Arc::new(DefaultClock),
        }
    }
}

impl HttpState {
    /// Resolve a model id, answering `404` for unknown models.
    pub(crate) async fn require_model(&self, model_id: &str) -> Result<ModelConfig, Error> {
        self.models
            .find(model_id)
            .await
            .ok_or_else(|| Error::not_found(format!("model '{model_id}' not found")))
    }

    /// The local calendar date.
    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.local().date_naive()
    }

    /// Resolve an optional model id, defaulting to the selected model.
    pub(crate) async fn model_or_selected(
        &self,
        model_id: Option<&str>,
    ) -> Result<ModelConfig, Error> {
        match model_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => self.require_model(id).await,
            None => {
                let list = self.models.list().await;
                self.require_model(&list.selected).await
            }
        }
    }
}
