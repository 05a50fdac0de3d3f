//! Driving port for product model management.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, ModelConfig, Persisted};

/// Configured models and the active selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelList {
    /// Models in display order.
    pub models: Vec<ModelConfig>,
    /// Id of the selected model.
    #[schema(example = "ICH-3000")]
    pub selected: String,
}

/// Model catalogue operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// All models plus the selection.
    async fn list(&self) -> ModelList;

    /// One model by id.
    async fn find(&self, model_id: &str) -> Option<ModelConfig>;

    /// Add a model.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for blank input, `Conflict` for duplicate ids.
    async fn add(
        &self,
        model_id: &str,
        product_code: &str,
    ) -> Result<Persisted<ModelConfig>, Error>;

    /// Remove a model and purge its code tables.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids, `InvalidRequest` when removing the last or
    /// the selected model.
    async fn remove(&self, model_id: &str) -> Result<Persisted<ModelConfig>, Error>;

    /// Select a model and start refreshing its tables.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids.
    async fn select(&self, model_id: &str) -> Result<Persisted<ModelConfig>, Error>;
}

/// Catalogue fixture with one model.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureModelCatalog;

impl FixtureModelCatalog {
    fn model() -> ModelConfig {
        ModelConfig::new("ICH-3000", "C03")
    }
}

#[async_trait]
impl ModelCatalog for FixtureModelCatalog {
    async fn list(&self) -> ModelList {
        ModelList {
            models: vec![Self::model()],
            selected: Self::model().id,
        }
    }

    async fn find(&self, model_id: &str) -> Option<ModelConfig> {
        Some(Self::model()).filter(|model| model.id == model_id)
    }

    async fn add(
        &self,
        model_id: &str,
        product_code: &str,
    ) -> Result<Persisted<ModelConfig>, Error> {
        Ok(Persisted::clean(ModelConfig::new(model_id, product_code)))
    }

    async fn remove(&self, _model_id: &str) -> Result<Persisted<ModelConfig>, Error> {
        Err(Error::invalid_request("the last model cannot be removed"))
    }

    async fn select(&self, model_id: &str) -> Result<Persisted<ModelConfig>, Error> {
        self.find(model_id)
            .await
            .map(Persisted::clean)
            .ok_or_else(|| Error::not_found(format!("model '{model_id}' not found")))
    }
}
