//! Product models and the active selection.
//!
//! Every code table, defect-type map and submission pool is namespaced by a
//! model id. The catalogue always holds at least one model and always has a
//! valid selection.

use code_catalog::CodeCatalog;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One product model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// Model identifier, e.g. `ICH-3000`.
    #[schema(example = "ICH-3000")]
    pub id: String,
    /// Display label.
    #[schema(example = "ICH-3000")]
    pub label: String,
    /// Product code prefix used in defect codes.
    #[schema(example = "C03")]
    pub product_code: String,
}

impl ModelConfig {
    /// Build a model whose label equals its id.
    pub fn new(id: impl Into<String>, product_code: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            product_code: product_code.into(),
        }
    }
}

/// Rejected catalogue changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelConfigError {
    /// The model id was blank.
    #[error("model id is required")]
    EmptyId,
    /// The product code was blank.
    #[error("product code is required")]
    EmptyProductCode,
    /// A model with this id already exists.
    #[error("model '{id}' already exists")]
    DuplicateId {
        /// Offending id.
        id: String,
    },
    /// No model has this id.
    #[error("model '{id}' not found")]
    NotFound {
        /// Requested id.
        id: String,
    },
    /// The last remaining model cannot be removed.
    #[error("the last model cannot be removed")]
    LastModel,
    /// The selected model cannot be removed.
    #[error("model '{id}' is selected and cannot be removed")]
    SelectedModel {
        /// Selected id.
        id: String,
    },
}

impl ModelConfigError {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyId | Self::EmptyProductCode => "required",
            Self::DuplicateId { .. } => "duplicate_model",
            Self::NotFound { .. } => "model_not_found",
            Self::LastModel => "last_model",
            Self::SelectedModel { .. } => "selected_model",
        }
    }
}

/// Ordered, never-empty list of models plus the selected id.
///
/// # Examples
/// ```
/// use quality_backend::domain::ModelCatalogue;
/// use code_catalog::CodeCatalog;
///
/// let mut catalogue = ModelCatalogue::from_catalog(&CodeCatalog::builtin());
/// assert_eq!(catalogue.selected().id, "ICH-3000");
/// catalogue.add("WP-100", "w10").expect("new model");
/// assert_eq!(catalogue.find("WP-100").map(|m| m.product_code.as_str()), Some("W10"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalogue {
    first: ModelConfig,
    rest: Vec<ModelConfig>,
    selected: String,
}

impl ModelCatalogue {
    /// Catalogue with a single model, selected.
    #[must_use]
    pub fn single(model: ModelConfig) -> Self {
        Self {
            selected: model.id.clone(),
            first: model,
            rest: Vec::new(),
        }
    }

    /// Catalogue listing every model of a code catalogue, first one selected.
    #[must_use]
    pub fn from_catalog(catalog: &CodeCatalog) -> Self {
        let mut models = catalog.models().iter().map(|defaults| ModelConfig {
            id: defaults.id().to_owned(),
            label: defaults.label().to_owned(),
            product_code: defaults.product_code().to_owned(),
        });
        let first = models
            .next()
            .unwrap_or_else(|| ModelConfig::new(super::LEGACY_MODEL_ID, "C03"));
        let mut catalogue = Self::single(first);
        catalogue.rest.extend(models);
        catalogue
    }

    /// Rebuild from persisted state.
    ///
    /// An empty model list yields `fallback`; a selection naming a missing
    /// model selects the first model. Repeated ids keep their first entry.
    #[must_use]
    pub fn restore(models: Vec<ModelConfig>, selected: Option<&str>, fallback: Self) -> Self {
        let mut iter = models.into_iter();
        let Some(first) = iter.next() else {
            return fallback;
        };
        let mut catalogue = Self::single(first);
        for model in iter {
            if catalogue.find(&model.id).is_none() {
                catalogue.rest.push(model);
            }
        }
        if let Some(id) = selected.filter(|id| catalogue.find(id).is_some()) {
            catalogue.selected = id.to_owned();
        }
        catalogue
    }

    /// Models in display order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelConfig> {
        std::iter::once(&self.first).chain(self.rest.iter())
    }

    /// Owned copy of the model list.
    #[must_use]
    pub fn to_vec(&self) -> Vec<ModelConfig> {
        self.iter().cloned().collect()
    }

    /// Number of models, never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rest.len() + 1
    }

    /// Always `false`; provided for API symmetry with collections.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Model with this id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ModelConfig> {
        self.iter().find(|model| model.id == id)
    }

    /// The selected model.
    #[must_use]
    pub fn selected(&self) -> &ModelConfig {
        self.find(&self.selected).unwrap_or(&self.first)
    }

    /// Append a model. The id is trimmed; the product code is trimmed and
    /// upper-cased.
    ///
    /// # Errors
    ///
    /// Rejects blank values and duplicate ids.
    pub fn add(&mut self, id: &str, product_code: &str) -> Result<ModelConfig, ModelConfigError> {
        let id = id.trim();
        let product_code = product_code.trim().to_uppercase();
        if id.is_empty() {
            return Err(ModelConfigError::EmptyId);
        }
        if product_code.is_empty() {
            return Err(ModelConfigError::EmptyProductCode);
        }
        if self.find(id).is_some() {
            return Err(ModelConfigError::DuplicateId { id: id.to_owned() });
        }
        let model = ModelConfig::new(id, product_code);
        self.rest.push(model.clone());
        Ok(model)
    }

    /// Remove a model.
    ///
    /// # Errors
    ///
    /// Rejects unknown ids, the last model and the selected model.
    pub fn remove(&mut self, id: &str) -> Result<ModelConfig, ModelConfigError> {
        if self.find(id).is_none() {
            return Err(ModelConfigError::NotFound { id: id.to_owned() });
        }
        if self.rest.is_empty() {
            return Err(ModelConfigError::LastModel);
        }
        if self.selected().id == id {
            return Err(ModelConfigError::SelectedModel { id: id.to_owned() });
        }
        if self.first.id == id {
            let promoted = self.rest.remove(0);
            return Ok(std::mem::replace(&mut self.first, promoted));
        }
        let index = self
            .rest
            .iter()
            .position(|model| model.id == id)
            .ok_or_else(|| ModelConfigError::NotFound { id: id.to_owned() })?;
        Ok(self.rest.remove(index))
    }

    /// Change the selection.
    ///
    /// # Errors
    ///
    /// Returns [`ModelConfigError::NotFound`] for unknown ids.
    pub fn select(&mut self, id: &str) -> Result<ModelConfig, ModelConfigError> {
        let model = self
            .find(id)
            .cloned()
            .ok_or_else(|| ModelConfigError::NotFound { id: id.to_owned() })?;
        self.selected = model.id.clone();
        Ok(model)
    }
}
