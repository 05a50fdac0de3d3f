//! Persistence side-effect reporting and storage keys.
//!
//! In-memory state is the source of truth for a running process. Writes to
//! the local store and the remote data service happen after each mutation;
//! when they fail the mutation still succeeds and the caller receives a
//! [`PersistenceWarning`] to surface to the operator.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Which collaborator failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceTarget {
    /// The local key-value store.
    Local,
    /// The remote data service.
    Remote,
}

/// A non-fatal persistence failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceWarning {
    /// Failed collaborator.
    pub target: PersistenceTarget,
    /// Human-readable failure description.
    #[schema(example = "local store write failed: disk full")]
    pub message: String,
}

impl PersistenceWarning {
    /// Warning about the local store.
    pub fn local(message: impl Into<String>) -> Self {
        Self {
            target: PersistenceTarget::Local,
            message: message.into(),
        }
    }

    /// Warning about the remote data service.
    pub fn remote(message: impl Into<String>) -> Self {
        Self {
            target: PersistenceTarget::Remote,
            message: message.into(),
        }
    }
}

/// A mutation result plus the first persistence failure, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persisted<T> {
    /// The value produced by the mutation.
    pub value: T,
    /// Set when persisting the new state failed.
    pub warning: Option<PersistenceWarning>,
}

impl<T> Persisted<T> {
    /// A result whose side effects all succeeded.
    pub const fn clean(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    /// A result with an optional warning.
    pub const fn with_warning(value: T, warning: Option<PersistenceWarning>) -> Self {
        Self { value, warning }
    }

    /// Transform the value, keeping the warning.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Persisted<U> {
        Persisted {
            value: f(self.value),
            warning: self.warning,
        }
    }
}

/// Outcome of reconciling cached state with the remote data service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "warning")]
pub enum RefreshOutcome {
    /// Remote data replaced the cached state.
    Applied,
    /// The cached state changed while the fetch was in flight; the response
    /// was discarded.
    Stale,
    /// The remote returned nothing; the cached state was kept.
    Empty,
    /// The fetch failed; the cached state was kept.
    Failed(PersistenceWarning),
}

/// Local store keys.
pub mod keys {
    /// Option table snapshot of one model.
    #[must_use]
    pub fn options(model_id: &str) -> String {
        format!("ich-quality-options-{model_id}")
    }

    /// Defect-type map of one model.
    #[must_use]
    pub fn defect_types(model_id: &str) -> String {
        format!("ich-quality-defect-types-{model_id}")
    }

    /// Submission pool mirror.
    pub const SUBMISSIONS: &str = "ich-quality-worker-submissions-v2";
    /// Configured model list.
    pub const MODELS: &str = "ich-quality-models";
    /// Selected model id.
    pub const SELECTED_MODEL: &str = "ich-quality-selected-model";
}
