//! Remote data service adapters layered over a key-value store.
//!
//! Option rows live under `remote/options/{model}` and submission rows under
//! `remote/submissions`, each as one JSON array. Read-modify-write cycles are
//! serialised per repository with an async mutex.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::ports::{
    KeyValueStore, KeyValueStoreError, OptionRow, OptionRowRepository, OptionRowRepositoryError,
    SubmissionRepository, SubmissionRepositoryError, SubmissionRow, get_json, put_json,
};

const OPTIONS_PREFIX: &str = "remote/options/";
const SUBMISSIONS_KEY: &str = "remote/submissions";

fn options_key(model_id: &str) -> String {
    format!("{OPTIONS_PREFIX}{model_id}")
}

fn option_error(err: KeyValueStoreError) -> OptionRowRepositoryError {
    match err {
        KeyValueStoreError::Io { .. } => OptionRowRepositoryError::connection(err.to_string()),
        KeyValueStoreError::InvalidKey { .. } | KeyValueStoreError::Corrupt { .. } => {
            OptionRowRepositoryError::query(err.to_string())
        }
    }
}

fn submission_error(err: KeyValueStoreError) -> SubmissionRepositoryError {
    match err {
        KeyValueStoreError::Io { .. } => SubmissionRepositoryError::connection(err.to_string()),
        KeyValueStoreError::InvalidKey { .. } | KeyValueStoreError::Corrupt { .. } => {
            SubmissionRepositoryError::query(err.to_string())
        }
    }
}

/// Option rows stored as one document per model.
pub struct KvOptionRowRepository<K> {
    store: Arc<K>,
    writes: Mutex<()>,
}

impl<K> KvOptionRowRepository<K> {
    /// Store rows in `store`.
    pub fn new(store: Arc<K>) -> Self {
        Self {
            store,
            writes: Mutex::new(()),
        }
    }
}

#[async_trait]
impl<K: KeyValueStore> OptionRowRepository for KvOptionRowRepository<K> {
    async fn list(&self, model_id: &str) -> Result<Vec<OptionRow>, OptionRowRepositoryError> {
        let rows: Option<Vec<OptionRow>> = get_json(&*self.store, &options_key(model_id))
            .await
            .map_err(option_error)?;
        Ok(rows.unwrap_or_default())
    }

    async fn replace(
        &self,
        model_id: &str,
        rows: Vec<OptionRow>,
    ) -> Result<(), OptionRowRepositoryError> {
        let _guard = self.writes.lock().await;
        let key = options_key(model_id);
        if rows.is_empty() {
            return self.store.remove(&key).await.map_err(option_error);
        }
        put_json(&*self.store, &key, &rows)
            .await
            .map_err(option_error)
    }
}

/// Submission rows stored as a single newest-first document.
pub struct KvSubmissionRepository<K> {
    store: Arc<K>,
    writes: Mutex<()>,
}

impl<K> KvSubmissionRepository<K> {
    /// Store rows in `store`.
    pub fn new(store: Arc<K>) -> Self {
        Self {
            store,
            writes: Mutex::new(()),
        }
    }
}

impl<K: KeyValueStore> KvSubmissionRepository<K> {
    async fn load(&self) -> Result<Vec<SubmissionRow>, SubmissionRepositoryError> {
        let rows: Option<Vec<SubmissionRow>> = get_json(&*self.store, SUBMISSIONS_KEY)
            .await
            .map_err(submission_error)?;
        Ok(rows.unwrap_or_default())
    }

    async fn save(&self, rows: &[SubmissionRow]) -> Result<(), SubmissionRepositoryError> {
        put_json(&*self.store, SUBMISSIONS_KEY, rows)
            .await
            .map_err(submission_error)
    }
}

#[async_trait]
impl<K: KeyValueStore> SubmissionRepository for KvSubmissionRepository<K> {
    async fn insert(&self, row: SubmissionRow) -> Result<SubmissionRow, SubmissionRepositoryError> {
        let _guard = self.writes.lock().await;
        let mut rows = self.load().await?;
        rows.retain(|existing| existing.id != row.id);
        rows.insert(0, row.clone());
        self.save(&rows).await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<(), SubmissionRepositoryError> {
        let _guard = self.writes.lock().await;
        let mut rows = self.load().await?;
        let before = rows.len();
        rows.retain(|row| row.id != id);
        if rows.len() == before {
            return Err(SubmissionRepositoryError::not_found(id));
        }
        self.save(&rows).await
    }

    async fn list_all(&self) -> Result<Vec<SubmissionRow>, SubmissionRepositoryError> {
        let mut rows = self.load().await?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}
