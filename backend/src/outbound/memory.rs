//! In-memory adapters.
//!
//! Used by tests and by servers started with `QUALITY_EPHEMERAL`. Nothing
//! survives a restart.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::{
    KeyValueStore, KeyValueStoreError, OptionRow, OptionRowRepository, OptionRowRepositoryError,
    SubmissionRepository, SubmissionRepositoryError, SubmissionRow,
};

/// Key-value store held in a map.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    docs: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        Ok(self
            .docs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        if key.trim().is_empty() {
            return Err(KeyValueStoreError::invalid_key(key));
        }
        self.docs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KeyValueStoreError> {
        self.docs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Option rows grouped by model.
#[derive(Debug, Default)]
pub struct InMemoryOptionRows {
    rows: RwLock<HashMap<String, Vec<OptionRow>>>,
}

impl InMemoryOptionRows {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OptionRowRepository for InMemoryOptionRows {
    async fn list(&self, model_id: &str) -> Result<Vec<OptionRow>, OptionRowRepositoryError> {
        Ok(self
            .rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(model_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace(
        &self,
        model_id: &str,
        rows: Vec<OptionRow>,
    ) -> Result<(), OptionRowRepositoryError> {
        let mut tables = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        if rows.is_empty() {
            tables.remove(model_id);
        } else {
            tables.insert(model_id.to_owned(), rows);
        }
        Ok(())
    }
}

/// Submission rows, newest first.
#[derive(Debug, Default)]
pub struct InMemorySubmissions {
    rows: RwLock<Vec<SubmissionRow>>,
}

impl InMemorySubmissions {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissions {
    async fn insert(&self, row: SubmissionRow) -> Result<SubmissionRow, SubmissionRepositoryError> {
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, row.clone());
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<(), SubmissionRepositoryError> {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        let before = rows.len();
        rows.retain(|row| row.id != id);
        if rows.len() == before {
            return Err(SubmissionRepositoryError::not_found(id));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<SubmissionRow>, SubmissionRepositoryError> {
        Ok(self
            .rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use rstest::rstest;

    use super::*;
    use crate::domain::{CodeTable, OptionTables};

    fn submission_row(id: Uuid) -> SubmissionRow {
        SubmissionRow {
            id,
            model_id: Some("EP-7000".to_owned()),
            worker_name: "김철수".to_owned(),
            worker_code: "W001".to_owned(),
            work_date: "2025-01-05".to_owned(),
            work_time: "08:30".to_owned(),
            process: "조립".to_owned(),
            production_qty: 12,
            tasks: vec![],
            defects: vec![],
            memo: String::new(),
            created_at: DateTime::<Utc>::default(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn key_value_store_rejects_blank_keys() {
        let store = InMemoryKeyValueStore::new();

        let err = store.put(" ", "{}").await.expect_err("blank key");

        assert!(matches!(err, KeyValueStoreError::InvalidKey { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn option_rows_are_scoped_by_model() {
        let repo = InMemoryOptionRows::new();
        let tables = OptionTables {
            processes: CodeTable::from_entries([crate::domain::CodeEntry::new("조립", "A")]),
            ..OptionTables::default()
        };
        repo.replace("EP-7000", OptionRow::from_tables("EP-7000", &tables))
            .await
            .expect("replace");

        assert_eq!(repo.list("EP-7000").await.expect("list").len(), 1);
        assert!(repo.list("ICH-3000").await.expect("list").is_empty());

        repo.replace("EP-7000", Vec::new()).await.expect("clear");
        assert!(repo.list("EP-7000").await.expect("list").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn submissions_list_newest_first_and_delete() {
        let repo = InMemorySubmissions::new();
        let (older, newer) = (Uuid::new_v4(), Uuid::new_v4());
        repo.insert(submission_row(older)).await.expect("insert");
        repo.insert(submission_row(newer)).await.expect("insert");

        let ids: Vec<Uuid> = repo
            .list_all()
            .await
            .expect("list")
            .into_iter()
            .map(|row| row.id)
            .collect();
        assert_eq!(ids, vec![newer, older]);

        repo.delete(older).await.expect("delete");
        let err = repo.delete(older).await.expect_err("already deleted");
        assert_eq!(err, SubmissionRepositoryError::not_found(older));
    }
}
