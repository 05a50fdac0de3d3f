//! Model catalogue service.
//!
//! Keeps the list of product models and the selected model in the local
//! store. Removing a model purges its code tables; selecting one starts a
//! background refresh of that model's tables.
//!
//! Changes hold a persistence lock until their writes finish, so the stored
//! list always reflects the latest change.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    CodeTableCommand, KeyValueStore, ModelCatalog, ModelList, get_json, put_json,
};
use crate::domain::{
    Error, ModelCatalogue, ModelConfig, ModelConfigError, Persisted, PersistenceWarning, TraceId,
    keys,
};

#[derive(Debug)]
struct State {
    catalogue: ModelCatalogue,
    loaded: bool,
}

/// Model catalogue backed by the local store.
pub struct ModelCatalogService<K, T> {
    store: Arc<K>,
    tables: Arc<T>,
    defaults: ModelCatalogue,
    state: RwLock<State>,
    persist: Mutex<()>,
}

impl<K, T> ModelCatalogService<K, T> {
    /// Create a service that falls back to `defaults` when nothing is stored.
    pub fn new(store: Arc<K>, tables: Arc<T>, defaults: ModelCatalogue) -> Self {
        Self {
            store,
            tables,
            state: RwLock::new(State {
                catalogue: defaults.clone(),
                loaded: false,
            }),
            defaults,
            persist: Mutex::new(()),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn catalogue_error(err: &ModelConfigError) -> Error {
    let message = err.to_string();
    let error = match err {
        ModelConfigError::NotFound { .. } => Error::not_found(message),
        ModelConfigError::DuplicateId { .. } => Error::conflict(message),
        ModelConfigError::EmptyId
        | ModelConfigError::EmptyProductCode
        | ModelConfigError::LastModel
        | ModelConfigError::SelectedModel { .. } => Error::invalid_request(message),
    };
    let field = match err {
        ModelConfigError::EmptyProductCode => "productCode",
        _ => "id",
    };
    error.with_details(json!({ "field": field, "code": err.code() }))
}

impl<K, T> ModelCatalogService<K, T>
where
    K: KeyValueStore,
    T: CodeTableCommand + 'static,
{
    async fn ensure_loaded(&self) {
        if self.read_state().loaded {
            return;
        }
        let models = match get_json::<_, Vec<ModelConfig>>(&*self.store, keys::MODELS).await {
            Ok(models) => models.unwrap_or_default(),
            Err(err) => {
                warn!(
                    error = %err,
                    "stored model list unreadable; using defaults until the next change replaces it"
                );
                Vec::new()
            }
        };
        let selected = match self.store.get(keys::SELECTED_MODEL).await {
            Ok(selected) => selected,
            Err(err) => {
                warn!(error = %err, "stored model selection unreadable");
                None
            }
        };
        let catalogue = ModelCatalogue::restore(models, selected.as_deref(), self.defaults.clone());

        let mut state = self.write_state();
        if !state.loaded {
            debug!(
                models = catalogue.len(),
                selected = %catalogue.selected().id,
                "model catalogue loaded"
            );
            state.catalogue = catalogue;
            state.loaded = true;
        }
    }

    /// Apply `change` to the loaded catalogue.
    async fn update<R>(
        &self,
        change: impl FnOnce(&mut ModelCatalogue) -> Result<R, ModelConfigError>,
    ) -> Result<(R, ModelCatalogue), Error> {
        self.ensure_loaded().await;
        let mut state = self.write_state();
        let value = change(&mut state.catalogue).map_err(|err| {
            warn!(code = err.code(), error = %err, "model catalogue change rejected");
            catalogue_error(&err)
        })?;
        Ok((value, state.catalogue.clone()))
    }

    async fn save_models(&self, catalogue: &ModelCatalogue) -> Option<PersistenceWarning> {
        put_json(&*self.store, keys::MODELS, &catalogue.to_vec())
            .await
            .err()
            .map(|err| {
                warn!(error = %err, "failed to save model list");
                PersistenceWarning::local(err.to_string())
            })
    }

    async fn save_selection(&self, model_id: &str) -> Option<PersistenceWarning> {
        self.store
            .put(keys::SELECTED_MODEL, model_id)
            .await
            .err()
            .map(|err| {
                warn!(model_id, error = %err, "failed to save model selection");
                PersistenceWarning::local(err.to_string())
            })
    }

    fn spawn_refresh(&self, model_id: String) {
        let tables = Arc::clone(&self.tables);
        let task = async move {
            let outcome = tables.refresh(&model_id).await;
            debug!(model_id, ?outcome, "selected model tables refreshed");
        };
        match TraceId::current() {
            Some(trace_id) => tokio::spawn(TraceId::scope(trace_id, task)),
            None => tokio::spawn(task),
        };
    }
}

#[async_trait]
impl<K, T> ModelCatalog for ModelCatalogService<K, T>
where
    K: KeyValueStore,
    T: CodeTableCommand + 'static,
{
    async fn list(&self) -> ModelList {
        self.ensure_loaded().await;
        let state = self.read_state();
        ModelList {
            models: state.catalogue.to_vec(),
            selected: state.catalogue.selected().id.clone(),
        }
    }

    async fn find(&self, model_id: &str) -> Option<ModelConfig> {
        self.ensure_loaded().await;
        self.read_state().catalogue.find(model_id).cloned()
    }

    async fn add(
        &self,
        model_id: &str,
        product_code: &str,
    ) -> Result<Persisted<ModelConfig>, Error> {
        let _persist = self.persist.lock().await;
        let (model, catalogue) = self
            .update(|catalogue| catalogue.add(model_id, product_code))
            .await?;
        info!(model_id = %model.id, product_code = %model.product_code, "model added");
        let warning = self.save_models(&catalogue).await;
        Ok(Persisted::with_warning(model, warning))
    }

    async fn remove(&self, model_id: &str) -> Result<Persisted<ModelConfig>, Error> {
        let _persist = self.persist.lock().await;
        let (model, catalogue) = self.update(|catalogue| catalogue.remove(model_id)).await?;
        info!(model_id = %model.id, "model removed");
        let saved = self.save_models(&catalogue).await;
        let purged = self.tables.purge(&model.id).await;
        Ok(Persisted::with_warning(model, saved.or(purged.warning)))
    }

    async fn select(&self, model_id: &str) -> Result<Persisted<ModelConfig>, Error> {
        let _persist = self.persist.lock().await;
        let (model, _) = self.update(|catalogue| catalogue.select(model_id)).await?;
        info!(model_id = %model.id, "model selected");
        let warning = self.save_selection(&model.id).await;
        self.spawn_refresh(model.id.clone());
        Ok(Persisted::with_warning(model, warning))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use code_catalog::CodeCatalog;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::RefreshOutcome;
    use crate::domain::ports::{FixtureCodeTableCommand, MockCodeTableCommand};
    use crate::domain::test_support::{GateHandle, GatedStore, MemoryStore};

    #[fixture]
    fn defaults() -> ModelCatalogue {
        ModelCatalogue::from_catalog(&CodeCatalog::builtin())
    }

    fn service<T: CodeTableCommand + 'static>(
        store: MemoryStore,
        tables: T,
        defaults: ModelCatalogue,
    ) -> ModelCatalogService<MemoryStore, T> {
        ModelCatalogService::new(Arc::new(store), Arc::new(tables), defaults)
    }

    #[rstest]
    #[tokio::test]
    async fn empty_store_lists_defaults(defaults: ModelCatalogue) {
        let service = service(MemoryStore::default(), FixtureCodeTableCommand, defaults);

        let list = service.list().await;

        let ids: Vec<&str> = list.models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["ICH-3000", "EP-7000"]);
        assert_eq!(list.selected, "ICH-3000");
    }

    #[rstest]
    #[tokio::test]
    async fn stored_state_is_restored(defaults: ModelCatalogue) {
        let store = MemoryStore::default();
        store.seed(
            keys::MODELS,
            r#"[{"id":"WP-100","label":"WP-100","productCode":"W10"},
                {"id":"EP-7000","label":"EP-7000","productCode":"E07"}]"#,
        );
        store.seed(keys::SELECTED_MODEL, "EP-7000");
        let service = service(store, FixtureCodeTableCommand, defaults);

        let list = service.list().await;

        assert_eq!(list.models.len(), 2);
        assert_eq!(list.selected, "EP-7000");
        assert!(service.find("ICH-3000").await.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn missing_selection_falls_back_to_first_model(defaults: ModelCatalogue) {
        let store = MemoryStore::default();
        store.seed(keys::SELECTED_MODEL, "GONE-1");
        let service = service(store, FixtureCodeTableCommand, defaults);

        assert_eq!(service.list().await.selected, "ICH-3000");
    }

    #[rstest]
    #[tokio::test]
    async fn add_persists_the_model_list(defaults: ModelCatalogue) {
        let store = Arc::new(MemoryStore::default());
        let service = ModelCatalogService::new(
            Arc::clone(&store),
            Arc::new(FixtureCodeTableCommand),
            defaults,
        );

        let added = service.add(" WP-100 ", "w10").await.expect("added");

        assert_eq!(added.value, ModelConfig::new("WP-100", "W10"));
        assert!(added.warning.is_none());
        let stored = store.doc(keys::MODELS).expect("model list stored");
        assert!(stored.contains("WP-100"));
    }

    #[rstest]
    #[case::blank_id("  ", "X01", ErrorCode::InvalidRequest, "required")]
    #[case::blank_code("WP-100", " ", ErrorCode::InvalidRequest, "required")]
    #[case::duplicate("ICH-3000", "C99", ErrorCode::Conflict, "duplicate_model")]
    #[tokio::test]
    async fn add_rejects_invalid_models(
        defaults: ModelCatalogue,
        #[case] id: &str,
        #[case] code: &str,
        #[case] expected: ErrorCode,
        #[case] detail: &str,
    ) {
        let service = service(MemoryStore::default(), FixtureCodeTableCommand, defaults);

        let err = service.add(id, code).await.expect_err("rejected");

        assert_eq!(err.code(), expected);
        assert_eq!(err.details().expect("details")["code"], detail);
        assert_eq!(service.list().await.models.len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn remove_purges_code_tables(defaults: ModelCatalogue) {
        let mut tables = MockCodeTableCommand::new();
        tables
            .expect_purge()
            .withf(|model_id| model_id == "EP-7000")
            .times(1)
            .returning(|_| Persisted::clean(()));
        let service = service(MemoryStore::default(), tables, defaults);

        let removed = service.remove("EP-7000").await.expect("removed");

        assert_eq!(removed.value.id, "EP-7000");
        assert!(service.find("EP-7000").await.is_none());
    }

    #[rstest]
    #[case::selected("ICH-3000", ErrorCode::InvalidRequest)]
    #[case::unknown("NOPE", ErrorCode::NotFound)]
    #[tokio::test]
    async fn remove_refuses_selected_or_unknown_models(
        defaults: ModelCatalogue,
        #[case] id: &str,
        #[case] expected: ErrorCode,
    ) {
        let mut tables = MockCodeTableCommand::new();
        tables.expect_purge().never();
        let service = service(MemoryStore::default(), tables, defaults);

        let err = service.remove(id).await.expect_err("refused");

        assert_eq!(err.code(), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn select_persists_and_refreshes(defaults: ModelCatalogue) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let tx = std::sync::Mutex::new(Some(tx));
        let mut tables = MockCodeTableCommand::new();
        tables.expect_refresh().returning(move |model_id| {
            if let Some(tx) = tx.lock().expect("sender lock").take() {
                let _ = tx.send(model_id.to_owned());
            }
            RefreshOutcome::Empty
        });
        let store = Arc::new(MemoryStore::default());
        let service = ModelCatalogService::new(Arc::clone(&store), Arc::new(tables), defaults);

        let selected = service.select("EP-7000").await.expect("selected");

        assert_eq!(selected.value.product_code, "E07");
        assert_eq!(service.list().await.selected, "EP-7000");
        assert_eq!(store.doc(keys::SELECTED_MODEL).as_deref(), Some("EP-7000"));
        assert_eq!(rx.await.expect("refresh started"), "EP-7000");
    }

    #[rstest]
    #[tokio::test]
    async fn select_unknown_model_is_not_found(defaults: ModelCatalogue) {
        let service = service(MemoryStore::default(), FixtureCodeTableCommand, defaults);

        let err = service.select("NOPE").await.expect_err("unknown");

        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(service.list().await.selected, "ICH-3000");
    }

    #[rstest]
    #[tokio::test]
    async fn save_failures_are_warnings(defaults: ModelCatalogue) {
        let service = service(MemoryStore::failing(), FixtureCodeTableCommand, defaults);

        let added = service.add("WP-100", "W10").await.expect("added");

        assert!(added.warning.is_some());
        assert!(service.find("WP-100").await.is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn concurrent_adds_store_every_model(defaults: ModelCatalogue) {
        let (store, GateHandle { started, release }) = GatedStore::new();
        let store = Arc::new(store);
        let service = ModelCatalogService::new(
            Arc::clone(&store),
            Arc::new(FixtureCodeTableCommand),
            defaults,
        );

        let (first, second, ()) = tokio::join!(
            service.add("WP-100", "W10"),
            async {
                started.await.expect("first write started");
                service.add("WP-200", "W20").await
            },
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let _ = release.send(());
            },
        );

        first.expect("first model added");
        second.expect("second model added");
        let raw = store.doc(keys::MODELS).expect("model list written");
        let stored: Vec<ModelConfig> = serde_json::from_str(&raw).expect("model list json");
        let ids: Vec<&str> = stored.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["ICH-3000", "EP-7000", "WP-100", "WP-200"]);
    }
}
