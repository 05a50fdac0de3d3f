//! Code table registry service.
//!
//! Holds one slot per model with its four tables and its defect-type map.
//! Slots are loaded lazily from the local store (falling back to the
//! built-in catalogue) and reconciled with the remote data service through
//! [`CodeTableCommand::refresh`].
//!
//! Every slot carries a generation number drawn from a process-wide counter.
//! Mutations, resets and applied refreshes assign a new generation; a refresh
//! only applies its response when the slot still has the generation it
//! observed before fetching, so a slow response can never overwrite newer
//! state or leak into another model's slot.
//!
//! Commands hold a persistence lock from the slot change until their writes
//! finish, so stored snapshots land in the order the slots changed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use async_trait::async_trait;
use code_catalog::CodeCatalog;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    CodeTableCommand, CodeTableQuery, KeyValueStore, OptionRow, OptionRowRepository, get_json,
    put_json,
};
use crate::domain::{
    CodeBook, DefectTypes, OptionTable, OptionTables, Persisted, PersistenceWarning,
    RefreshOutcome, keys,
};

#[derive(Debug, Clone)]
struct Slot {
    tables: OptionTables,
    defect_types: DefectTypes,
    generation: u64,
}

/// Per-model code tables with local and remote persistence.
pub struct CodeTableRegistry<K, O> {
    store: Arc<K>,
    remote: Arc<O>,
    catalog: Arc<CodeCatalog>,
    slots: RwLock<HashMap<String, Slot>>,
    generations: AtomicU64,
    persist: Mutex<()>,
}

impl<K, O> CodeTableRegistry<K, O> {
    /// Create a registry seeded from `catalog` defaults.
    pub fn new(store: Arc<K>, remote: Arc<O>, catalog: Arc<CodeCatalog>) -> Self {
        Self {
            store,
            remote,
            catalog,
            slots: RwLock::new(HashMap::new()),
            generations: AtomicU64::new(0),
            persist: Mutex::new(()),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn write_slots(&self) -> RwLockWriteGuard<'_, HashMap<String, Slot>> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached(&self, model_id: &str) -> Option<Slot> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(model_id)
            .cloned()
    }

    fn default_tables(&self, model_id: &str) -> OptionTables {
        OptionTables::from_defaults(self.catalog.defaults_for(model_id))
    }

    fn default_defect_types(&self, model_id: &str) -> DefectTypes {
        DefectTypes::from(self.catalog.defaults_for(model_id).defect_types())
    }
}

impl<K, O> CodeTableRegistry<K, O>
where
    K: KeyValueStore,
    O: OptionRowRepository,
{
    async fn load_slot(&self, model_id: &str) -> Slot {
        if let Some(slot) = self.cached(model_id) {
            return slot;
        }

        let tables = match get_json::<_, OptionTables>(&*self.store, &keys::options(model_id)).await
        {
            Ok(Some(tables)) => tables,
            Ok(None) => self.default_tables(model_id),
            Err(err) => {
                warn!(
                    model_id,
                    error = %err,
                    "local option snapshot unreadable; using defaults until the next change replaces it"
                );
                self.default_tables(model_id)
            }
        };
        let defect_types =
            match get_json::<_, DefectTypes>(&*self.store, &keys::defect_types(model_id)).await {
                Ok(Some(types)) => types,
                Ok(None) => self.default_defect_types(model_id),
                Err(err) => {
                    warn!(
                        model_id,
                        error = %err,
                        "local defect types unreadable; using defaults until the next change replaces them"
                    );
                    self.default_defect_types(model_id)
                }
            };

        let generation = self.next_generation();
        let mut slots = self.write_slots();
        slots
            .entry(model_id.to_owned())
            .or_insert(Slot {
                tables,
                defect_types,
                generation,
            })
            .clone()
    }

    /// Apply `change` to a loaded slot. When it reports a change, the slot
    /// receives a new generation and the updated slot is returned.
    async fn mutate<T>(
        &self,
        model_id: &str,
        change: impl FnOnce(&mut Slot) -> (bool, T),
    ) -> (T, Option<Slot>) {
        self.load_slot(model_id).await;
        let generation = self.next_generation();
        let mut slots = self.write_slots();
        let slot = slots.entry(model_id.to_owned()).or_insert_with(|| Slot {
            tables: self.default_tables(model_id),
            defect_types: self.default_defect_types(model_id),
            generation,
        });
        let (changed, value) = change(slot);
        if !changed {
            return (value, None);
        }
        slot.generation = generation;
        (value, Some(slot.clone()))
    }

    async fn save_tables(&self, model_id: &str, tables: &OptionTables) -> Option<PersistenceWarning> {
        let local = put_json(&*self.store, &keys::options(model_id), tables)
            .await
            .err()
            .map(|err| {
                warn!(model_id, error = %err, "failed to save option snapshot locally");
                PersistenceWarning::local(err.to_string())
            });
        let rows = OptionRow::from_tables(model_id, tables);
        let remote = self
            .remote
            .replace(model_id, rows)
            .await
            .err()
            .map(|err| {
                warn!(model_id, error = %err, "failed to replace remote option rows");
                PersistenceWarning::remote(err.to_string())
            });
        local.or(remote)
    }

    async fn save_defect_types(
        &self,
        model_id: &str,
        defect_types: &DefectTypes,
    ) -> Option<PersistenceWarning> {
        put_json(&*self.store, &keys::defect_types(model_id), defect_types)
            .await
            .err()
            .map(|err| {
                warn!(model_id, error = %err, "failed to save defect types locally");
                PersistenceWarning::local(err.to_string())
            })
    }

    async fn clear_key(&self, model_id: &str, key: &str) -> Option<PersistenceWarning> {
        self.store.remove(key).await.err().map(|err| {
            warn!(model_id, key, error = %err, "failed to clear stored override");
            PersistenceWarning::local(err.to_string())
        })
    }
}

#[async_trait]
impl<K, O> CodeTableCommand for CodeTableRegistry<K, O>
where
    K: KeyValueStore,
    O: OptionRowRepository,
{
    async fn add_entry(
        &self,
        model_id: &str,
        table: OptionTable,
        name: &str,
        code: &str,
    ) -> Persisted<bool> {
        let _persist = self.persist.lock().await;
        let (inserted, slot) = self
            .mutate(model_id, |slot| {
                let inserted = slot.tables.table_mut(table).insert(name, code);
                (inserted, inserted)
            })
            .await;
        let Some(slot) = slot else {
            debug!(model_id, %table, name, "option entry ignored");
            return Persisted::clean(false);
        };
        info!(model_id, %table, name, "option entry added");
        Persisted::with_warning(inserted, self.save_tables(model_id, &slot.tables).await)
    }

    async fn remove_entry(
        &self,
        model_id: &str,
        table: OptionTable,
        name: &str,
    ) -> Persisted<bool> {
        let _persist = self.persist.lock().await;
        let (removed, slot) = self
            .mutate(model_id, |slot| {
                let removed = slot.tables.table_mut(table).remove(name);
                (removed, removed)
            })
            .await;
        let Some(slot) = slot else {
            return Persisted::clean(false);
        };
        info!(model_id, %table, name, "option entry removed");
        Persisted::with_warning(removed, self.save_tables(model_id, &slot.tables).await)
    }

    async fn reset_tables(&self, model_id: &str) -> Persisted<OptionTables> {
        let _persist = self.persist.lock().await;
        let defaults = self.default_tables(model_id);
        let (tables, _) = self
            .mutate(model_id, |slot| {
                slot.tables = defaults.clone();
                (true, defaults)
            })
            .await;
        info!(model_id, "option tables reset to defaults");
        let local = self.clear_key(model_id, &keys::options(model_id)).await;
        let remote = self
            .remote
            .replace(model_id, OptionRow::from_tables(model_id, &tables))
            .await
            .err()
            .map(|err| {
                warn!(model_id, error = %err, "failed to reset remote option rows");
                PersistenceWarning::remote(err.to_string())
            });
        Persisted::with_warning(tables, local.or(remote))
    }

    async fn add_defect_type(
        &self,
        model_id: &str,
        category: &str,
        name: &str,
        digit: &str,
    ) -> Persisted<bool> {
        let _persist = self.persist.lock().await;
        let (inserted, slot) = self
            .mutate(model_id, |slot| {
                let inserted = slot.defect_types.upsert(category, name, digit);
                (inserted, inserted)
            })
            .await;
        let Some(slot) = slot else {
            return Persisted::clean(false);
        };
        info!(model_id, category, name, digit, "defect type saved");
        Persisted::with_warning(
            inserted,
            self.save_defect_types(model_id, &slot.defect_types).await,
        )
    }

    async fn remove_defect_type(
        &self,
        model_id: &str,
        category: &str,
        name: &str,
    ) -> Persisted<bool> {
        let _persist = self.persist.lock().await;
        let (removed, slot) = self
            .mutate(model_id, |slot| {
                let removed = slot.defect_types.remove(category, name);
                (removed, removed)
            })
            .await;
        let Some(slot) = slot else {
            return Persisted::clean(false);
        };
        info!(model_id, category, name, "defect type removed");
        Persisted::with_warning(
            removed,
            self.save_defect_types(model_id, &slot.defect_types).await,
        )
    }

    async fn reset_defect_types(&self, model_id: &str) -> Persisted<DefectTypes> {
        let _persist = self.persist.lock().await;
        let defaults = self.default_defect_types(model_id);
        let (types, _) = self
            .mutate(model_id, |slot| {
                slot.defect_types = defaults.clone();
                (true, defaults)
            })
            .await;
        info!(model_id, "defect types reset to defaults");
        let warning = self
            .clear_key(model_id, &keys::defect_types(model_id))
            .await;
        Persisted::with_warning(types, warning)
    }

    async fn refresh(&self, model_id: &str) -> RefreshOutcome {
        let observed = self.load_slot(model_id).await.generation;

        let rows = match self.remote.list(model_id).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(model_id, error = %err, "remote option rows unavailable; keeping cache");
                return RefreshOutcome::Failed(PersistenceWarning::remote(err.to_string()));
            }
        };
        if rows.is_empty() {
            debug!(model_id, "remote holds no option rows");
            return RefreshOutcome::Empty;
        }
        let tables = OptionRow::into_tables(rows);

        let _persist = self.persist.lock().await;
        {
            let generation = self.next_generation();
            let mut slots = self.write_slots();
            let Some(slot) = slots.get_mut(model_id).filter(|s| s.generation == observed) else {
                debug!(model_id, "discarding stale option refresh");
                return RefreshOutcome::Stale;
            };
            slot.tables = tables.clone();
            slot.generation = generation;
        }

        info!(model_id, "option tables refreshed from remote");
        if let Err(err) = put_json(&*self.store, &keys::options(model_id), &tables).await {
            warn!(model_id, error = %err, "failed to save refreshed option snapshot");
        }
        RefreshOutcome::Applied
    }

    async fn purge(&self, model_id: &str) -> Persisted<()> {
        let _persist = self.persist.lock().await;
        self.write_slots().remove(model_id);
        let options = self.clear_key(model_id, &keys::options(model_id)).await;
        let types = self
            .clear_key(model_id, &keys::defect_types(model_id))
            .await;
        let remote = self
            .remote
            .replace(model_id, Vec::new())
            .await
            .err()
            .map(|err| {
                warn!(model_id, error = %err, "failed to purge remote option rows");
                PersistenceWarning::remote(err.to_string())
            });
        info!(model_id, "model code tables purged");
        Persisted::with_warning((), options.or(types).or(remote))
    }
}

#[async_trait]
impl<K, O> CodeTableQuery for CodeTableRegistry<K, O>
where
    K: KeyValueStore,
    O: OptionRowRepository,
{
    async fn codebook(&self, model_id: &str) -> CodeBook {
        let slot = self.load_slot(model_id).await;
        CodeBook::new(slot.tables, slot.defect_types)
    }

    async fn tables(&self, model_id: &str) -> OptionTables {
        self.load_slot(model_id).await.tables
    }

    async fn defect_types(&self, model_id: &str) -> DefectTypes {
        self.load_slot(model_id).await.defect_types
    }
}

#[cfg(test)]
#[path = "code_table_service_tests.rs"]
mod tests;
