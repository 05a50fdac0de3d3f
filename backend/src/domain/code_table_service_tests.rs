//! Tests for the code table registry.

use std::time::Duration;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    FixtureOptionRowRepository, MockOptionRowRepository, OptionRowRepositoryError,
};
use crate::domain::test_support::{Gate, GateHandle, GatedStore, MemoryStore};
use crate::domain::{CodeEntry, CodeTable};

struct GatedRemote {
    rows: Vec<OptionRow>,
    gate: Gate,
}

#[async_trait]
impl OptionRowRepository for GatedRemote {
    async fn list(&self, _model_id: &str) -> Result<Vec<OptionRow>, OptionRowRepositoryError> {
        self.gate.pass().await;
        Ok(self.rows.clone())
    }

    async fn replace(
        &self,
        _model_id: &str,
        _rows: Vec<OptionRow>,
    ) -> Result<(), OptionRowRepositoryError> {
        Ok(())
    }
}

fn remote_tables() -> OptionTables {
    let mut tables = OptionTables::default();
    tables.processes.insert("원격공정", "R");
    tables
}

#[fixture]
fn catalog() -> Arc<CodeCatalog> {
    Arc::new(CodeCatalog::builtin())
}

fn registry<O: OptionRowRepository>(
    store: MemoryStore,
    remote: O,
    catalog: Arc<CodeCatalog>,
) -> CodeTableRegistry<MemoryStore, O> {
    CodeTableRegistry::new(Arc::new(store), Arc::new(remote), catalog)
}

#[rstest]
#[tokio::test]
async fn unknown_models_start_from_first_catalogue_model(catalog: Arc<CodeCatalog>) {
    let registry = registry(MemoryStore::default(), FixtureOptionRowRepository, catalog);

    let tables = registry.tables("NEW-1").await;

    assert_eq!(tables.processes.code_for("공정검사"), Some("B"));
    assert_eq!(tables.workers.len(), 10);
}

#[rstest]
#[tokio::test]
async fn duplicate_names_are_ignored(catalog: Arc<CodeCatalog>) {
    let registry = registry(MemoryStore::default(), FixtureOptionRowRepository, catalog);

    let before = registry.tables("ICH-3000").await.parts.len();
    let outcome = registry
        .add_entry("ICH-3000", OptionTable::Parts, "필터", "999")
        .await;
    let after = registry.tables("ICH-3000").await;

    assert!(!outcome.value);
    assert_eq!(after.parts.len(), before);
    assert_eq!(after.parts.code_for("필터"), Some("701"));
}

#[rstest]
#[tokio::test]
async fn mutations_persist_and_reload(catalog: Arc<CodeCatalog>) {
    let store = Arc::new(MemoryStore::default());
    let first = CodeTableRegistry::new(
        Arc::clone(&store),
        Arc::new(FixtureOptionRowRepository),
        Arc::clone(&catalog),
    );

    let added = first
        .add_entry("EP-7000", OptionTable::Workers, "신입", "W099")
        .await;
    first
        .remove_entry("EP-7000", OptionTable::Processes, "고객")
        .await;
    let expected = first.tables("EP-7000").await;

    let second =
        CodeTableRegistry::new(store, Arc::new(FixtureOptionRowRepository), catalog);
    let reloaded = second.tables("EP-7000").await;

    assert!(added.value);
    assert!(added.warning.is_none());
    assert_eq!(reloaded, expected);
    assert_eq!(reloaded.workers.code_for("신입"), Some("W099"));
}

#[rstest]
#[tokio::test]
async fn local_write_failures_become_warnings(catalog: Arc<CodeCatalog>) {
    let registry = registry(MemoryStore::failing(), FixtureOptionRowRepository, catalog);

    let outcome = registry
        .add_entry("ICH-3000", OptionTable::Processes, "도장", "F")
        .await;

    assert!(outcome.value);
    let warning = outcome.warning.expect("warning");
    assert_eq!(warning.target, crate::domain::PersistenceTarget::Local);
    assert_eq!(
        registry.tables("ICH-3000").await.processes.code_for("도장"),
        Some("F")
    );
}

#[rstest]
#[tokio::test]
async fn remote_failures_become_warnings(catalog: Arc<CodeCatalog>) {
    let mut remote = MockOptionRowRepository::new();
    remote
        .expect_replace()
        .returning(|_, _| Err(OptionRowRepositoryError::connection("offline")));
    let registry = registry(MemoryStore::default(), remote, catalog);

    let outcome = registry
        .add_entry("ICH-3000", OptionTable::DefectCauses, "설계불량", "DC09")
        .await;

    assert!(outcome.value);
    let warning = outcome.warning.expect("warning");
    assert!(warning.message.contains("offline"));
}

#[rstest]
#[tokio::test]
async fn reset_restores_defaults_and_clears_snapshot(catalog: Arc<CodeCatalog>) {
    let store = Arc::new(MemoryStore::default());
    let registry = CodeTableRegistry::new(
        Arc::clone(&store),
        Arc::new(FixtureOptionRowRepository),
        catalog,
    );
    registry
        .add_entry("ICH-3000", OptionTable::Parts, "신규부품", "901")
        .await;
    assert!(store.doc(&keys::options("ICH-3000")).is_some());

    let reset = registry.reset_tables("ICH-3000").await;

    assert!(!reset.value.parts.contains("신규부품"));
    assert!(store.doc(&keys::options("ICH-3000")).is_none());
}

#[rstest]
#[tokio::test]
async fn defect_types_are_maintained_locally(catalog: Arc<CodeCatalog>) {
    let store = Arc::new(MemoryStore::default());
    let registry = CodeTableRegistry::new(
        Arc::clone(&store),
        Arc::new(FixtureOptionRowRepository),
        catalog,
    );

    registry.add_defect_type("ICH-3000", "5", "소음", "6").await;
    registry.remove_defect_type("ICH-3000", "5", "이물질").await;
    let names = registry.defect_types("ICH-3000").await.names_for("5");

    assert_eq!(names, vec!["누수", "체결불량", "작동불량", "소음"]);
    assert!(store.doc(&keys::defect_types("ICH-3000")).is_some());

    let reset = registry.reset_defect_types("ICH-3000").await;
    assert_eq!(reset.value.names_for("5"), vec!["누수", "이물질", "체결불량", "작동불량"]);
    assert!(store.doc(&keys::defect_types("ICH-3000")).is_none());
}

#[rstest]
#[tokio::test]
async fn refresh_applies_remote_rows_and_saves_snapshot(catalog: Arc<CodeCatalog>) {
    let rows = OptionRow::from_tables("ICH-3000", &remote_tables());
    let mut remote = MockOptionRowRepository::new();
    remote.expect_list().return_once(move |_| Ok(rows));
    let store = Arc::new(MemoryStore::default());
    let registry = CodeTableRegistry::new(Arc::clone(&store), Arc::new(remote), catalog);

    let outcome = registry.refresh("ICH-3000").await;

    assert_eq!(outcome, RefreshOutcome::Applied);
    assert_eq!(registry.tables("ICH-3000").await, remote_tables());
    assert!(store.doc(&keys::options("ICH-3000")).is_some());
}

#[rstest]
#[tokio::test]
async fn refresh_keeps_cache_on_empty_or_failed_remote(catalog: Arc<CodeCatalog>) {
    let mut remote = MockOptionRowRepository::new();
    let mut calls = 0;
    remote.expect_list().times(2).returning(move |_| {
        calls += 1;
        if calls == 1 {
            Ok(Vec::new())
        } else {
            Err(OptionRowRepositoryError::query("boom"))
        }
    });
    let registry = registry(MemoryStore::default(), remote, catalog);
    let before = registry.tables("ICH-3000").await;

    assert_eq!(registry.refresh("ICH-3000").await, RefreshOutcome::Empty);
    assert!(matches!(
        registry.refresh("ICH-3000").await,
        RefreshOutcome::Failed(_)
    ));
    assert_eq!(registry.tables("ICH-3000").await, before);
}

#[rstest]
#[tokio::test]
async fn refresh_discards_response_after_local_mutation(catalog: Arc<CodeCatalog>) {
    let (gate, handle) = Gate::new();
    let remote = GatedRemote {
        rows: OptionRow::from_tables("ICH-3000", &remote_tables()),
        gate,
    };
    let registry = Arc::new(registry(MemoryStore::default(), remote, catalog));

    let refreshing = tokio::spawn({
        let registry = Arc::clone(&registry);
        async move { registry.refresh("ICH-3000").await }
    });
    handle.started.await.expect("refresh started");
    registry
        .add_entry("ICH-3000", OptionTable::Processes, "도장", "F")
        .await;
    handle.release.send(()).expect("release refresh");

    let outcome = refreshing.await.expect("refresh task");

    assert_eq!(outcome, RefreshOutcome::Stale);
    let tables = registry.tables("ICH-3000").await;
    assert_eq!(tables.processes.code_for("도장"), Some("F"));
    assert!(!tables.processes.contains("원격공정"));
}

#[rstest]
#[tokio::test]
async fn refresh_for_purged_model_is_stale(catalog: Arc<CodeCatalog>) {
    let (gate, handle) = Gate::new();
    let remote = GatedRemote {
        rows: OptionRow::from_tables("EP-7000", &remote_tables()),
        gate,
    };
    let registry = Arc::new(registry(MemoryStore::default(), remote, catalog));

    let refreshing = tokio::spawn({
        let registry = Arc::clone(&registry);
        async move { registry.refresh("EP-7000").await }
    });
    handle.started.await.expect("refresh started");
    registry.purge("EP-7000").await;
    handle.release.send(()).expect("release refresh");

    assert_eq!(refreshing.await.expect("refresh task"), RefreshOutcome::Stale);
    assert!(!registry.tables("EP-7000").await.processes.contains("원격공정"));
}

#[rstest]
#[tokio::test]
async fn local_snapshot_wins_over_defaults(catalog: Arc<CodeCatalog>) {
    let store = MemoryStore::default();
    let snapshot = OptionTables {
        processes: CodeTable::from_entries([CodeEntry::new("단일공정", "Z")]),
        ..OptionTables::default()
    };
    store.seed(
        &keys::options("ICH-3000"),
        &serde_json::to_string(&snapshot).expect("serialise"),
    );
    let registry = registry(store, FixtureOptionRowRepository, catalog);

    let book = registry.codebook("ICH-3000").await;

    assert_eq!(book.tables, snapshot);
    assert!(!book.defect_types.as_map().is_empty());
}

#[rstest]
#[tokio::test]
async fn concurrent_edits_store_the_newest_snapshot(catalog: Arc<CodeCatalog>) {
    let (store, GateHandle { started, release }) = GatedStore::new();
    let store = Arc::new(store);
    let registry = CodeTableRegistry::new(
        Arc::clone(&store),
        Arc::new(FixtureOptionRowRepository),
        catalog,
    );

    let (first, second, ()) = tokio::join!(
        registry.add_entry("ICH-3000", OptionTable::Parts, "시험부품A", "801"),
        async {
            started.await.expect("first write started");
            registry
                .add_entry("ICH-3000", OptionTable::Parts, "시험부품B", "802")
                .await
        },
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = release.send(());
        },
    );

    assert!(first.value && second.value);
    let raw = store.doc(&keys::options("ICH-3000")).expect("snapshot written");
    let stored: OptionTables = serde_json::from_str(&raw).expect("snapshot json");
    assert_eq!(stored.parts.code_for("시험부품A"), Some("801"));
    assert_eq!(stored.parts.code_for("시험부품B"), Some("802"));
}

#[rstest]
#[tokio::test]
async fn unreadable_snapshot_falls_back_to_defaults(catalog: Arc<CodeCatalog>) {
    let store = MemoryStore::default();
    store.seed(&keys::options("ICH-3000"), "{\"processes\": [");
    let registry = registry(store, FixtureOptionRowRepository, catalog);

    let tables = registry.tables("ICH-3000").await;

    assert_eq!(tables.parts.code_for("필터"), Some("701"));
}
