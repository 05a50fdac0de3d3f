//! Builders wiring storage adapters into the domain services.

use std::sync::Arc;

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use code_catalog::CodeCatalog;
use mockable::{Clock, DefaultClock};
use tracing::info;

use quality_backend::domain::ports::{
    CodeTableCommand, KeyValueStore, OptionRowRepository, SubmissionCommand,
    SubmissionRepository,
};
use quality_backend::domain::{
    CodeTableRegistry, ModelCatalogService, ModelCatalogue, RefreshOutcome, SubmissionService,
};
use quality_backend::inbound::http::state::HttpState;
use quality_backend::outbound::memory::{
    InMemoryKeyValueStore, InMemoryOptionRows, InMemorySubmissions,
};
use quality_backend::outbound::remote::{KvOptionRowRepository, KvSubmissionRepository};
use quality_backend::outbound::storage::FsKeyValueStore;

use super::ServerSettings;

/// Load the configured catalogue, or the built-in one.
///
/// # Errors
///
/// Returns an I/O error when the configured file cannot be read or parsed.
pub fn load_catalog(settings: &ServerSettings) -> std::io::Result<CodeCatalog> {
    let Some(path) = settings.catalog_path() else {
        return Ok(CodeCatalog::builtin());
    };
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| camino::Utf8Path::new("."));
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("catalogue path '{path}' has no file name"),
        )
    })?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    let catalog = CodeCatalog::from_file(&dir, camino::Utf8Path::new(file_name))
        .map_err(|err| std::io::Error::other(format!("catalogue '{path}': {err}")))?;
    info!(path = %path, models = catalog.models().len(), "loaded code catalogue");
    Ok(catalog)
}

/// Services sharing one store, plus the state handed to handlers.
pub struct AppServices {
    pub http_state: HttpState,
    pub tables: Arc<dyn CodeTableCommand>,
    pub submissions: Arc<dyn SubmissionCommand>,
}

/// Build every service on top of one local store and two remote repositories.
pub fn build_services<K, O, S>(
    store: Arc<K>,
    option_rows: Arc<O>,
    remote_submissions: Arc<S>,
    catalog: Arc<CodeCatalog>,
    clock: Arc<dyn Clock>,
) -> AppServices
where
    K: KeyValueStore + 'static,
    O: OptionRowRepository + 'static,
    S: SubmissionRepository + 'static,
{
    let defaults = ModelCatalogue::from_catalog(&catalog);

    let registry = Arc::new(CodeTableRegistry::new(
        Arc::clone(&store),
        option_rows,
        catalog,
    ));
    let submissions = Arc::new(SubmissionService::new(
        Arc::clone(&store),
        remote_submissions,
        Arc::clone(&registry),
        Arc::clone(&clock),
    ));
    let models = Arc::new(ModelCatalogService::new(
        store,
        Arc::clone(&registry),
        defaults,
    ));

    AppServices {
        http_state: HttpState {
            models,
            tables: registry.clone(),
            tables_query: registry.clone(),
            submissions: submissions.clone(),
            submissions_query: submissions.clone(),
            clock,
        },
        tables: registry,
        submissions,
    }
}

/// Open the data directory and build the services.
///
/// # Errors
///
/// Returns an I/O error when the data directory or catalogue is unusable.
pub fn build_app_services(settings: &ServerSettings) -> std::io::Result<AppServices> {
    let catalog = Arc::new(load_catalog(settings)?);
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    if settings.ephemeral {
        info!("using in-memory storage; nothing survives a restart");
        return Ok(build_services(
            Arc::new(InMemoryKeyValueStore::new()),
            Arc::new(InMemoryOptionRows::default()),
            Arc::new(InMemorySubmissions::default()),
            catalog,
            clock,
        ));
    }

    let store = Arc::new(FsKeyValueStore::open(settings.data_dir())?);
    info!(data_dir = %settings.data_dir(), "opened key-value store");
    let option_rows = Arc::new(KvOptionRowRepository::new(Arc::clone(&store)));
    let remote_submissions = Arc::new(KvSubmissionRepository::new(Arc::clone(&store)));
    Ok(build_services(
        store,
        option_rows,
        remote_submissions,
        catalog,
        clock,
    ))
}

/// Reconcile the selected model's tables and the submission pool once.
pub async fn initial_refresh(services: &AppServices) {
    let selected = services.http_state.models.list().await.selected;
    let tables = services.tables.refresh(&selected).await;
    let submissions = services.submissions.refresh().await;
    log_outcome("code tables", &tables);
    log_outcome("submissions", &submissions);
}

fn log_outcome(what: &str, outcome: &RefreshOutcome) {
    match outcome {
        RefreshOutcome::Failed(warning) => {
            tracing::warn!(what, message = %warning.message, "startup refresh failed; serving cached data");
        }
        other => info!(what, outcome = ?other, "startup refresh finished"),
    }
}
