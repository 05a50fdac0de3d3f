//! Submission pool service.
//!
//! The pool is mirrored to the local store after every mutation and
//! reconciled with the remote submission table by
//! [`SubmissionCommand::refresh`]. Remote or local write failures never undo
//! an accepted submission; they come back as warnings.
//!
//! Mirror records that no longer parse are carried along and written back
//! unchanged. A mirror document that cannot be read at all is never
//! overwritten. Mirror writes are serialised so the stored document always
//! matches the newest pool state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use mockable::Clock;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::ports::{
    CodeTableQuery, KeyValueStore, KeyValueStoreError, SubmissionCommand, SubmissionQuery,
    SubmissionRepository, SubmissionRepositoryError, SubmissionRow, get_json, put_json,
};
use crate::domain::{
    DailySummary, DateRange, Error, Persisted, PersistenceWarning, RefreshOutcome, StatFilters,
    SubmissionDraft, SubmissionStats, SubmissionValidationError, WorkerSubmission, aggregate,
    keys,
};

#[derive(Debug, Default)]
struct Pool {
    submissions: Vec<WorkerSubmission>,
    generation: u64,
    loaded: bool,
    mirror: Mirror,
}

/// Local mirror state found at load time.
#[derive(Debug, Clone, Default)]
enum Mirror {
    /// Every stored record parsed.
    #[default]
    Writable,
    /// Writable; the values are records that did not parse.
    Kept(Vec<Value>),
    /// The document could not be read and must not be replaced.
    Unreadable,
}

struct LoadedMirror {
    submissions: Vec<WorkerSubmission>,
    mirror: Mirror,
}

/// Worker submissions with local mirroring and remote persistence.
pub struct SubmissionService<K, R, Q> {
    store: Arc<K>,
    remote: Arc<R>,
    tables: Arc<Q>,
    clock: Arc<dyn Clock>,
    pool: RwLock<Pool>,
    generations: AtomicU64,
    persist: Mutex<()>,
}

impl<K, R, Q> SubmissionService<K, R, Q> {
    /// Create a service; the pool loads lazily on first use.
    pub fn new(store: Arc<K>, remote: Arc<R>, tables: Arc<Q>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            remote,
            tables,
            clock,
            pool: RwLock::new(Pool::default()),
            generations: AtomicU64::new(0),
            persist: Mutex::new(()),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn read_pool(&self) -> RwLockReadGuard<'_, Pool> {
        self.pool.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_pool(&self) -> RwLockWriteGuard<'_, Pool> {
        self.pool.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validation_error(err: &SubmissionValidationError) -> Error {
    let mut details = json!({ "field": err.field(), "code": err.code() });
    if let SubmissionValidationError::IncompleteDefects { count } = err {
        details["count"] = json!(count);
    }
    Error::invalid_request(err.to_string()).with_details(details)
}

fn newest_first(submissions: &mut [WorkerSubmission]) {
    submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

impl<K, R, Q> SubmissionService<K, R, Q>
where
    K: KeyValueStore,
    R: SubmissionRepository,
    Q: CodeTableQuery,
{
    async fn read_mirror(&self) -> LoadedMirror {
        let records = match get_json::<_, Vec<Value>>(&*self.store, keys::SUBMISSIONS).await {
            Ok(found) => found.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "local submission mirror unreadable; it will not be overwritten");
                return LoadedMirror {
                    submissions: Vec::new(),
                    mirror: Mirror::Unreadable,
                };
            }
        };
        let mut submissions = Vec::with_capacity(records.len());
        let mut kept = Vec::new();
        for record in records {
            match WorkerSubmission::deserialize(&record) {
                Ok(submission) => submissions.push(submission),
                Err(err) => {
                    warn!(error = %err, "keeping unreadable submission record in the local mirror");
                    kept.push(record);
                }
            }
        }
        newest_first(&mut submissions);
        let mirror = if kept.is_empty() {
            Mirror::Writable
        } else {
            Mirror::Kept(kept)
        };
        LoadedMirror {
            submissions,
            mirror,
        }
    }

    async fn ensure_loaded(&self) {
        if self.read_pool().loaded {
            return;
        }
        let loaded = self.read_mirror().await;

        let generation = self.next_generation();
        let mut pool = self.write_pool();
        if !pool.loaded {
            debug!(count = loaded.submissions.len(), "submission pool loaded from local mirror");
            pool.submissions = loaded.submissions;
            pool.mirror = loaded.mirror;
            pool.generation = generation;
            pool.loaded = true;
        }
    }

    /// Write `submissions` to the local mirror. Callers hold `persist`.
    async fn save_local(&self, submissions: &[WorkerSubmission]) -> Option<PersistenceWarning> {
        let kept = match self.read_pool().mirror.clone() {
            Mirror::Writable => Vec::new(),
            Mirror::Kept(kept) => kept,
            Mirror::Unreadable => {
                warn!("local submission mirror left untouched; it could not be read at startup");
                return Some(PersistenceWarning::local(
                    "local submission mirror is unreadable and was not overwritten",
                ));
            }
        };
        let records = submissions
            .iter()
            .map(serde_json::to_value)
            .chain(kept.into_iter().map(Ok))
            .collect::<Result<Vec<Value>, _>>();
        let result = match records {
            Ok(records) => put_json(&*self.store, keys::SUBMISSIONS, &records).await,
            Err(err) => Err(KeyValueStoreError::corrupt(keys::SUBMISSIONS, err.to_string())),
        };
        result.err().map(|err| {
            warn!(error = %err, "failed to mirror submissions locally");
            PersistenceWarning::local(err.to_string())
        })
    }

    fn snapshot(&self) -> Vec<WorkerSubmission> {
        self.read_pool().submissions.clone()
    }
}

#[async_trait]
impl<K, R, Q> SubmissionCommand for SubmissionService<K, R, Q>
where
    K: KeyValueStore,
    R: SubmissionRepository,
    Q: CodeTableQuery,
{
    async fn add(&self, draft: SubmissionDraft) -> Result<Persisted<WorkerSubmission>, Error> {
        self.ensure_loaded().await;
        let workers = self.tables.tables(draft.model.trim()).await.workers;
        let valid = draft
            .validate(&workers, self.clock.local().time())
            .map_err(|err| {
                warn!(field = err.field(), code = err.code(), "submission rejected");
                validation_error(&err)
            })?;
        let submission = WorkerSubmission::record(valid, Uuid::new_v4(), self.clock.utc());

        let persist = self.persist.lock().await;
        let snapshot = {
            let generation = self.next_generation();
            let mut pool = self.write_pool();
            pool.submissions.insert(0, submission.clone());
            pool.generation = generation;
            pool.submissions.clone()
        };
        info!(
            id = %submission.id,
            model_id = %submission.model,
            worker = %submission.worker_name,
            defects = submission.defect_total(),
            "submission recorded"
        );

        let local = self.save_local(&snapshot).await;
        drop(persist);
        let remote = self
            .remote
            .insert(SubmissionRow::from(&submission))
            .await
            .err()
            .map(|err| {
                warn!(id = %submission.id, error = %err, "failed to store submission remotely");
                PersistenceWarning::remote(err.to_string())
            });
        Ok(Persisted::with_warning(submission, local.or(remote)))
    }

    async fn delete(&self, id: Uuid) -> Result<Persisted<WorkerSubmission>, Error> {
        self.ensure_loaded().await;
        let persist = self.persist.lock().await;
        let (removed, snapshot) = {
            let generation = self.next_generation();
            let mut pool = self.write_pool();
            let Some(index) = pool.submissions.iter().position(|s| s.id == id) else {
                return Err(Error::not_found(format!("submission {id} not found")));
            };
            let removed = pool.submissions.remove(index);
            pool.generation = generation;
            (removed, pool.submissions.clone())
        };
        info!(%id, "submission deleted");

        let local = self.save_local(&snapshot).await;
        drop(persist);
        let remote = match self.remote.delete(id).await {
            Ok(()) | Err(SubmissionRepositoryError::NotFound { .. }) => None,
            Err(err) => {
                warn!(%id, error = %err, "failed to delete submission remotely");
                Some(PersistenceWarning::remote(err.to_string()))
            }
        };
        Ok(Persisted::with_warning(removed, local.or(remote)))
    }

    async fn refresh(&self) -> RefreshOutcome {
        self.ensure_loaded().await;
        let observed = self.read_pool().generation;

        let rows = match self.remote.list_all().await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(error = %err, "remote submissions unavailable; keeping cache");
                return RefreshOutcome::Failed(PersistenceWarning::remote(err.to_string()));
            }
        };
        if rows.is_empty() {
            debug!("remote holds no submissions");
            return RefreshOutcome::Empty;
        }
        let mut fetched: Vec<WorkerSubmission> = rows
            .into_iter()
            .filter_map(|row| {
                WorkerSubmission::try_from(row)
                    .inspect_err(|err| warn!(error = %err, "skipping unreadable submission row"))
                    .ok()
            })
            .collect();
        newest_first(&mut fetched);

        let _persist = self.persist.lock().await;
        {
            let generation = self.next_generation();
            let mut pool = self.write_pool();
            if pool.generation != observed {
                debug!("discarding stale submission refresh");
                return RefreshOutcome::Stale;
            }
            pool.submissions.clone_from(&fetched);
            pool.generation = generation;
        }

        info!(count = fetched.len(), "submissions refreshed from remote");
        self.save_local(&fetched).await;
        RefreshOutcome::Applied
    }
}

#[async_trait]
impl<K, R, Q> SubmissionQuery for SubmissionService<K, R, Q>
where
    K: KeyValueStore,
    R: SubmissionRepository,
    Q: CodeTableQuery,
{
    async fn list(&self, model_id: Option<String>) -> Vec<WorkerSubmission> {
        self.ensure_loaded().await;
        let mut submissions = self.snapshot();
        if let Some(model_id) = model_id.filter(|id| !id.is_empty()) {
            submissions.retain(|s| s.model == model_id);
        }
        submissions
    }

    async fn stats(
        &self,
        model_id: &str,
        range: DateRange,
        filters: StatFilters,
    ) -> SubmissionStats {
        self.ensure_loaded().await;
        aggregate(&self.read_pool().submissions, model_id, &range, &filters)
    }

    async fn daily_summary(&self, model_id: &str, date: NaiveDate) -> DailySummary {
        self.ensure_loaded().await;
        DailySummary::compute(&self.read_pool().submissions, model_id, date)
    }
}

#[cfg(test)]
#[path = "submission_service_tests.rs"]
mod tests;
