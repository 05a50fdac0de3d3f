//! Test doubles shared by the domain service tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use tokio::sync::oneshot;

use crate::domain::ports::{KeyValueStore, KeyValueStoreError};

/// Key-value store backed by a map, optionally refusing writes.
#[derive(Default)]
pub(crate) struct MemoryStore {
    docs: Mutex<HashMap<String, String>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub(crate) fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub(crate) fn doc(&self, key: &str) -> Option<String> {
        self.docs.lock().expect("docs lock").get(key).cloned()
    }

    pub(crate) fn seed(&self, key: &str, value: &str) {
        self.docs
            .lock()
            .expect("docs lock")
            .insert(key.to_owned(), value.to_owned());
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        Ok(self.doc(key))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        if self.fail_writes {
            return Err(KeyValueStoreError::io(key, "read-only"));
        }
        self.seed(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KeyValueStoreError> {
        self.docs.lock().expect("docs lock").remove(key);
        Ok(())
    }
}

struct FixedClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 9, 15, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub(crate) fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock {
        utc_now: fixed_now(),
    })
}

/// Holds a remote call open until the test releases it.
pub(crate) struct Gate {
    started: Mutex<Option<oneshot::Sender<()>>>,
    release: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
}

/// Test-side handle of a [`Gate`].
pub(crate) struct GateHandle {
    pub(crate) started: oneshot::Receiver<()>,
    pub(crate) release: oneshot::Sender<()>,
}

impl Gate {
    pub(crate) fn new() -> (Self, GateHandle) {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let gate = Self {
            started: Mutex::new(Some(started_tx)),
            release: tokio::sync::Mutex::new(Some(release_rx)),
        };
        let handle = GateHandle {
            started: started_rx,
            release: release_tx,
        };
        (gate, handle)
    }

    /// Signal the test, then wait for release. Only the first call blocks.
    pub(crate) async fn pass(&self) {
        if let Some(started) = self.started.lock().expect("started lock").take() {
            let _ = started.send(());
        }
        if let Some(release) = self.release.lock().await.take() {
            let _ = release.await;
        }
    }
}

/// Store whose first write waits on a [`Gate`] before reaching the map.
pub(crate) struct GatedStore {
    inner: MemoryStore,
    gate: Gate,
}

impl GatedStore {
    pub(crate) fn new() -> (Self, GateHandle) {
        let (gate, handle) = Gate::new();
        let store = Self {
            inner: MemoryStore::default(),
            gate,
        };
        (store, handle)
    }

    pub(crate) fn doc(&self, key: &str) -> Option<String> {
        self.inner.doc(key)
    }
}

#[async_trait]
impl KeyValueStore for GatedStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        self.gate.pass().await;
        self.inner.put(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), KeyValueStoreError> {
        self.inner.remove(key).await
    }
}
