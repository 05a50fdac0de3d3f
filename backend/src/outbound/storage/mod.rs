//! Filesystem key-value store.
//!
//! Each key is one JSON document in a capability-scoped directory. Keys are
//! percent-encoded into flat file names (`remote/submissions` becomes
//! `remote%2Fsubmissions.json`), so no key can escape the directory.
//! Blocking filesystem calls run on the tokio blocking pool.

mod atomic;

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::debug;

use crate::domain::ports::{KeyValueStore, KeyValueStoreError};

const MAX_FILE_NAME: usize = 240;
const EXTENSION: &str = ".json";

/// Key-value store writing one file per key.
#[derive(Debug, Clone)]
pub struct FsKeyValueStore {
    dir: Arc<Dir>,
}

impl FsKeyValueStore {
    /// Wrap an already opened directory.
    pub fn new(dir: Dir) -> Self {
        Self { dir: Arc::new(dir) }
    }

    /// Open `path`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the directory cannot be created or opened.
    pub fn open(path: &Utf8Path) -> io::Result<Self> {
        std::fs::create_dir_all(path)?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self::new(dir))
    }

    async fn run<T, F>(&self, key: &str, op: F) -> Result<T, KeyValueStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir, &str) -> io::Result<T> + Send + 'static,
    {
        let file_name = file_name_for(key)?;
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || op(&dir, &file_name))
            .await
            .map_err(|err| KeyValueStoreError::io(key, err.to_string()))?
            .map_err(|err| KeyValueStoreError::io(key, err.to_string()))
    }
}

/// Percent-encode `key` into a file name.
fn file_name_for(key: &str) -> Result<String, KeyValueStoreError> {
    if key.trim().is_empty() {
        return Err(KeyValueStoreError::invalid_key(key));
    }
    let mut name = String::with_capacity(key.len() + EXTENSION.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' => name.push(char::from(byte)),
            _ => name.push_str(&format!("%{byte:02X}")),
        }
    }
    name.push_str(EXTENSION);
    if name.len() > MAX_FILE_NAME {
        return Err(KeyValueStoreError::invalid_key(key));
    }
    Ok(name)
}

#[async_trait]
impl KeyValueStore for FsKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        self.run(key, |dir, file_name| match dir.read_to_string(file_name) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        })
        .await
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        let value = value.to_owned();
        self.run(key, move |dir, file_name| {
            atomic::write_atomic(dir, file_name, &value)
        })
        .await?;
        debug!(key, "document stored");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KeyValueStoreError> {
        self.run(key, |dir, file_name| match dir.remove_file(file_name) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        })
        .await
    }
}
