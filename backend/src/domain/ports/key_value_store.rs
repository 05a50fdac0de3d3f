//! Port for the local key-value persistence collaborator.
//!
//! Values are JSON documents stored under string keys. Adapters decide the
//! medium (files, memory); services only see whole documents.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::define_port_error;

define_port_error! {
    /// Errors raised by key-value store adapters.
    pub enum KeyValueStoreError {
        /// The key cannot be mapped onto the storage medium.
        InvalidKey { key: String } => "invalid storage key '{key}'",
        /// Reading or writing the medium failed.
        Io { key: String, message: String } =>
            "key-value store failed for '{key}': {message}",
        /// A stored document could not be decoded or encoded.
        Corrupt { key: String, message: String } =>
            "stored document '{key}' is not valid: {message}",
    }
}

/// Local key-value persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the raw document stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError>;

    /// Store `value` under `key`, replacing any previous document.
    async fn put(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError>;

    /// Delete `key`. Deleting a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), KeyValueStoreError>;
}

/// Fetch and decode the JSON document stored under `key`.
///
/// # Errors
///
/// Propagates adapter failures and reports undecodable documents as
/// [`KeyValueStoreError::Corrupt`].
pub async fn get_json<S, T>(store: &S, key: &str) -> Result<Option<T>, KeyValueStoreError>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| KeyValueStoreError::corrupt(key, err.to_string()))
}

/// Encode `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Propagates adapter failures.
pub async fn put_json<S, T>(store: &S, key: &str, value: &T) -> Result<(), KeyValueStoreError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + Sync + ?Sized,
{
    let raw = serde_json::to_string(value)
        .map_err(|err| KeyValueStoreError::corrupt(key, err.to_string()))?;
    store.put(key, &raw).await
}

/// Store that never holds anything and accepts every write.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureKeyValueStore;

#[async_trait]
impl KeyValueStore for FixtureKeyValueStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, KeyValueStoreError> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: &str) -> Result<(), KeyValueStoreError> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<(), KeyValueStoreError> {
        Ok(())
    }
}
