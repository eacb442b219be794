use async_trait::async_trait;
use coach_core::model::ModuleId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Key under which a module's serialized progress lives.
///
/// The format is part of the persisted contract and must not change:
/// other clients of the same storage resolve blobs by this exact shape.
#[must_use]
pub fn progress_key(module_id: &ModuleId) -> String {
    format!("module_{module_id}_progress")
}

/// Durable key-value store for serialized progress records.
///
/// Adapters stay deliberately dumb: opaque string blobs in, opaque string
/// blobs out, last write wins. Serialization, coalescing, and corruption
/// recovery all live above this interface.
#[async_trait]
pub trait ProgressStorage: Send + Sync {
    /// Fetch the blob stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backend cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Drop the blob stored under `key`. Removing a missing key is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Simple in-memory store for testing and prototyping.
///
/// Counts writes per key so tests can assert that a burst of mutations
/// coalesced into a single durable write.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    blobs: HashMap<String, String>,
    writes: HashMap<String, usize>,
}

impl InMemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls observed for `key`.
    #[must_use]
    pub fn write_count(&self, key: &str) -> usize {
        self.inner
            .lock()
            .map(|guard| guard.writes.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of `set` calls observed across all keys.
    #[must_use]
    pub fn total_writes(&self) -> usize {
        self.inner
            .lock()
            .map(|guard| guard.writes.values().sum())
            .unwrap_or(0)
    }

    /// Seed a raw blob without touching the write counters. Lets tests
    /// plant corrupt or legacy payloads.
    pub fn insert_raw(&self, key: &str, value: &str) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.blobs.insert(key.to_string(), value.to_string());
        }
    }
}

#[async_trait]
impl ProgressStorage for InMemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.blobs.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.blobs.insert(key.to_string(), value.to_string());
        *guard.writes.entry(key.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.blobs.remove(key);
        Ok(())
    }
}
