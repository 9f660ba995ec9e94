//! In-memory storage backend for tests and single-process use.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{Backend, SessionRecord, StorageError};

/// Map-backed [`Backend`] guarded by a mutex.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, SessionRecord>>,
}

impl MemoryBackend {
    /// Construct an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, SessionRecord>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Backend("poisoned lock".to_owned()))
    }
}

impl Backend for MemoryBackend {
    fn put(&self, key: &str, record: SessionRecord) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_owned(), record);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<SessionRecord, StorageError> {
        self.lock()?.get(key).cloned().ok_or(StorageError::NotFound)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
