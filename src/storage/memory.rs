//! `memory` storage: ephemeral in-process key-value map.
//!
//! Everything is discarded when the process exits.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::AppError;
use super::Storage;

#[derive(Default)]
pub struct MemoryStorage {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, AppError> {
        self.data
            .lock()
            .map_err(|_| AppError::Storage("memory storage lock poisoned".into()))
    }
}

impl Storage for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<bool, AppError> {
        Ok(self.lock()?.remove(key).is_some())
    }
}
