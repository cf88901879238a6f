//! In-memory SaveRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::repository::{RepositoryError, Result, SaveRepository, validate_key};

/// In-memory implementation of SaveRepository.
#[derive(Debug, Default)]
pub struct InMemorySaveRepository {
    blobs: RwLock<HashMap<String, String>>,
}

impl InMemorySaveRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with one blob already stored.
    pub fn with_blob(instance: impl Into<String>, blob: impl Into<String>) -> Self {
        let mut blobs = HashMap::new();
        blobs.insert(instance.into(), blob.into());
        Self {
            blobs: RwLock::new(blobs),
        }
    }
}

impl SaveRepository for InMemorySaveRepository {
    fn save(&self, instance: &str, blob: &str) -> Result<()> {
        validate_key(instance)?;
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        blobs.insert(instance.to_string(), blob.to_string());
        Ok(())
    }

    fn load(&self, instance: &str) -> Result<Option<String>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(blobs.get(instance).cloned())
    }

    fn exists(&self, instance: &str) -> bool {
        self.blobs
            .read()
            .map(|blobs| blobs.contains_key(instance))
            .unwrap_or(false)
    }

    fn delete(&self, instance: &str) -> Result<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        blobs.remove(instance);
        Ok(())
    }

    fn list_instances(&self) -> Result<Vec<String>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut instances: Vec<String> = blobs.keys().cloned().collect();
        instances.sort_unstable();
        Ok(instances)
    }
}
