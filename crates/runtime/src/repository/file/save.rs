//! File-based SaveRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::repository::{RepositoryError, Result, SaveRepository, validate_key};

const ENVELOPE_VERSION: u32 = 1;

/// On-disk wrapper around a save blob.
#[derive(Debug, Serialize, Deserialize)]
struct SaveEnvelope {
    version: u32,
    instance: String,
    /// Milliseconds since the Unix epoch.
    saved_at: u64,
    blob: String,
}

/// File-based implementation of SaveRepository.
///
/// # File Format
///
/// Each instance is stored as `{instance}.json` holding a small JSON
/// envelope (format version, instance id, timestamp, blob). Writes go to a
/// temporary file that is then renamed over the old save, so a crash never
/// leaves a half-written save behind.
pub struct FileSaveRepository {
    base_dir: PathBuf,
}

impl FileSaveRepository {
    /// Create a new file-based save repository, creating `base_dir` if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn save_path(&self, instance: &str) -> PathBuf {
        self.base_dir.join(format!("{instance}.json"))
    }
}

impl SaveRepository for FileSaveRepository {
    fn save(&self, instance: &str, blob: &str) -> Result<()> {
        validate_key(instance)?;
        let path = self.save_path(instance);
        let temp_path = path.with_extension("json.tmp");

        let envelope = SaveEnvelope {
            version: ENVELOPE_VERSION,
            instance: instance.to_string(),
            saved_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
                .unwrap_or(0),
            blob: blob.to_string(),
        };
        let bytes = serde_json::to_vec_pretty(&envelope)?;

        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!(target: "runtime::repository", instance, path = %path.display(), "saved instance");
        Ok(())
    }

    fn load(&self, instance: &str) -> Result<Option<String>> {
        validate_key(instance)?;
        let path = self.save_path(instance);

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)?;
        let envelope: SaveEnvelope = serde_json::from_slice(&bytes)?;

        if envelope.version != ENVELOPE_VERSION {
            return Err(RepositoryError::CorruptedData(format!(
                "{} has unsupported version {}",
                path.display(),
                envelope.version
            )));
        }
        if envelope.instance != instance {
            return Err(RepositoryError::CorruptedData(format!(
                "{} belongs to instance '{}'",
                path.display(),
                envelope.instance
            )));
        }

        tracing::debug!(target: "runtime::repository", instance, path = %path.display(), "loaded instance");
        Ok(Some(envelope.blob))
    }

    fn exists(&self, instance: &str) -> bool {
        validate_key(instance).is_ok() && self.save_path(instance).exists()
    }

    fn delete(&self, instance: &str) -> Result<()> {
        validate_key(instance)?;
        let path = self.save_path(instance);

        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!(target: "runtime::repository", instance, "deleted instance save");
        }

        Ok(())
    }

    fn list_instances(&self) -> Result<Vec<String>> {
        let mut instances = Vec::new();

        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();

            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(instance) = filename.strip_suffix(".json")
                && validate_key(instance).is_ok()
            {
                instances.push(instance.to_string());
            }
        }

        instances.sort_unstable();
        Ok(instances)
    }
}
