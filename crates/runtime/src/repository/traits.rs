//! Repository contract for instance save blobs.

use super::Result;

/// Stores one save blob per instance.
///
/// Implementations are shared between the simulation and tooling, hence
/// `&self` methods and `Send + Sync`.
pub trait SaveRepository: Send + Sync {
    /// Replace the blob stored for `instance`.
    fn save(&self, instance: &str, blob: &str) -> Result<()>;

    /// Load the blob stored for `instance`, `None` if it was never saved.
    fn load(&self, instance: &str) -> Result<Option<String>>;

    fn exists(&self, instance: &str) -> bool;

    /// Delete the blob; deleting a missing instance is not an error.
    fn delete(&self, instance: &str) -> Result<()>;

    /// List every instance with a stored blob, sorted.
    fn list_instances(&self) -> Result<Vec<String>> {
        Ok(vec![])
    }
}
