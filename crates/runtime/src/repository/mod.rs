//! Repository layer for instance saves.
//!
//! Repositories store the opaque blobs produced by
//! [`encounter::EncounterStateMachine::save`], keyed by instance id. They
//! never interpret the blob; decoding and fallback to defaults belong to the
//! state machine.

mod error;
mod traits;

pub mod file;
pub mod memory;

pub use error::{RepositoryError, Result};
pub use file::FileSaveRepository;
pub use memory::InMemorySaveRepository;
pub use traits::SaveRepository;

/// Rejects keys that cannot safely become a file name.
pub(crate) fn validate_key(instance: &str) -> Result<()> {
    let valid = !instance.is_empty()
        && instance
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RepositoryError::InvalidKey(instance.to_string()))
    }
}
