//! Instance templates loaded from TOML content files.
//!
//! ```toml
//! id = "onyxias_lair"
//! header = "ONY"
//! attempts = 3
//!
//! [[slots]]
//! name = "onyxia"
//! boundaries = [{ shape = "circle", center = { x = 0.0, y = 0.0 }, radius = 60.0 }]
//! doors = [{ door = 1, kind = "room" }]
//!
//! [[spawns]]
//! script = "boss_onyxia"
//! actor = 100
//! slot = 0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use encounter::{AttemptPolicy, EncounterLayout, SlotLayout};

use crate::actions::ActorId;
use crate::error::{Result, RuntimeError};

/// One controller to create when the instance opens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnTemplate {
    pub script: String,
    pub actor: ActorId,
    #[serde(default)]
    pub slot: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstanceTemplate {
    /// Repository key for the instance save.
    pub id: String,
    pub header: String,
    /// Attempt limit, absent for unlimited.
    #[serde(default)]
    pub attempts: Option<u32>,
    pub slots: Vec<SlotLayout>,
    #[serde(default)]
    pub spawns: Vec<SpawnTemplate>,
}

impl InstanceTemplate {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let template: Self = toml::from_str(source)?;
        template.layout().validate()?;
        Ok(template)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| RuntimeError::TemplateIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn layout(&self) -> EncounterLayout {
        let policy = match self.attempts {
            Some(max) => AttemptPolicy::Limited(max),
            None => AttemptPolicy::Unlimited,
        };
        EncounterLayout::new(self.header.clone(), self.slots.clone()).attempts(policy)
    }
}
