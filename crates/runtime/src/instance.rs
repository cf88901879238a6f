//! Host side of an instance: applies encounter side effects to the world
//! model and forwards save blobs to a [`SaveRepository`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use encounter::{DoorId, EncounterHooks, EncounterLayout, EncounterStateMachine, LoadOutcome};

use crate::error::Result;
use crate::repository::SaveRepository;

/// Encounter state machine as hosted by the runtime.
pub type Instance = EncounterStateMachine<InstanceHost>;

pub struct InstanceHost {
    instance_id: String,
    repository: Arc<dyn SaveRepository>,
    gate_closed: bool,
    doors: BTreeMap<DoorId, bool>,
    locked_out: bool,
    failed_saves: u32,
}

impl InstanceHost {
    pub fn new(instance_id: impl Into<String>, repository: Arc<dyn SaveRepository>) -> Self {
        Self {
            instance_id: instance_id.into(),
            repository,
            gate_closed: false,
            doors: BTreeMap::new(),
            locked_out: false,
            failed_saves: 0,
        }
    }

    /// Builds the state machine for `layout` and restores it from the
    /// repository. A missing or unreadable save starts the instance fresh.
    pub fn open(
        instance_id: impl Into<String>,
        layout: EncounterLayout,
        repository: Arc<dyn SaveRepository>,
    ) -> Result<Instance> {
        let host = Self::new(instance_id, Arc::clone(&repository));
        let key = host.instance_id.clone();
        let mut instance = EncounterStateMachine::new(layout, host)?;

        match repository.load(&key) {
            Ok(Some(blob)) => {
                if let LoadOutcome::Defaulted(err) = instance.load(&blob) {
                    warn!(target: "runtime::instance", instance = %key, %err, "stored save discarded");
                }
            }
            Ok(None) => {
                debug!(target: "runtime::instance", instance = %key, "no stored save, starting fresh");
                instance.apply_side_effects();
            }
            Err(err) => {
                error!(target: "runtime::instance", instance = %key, %err, "failed to read stored save, starting fresh");
                instance.apply_side_effects();
            }
        }

        info!(
            target: "runtime::instance",
            instance = %key,
            slots = instance.slot_count(),
            attempts = ?instance.attempts_remaining(),
            "instance opened"
        );
        Ok(instance)
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn is_gate_closed(&self) -> bool {
        self.gate_closed
    }

    /// Last state applied to `door`, `None` if it was never touched.
    pub fn door_state(&self, door: DoorId) -> Option<bool> {
        self.doors.get(&door).copied()
    }

    pub fn is_locked_out(&self) -> bool {
        self.locked_out
    }

    /// Number of saves the repository rejected.
    pub fn failed_saves(&self) -> u32 {
        self.failed_saves
    }
}

impl EncounterHooks for InstanceHost {
    fn set_encounter_gate(&mut self, closed: bool) {
        if self.gate_closed != closed {
            info!(target: "runtime::instance", instance = %self.instance_id, closed, "encounter gate changed");
        }
        self.gate_closed = closed;
    }

    fn set_door(&mut self, door: DoorId, open: bool) {
        if self.doors.insert(door, open) != Some(open) {
            debug!(target: "runtime::instance", instance = %self.instance_id, %door, open, "door changed");
        }
    }

    fn on_lockout(&mut self, slot: usize) {
        warn!(target: "runtime::instance", instance = %self.instance_id, slot, "instance locked out");
        self.locked_out = true;
    }

    fn persist(&mut self, blob: &str) {
        match self.repository.save(&self.instance_id, blob) {
            Ok(()) => {
                info!(target: "runtime::instance", instance = %self.instance_id, "instance saved");
            }
            Err(err) => {
                self.failed_saves += 1;
                error!(target: "runtime::instance", instance = %self.instance_id, %err, "failed to save instance");
            }
        }
    }
}
