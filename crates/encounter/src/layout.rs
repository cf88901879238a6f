//! Static description of an instance: its boss slots, their doors and leash
//! regions, and the attempt policy.

use serde::{Deserialize, Serialize};

use crate::boundary::{Boundary, Position};
use crate::error::LayoutError;
use crate::hooks::DoorId;

/// How many wipes an instance tolerates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPolicy {
    #[default]
    Unlimited,
    /// The instance locks out once this many encounters have failed.
    Limited(u32),
}

/// How a door reacts to the state of its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorKind {
    /// Seals the boss room while the fight is active.
    Room,
    /// Blocks the way forward until the boss is defeated.
    Passage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorLayout {
    pub door: DoorId,
    pub kind: DoorKind,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotLayout {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub boundaries: Vec<Boundary>,
    #[serde(default)]
    pub doors: Vec<DoorLayout>,
}

impl SlotLayout {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn boundary(mut self, boundary: Boundary) -> Self {
        self.boundaries.push(boundary);
        self
    }

    #[must_use]
    pub fn door(mut self, door: DoorId, kind: DoorKind) -> Self {
        self.doors.push(DoorLayout { door, kind });
        self
    }

    /// True when `pos` satisfies every boundary of the slot. A slot without
    /// boundaries has no leash.
    pub fn is_within_boundary(&self, pos: Position) -> bool {
        self.boundaries.iter().all(|b| b.is_within(pos))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncounterLayout {
    /// Tag written at the start of every save blob of this instance.
    pub header: String,
    pub slots: Vec<SlotLayout>,
    #[serde(default)]
    pub attempts: AttemptPolicy,
}

impl EncounterLayout {
    pub fn new(header: impl Into<String>, slots: Vec<SlotLayout>) -> Self {
        Self {
            header: header.into(),
            slots,
            attempts: AttemptPolicy::Unlimited,
        }
    }

    /// Layout with `count` anonymous slots and no doors or boundaries.
    pub fn with_slot_count(header: impl Into<String>, count: usize) -> Self {
        Self::new(header, vec![SlotLayout::default(); count])
    }

    #[must_use]
    pub fn attempts(mut self, policy: AttemptPolicy) -> Self {
        self.attempts = policy;
        self
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        let header_ok = !self.header.is_empty()
            && !self.header.contains(char::is_whitespace)
            && !self.header.contains('=');
        if !header_ok {
            return Err(LayoutError::InvalidHeader(self.header.clone()));
        }
        if self.slots.is_empty() {
            return Err(LayoutError::NoSlots);
        }
        if self.attempts == AttemptPolicy::Limited(0) {
            return Err(LayoutError::ZeroAttempts);
        }
        Ok(())
    }
}
