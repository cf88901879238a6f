//! Encounter state of a single boss slot.

use serde::{Deserialize, Serialize};

/// Progress of one boss encounter.
///
/// The discriminants are the persisted representation and must not change.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::FromRepr,
    strum::IntoStaticStr,
)]
#[repr(u8)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EncounterState {
    /// Boss alive and idle.
    #[default]
    NotStarted = 0,

    /// Fight under way.
    InProgress = 1,

    /// Raid wiped. Transient unless the instance ran out of attempts.
    Fail = 2,

    /// Boss defeated.
    Done = 3,

    /// Instance-defined milestone reached during the fight (e.g. a
    /// non-fatal first kill in a multi-stage encounter).
    Special = 4,
}

impl EncounterState {
    /// Persisted integer value.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for states that keep the encounter area locked down.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::InProgress | Self::Special)
    }

    /// Whether `self → next` is a legal transition.
    ///
    /// `Done` has no outgoing edges; leaving it requires an explicit slot
    /// reset.
    pub const fn can_transition_to(self, next: EncounterState) -> bool {
        use EncounterState::*;
        matches!(
            (self, next),
            (NotStarted, InProgress)
                | (InProgress, Done)
                | (InProgress, Fail)
                | (InProgress, Special)
                | (Special, InProgress)
                | (Special, Done)
                | (Fail, NotStarted)
        )
    }
}
