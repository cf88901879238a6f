//! Collaborator interface for encounter side effects.

use std::fmt;

/// Identifier of a door object in the host world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct DoorId(pub u64);

impl fmt::Display for DoorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "door#{}", self.0)
    }
}

/// Side effects requested by [`crate::EncounterStateMachine`].
///
/// Implemented by the host world. Every method is invoked synchronously from
/// inside a state change and should only record or forward the request.
pub trait EncounterHooks {
    /// Instance-wide lock: `closed` is true while any slot is in progress or
    /// in its special stage. Re-applied after every accepted transition.
    fn set_encounter_gate(&mut self, closed: bool);

    /// Open or close one registered door. Re-applied after every accepted
    /// transition.
    fn set_door(&mut self, _door: DoorId, _open: bool) {}

    /// The instance ran out of attempts; `slot` is the encounter whose
    /// failure consumed the last one.
    fn on_lockout(&mut self, _slot: usize) {}

    /// Persist a freshly serialized save blob.
    fn persist(&mut self, blob: &str);
}

/// Hooks that drop every request. Useful for tooling and tests that only
/// care about state.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl EncounterHooks for NoopHooks {
    fn set_encounter_gate(&mut self, _closed: bool) {}

    fn persist(&mut self, _blob: &str) {}
}
