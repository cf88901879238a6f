//! Encounter progress tracking for dungeon and raid instances.
//!
//! One [`EncounterStateMachine`] exists per loaded instance. It holds the
//! [`EncounterState`] of every boss slot, an attempt counter for
//! limited-attempt instances and a small scratch-data map, and it owns the
//! textual save blob format. Side effects (doors, the instance-wide combat
//! gate, lockouts, persistence) are delegated to an [`EncounterHooks`]
//! collaborator supplied by the host.
//!
//! All mutation goes through [`EncounterStateMachine::set_boss_state`]; the
//! machine never resumes an encounter mid-fight across a reload.

pub mod blob;
pub mod boundary;
pub mod error;
pub mod hooks;
pub mod layout;
pub mod machine;
pub mod state;

pub use blob::SaveData;
pub use boundary::{Boundary, BoundaryShape, Position};
pub use error::{BlobError, LayoutError, TransitionError};
pub use hooks::{DoorId, EncounterHooks, NoopHooks};
pub use layout::{AttemptPolicy, DoorKind, DoorLayout, EncounterLayout, SlotLayout};
pub use machine::{EncounterStateMachine, LoadOutcome};
pub use state::EncounterState;
