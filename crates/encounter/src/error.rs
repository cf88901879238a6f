//! Error types for the encounter state machine.
//!
//! None of these abort the simulation. Transition errors explain why
//! `set_boss_state` returned `false`; blob errors explain why a load fell back
//! to defaults; layout errors are raised once, when an instance is built.

use thiserror::Error;

use crate::state::EncounterState;

/// Why a boss-state change was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("boss slot {slot} out of range (instance has {count} slots)")]
    InvalidSlot { slot: usize, count: usize },

    #[error("boss slot {slot} is already {state}")]
    Unchanged { slot: usize, state: EncounterState },

    #[error("boss slot {slot}: illegal transition {from} -> {to}")]
    Illegal {
        slot: usize,
        from: EncounterState,
        to: EncounterState,
    },
}

/// Why a save blob could not be restored.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BlobError {
    #[error("save blob is empty")]
    Empty,

    #[error("save blob header mismatch: expected '{expected}', found '{found}'")]
    HeaderMismatch { expected: String, found: String },

    #[error("save blob truncated: expected {expected} boss states, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("save blob token {index} ('{token}') is not a boss state")]
    InvalidState { index: usize, token: String },

    #[error("save blob counter '{token}' is malformed")]
    MalformedCounter { token: String },
}

/// Problems with an instance layout definition.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("instance header must be a non-empty token without whitespace or '=' (got '{0}')")]
    InvalidHeader(String),

    #[error("instance must have at least one boss slot")]
    NoSlots,

    #[error("limited-attempt instance must allow at least one attempt")]
    ZeroAttempts,
}
