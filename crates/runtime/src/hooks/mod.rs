//! World notifications delivered to scripts.
//!
//! The host reports what happened to an actor as a [`HookEvent`]. A script
//! declares which kinds it reacts to by filling a [`HookTable`]; kinds with no
//! entry are simply not delivered to it. Boss defaults (combat, death, evade)
//! are applied by the controller whether or not the script has an entry.

mod table;

pub use table::{HookFn, HookTable};

use serde::{Deserialize, Serialize};

use crate::actions::{ActorId, SpellId};

/// Discriminant of [`HookEvent`], the key of a [`HookTable`].
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum HookKind {
    EnterCombat,
    Death,
    Evade,
    Damaged,
    SpellHit,
    Summoned,
}

/// Something that happened to the actor owning a controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum HookEvent {
    EnterCombat {
        target: ActorId,
    },
    Death {
        killer: Option<ActorId>,
    },
    Evade,
    Damaged {
        attacker: Option<ActorId>,
        amount: u32,
        /// Health left after the hit, in percent.
        health_pct: u8,
    },
    SpellHit {
        caster: ActorId,
        spell: SpellId,
    },
    /// The actor summoned another actor.
    Summoned {
        summon: ActorId,
    },
}

impl HookEvent {
    pub fn kind(&self) -> HookKind {
        match self {
            HookEvent::EnterCombat { .. } => HookKind::EnterCombat,
            HookEvent::Death { .. } => HookKind::Death,
            HookEvent::Evade => HookKind::Evade,
            HookEvent::Damaged { .. } => HookKind::Damaged,
            HookEvent::SpellHit { .. } => HookKind::SpellHit,
            HookEvent::Summoned { .. } => HookKind::Summoned,
        }
    }
}
