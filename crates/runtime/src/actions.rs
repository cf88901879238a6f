//! Boundary to the host world: actor identifiers, the actions a script can
//! request, and the dispatcher that carries them out.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use encounter::Position;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpellId(pub u32);

impl fmt::Display for SpellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spell#{}", self.0)
    }
}

/// A game action requested by a script.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorAction {
    Cast {
        spell: SpellId,
        target: Option<ActorId>,
    },
    MoveTo(Position),
    /// Broadcast text line from the content tables.
    Talk(u32),
    Summon {
        entry: u32,
        at: Position,
    },
    Despawn,
    /// Drop combat and return home.
    Evade,
}

/// Executes script actions against the world.
pub trait ActionDispatcher: Send {
    fn dispatch(&mut self, actor: ActorId, action: ActorAction);

    /// True while `actor` is casting or otherwise unable to start a new
    /// action. Controllers stop dispatching events while busy.
    fn is_busy(&self, _actor: ActorId) -> bool {
        false
    }

    /// Current position of `actor`, if the world tracks it.
    fn position(&self, _actor: ActorId) -> Option<Position> {
        None
    }
}

/// Dispatcher that records every action and lets callers stage busy flags
/// and positions. Backs tests and the headless demo host.
#[derive(Debug, Default)]
pub struct ActionLog {
    entries: Vec<(ActorId, ActorAction)>,
    busy: HashSet<ActorId>,
    positions: HashMap<ActorId, Position>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[(ActorId, ActorAction)] {
        &self.entries
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&mut self) -> Vec<(ActorId, ActorAction)> {
        std::mem::take(&mut self.entries)
    }

    pub fn set_busy(&mut self, actor: ActorId, busy: bool) {
        if busy {
            self.busy.insert(actor);
        } else {
            self.busy.remove(&actor);
        }
    }

    pub fn set_position(&mut self, actor: ActorId, pos: Position) {
        self.positions.insert(actor, pos);
    }
}

impl ActionDispatcher for ActionLog {
    fn dispatch(&mut self, actor: ActorId, action: ActorAction) {
        if let ActorAction::MoveTo(pos) = action {
            self.positions.insert(actor, pos);
        }
        self.entries.push((actor, action));
    }

    fn is_busy(&self, actor: ActorId) -> bool {
        self.busy.contains(&actor)
    }

    fn position(&self, actor: ActorId) -> Option<Position> {
        self.positions.get(&actor).copied()
    }
}
