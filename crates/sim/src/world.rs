//! Headless world: records script actions and echoes them to the log.

use encounter::Position;
use runtime::{ActionDispatcher, ActionLog, ActorAction, ActorId};
use tracing::info;

#[derive(Debug, Default)]
pub struct ConsoleWorld {
    log: ActionLog,
}

impl ConsoleWorld {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActionDispatcher for ConsoleWorld {
    fn dispatch(&mut self, actor: ActorId, action: ActorAction) {
        match &action {
            ActorAction::Cast { spell, target } => {
                info!(target: "sim::world", %actor, spell = spell.0, ?target, "cast");
            }
            ActorAction::Talk(line) => info!(target: "sim::world", %actor, line, "says"),
            ActorAction::Summon { entry, at } => {
                info!(target: "sim::world", %actor, entry, x = at.x, y = at.y, "summon");
            }
            other => info!(target: "sim::world", %actor, action = ?other, "action"),
        }
        self.log.dispatch(actor, action);
    }

    fn is_busy(&self, actor: ActorId) -> bool {
        self.log.is_busy(actor)
    }

    fn position(&self, actor: ActorId) -> Option<Position> {
        self.log.position(actor)
    }
}
