//! Explicit script registry.
//!
//! Scripts are registered by name at startup and instantiated by name when
//! the host spawns an actor. Registration order has no effect on lookup.

use std::collections::BTreeMap;
use std::fmt;

use scheduler::EventScheduler;
use tracing::debug;

use crate::actions::ActorId;
use crate::controller::{ActorController, Controller, Script};
use crate::error::{Result, RuntimeError};

/// Parameters for creating one controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnRequest {
    pub actor: ActorId,
    pub slot: Option<usize>,
    /// Seed for the controller's delay rolls, `None` for entropy.
    pub seed: Option<u64>,
}

pub type ScriptFactory = Box<dyn Fn(SpawnRequest) -> Box<dyn ActorController> + Send + Sync>;

#[derive(Default)]
pub struct ScriptRegistry {
    factories: BTreeMap<String, ScriptFactory>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers script `S` under `name`, built by `make` for every spawn.
    pub fn register<S: Script>(&mut self, name: impl Into<String>, make: fn() -> S) -> Result<()> {
        self.register_factory(
            name,
            Box::new(move |request: SpawnRequest| {
                let events = match request.seed {
                    Some(seed) => EventScheduler::with_seed(seed ^ request.actor.0),
                    None => EventScheduler::new(),
                };
                Box::new(Controller::with_events(
                    request.actor,
                    request.slot,
                    make(),
                    events,
                )) as Box<dyn ActorController>
            }),
        )
    }

    /// Registers a hand-written factory.
    pub fn register_factory(&mut self, name: impl Into<String>, factory: ScriptFactory) -> Result<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(RuntimeError::DuplicateScript(name));
        }
        debug!(target: "runtime::registry", script = %name, "script registered");
        self.factories.insert(name, factory);
        Ok(())
    }

    pub fn spawn(&self, name: &str, request: SpawnRequest) -> Result<Box<dyn ActorController>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownScript(name.to_string()))?;
        Ok(factory(request))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}
