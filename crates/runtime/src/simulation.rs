//! Tick host: owns the controllers of one instance and drives them.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use encounter::EncounterState;

use crate::actions::{ActionDispatcher, ActorId};
use crate::controller::{ActorController, ControllerEnv};
use crate::error::{Result, RuntimeError};
use crate::hooks::HookEvent;
use crate::instance::Instance;
use crate::registry::{ScriptRegistry, SpawnRequest};

/// Read-only view of a simulation, cheap to send across threads.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationSnapshot {
    pub elapsed_ms: u64,
    pub ticks: u64,
    pub actors: Vec<ActorSnapshot>,
    pub instance: Option<InstanceSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActorSnapshot {
    pub actor: ActorId,
    pub slot: Option<usize>,
    pub in_combat: bool,
    pub pending_events: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InstanceSnapshot {
    pub id: String,
    pub states: Vec<EncounterState>,
    pub attempts_remaining: Option<u32>,
    pub gate_closed: bool,
    pub locked_out: bool,
}

pub struct Simulation {
    registry: ScriptRegistry,
    dispatcher: Box<dyn ActionDispatcher>,
    instance: Option<Instance>,
    controllers: BTreeMap<ActorId, Box<dyn ActorController>>,
    seed: Option<u64>,
    elapsed: Duration,
    ticks: u64,
}

impl Simulation {
    pub fn new(registry: ScriptRegistry, dispatcher: Box<dyn ActionDispatcher>) -> Self {
        Self {
            registry,
            dispatcher,
            instance: None,
            controllers: BTreeMap::new(),
            seed: None,
            elapsed: Duration::ZERO,
            ticks: 0,
        }
    }

    #[must_use]
    pub fn with_instance(mut self, instance: Instance) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Seeds every controller spawned from now on.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Creates a controller for `actor` running the script registered as
    /// `script`, optionally bound to boss `slot` of the loaded instance.
    pub fn spawn(&mut self, script: &str, actor: ActorId, slot: Option<usize>) -> Result<()> {
        if self.controllers.contains_key(&actor) {
            return Err(RuntimeError::DuplicateActor(actor));
        }
        if let Some(slot) = slot {
            let count = self
                .instance
                .as_ref()
                .ok_or(RuntimeError::NoInstance { slot })?
                .slot_count();
            if slot >= count {
                return Err(RuntimeError::InvalidSlot { slot, count });
            }
        }

        let controller = self.registry.spawn(
            script,
            SpawnRequest {
                actor,
                slot,
                seed: self.seed,
            },
        )?;
        info!(target: "runtime::simulation", script, %actor, ?slot, "actor spawned");
        self.controllers.insert(actor, controller);
        Ok(())
    }

    /// Drops the controller of `actor` along with its pending events.
    pub fn despawn(&mut self, actor: ActorId) -> bool {
        let removed = self.controllers.remove(&actor).is_some();
        if removed {
            info!(target: "runtime::simulation", %actor, "actor despawned");
        }
        removed
    }

    /// Delivers a world notification to the controller of `actor`.
    pub fn notify(&mut self, actor: ActorId, event: HookEvent) -> Result<()> {
        let controller = self
            .controllers
            .get_mut(&actor)
            .ok_or(RuntimeError::UnknownActor(actor))?;

        let mut env = ControllerEnv {
            dispatcher: self.dispatcher.as_mut(),
            instance: self.instance.as_mut(),
        };
        controller.notify(event, &mut env);
        Ok(())
    }

    /// Advances every controller by `dt`. Returns the number of events fired.
    pub fn tick(&mut self, dt: Duration) -> usize {
        self.elapsed += dt;
        self.ticks += 1;

        let mut env = ControllerEnv {
            dispatcher: self.dispatcher.as_mut(),
            instance: self.instance.as_mut(),
        };

        let fired: usize = self
            .controllers
            .values_mut()
            .map(|controller| controller.update(dt, &mut env))
            .sum();

        if fired > 0 {
            debug!(target: "runtime::simulation", tick = self.ticks, fired, "tick");
        }
        fired
    }

    /// Persists pending instance changes. Returns whether anything was saved.
    pub fn flush(&mut self) -> bool {
        self.instance.as_mut().is_some_and(|instance| instance.flush())
    }

    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    pub fn instance_mut(&mut self) -> Option<&mut Instance> {
        self.instance.as_mut()
    }

    pub fn dispatcher(&self) -> &dyn ActionDispatcher {
        self.dispatcher.as_ref()
    }

    pub fn dispatcher_mut(&mut self) -> &mut dyn ActionDispatcher {
        self.dispatcher.as_mut()
    }

    pub fn contains(&self, actor: ActorId) -> bool {
        self.controllers.contains_key(&actor)
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        let actors = self
            .controllers
            .values()
            .map(|controller| ActorSnapshot {
                actor: controller.actor(),
                slot: controller.slot(),
                in_combat: controller.is_in_combat(),
                pending_events: controller.pending_events(),
            })
            .collect();

        let instance = self.instance.as_ref().map(|instance| InstanceSnapshot {
            id: instance.hooks().instance_id().to_string(),
            states: instance.states().to_vec(),
            attempts_remaining: instance.attempts_remaining(),
            gate_closed: instance.hooks().is_gate_closed(),
            locked_out: instance.is_locked_out(),
        });

        SimulationSnapshot {
            elapsed_ms: u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX),
            ticks: self.ticks,
            actors,
            instance,
        }
    }
}
