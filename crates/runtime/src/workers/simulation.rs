//! Simulation worker that owns the authoritative [`Simulation`].
//!
//! Ticks the simulation on a fixed interval and serves commands from
//! [`crate::SimulationHandle`] between ticks, so controllers never run
//! concurrently with a command.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::actions::ActorId;
use crate::error::Result;
use crate::hooks::HookEvent;
use crate::simulation::{Simulation, SimulationSnapshot};

/// Commands that can be sent to the simulation worker
pub enum Command {
    /// Create a controller for an actor.
    Spawn {
        script: String,
        actor: ActorId,
        slot: Option<usize>,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Remove an actor's controller.
    Despawn {
        actor: ActorId,
        reply: oneshot::Sender<bool>,
    },
    /// Deliver a world notification to an actor's controller.
    Notify {
        actor: ActorId,
        event: HookEvent,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Query a snapshot of the simulation (read-only).
    QueryState {
        reply: oneshot::Sender<SimulationSnapshot>,
    },
    /// Persist pending instance changes now.
    Flush { reply: oneshot::Sender<bool> },
    /// Stop ticking and hand the simulation back.
    Shutdown,
}

/// Background task that ticks the simulation and processes commands.
pub struct SimulationWorker {
    simulation: Simulation,
    command_rx: mpsc::Receiver<Command>,
    tick: Duration,
}

impl SimulationWorker {
    pub fn new(simulation: Simulation, command_rx: mpsc::Receiver<Command>, tick: Duration) -> Self {
        info!(
            target: "runtime::worker",
            tick_ms = u64::try_from(tick.as_millis()).unwrap_or(u64::MAX),
            controllers = simulation.controller_count(),
            "SimulationWorker initialized"
        );

        Self {
            simulation,
            command_rx,
            tick,
        }
    }

    /// Main worker loop. Returns the simulation once every handle is gone or
    /// a shutdown was requested; pending instance changes are flushed first.
    pub async fn run(mut self) -> Simulation {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();

        loop {
            tokio::select! {
                now = interval.tick() => {
                    let dt = now.saturating_duration_since(last_tick);
                    last_tick = now;
                    self.simulation.tick(dt);
                }
                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
            }
        }

        if self.simulation.flush() {
            info!(target: "runtime::worker", "flushed instance on shutdown");
        }
        info!(
            target: "runtime::worker",
            elapsed_ms = u64::try_from(self.simulation.elapsed().as_millis()).unwrap_or(u64::MAX),
            "SimulationWorker stopped"
        );
        self.simulation
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Spawn {
                script,
                actor,
                slot,
                reply,
            } => {
                let result = self.simulation.spawn(&script, actor, slot);
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "Spawn reply channel closed (caller dropped)");
                }
            }
            Command::Despawn { actor, reply } => {
                if reply.send(self.simulation.despawn(actor)).is_err() {
                    debug!(target: "runtime::worker", "Despawn reply channel closed (caller dropped)");
                }
            }
            Command::Notify {
                actor,
                event,
                reply,
            } => {
                let result = self.simulation.notify(actor, event);
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "Notify reply channel closed (caller dropped)");
                }
            }
            Command::QueryState { reply } => {
                if reply.send(self.simulation.snapshot()).is_err() {
                    debug!(target: "runtime::worker", "QueryState reply channel closed (caller dropped)");
                }
            }
            Command::Flush { reply } => {
                if reply.send(self.simulation.flush()).is_err() {
                    debug!(target: "runtime::worker", "Flush reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown => {}
        }
    }
}
