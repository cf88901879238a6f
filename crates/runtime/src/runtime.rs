//! High-level runtime orchestrator.
//!
//! The runtime moves a [`Simulation`] onto a background worker task, wires up
//! the command channel and exposes a [`SimulationHandle`] to clients.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::handle::SimulationHandle;
use crate::simulation::Simulation;
use crate::workers::{Command, SimulationWorker};

/// Running simulation plus its worker task.
///
/// [`SimulationHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: SimulationHandle,
    worker: JoinHandle<Simulation>,
}

impl Runtime {
    /// Starts ticking `simulation` on the current tokio runtime.
    pub fn start(simulation: Simulation, config: &RuntimeConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer_size.max(1));
        let worker = SimulationWorker::new(simulation, command_rx, config.tick);

        Self {
            handle: SimulationHandle::new(command_tx),
            worker: tokio::spawn(worker.run()),
        }
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> SimulationHandle {
        self.handle.clone()
    }

    /// Stops the worker, flushing pending instance changes, and returns the
    /// simulation for inspection or a later restart.
    pub async fn shutdown(self) -> Result<Simulation> {
        // fails only if the worker already stopped
        let _ = self.handle.send(Command::Shutdown).await;
        drop(self.handle);

        self.worker.await.map_err(RuntimeError::WorkerJoin)
    }
}
