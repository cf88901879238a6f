//! Cloneable façade for issuing commands to the simulation worker.
//!
//! [`SimulationHandle`] hides the channel plumbing and offers async helpers
//! for spawning actors, reporting world events and reading snapshots.
use tokio::sync::{mpsc, oneshot};

use crate::actions::ActorId;
use crate::error::{Result, RuntimeError};
use crate::hooks::HookEvent;
use crate::simulation::SimulationSnapshot;
use crate::workers::Command;

/// Client-facing handle to interact with a running simulation
#[derive(Clone)]
pub struct SimulationHandle {
    command_tx: mpsc::Sender<Command>,
}

impl SimulationHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>) -> Self {
        Self { command_tx }
    }

    /// Spawn a controller running `script` for `actor`
    pub async fn spawn(
        &self,
        script: impl Into<String>,
        actor: ActorId,
        slot: Option<usize>,
    ) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.send(Command::Spawn {
            script: script.into(),
            actor,
            slot,
            reply: reply_tx,
        })
        .await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Remove the controller of `actor`; false if it had none
    pub async fn despawn(&self, actor: ActorId) -> Result<bool> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.send(Command::Despawn {
            actor,
            reply: reply_tx,
        })
        .await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Report a world event to the controller of `actor`
    pub async fn notify(&self, actor: ActorId, event: HookEvent) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.send(Command::Notify {
            actor,
            event,
            reply: reply_tx,
        })
        .await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Query a snapshot of the simulation (read-only)
    pub async fn snapshot(&self) -> Result<SimulationSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.send(Command::QueryState { reply: reply_tx }).await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Persist pending instance changes; true if anything was written
    pub async fn flush(&self) -> Result<bool> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.send(Command::Flush { reply: reply_tx }).await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    pub(crate) async fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }
}
