//! Unified error type surfaced by the runtime API.
//!
//! Wraps failures from script lookup, instance setup, repositories and worker
//! coordination so hosts can bubble them up with consistent context.
use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::oneshot;

use encounter::LayoutError;

use crate::actions::ActorId;
pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("script '{0}' is already registered")]
    DuplicateScript(String),

    #[error("no script registered under '{0}'")]
    UnknownScript(String),

    #[error("{0} already has a controller")]
    DuplicateActor(ActorId),

    #[error("{0} has no controller")]
    UnknownActor(ActorId),

    #[error("boss slot {slot} does not exist (instance has {count} slots)")]
    InvalidSlot { slot: usize, count: usize },

    #[error("boss slot {slot} requested but no instance is loaded")]
    NoInstance { slot: usize },

    #[error("invalid instance layout")]
    Layout(#[from] LayoutError),

    #[error("failed to read instance template {}", .path.display())]
    TemplateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse instance template")]
    TemplateParse(#[from] toml::de::Error),

    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("simulation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
