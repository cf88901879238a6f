//! Runtime glue between encounter scripts and the host world.
//!
//! This crate binds scripts to actors through per-actor controllers, hosts
//! the instance's encounter state machine, and drives everything from a
//! single tick loop. Consumers register scripts in a [`ScriptRegistry`],
//! build a [`Simulation`], and either tick it themselves or hand it to
//! [`Runtime`] and talk to it through a [`SimulationHandle`].
//!
//! Modules are organized by responsibility:
//! - [`controller`] binds a [`Script`] and its event scheduler to one actor
//! - [`hooks`] defines world notifications and the per-script capability table
//! - [`registry`] maps script names to constructors
//! - [`instance`] and [`repository`] host and persist encounter state
//! - [`simulation`] and [`runtime`] drive the tick loop, the latter on a
//!   background worker
//! - [`content`] loads instance templates from TOML
pub mod actions;
pub mod config;
pub mod content;
pub mod controller;
pub mod error;
pub mod handle;
pub mod hooks;
pub mod instance;
pub mod registry;
pub mod repository;
pub mod runtime;
pub mod simulation;

mod workers;

pub use actions::{ActionDispatcher, ActionLog, ActorAction, ActorId, SpellId};
pub use config::RuntimeConfig;
pub use content::{InstanceTemplate, SpawnTemplate};
pub use controller::{ActorController, Controller, ControllerEnv, Script, ScriptContext};
pub use error::{Result, RuntimeError};
pub use handle::SimulationHandle;
pub use hooks::{HookEvent, HookFn, HookKind, HookTable};
pub use instance::{Instance, InstanceHost};
pub use registry::{ScriptFactory, ScriptRegistry, SpawnRequest};
pub use repository::{
    FileSaveRepository, InMemorySaveRepository, RepositoryError, SaveRepository,
};
pub use runtime::Runtime;
pub use simulation::{ActorSnapshot, InstanceSnapshot, Simulation, SimulationSnapshot};
