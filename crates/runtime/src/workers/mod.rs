//! Worker tasks that back the runtime orchestration.
//!
//! The simulation worker owns the [`crate::Simulation`] and is the only task
//! that ever touches it; everything else talks to it through commands.

mod simulation;

pub use simulation::{Command, SimulationWorker};
