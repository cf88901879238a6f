//! Headless encounter simulator.
//!
//! Loads an instance template, opens (or restores) its save, spawns the
//! template's actors on a background runtime and plays a scripted fight
//! against the first boss. The final snapshot is printed as JSON.
//!
//! ```bash
//! SIM_RNG_SEED=7 SIM_SAVE_DIR=/tmp/sim-saves cargo run -p encounter-sim
//! SIM_TEMPLATE=path/to/lair.toml cargo run -p encounter-sim
//! ```
mod fight;
mod logging;
mod scripts;
mod world;

use std::sync::Arc;

use anyhow::Result;
use runtime::{
    FileSaveRepository, InstanceHost, InstanceTemplate, Runtime, RuntimeConfig, Simulation,
};

const DEFAULT_TEMPLATE: &str = include_str!("../content/onyxias_lair.toml");

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = RuntimeConfig::from_env();
    let _log_guard = logging::setup_logging(&config)?;

    let template = match std::env::var_os("SIM_TEMPLATE") {
        Some(path) => InstanceTemplate::load(path)?,
        None => InstanceTemplate::from_toml_str(DEFAULT_TEMPLATE)?,
    };
    tracing::info!("Instance template: {}", template.id);

    let save_dir = config.resolved_save_dir();
    let repository = Arc::new(FileSaveRepository::new(&save_dir)?);
    tracing::info!("Save directory: {}", save_dir.display());

    let instance = InstanceHost::open(template.id.clone(), template.layout(), repository)?;
    let simulation = Simulation::new(scripts::registry()?, Box::new(world::ConsoleWorld::new()))
        .with_instance(instance)
        .with_seed(config.rng_seed);

    let runtime = Runtime::start(simulation, &config);
    let handle = runtime.handle();

    for spawn in &template.spawns {
        handle
            .spawn(spawn.script.clone(), spawn.actor, spawn.slot)
            .await?;
    }

    fight::play(&handle, &template).await?;

    let snapshot = handle.snapshot().await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    runtime.shutdown().await?;
    tracing::info!("Simulator shutdown complete");
    Ok(())
}
