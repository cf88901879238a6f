//! Runtime configuration and environment loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const APP_NAME: &str = "encounter-sim";

/// Settings shared by the simulation host and its worker.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Wall-clock interval between simulation ticks.
    pub tick: Duration,
    pub command_buffer_size: usize,
    /// Seed for every scheduler delay roll. `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
    /// Where [`crate::FileSaveRepository`] keeps instance saves. `None`
    /// selects the platform data directory.
    pub save_dir: Option<PathBuf>,
    /// Write a log file next to stderr output.
    pub log_to_file: bool,
    /// Directory for the log file. `None` selects the platform cache
    /// directory.
    pub log_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            command_buffer_size: 32,
            rng_seed: None,
            save_dir: None,
            log_to_file: false,
            log_dir: None,
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SIM_TICK_MS` - Tick interval in milliseconds (default: 100, minimum 1)
    /// - `SIM_COMMAND_BUFFER` - Worker command queue size (default: 32)
    /// - `SIM_RNG_SEED` - Fixed seed for delay rolls (default: entropy)
    /// - `SIM_SAVE_DIR` - Directory for instance saves (default: platform-specific)
    /// - `SIM_LOG_FILE` - Also log to a file when `1` or `true` (default: stderr only)
    /// - `SIM_LOG_DIR` - Directory for the log file; implies `SIM_LOG_FILE` (default: platform-specific)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = read_env::<u64>("SIM_TICK_MS") {
            config.tick = Duration::from_millis(ms.max(1));
        }

        if let Some(capacity) = read_env::<usize>("SIM_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }

        config.rng_seed = read_env::<u64>("SIM_RNG_SEED");
        config.save_dir = env::var_os("SIM_SAVE_DIR").map(PathBuf::from);
        config.log_dir = env::var_os("SIM_LOG_DIR").map(PathBuf::from);
        config.log_to_file = config.log_dir.is_some()
            || env::var("SIM_LOG_FILE").is_ok_and(|value| value == "1" || value == "true");

        config
    }

    /// Save directory with the platform default applied.
    pub fn resolved_save_dir(&self) -> PathBuf {
        self.save_dir.clone().unwrap_or_else(default_save_dir)
    }

    /// Log file directory, `None` when file logging is off.
    pub fn resolved_log_dir(&self) -> Option<PathBuf> {
        self.log_to_file
            .then(|| self.log_dir.clone().unwrap_or_else(default_log_dir))
    }
}

/// Platform data directory for instance saves.
///
/// - Linux: `~/.local/share/encounter-sim/saves`
/// - macOS: `~/Library/Application Support/encounter-sim/saves`
/// - Windows: `%APPDATA%\encounter-sim\saves`
/// - Fallback: `./save_data`
pub fn default_save_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().join("saves"))
        .unwrap_or_else(|| PathBuf::from("./save_data"))
}

/// Platform cache directory for log files.
pub fn default_log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.cache_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("/tmp/encounter-sim/logs"))
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
