use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::saves::SAVES_DIR;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tui: TuiConfig,
    pub data: DataConfig,
    pub combat: CombatConfig,
}

/// TUI-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Tick interval in milliseconds for the event loop.
    pub tick_rate_ms: u64,
    /// Enable mouse support in the terminal.
    pub mouse_enabled: bool,
}

/// Data directory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

/// Encounter behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// How long an ended encounter stays on screen before it resets.
    pub auto_end_delay_ms: u64,
    /// Cap healing at max HP. Off keeps HP free to rise above max.
    pub clamp_healing_to_max: bool,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 50,
            mouse_enabled: false,
        }
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            auto_end_delay_ms: 2000,
            clamp_healing_to_max: false,
        }
    }
}

impl CombatConfig {
    pub fn auto_end_delay(&self) -> Duration {
        Duration::from_millis(self.auto_end_delay_ms)
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/combat-pad/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::from_toml(&contents).unwrap_or_else(|e| {
                log::warn!(
                    "Failed to parse config at {}: {e}; using defaults",
                    config_path.display()
                );
                Self::default()
            }),
            Err(_) => {
                log::debug!(
                    "No config file at {}; using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("combat-pad"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    /// Directory holding save snapshots.
    pub fn saves_dir(&self) -> PathBuf {
        self.data_dir().join(SAVES_DIR)
    }

    /// Directory for rolling log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("combat-pad").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
