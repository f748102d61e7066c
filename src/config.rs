// src/config.rs

//! Appliance configuration.
//!
//! Everything has a baked-in default matching the target hardware; an
//! optional JSON file at `/etc/snakebox.json` overrides individual fields.
//! A file that fails to parse is reported and ignored rather than taking the
//! appliance down.

use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_PATH: &str = "/etc/snakebox.json";

/// Process-wide configuration, loaded once on first use.
pub static CONFIG: Lazy<Config> = Lazy::new(|| Config::load_or_default(CONFIG_PATH));

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub devices: DevicesConfig,
    pub game: GameConfig,
}

/// Device node paths the appliance drives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DevicesConfig {
    /// GPU card node with the mode-setting interface.
    pub card: PathBuf,
    /// Keyboard event-stream node.
    pub keyboard: PathBuf,
    /// Serial console the kernel log is pushed to while the game owns the
    /// display.
    pub game_console: PathBuf,
    /// Console restored when the game session ends.
    pub shell_console: PathBuf,
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            card: PathBuf::from("/dev/dri/card0"),
            keyboard: PathBuf::from("/dev/input/event0"),
            game_console: PathBuf::from("/dev/ttyAMA0"),
            shell_console: PathBuf::from("/dev/tty0"),
        }
    }
}

/// Game pacing and layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Side length of one grid cell, in pixels.
    pub cell_px: u32,
    /// Render tick interval in milliseconds.
    pub tick_ms: u64,
    /// Cells per second at the start of a game.
    pub base_speed: f32,
    /// Speed added per piece of food eaten.
    pub speed_gain: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cell_px: 26,
            tick_ms: 33,
            base_speed: 1.0,
            speed_gain: 0.05,
        }
    }
}

impl Config {
    fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring malformed configuration {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_target_hardware() {
        let config = Config::default();
        assert_eq!(config.devices.card, PathBuf::from("/dev/dri/card0"));
        assert_eq!(config.devices.keyboard, PathBuf::from("/dev/input/event0"));
        assert_eq!(config.game.cell_px, 26);
        assert_eq!(config.game.tick_ms, 33);
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let config: Config = serde_json::from_str(r#"{"game": {"cell_px": 13}}"#).unwrap();
        assert_eq!(config.game.cell_px, 13);
        assert_eq!(config.game.tick_ms, 33);
        assert_eq!(config.devices.card, PathBuf::from("/dev/dri/card0"));
    }
}
