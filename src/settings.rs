use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Returns the path to the settings file: `~/.config/mictap/settings.json`
fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("mictap");
    path.push("settings.json");
    path
}

/// Persisted application settings.
///
/// Serialized as JSON to the platform config directory.
/// Fields use `#[serde(default)]` so that adding new settings
/// won't break existing config files.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Index into the enumerated input devices
    pub device: usize,

    /// Hand-off ring capacity in samples
    pub ring_capacity: usize,

    /// How often the writer thread drains the ring
    pub poll_interval_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            device: 0,
            // One second at 48 kHz mono
            ring_capacity: 48_000,
            poll_interval_ms: 10,
        }
    }
}

impl AppSettings {
    /// Load settings from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        let path = settings_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Failed to parse settings ({}), using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                log::info!("No settings file found ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to disk as pretty JSON.
    pub fn save(&self) {
        let path = settings_path();
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("Failed to create config directory: {}", e);
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    log::warn!("Failed to write settings: {}", e);
                }
            }
            Err(e) => {
                log::warn!("Failed to serialize settings: {}", e);
            }
        }
    }
}
