//! Persistent Settings Management
//!
//! Handles saving/loading the last-used monitoring state to disk.
//!
//! # Storage Locations
//! - Linux: `~/.config/micmonitor/config.json`
//! - Windows: `%APPDATA%\micmon\MicMonitor\config\config.json`
//! - macOS: `~/Library/Application Support/com.micmon.MicMonitor/config.json`

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use micmon_platform::AudioBackend;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{clamp_volume, EngineConfig, DEFAULT_VOLUME};
use crate::engine::AudioEngine;
use crate::error::{EngineError, EngineResult};
use crate::latency::{clamp_latency, DEFAULT_LATENCY_MS};

const CONFIG_FILE: &str = "config.json";

/// Last-used monitoring state
///
/// Keys missing from the file take their individual defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub volume: i32,
    pub latency_ms: i32,
    pub monitoring_enabled: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME as i32,
            latency_ms: DEFAULT_LATENCY_MS as i32,
            monitoring_enabled: false,
        }
    }
}

impl MonitorSettings {
    /// Load settings from the platform config dir, or defaults if missing/corrupt
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("Could not determine settings directory; using defaults");
                Self::default()
            }
        }
    }

    /// Load settings from `path`, or defaults if missing/corrupt
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings at {:?}; using defaults", path);
            return Self::default();
        }

        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Failed to open settings file {:?}: {}", path, e);
                return Self::default();
            }
        };

        match serde_json::from_reader::<_, Self>(file) {
            Ok(settings) => {
                info!("Settings loaded from {:?}", path);
                settings.clamped()
            }
            Err(e) => {
                warn!("Failed to parse settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save settings to the platform config dir
    pub fn save(&self) -> EngineResult<PathBuf> {
        let path = Self::config_path().ok_or(EngineError::NoSettingsDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> EngineResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;

        info!("Settings saved to {:?}", path);
        Ok(())
    }

    /// Snapshot the engine's current state
    pub fn capture<B: AudioBackend>(engine: &AudioEngine<B>) -> Self {
        Self {
            volume: engine.volume() as i32,
            latency_ms: engine.latency_ms() as i32,
            monitoring_enabled: engine.is_running(),
        }
    }

    /// Copy with volume and latency clamped to their domains
    pub fn clamped(self) -> Self {
        Self {
            volume: clamp_volume(self.volume) as i32,
            latency_ms: clamp_latency(self.latency_ms) as i32,
            ..self
        }
    }

    /// Get the platform-specific configuration file path
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "micmon", "MicMonitor")
            .map(|proj| proj.config_dir().join(CONFIG_FILE))
    }
}

impl From<&MonitorSettings> for EngineConfig {
    fn from(settings: &MonitorSettings) -> Self {
        EngineConfig::new(settings.volume, settings.latency_ms)
    }
}
