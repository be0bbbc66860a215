//! Engine settings
//!
//! Pool budgets and tuning values, loaded from a JSON file. Missing fields
//! fall back to their defaults so older files keep working.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{
    DEFAULT_ACTIVATION_RADIUS, DEFAULT_GRAVITY, DEFAULT_TILE_SIZE, MAX_GAME_OBJECTS,
    MAX_TEMPORARY_SEGMENTS,
};
use crate::sim::ComponentKind;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    // === Pools ===
    /// Game object pool capacity
    pub max_game_objects: usize,
    /// Per-kind component pool capacities; kinds not listed use their defaults
    pub component_pool_sizes: BTreeMap<ComponentKind, usize>,
    /// Temporary collision segments per frame
    pub max_temporary_segments: usize,
    /// Assert on pool exhaustion instead of skipping the allocation
    pub fatal_pool_exhaustion: bool,

    // === World ===
    /// Tile edge length in world units for generated levels
    pub tile_size: f32,
    /// Vertical gravity applied by gravity components (negative is down)
    pub gravity: f32,
    /// Distance from the focal point within which objects stay active
    pub activation_radius: f32,

    // === Telemetry ===
    pub telemetry: bool,
    /// Frames between telemetry snapshots
    pub telemetry_interval: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            // Pools
            max_game_objects: MAX_GAME_OBJECTS,
            component_pool_sizes: BTreeMap::new(),
            max_temporary_segments: MAX_TEMPORARY_SEGMENTS,
            fatal_pool_exhaustion: false,

            // World
            tile_size: DEFAULT_TILE_SIZE,
            gravity: DEFAULT_GRAVITY,
            activation_radius: DEFAULT_ACTIVATION_RADIUS,

            // Telemetry
            telemetry: true,
            telemetry_interval: 60,
        }
    }
}

impl EngineSettings {
    /// Pool capacity for a component kind
    pub fn component_capacity(&self, kind: ComponentKind) -> usize {
        self.component_pool_sizes
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_capacity())
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let settings = Self::from_json(&fs::read_to_string(path)?)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Load from `path`, or fall back to defaults with a warning
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Using default settings ({})", err);
                Self::default()
            }
        }
    }
}
