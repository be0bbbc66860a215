//! Tilestep - 2D platformer simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tile collision, pooled objects, phased update)
//! - `settings`: Pool budgets and tuning loaded from JSON
//! - `runner`: Simulation thread with cooperative shutdown
//! - `telemetry`: Fire-and-forget reporting thread

pub mod runner;
pub mod settings;
pub mod sim;
pub mod telemetry;

pub use settings::{EngineSettings, SettingsError};

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// First byte of every collision tile data stream
    pub const COLLISION_SIGNATURE: u8 = 52;
    /// Tile edge length in world units
    pub const DEFAULT_TILE_SIZE: f32 = 32.0;

    /// Pool budgets
    pub const MAX_GAME_OBJECTS: usize = 384;
    pub const MAX_COMPONENTS_PER_OBJECT: usize = 8;
    pub const MAX_TEMPORARY_SEGMENTS: usize = 256;

    /// Vertical gravity, world units/s² (negative is down)
    pub const DEFAULT_GRAVITY: f32 = -900.0;
    /// Objects farther than this from the focal point stop updating
    pub const DEFAULT_ACTIVATION_RADIUS: f32 = 640.0;
}

/// Move `current` toward `target` by at most `max_delta`
#[inline]
pub fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
    if current < target {
        (current + max_delta).min(target)
    } else {
        (current - max_delta).max(target)
    }
}
