//! World state
//!
//! Everything one running level owns: the engine services, the live object
//! set and the frame counter. Level load and unload are the only places pools
//! and archetypes are set up or torn down.

use super::archetype::ObjectType;
use super::context::EngineContext;
use super::factory::LeakReport;
use super::level::Level;
use super::manager::GameObjectManager;
use super::object::GameObject;
use super::tiles::CollisionDataError;
use crate::settings::EngineSettings;

#[derive(Debug)]
pub struct World {
    pub context: EngineContext,
    pub manager: GameObjectManager,
    /// Ticks since the level was loaded
    pub frame: u64,
    level_loaded: bool,
}

impl World {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            context: EngineContext::new(settings),
            manager: GameObjectManager::new(settings.max_game_objects),
            frame: 0,
            level_loaded: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.level_loaded
    }

    pub fn player(&self) -> Option<&GameObject> {
        self.manager.player()
    }

    /// Load the level's collision and spawn its objects.
    ///
    /// Bad collision data leaves the level running without static collision;
    /// the error is still returned so the caller can report it.
    pub fn load_level(&mut self, level: &Level) -> Result<(), CollisionDataError> {
        if self.level_loaded {
            self.unload_level();
        }

        self.context
            .collision
            .initialize(level.grid.clone(), level.tile_size, level.tile_size);
        let collision = self.load_collision_data(&level.collision_data).map(|_| ());

        for spawn in &level.spawns {
            match self.context.factory.spawn(spawn.kind, spawn.position, spawn.flip) {
                Ok(object) => {
                    if spawn.kind == ObjectType::Player {
                        self.manager.set_player(Some(object.id()));
                    }
                    self.manager.add(object);
                }
                Err(err) => log::warn!("Level spawn of {} skipped: {}", spawn.kind.name(), err),
            }
        }
        self.manager.commit_updates(&mut self.context);

        self.frame = 0;
        self.level_loaded = true;
        log::info!(
            "Level loaded (seed {}): {} objects, player {:?}",
            level.seed,
            self.manager.len(),
            self.manager.player_id()
        );
        collision
    }

    /// Replace the static collision tile table from encoded bytes
    pub fn load_collision_data(&mut self, bytes: &[u8]) -> Result<usize, CollisionDataError> {
        self.context.collision.load_collision_tiles(bytes)
    }

    /// Destroy every object, drop per-level data and check the pools for leaks
    pub fn unload_level(&mut self) -> LeakReport {
        self.manager.destroy_all();
        self.manager.commit_updates(&mut self.context);
        self.manager.set_focus(None);
        self.context.collision.clear_temporary_surfaces();
        self.context.factory.clear_archetypes();
        self.level_loaded = false;

        let report = self.context.factory.sanity_check();
        log::info!(
            "Level unloaded after {} frames ({})",
            self.frame,
            if report.is_clean() { "no leaks" } else { "leaks detected" }
        );
        report
    }
}
