//! Engine services
//!
//! `EngineContext` owns the subsystems shared by every object. It is built
//! once and passed down explicitly. `FrameContext` is the slice of it a
//! component sees while it updates.

use glam::Vec2;

use super::archetype::ObjectType;
use super::collision::CollisionSystem;
use super::factory::GameObjectFactory;
use super::object::ObjectId;
use super::pool::FixedSizeArray;
use super::tick::TickInput;
use crate::settings::EngineSettings;

/// Engine-lifetime services
#[derive(Debug)]
pub struct EngineContext {
    pub collision: CollisionSystem,
    pub factory: GameObjectFactory,
}

impl EngineContext {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            collision: CollisionSystem::new(settings.max_temporary_segments),
            factory: GameObjectFactory::new(settings),
        }
    }
}

/// What a component may touch during its update
pub struct FrameContext<'a> {
    pub collision: &'a mut CollisionSystem,
    pub input: &'a TickInput,
    /// Center of the player object, if there is one
    pub player_position: Option<Vec2>,
    pub commands: &'a mut ObjectCommands,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub kind: ObjectType,
    pub position: Vec2,
    pub flip: bool,
}

/// Spawn and destroy requests raised during a frame, applied at the manager's commit
#[derive(Debug)]
pub struct ObjectCommands {
    spawns: FixedSizeArray<SpawnRequest>,
    destroys: FixedSizeArray<ObjectId>,
}

impl ObjectCommands {
    pub fn new(capacity: usize) -> Self {
        Self {
            spawns: FixedSizeArray::new(capacity),
            destroys: FixedSizeArray::new(capacity),
        }
    }

    /// Request a spawn. Returns false (request dropped) when the queue is full.
    pub fn spawn(&mut self, kind: ObjectType, position: Vec2, flip: bool) -> bool {
        let request = SpawnRequest { kind, position, flip };
        if self.spawns.add(request).is_err() {
            log::warn!("Spawn queue full, skipping {}", kind.name());
            return false;
        }
        true
    }

    /// Request destruction. Repeated requests for one object collapse into one.
    pub fn destroy(&mut self, id: ObjectId) {
        if self.destroys.iter().any(|queued| *queued == id) {
            return;
        }
        if self.destroys.add(id).is_err() {
            log::warn!("Destroy queue full, object {:?} survives this frame", id);
        }
    }

    pub fn spawns(&self) -> impl Iterator<Item = &SpawnRequest> {
        self.spawns.iter()
    }

    pub fn destroys(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.destroys.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.spawns.is_empty() && self.destroys.is_empty()
    }

    pub(crate) fn take_spawns(&mut self) -> std::vec::Drain<'_, SpawnRequest> {
        self.spawns.drain()
    }

    pub(crate) fn take_destroys(&mut self) -> std::vec::Drain<'_, ObjectId> {
        self.destroys.drain()
    }

    pub fn clear(&mut self) {
        self.spawns.clear();
        self.destroys.clear();
    }
}
