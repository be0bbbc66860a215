//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (live-set order, phase by phase)
//! - No rendering or platform dependencies

pub mod archetype;
pub mod collision;
pub mod component;
pub mod components;
pub mod context;
pub mod factory;
pub mod geometry;
pub mod level;
pub mod manager;
pub mod object;
pub mod pool;
pub mod registry;
pub mod state;
pub mod tick;
pub mod tiles;

pub use archetype::{Animation, AnimationSet, ArchetypeTable, ObjectType};
pub use collision::{CollisionSystem, HitPoint};
pub use component::{AnyComponent, Component, ComponentKind, Phase};
pub use context::{EngineContext, FrameContext, ObjectCommands, SpawnRequest};
pub use factory::{GameObjectFactory, LeakReport};
pub use geometry::{Aabb, LineSegment};
pub use level::{
    Level, SpawnPoint, generate_level, generate_level_with_tile_size, standard_collision_tiles,
};
pub use manager::GameObjectManager;
pub use object::{ActionType, ActivationRadius, GameObject, HitType, ObjectId, Team};
pub use pool::{FixedSizeArray, ObjectPool, PoolError, Poolable};
pub use registry::ComponentPools;
pub use state::World;
pub use tick::{FrameClock, TickInput, tick};
pub use tiles::{CollisionDataError, CollisionTile, TileGrid};
