//! Object construction and teardown
//!
//! The factory is the only place objects and components are allocated or
//! released. Spawns either fully succeed or leave every pool as it was.

use glam::Vec2;

use super::archetype::{ArchetypeTable, ObjectType};
use super::component::ComponentKind;
use super::components::{
    AnimationComponent, BackgroundCollisionComponent, GravityComponent, LifetimeComponent,
    PatrolComponent, PhysicsComponent, PlayerInputComponent, SolidSurfaceComponent,
};
use super::object::{ActionType, ActivationRadius, GameObject, ObjectId, Team};
use super::pool::{ObjectPool, PoolError};
use super::registry::ComponentPools;
use crate::settings::EngineSettings;

/// Objects below this line are out of the level
const KILL_PLANE: f32 = -64.0;

/// Leaks found by `GameObjectFactory::sanity_check`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeakReport {
    pub objects: usize,
    pub components: Vec<(ComponentKind, usize)>,
}

impl LeakReport {
    pub fn is_clean(&self) -> bool {
        self.objects == 0 && self.components.is_empty()
    }
}

#[derive(Debug)]
pub struct GameObjectFactory {
    objects: ObjectPool<GameObject>,
    components: ComponentPools,
    archetypes: ArchetypeTable,
    next_id: u32,
    gravity: f32,
    activation_radius: f32,
}

impl GameObjectFactory {
    pub fn new(settings: &EngineSettings) -> Self {
        let mut objects = ObjectPool::new("game_objects", settings.max_game_objects, GameObject::new);
        objects.set_fatal_on_exhaustion(settings.fatal_pool_exhaustion);
        Self {
            objects,
            components: ComponentPools::from_settings(settings),
            archetypes: ArchetypeTable::new(),
            next_id: 1,
            gravity: settings.gravity,
            activation_radius: settings.activation_radius,
        }
    }

    pub fn components_mut(&mut self) -> &mut ComponentPools {
        &mut self.components
    }

    pub fn components(&self) -> &ComponentPools {
        &self.components
    }

    pub fn archetypes(&self) -> &ArchetypeTable {
        &self.archetypes
    }

    pub fn live_objects(&self) -> usize {
        self.objects.allocated_count()
    }

    /// Build a `kind` object with its bottom-left corner at `position`.
    /// `flip` starts it facing left.
    ///
    /// On pool exhaustion nothing stays allocated and the error is returned;
    /// callers spawning optional effects just skip them.
    pub fn spawn(&mut self, kind: ObjectType, position: Vec2, flip: bool) -> Result<GameObject, PoolError> {
        let mut object = self.objects.allocate()?;

        object.set_id(ObjectId(self.next_id));
        self.next_id = self.next_id.wrapping_add(1);
        object.object_type = Some(kind);
        object.position = position;
        let size = kind.size();
        object.width = size.x;
        object.height = size.y;
        object.facing_direction = if flip { Vec2::NEG_X } else { Vec2::X };

        if let Err(err) = self.attach_components(kind, &mut object) {
            object.release_components(&mut self.components);
            self.objects.release(object);
            return Err(err);
        }
        object.commit_updates(&mut self.components);
        Ok(object)
    }

    fn attach_components(&mut self, kind: ObjectType, object: &mut GameObject) -> Result<(), PoolError> {
        let archetype = self.archetypes.get_or_create(kind);
        let animations = archetype.animations.clone();
        let pools = &mut self.components;
        let gravity = Vec2::new(0.0, self.gravity);

        match kind {
            ObjectType::Player => {
                object.team = Team::Player;
                object.life = 3;
                object.current_action = ActionType::Idle;
                object.activation_radius = ActivationRadius::Always;
                object.add(pools.allocate_as::<PlayerInputComponent>(|_| {})?);
                object.add(pools.allocate_as::<GravityComponent>(|g| g.gravity = gravity)?);
                object.add(pools.allocate_as::<PhysicsComponent>(|_| {})?);
                object.add(pools.allocate_as::<BackgroundCollisionComponent>(|c| {
                    c.landing_effect_speed = Some(300.0)
                })?);
                object.add(pools.allocate_as::<LifetimeComponent>(|l| {
                    l.die_below = Some(KILL_PLANE);
                    l.death_delay = 1.0;
                })?);
            }
            ObjectType::Patroller => {
                object.team = Team::Enemy;
                object.activation_radius = ActivationRadius::Within(self.activation_radius);
                object.add(pools.allocate_as::<PatrolComponent>(|p| p.chase_radius = Some(96.0))?);
                object.add(pools.allocate_as::<GravityComponent>(|g| g.gravity = gravity)?);
                object.add(pools.allocate_as::<PhysicsComponent>(|_| {})?);
                object.add(pools.allocate_as::<BackgroundCollisionComponent>(|_| {})?);
                object.add(pools.allocate_as::<LifetimeComponent>(|l| {
                    l.die_below = Some(KILL_PLANE);
                    l.death_delay = 0.5;
                })?);
            }
            ObjectType::MovingPlatform => {
                object.activation_radius = ActivationRadius::Within(self.activation_radius);
                object.add(pools.allocate_as::<PatrolComponent>(|p| {
                    p.speed = 40.0;
                    p.acceleration = 400.0;
                    p.turn_interval = Some(3.0);
                })?);
                object.add(pools.allocate_as::<PhysicsComponent>(|_| {})?);
                let surfaces = &archetype.surfaces;
                object.add(pools.allocate_as::<SolidSurfaceComponent>(|s| {
                    for seg in surfaces {
                        s.add_surface(seg.start, seg.end, seg.normal);
                    }
                })?);
            }
            ObjectType::Dust => {
                object.current_action = ActionType::Idle;
                object.activation_radius = ActivationRadius::Within(self.activation_radius);
                object.destroy_on_deactivation = true;
                object.add(pools.allocate_as::<LifetimeComponent>(|l| l.time_until_death = Some(0.4))?);
            }
        }

        object.add(pools.allocate_as::<AnimationComponent>(|a| a.set_animations(animations))?);
        Ok(())
    }

    /// Release an object's components and return it to the pool
    pub fn destroy(&mut self, mut object: GameObject) {
        object.release_components(&mut self.components);
        self.objects.release(object);
    }

    /// Drop archetype data (level teardown)
    pub fn clear_archetypes(&mut self) {
        self.archetypes.clear();
    }

    /// Outstanding objects and components. Expected to be clean between levels.
    pub fn sanity_check(&self) -> LeakReport {
        let objects = self.objects.allocated_count();
        if objects > 0 {
            if cfg!(debug_assertions) {
                log::error!("{} game objects leaked", objects);
            } else {
                log::warn!("{} game objects leaked", objects);
            }
        }
        LeakReport {
            objects,
            components: self.components.sanity_check(),
        }
    }
}
