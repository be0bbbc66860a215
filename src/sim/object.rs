//! Game objects
//!
//! A game object is shared simulation state (position, velocity, life...) plus
//! an ordered list of components. Adding or removing components is buffered
//! and only applied by `commit_updates`, so a component may restructure its
//! own object while the update loop is running.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::archetype::ObjectType;
use super::component::{AnyComponent, Component, ComponentKind, Phase};
use super::context::FrameContext;
use super::geometry::Aabb;
use super::pool::{FixedSizeArray, Poolable};
use super::registry::ComponentPools;
use crate::consts::MAX_COMPONENTS_PER_OBJECT;

/// Stable identifier handed out by the factory. Never reused within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Team {
    #[default]
    None,
    Player,
    Enemy,
}

/// Kind of the last hit an object received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HitType {
    #[default]
    Invalid,
    Hit,
    Death,
    Deflect,
}

/// Current discrete action (drives animation selection)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActionType {
    #[default]
    Invalid,
    Idle,
    Move,
    Attack,
    HitReact,
    Death,
    Frozen,
}

/// How far from the focal point an object keeps updating
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ActivationRadius {
    /// Updates regardless of distance
    #[default]
    Always,
    /// Updates only while its center is within this distance of the focal point
    Within(f32),
}

enum PendingChange {
    Add(AnyComponent),
    Remove(ComponentKind),
    RemoveAll,
}

/// One simulated actor
pub struct GameObject {
    id: ObjectId,
    pub object_type: Option<ObjectType>,

    /// Bottom-left corner in world units
    pub position: Vec2,
    pub velocity: Vec2,
    pub target_velocity: Vec2,
    /// Rate at which velocity approaches `target_velocity` (per axis, 0 = no approach)
    pub acceleration: Vec2,
    /// Velocity change applied once by the next physics step
    pub impulse: Vec2,
    pub width: f32,
    pub height: f32,
    pub facing_direction: Vec2,

    pub team: Team,
    pub life: i32,
    pub last_received_hit_type: HitType,
    pub current_action: ActionType,

    pub activation_radius: ActivationRadius,
    pub destroy_on_deactivation: bool,

    // Background collision results from the latest frame
    pub touching_ground: bool,
    pub touching_ceiling: bool,
    pub touching_left_wall: bool,
    pub touching_right_wall: bool,

    /// Frame picked by render prep for the renderer
    pub render_frame: u16,

    active: bool,
    components: FixedSizeArray<AnyComponent>,
    pending: Vec<PendingChange>,
}

impl GameObject {
    pub fn new() -> Self {
        Self::with_storage(
            FixedSizeArray::new(MAX_COMPONENTS_PER_OBJECT),
            Vec::with_capacity(MAX_COMPONENTS_PER_OBJECT * 2),
        )
    }

    fn with_storage(components: FixedSizeArray<AnyComponent>, pending: Vec<PendingChange>) -> Self {
        Self {
            id: ObjectId::default(),
            object_type: None,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            target_velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            impulse: Vec2::ZERO,
            width: 0.0,
            height: 0.0,
            facing_direction: Vec2::X,
            team: Team::None,
            life: 1,
            last_received_hit_type: HitType::Invalid,
            current_action: ActionType::Invalid,
            activation_radius: ActivationRadius::Always,
            destroy_on_deactivation: false,
            touching_ground: false,
            touching_ceiling: false,
            touching_left_wall: false,
            touching_right_wall: false,
            render_frame: 0,
            active: true,
            components,
            pending,
        }
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ObjectId) {
        self.id = id;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_position(self.position, self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.position + Vec2::new(self.width, self.height) * 0.5
    }

    /// Queue a component for attachment at the next commit
    pub fn add(&mut self, component: AnyComponent) {
        self.pending.push(PendingChange::Add(component));
    }

    /// Queue removal of the first component of `kind` at the next commit
    pub fn remove(&mut self, kind: ComponentKind) {
        self.pending.push(PendingChange::Remove(kind));
    }

    /// Queue removal of every component at the next commit
    pub fn remove_all(&mut self) {
        self.pending.push(PendingChange::RemoveAll);
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Apply buffered add/remove operations in call order.
    /// Removed components go back to their pools.
    pub fn commit_updates(&mut self, pools: &mut ComponentPools) {
        for change in self.pending.drain(..) {
            match change {
                PendingChange::Add(component) => {
                    if let Err(component) = self.components.add(component) {
                        log::error!(
                            "Object {:?}: component list full, dropping {}",
                            self.id,
                            component.kind().name()
                        );
                        pools.release(component);
                    }
                }
                PendingChange::Remove(kind) => {
                    let removed = self
                        .components
                        .find(|c| c.kind() == kind)
                        .and_then(|index| self.components.remove(index));
                    if let Some(component) = removed {
                        pools.release(component);
                    }
                }
                PendingChange::RemoveAll => {
                    for component in self.components.drain() {
                        pools.release(component);
                    }
                }
            }
        }
    }

    /// Return every live and queued component to its pool (object teardown)
    pub fn release_components(&mut self, pools: &mut ComponentPools) {
        for component in self.components.drain() {
            pools.release(component);
        }
        for change in self.pending.drain(..) {
            if let PendingChange::Add(component) = change {
                pools.release(component);
            }
        }
    }

    /// First attached component of `kind` (linear search)
    pub fn find_by_kind(&self, kind: ComponentKind) -> Option<&AnyComponent> {
        self.components.iter().find(|c| c.kind() == kind)
    }

    /// First attached component of type `C`
    pub fn find<C: Component>(&self) -> Option<&C> {
        self.components.iter().find_map(C::downcast_ref)
    }

    pub fn find_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.components.iter_mut().find_map(C::downcast_mut)
    }

    pub fn components(&self) -> impl Iterator<Item = &AnyComponent> {
        self.components.iter()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Run every component belonging to `phase`, in attachment order.
    ///
    /// The live list is detached for the duration so components can take the
    /// parent mutably; it holds no allocation while detached.
    pub(crate) fn update_phase(&mut self, phase: Phase, dt: f32, frame: &mut FrameContext<'_>) {
        if !self.components.iter().any(|c| c.phase() == phase) {
            return;
        }
        let mut components = std::mem::take(&mut self.components);
        for component in components.iter_mut().filter(|c| c.phase() == phase) {
            component.update(dt, self, frame);
        }
        self.components = components;
    }
}

impl Default for GameObject {
    fn default() -> Self {
        Self::new()
    }
}

impl Poolable for GameObject {
    /// Clears object-level state only. Components must already have been
    /// released by the factory.
    fn reset(&mut self) {
        if !self.components.is_empty() || !self.pending.is_empty() {
            log::warn!(
                "Object {:?} reset with {} components still attached",
                self.id,
                self.components.len()
            );
            self.components.clear();
            self.pending.clear();
        }
        let components = std::mem::take(&mut self.components);
        let pending = std::mem::take(&mut self.pending);
        *self = Self::with_storage(components, pending);
    }
}

impl std::fmt::Debug for GameObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameObject")
            .field("id", &self.id)
            .field("object_type", &self.object_type)
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("life", &self.life)
            .field("action", &self.current_action)
            .field("active", &self.active)
            .field("components", &self.components.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::components::{GravityComponent, PhysicsComponent};

    fn pools() -> ComponentPools {
        ComponentPools::new(|_| 4, false)
    }

    #[test]
    fn test_add_is_invisible_until_commit() {
        let mut pools = pools();
        let mut object = GameObject::new();
        object.add(pools.allocate(ComponentKind::Physics).unwrap());

        assert_eq!(object.component_count(), 0);
        assert!(object.find::<PhysicsComponent>().is_none());
        assert!(object.has_pending_changes());

        object.commit_updates(&mut pools);
        assert_eq!(object.component_count(), 1);
        assert!(object.find::<PhysicsComponent>().is_some());
        assert!(!object.has_pending_changes());
    }

    #[test]
    fn test_remove_is_invisible_until_commit() {
        let mut pools = pools();
        let mut object = GameObject::new();
        object.add(pools.allocate(ComponentKind::Gravity).unwrap());
        object.commit_updates(&mut pools);

        object.remove(ComponentKind::Gravity);
        assert!(object.find_by_kind(ComponentKind::Gravity).is_some());
        object.commit_updates(&mut pools);
        assert!(object.find_by_kind(ComponentKind::Gravity).is_none());
        assert_eq!(pools.allocated_count(ComponentKind::Gravity), 0);
    }

    #[test]
    fn test_commit_applies_changes_in_call_order() {
        let mut pools = pools();
        let mut object = GameObject::new();
        object.add(pools.allocate(ComponentKind::Gravity).unwrap());
        object.add(pools.allocate(ComponentKind::Physics).unwrap());
        object.remove_all();
        object.add(pools.allocate(ComponentKind::Lifetime).unwrap());
        object.remove(ComponentKind::Gravity); // nothing to remove at this point
        object.commit_updates(&mut pools);

        let kinds: Vec<_> = object.components().map(AnyComponent::kind).collect();
        assert_eq!(kinds, vec![ComponentKind::Lifetime]);
        assert_eq!(pools.allocated_count(ComponentKind::Gravity), 0);
        assert_eq!(pools.allocated_count(ComponentKind::Physics), 0);
        assert_eq!(pools.allocated_count(ComponentKind::Lifetime), 1);
    }

    #[test]
    fn test_remove_takes_first_of_kind() {
        let mut pools = pools();
        let mut object = GameObject::new();
        object.add(pools.allocate_as::<GravityComponent>(|g| g.gravity.y = -1.0).unwrap());
        object.add(pools.allocate_as::<GravityComponent>(|g| g.gravity.y = -2.0).unwrap());
        object.commit_updates(&mut pools);

        object.remove(ComponentKind::Gravity);
        object.commit_updates(&mut pools);
        assert_eq!(object.find::<GravityComponent>().unwrap().gravity.y, -2.0);
    }

    #[test]
    fn test_release_components_returns_everything() {
        let mut pools = pools();
        let mut object = GameObject::new();
        object.add(pools.allocate(ComponentKind::Gravity).unwrap());
        object.commit_updates(&mut pools);
        object.add(pools.allocate(ComponentKind::Physics).unwrap());

        object.release_components(&mut pools);
        assert_eq!(pools.total_allocated(), 0);
        assert_eq!(object.component_count(), 0);
    }

    #[test]
    fn test_update_phase_runs_only_that_phase_and_restores_components() {
        let mut pools = pools();
        let mut harness = crate::sim::components::test_support::Harness::new();
        let mut object = GameObject::new();
        object.add(pools.allocate_as::<PhysicsComponent>(|_| {}).unwrap());
        object.add(pools.allocate_as::<GravityComponent>(|g| g.gravity = Vec2::new(0.0, -6.0)).unwrap());
        object.commit_updates(&mut pools);

        object.update_phase(Phase::Movement, 0.5, &mut harness.frame());
        assert_eq!(object.impulse, Vec2::new(0.0, -3.0));
        assert_eq!(object.velocity, Vec2::ZERO);
        assert_eq!(object.component_count(), 2);

        object.update_phase(Phase::Physics, 0.5, &mut harness.frame());
        assert_eq!(object.velocity, Vec2::new(0.0, -3.0));
        let kinds: Vec<_> = object.components().map(AnyComponent::kind).collect();
        assert_eq!(kinds, vec![ComponentKind::Physics, ComponentKind::Gravity]);
    }

    #[test]
    fn test_reset_clears_object_state() {
        let mut object = GameObject::new();
        object.set_id(ObjectId(9));
        object.position = Vec2::new(5.0, 6.0);
        object.life = 0;
        object.team = Team::Enemy;
        object.touching_ground = true;
        object.reset();

        assert_eq!(object.id(), ObjectId(0));
        assert_eq!(object.position, Vec2::ZERO);
        assert_eq!(object.life, 1);
        assert_eq!(object.team, Team::None);
        assert!(!object.touching_ground);
    }

    #[test]
    fn test_bounds_and_center() {
        let mut object = GameObject::new();
        object.position = Vec2::new(10.0, 20.0);
        object.width = 4.0;
        object.height = 8.0;
        assert_eq!(object.center(), Vec2::new(12.0, 24.0));
        assert_eq!(object.bounds().top(), 28.0);
    }
}
