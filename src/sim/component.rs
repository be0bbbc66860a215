//! Component contract and the closed set of component kinds
//!
//! Every component type implements `Component` and is wrapped by a variant of
//! `AnyComponent`. Pools, game objects and the update loop only ever see
//! `AnyComponent`, so dispatch is a `match` rather than runtime type lookup.

use serde::{Deserialize, Serialize};

use super::components::{
    AnimationComponent, BackgroundCollisionComponent, GravityComponent, LifetimeComponent,
    PatrolComponent, PhysicsComponent, PlayerInputComponent, SolidSurfaceComponent,
};
use super::context::FrameContext;
use super::object::GameObject;
use super::pool::Poolable;

/// Per-frame execution order. Within a frame every component of one phase, across
/// all active objects, runs before any component of the next phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Input,
    Think,
    Movement,
    Physics,
    CollisionDetection,
    PostCollision,
    RenderPrep,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Input,
        Phase::Think,
        Phase::Movement,
        Phase::Physics,
        Phase::CollisionDetection,
        Phase::PostCollision,
        Phase::RenderPrep,
    ];
}

/// Tag for each component type; the key of the component pool registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    PlayerInput,
    Patrol,
    Gravity,
    Physics,
    BackgroundCollision,
    SolidSurface,
    Lifetime,
    Animation,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 8] = [
        ComponentKind::PlayerInput,
        ComponentKind::Patrol,
        ComponentKind::Gravity,
        ComponentKind::Physics,
        ComponentKind::BackgroundCollision,
        ComponentKind::SolidSurface,
        ComponentKind::Lifetime,
        ComponentKind::Animation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::PlayerInput => "player_input",
            ComponentKind::Patrol => "patrol",
            ComponentKind::Gravity => "gravity",
            ComponentKind::Physics => "physics",
            ComponentKind::BackgroundCollision => "background_collision",
            ComponentKind::SolidSurface => "solid_surface",
            ComponentKind::Lifetime => "lifetime",
            ComponentKind::Animation => "animation",
        }
    }

    /// Per-level budget used when settings do not override it
    pub fn default_capacity(self) -> usize {
        match self {
            ComponentKind::PlayerInput => 1,
            ComponentKind::Patrol => 64,
            ComponentKind::SolidSurface => 32,
            ComponentKind::Gravity
            | ComponentKind::Physics
            | ComponentKind::BackgroundCollision
            | ComponentKind::Lifetime
            | ComponentKind::Animation => 256,
        }
    }
}

/// The update/reset contract shared by every component type
pub trait Component: Sized {
    const KIND: ComponentKind;
    const PHASE: Phase;

    /// Advance one frame. Structural changes to `parent` (adding/removing
    /// components) are buffered until its next commit.
    ///
    /// The parent's component list is detached while its components run, so
    /// `parent.find`, `find_by_kind` and `component_count` see nothing here.
    fn update(&mut self, dt: f32, parent: &mut GameObject, frame: &mut FrameContext<'_>);

    /// Return to the freshly-pooled state
    fn reset(&mut self);

    fn downcast_ref(any: &AnyComponent) -> Option<&Self>;

    fn downcast_mut(any: &mut AnyComponent) -> Option<&mut Self>;
}

/// Closed set of every component the engine knows about
#[derive(Debug, Clone)]
pub enum AnyComponent {
    PlayerInput(PlayerInputComponent),
    Patrol(PatrolComponent),
    Gravity(GravityComponent),
    Physics(PhysicsComponent),
    BackgroundCollision(BackgroundCollisionComponent),
    SolidSurface(SolidSurfaceComponent),
    Lifetime(LifetimeComponent),
    Animation(AnimationComponent),
}

impl AnyComponent {
    /// Freshly built component of the given kind (pool fill)
    pub fn new(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::PlayerInput => Self::PlayerInput(PlayerInputComponent::default()),
            ComponentKind::Patrol => Self::Patrol(PatrolComponent::default()),
            ComponentKind::Gravity => Self::Gravity(GravityComponent::default()),
            ComponentKind::Physics => Self::Physics(PhysicsComponent::default()),
            ComponentKind::BackgroundCollision => {
                Self::BackgroundCollision(BackgroundCollisionComponent::default())
            }
            ComponentKind::SolidSurface => Self::SolidSurface(SolidSurfaceComponent::default()),
            ComponentKind::Lifetime => Self::Lifetime(LifetimeComponent::default()),
            ComponentKind::Animation => Self::Animation(AnimationComponent::default()),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::PlayerInput(_) => PlayerInputComponent::KIND,
            Self::Patrol(_) => PatrolComponent::KIND,
            Self::Gravity(_) => GravityComponent::KIND,
            Self::Physics(_) => PhysicsComponent::KIND,
            Self::BackgroundCollision(_) => BackgroundCollisionComponent::KIND,
            Self::SolidSurface(_) => SolidSurfaceComponent::KIND,
            Self::Lifetime(_) => LifetimeComponent::KIND,
            Self::Animation(_) => AnimationComponent::KIND,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Self::PlayerInput(_) => PlayerInputComponent::PHASE,
            Self::Patrol(_) => PatrolComponent::PHASE,
            Self::Gravity(_) => GravityComponent::PHASE,
            Self::Physics(_) => PhysicsComponent::PHASE,
            Self::BackgroundCollision(_) => BackgroundCollisionComponent::PHASE,
            Self::SolidSurface(_) => SolidSurfaceComponent::PHASE,
            Self::Lifetime(_) => LifetimeComponent::PHASE,
            Self::Animation(_) => AnimationComponent::PHASE,
        }
    }

    pub fn update(&mut self, dt: f32, parent: &mut GameObject, frame: &mut FrameContext<'_>) {
        match self {
            Self::PlayerInput(c) => c.update(dt, parent, frame),
            Self::Patrol(c) => c.update(dt, parent, frame),
            Self::Gravity(c) => c.update(dt, parent, frame),
            Self::Physics(c) => c.update(dt, parent, frame),
            Self::BackgroundCollision(c) => c.update(dt, parent, frame),
            Self::SolidSurface(c) => c.update(dt, parent, frame),
            Self::Lifetime(c) => c.update(dt, parent, frame),
            Self::Animation(c) => c.update(dt, parent, frame),
        }
    }
}

impl Poolable for AnyComponent {
    fn reset(&mut self) {
        match self {
            Self::PlayerInput(c) => c.reset(),
            Self::Patrol(c) => c.reset(),
            Self::Gravity(c) => c.reset(),
            Self::Physics(c) => c.reset(),
            Self::BackgroundCollision(c) => c.reset(),
            Self::SolidSurface(c) => c.reset(),
            Self::Lifetime(c) => c.reset(),
            Self::Animation(c) => c.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_are_ordered() {
        let mut sorted = Phase::ALL;
        sorted.sort();
        assert_eq!(sorted, Phase::ALL);
        assert!(Phase::Input < Phase::Physics);
        assert!(Phase::Physics < Phase::CollisionDetection);
    }

    #[test]
    fn test_new_component_matches_kind() {
        for kind in ComponentKind::ALL {
            let component = AnyComponent::new(kind);
            assert_eq!(component.kind(), kind);
        }
    }

    #[test]
    fn test_phase_per_kind() {
        assert_eq!(AnyComponent::new(ComponentKind::PlayerInput).phase(), Phase::Input);
        assert_eq!(AnyComponent::new(ComponentKind::Patrol).phase(), Phase::Think);
        assert_eq!(AnyComponent::new(ComponentKind::Gravity).phase(), Phase::Movement);
        assert_eq!(AnyComponent::new(ComponentKind::Physics).phase(), Phase::Physics);
        assert_eq!(
            AnyComponent::new(ComponentKind::BackgroundCollision).phase(),
            Phase::CollisionDetection
        );
        assert_eq!(AnyComponent::new(ComponentKind::Lifetime).phase(), Phase::PostCollision);
        assert_eq!(AnyComponent::new(ComponentKind::Animation).phase(), Phase::RenderPrep);
    }

    #[test]
    fn test_downcast() {
        let mut any = AnyComponent::new(ComponentKind::Physics);
        assert!(PhysicsComponent::downcast_ref(&any).is_some());
        assert!(GravityComponent::downcast_ref(&any).is_none());
        PhysicsComponent::downcast_mut(&mut any).unwrap().max_speed.x = 99.0;
        assert_eq!(PhysicsComponent::downcast_ref(&any).unwrap().max_speed.x, 99.0);
    }
}
