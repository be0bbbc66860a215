//! Built-in components, one per execution phase or more

mod animation;
mod background_collision;
mod lifetime;
mod patrol;
mod physics;
mod player;
mod solid_surface;

pub use animation::AnimationComponent;
pub use background_collision::BackgroundCollisionComponent;
pub use lifetime::{LifeState, LifetimeComponent};
pub use patrol::PatrolComponent;
pub use physics::{GravityComponent, PhysicsComponent};
pub use player::PlayerInputComponent;
pub use solid_surface::SolidSurfaceComponent;

/// Implements the `AnyComponent` downcasts for a component type
macro_rules! downcasts {
    ($variant:ident) => {
        fn downcast_ref(any: &$crate::sim::component::AnyComponent) -> Option<&Self> {
            match any {
                $crate::sim::component::AnyComponent::$variant(c) => Some(c),
                _ => None,
            }
        }

        fn downcast_mut(any: &mut $crate::sim::component::AnyComponent) -> Option<&mut Self> {
            match any {
                $crate::sim::component::AnyComponent::$variant(c) => Some(c),
                _ => None,
            }
        }
    };
}

pub(crate) use downcasts;
