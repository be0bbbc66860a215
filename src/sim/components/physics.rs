//! Movement integration
//!
//! Gravity runs in the movement phase and only feeds the impulse accumulator;
//! physics consumes it one phase later so input and AI impulses from the same
//! frame are integrated together.

use glam::Vec2;

use crate::approach;
use crate::consts::DEFAULT_GRAVITY;
use crate::sim::component::{Component, ComponentKind, Phase};
use crate::sim::context::FrameContext;
use crate::sim::object::GameObject;

/// Constant acceleration applied as a per-frame impulse
#[derive(Debug, Clone)]
pub struct GravityComponent {
    pub gravity: Vec2,
}

impl Default for GravityComponent {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, DEFAULT_GRAVITY),
        }
    }
}

impl Component for GravityComponent {
    const KIND: ComponentKind = ComponentKind::Gravity;
    const PHASE: Phase = Phase::Movement;

    fn update(&mut self, dt: f32, parent: &mut GameObject, _frame: &mut FrameContext<'_>) {
        parent.impulse += self.gravity * dt;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    super::downcasts!(Gravity);
}

/// Velocity and position integration
#[derive(Debug, Clone)]
pub struct PhysicsComponent {
    /// Per-axis speed cap
    pub max_speed: Vec2,
}

impl Default for PhysicsComponent {
    fn default() -> Self {
        Self {
            max_speed: Vec2::new(400.0, 800.0),
        }
    }
}

impl Component for PhysicsComponent {
    const KIND: ComponentKind = ComponentKind::Physics;
    const PHASE: Phase = Phase::Physics;

    fn update(&mut self, dt: f32, parent: &mut GameObject, _frame: &mut FrameContext<'_>) {
        let mut velocity = parent.velocity + parent.impulse;
        parent.impulse = Vec2::ZERO;

        if parent.acceleration.x > 0.0 {
            velocity.x = approach(velocity.x, parent.target_velocity.x, parent.acceleration.x * dt);
        }
        if parent.acceleration.y > 0.0 {
            velocity.y = approach(velocity.y, parent.target_velocity.y, parent.acceleration.y * dt);
        }

        parent.velocity = velocity.clamp(-self.max_speed, self.max_speed);
        parent.position += parent.velocity * dt;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    super::downcasts!(Physics);
}
