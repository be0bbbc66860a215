use glam::Vec2;

use crate::sim::component::{Component, ComponentKind, Phase};
use crate::sim::context::FrameContext;
use crate::sim::object::{ActionType, GameObject};

/// Turns the frame's input into a target velocity and jump impulses
#[derive(Debug, Clone)]
pub struct PlayerInputComponent {
    /// Horizontal speed at full stick deflection
    pub run_speed: f32,
    /// Upward velocity change applied on jump
    pub jump_impulse: f32,
    /// How fast horizontal velocity reaches the target
    pub acceleration: f32,
}

impl Default for PlayerInputComponent {
    fn default() -> Self {
        Self {
            run_speed: 160.0,
            jump_impulse: 420.0,
            acceleration: 1200.0,
        }
    }
}

impl Component for PlayerInputComponent {
    const KIND: ComponentKind = ComponentKind::PlayerInput;
    const PHASE: Phase = Phase::Input;

    fn update(&mut self, _dt: f32, parent: &mut GameObject, frame: &mut FrameContext<'_>) {
        let move_x = frame.input.move_x.clamp(-1.0, 1.0);

        parent.target_velocity.x = move_x * self.run_speed;
        parent.acceleration.x = self.acceleration;

        if move_x != 0.0 {
            parent.facing_direction = Vec2::new(move_x.signum(), 0.0);
            parent.current_action = ActionType::Move;
        } else {
            parent.current_action = ActionType::Idle;
        }

        // Ground contact is from last frame's collision pass
        if frame.input.jump && parent.touching_ground {
            parent.impulse.y += self.jump_impulse;
            parent.touching_ground = false;
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    super::downcasts!(PlayerInput);
}
