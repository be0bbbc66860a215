use glam::Vec2;

use crate::sim::component::{Component, ComponentKind, Phase};
use crate::sim::context::FrameContext;
use crate::sim::object::{ActionType, GameObject};

/// Walks back and forth along the facing direction.
///
/// Turns around on wall contact, after `turn_interval` seconds when set, and
/// toward the player while the player is within `chase_radius`.
#[derive(Debug, Clone)]
pub struct PatrolComponent {
    pub speed: f32,
    pub acceleration: f32,
    pub chase_radius: Option<f32>,
    pub turn_interval: Option<f32>,
    since_turn: f32,
}

impl Default for PatrolComponent {
    fn default() -> Self {
        Self {
            speed: 60.0,
            acceleration: 600.0,
            chase_radius: None,
            turn_interval: None,
            since_turn: 0.0,
        }
    }
}

impl PatrolComponent {
    fn turn(&mut self, parent: &mut GameObject, direction: f32) {
        if parent.facing_direction.x != direction {
            parent.facing_direction = Vec2::new(direction, 0.0);
            self.since_turn = 0.0;
        }
    }
}

impl Component for PatrolComponent {
    const KIND: ComponentKind = ComponentKind::Patrol;
    const PHASE: Phase = Phase::Think;

    fn update(&mut self, dt: f32, parent: &mut GameObject, frame: &mut FrameContext<'_>) {
        self.since_turn += dt;

        if parent.facing_direction.x == 0.0 {
            parent.facing_direction = Vec2::X;
        }

        if parent.touching_left_wall {
            self.turn(parent, 1.0);
        } else if parent.touching_right_wall {
            self.turn(parent, -1.0);
        } else if self.turn_interval.is_some_and(|interval| self.since_turn >= interval) {
            let reversed = -parent.facing_direction.x.signum();
            self.turn(parent, reversed);
        }

        if let (Some(radius), Some(player)) = (self.chase_radius, frame.player_position) {
            let offset = player - parent.center();
            if offset.length_squared() <= radius * radius && offset.x.abs() > 1.0 {
                self.turn(parent, offset.x.signum());
            }
        }

        parent.target_velocity.x = parent.facing_direction.x * self.speed;
        parent.acceleration.x = self.acceleration;
        parent.current_action = ActionType::Move;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    super::downcasts!(Patrol);
}
