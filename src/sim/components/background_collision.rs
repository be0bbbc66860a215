//! Collision response against the static world and temporary surfaces
//!
//! Each frame the object's movement since last frame is swept one axis at a
//! time with rays from the center of the box to its leading edge. A thin box
//! probe under the feet then catches ground contact when the object did not
//! move into the ground this frame (resting on a platform, for example).

use glam::Vec2;

use crate::sim::archetype::ObjectType;
use crate::sim::collision::HitPoint;
use crate::sim::component::{Component, ComponentKind, Phase};
use crate::sim::context::FrameContext;
use crate::sim::geometry::Aabb;
use crate::sim::object::GameObject;
use crate::sim::pool::FixedSizeArray;

const MAX_PROBE_HITS: usize = 8;
/// Half height of the ground probe box
const GROUND_PROBE_DEPTH: f32 = 1.0;
/// Horizontal inset of the ground probe so walls don't count as ground
const GROUND_PROBE_INSET: f32 = 2.0;
/// Surfaces steeper than this are walls, not floors
const WALKABLE_NORMAL_Y: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct BackgroundCollisionComponent {
    previous_position: Option<Vec2>,
    hits: FixedSizeArray<HitPoint>,
    /// Falling faster than this when landing requests a dust effect
    pub landing_effect_speed: Option<f32>,
}

impl Default for BackgroundCollisionComponent {
    fn default() -> Self {
        Self {
            previous_position: None,
            hits: FixedSizeArray::new(MAX_PROBE_HITS),
            landing_effect_speed: None,
        }
    }
}

impl BackgroundCollisionComponent {
    fn resolve_horizontal(&self, parent: &mut GameObject, previous: Vec2, frame: &mut FrameContext<'_>) {
        let delta = parent.position.x - previous.x;
        if delta == 0.0 {
            return;
        }
        let direction = Vec2::new(delta.signum(), 0.0);
        let mid_y = parent.position.y + parent.height * 0.5;
        let start = Vec2::new(previous.x + parent.width * 0.5, mid_y);
        let leading_x = if delta > 0.0 {
            parent.position.x + parent.width
        } else {
            parent.position.x
        };

        let hit = frame.collision.cast_ray(
            start,
            Vec2::new(leading_x, mid_y),
            Some(direction),
            Some(parent.id()),
        );
        // Walkable slopes are resolved by the vertical pass
        let Some(hit) = hit.filter(|h| h.normal.y.abs() < WALKABLE_NORMAL_Y) else {
            return;
        };

        if delta > 0.0 {
            parent.position.x = hit.point.x - parent.width;
            parent.touching_right_wall = true;
            parent.velocity.x = parent.velocity.x.min(0.0);
        } else {
            parent.position.x = hit.point.x;
            parent.touching_left_wall = true;
            parent.velocity.x = parent.velocity.x.max(0.0);
        }
    }

    fn resolve_vertical(&self, parent: &mut GameObject, previous: Vec2, frame: &mut FrameContext<'_>) {
        let delta = parent.position.y - previous.y;
        if delta == 0.0 {
            return;
        }
        let direction = Vec2::new(0.0, delta.signum());
        let mid_x = parent.position.x + parent.width * 0.5;
        let start = Vec2::new(mid_x, previous.y + parent.height * 0.5);
        let leading_y = if delta > 0.0 {
            parent.position.y + parent.height
        } else {
            parent.position.y
        };

        let Some(hit) = frame.collision.cast_ray(
            start,
            Vec2::new(mid_x, leading_y),
            Some(direction),
            Some(parent.id()),
        ) else {
            return;
        };

        if delta > 0.0 {
            parent.position.y = hit.point.y - parent.height;
            parent.touching_ceiling = true;
            parent.velocity.y = parent.velocity.y.min(0.0);
        } else {
            parent.position.y = hit.point.y;
            parent.touching_ground = true;
            parent.velocity.y = parent.velocity.y.max(0.0);
        }
    }

    fn probe_ground(&mut self, parent: &GameObject, frame: &FrameContext<'_>) -> bool {
        let inset = GROUND_PROBE_INSET.min(parent.width * 0.25);
        let probe = Aabb::from_edges(
            parent.position.x + inset,
            parent.position.x + parent.width - inset,
            parent.position.y + GROUND_PROBE_DEPTH,
            parent.position.y - GROUND_PROBE_DEPTH,
        );
        self.hits.clear();
        frame
            .collision
            .test_box(&probe, Some(Vec2::NEG_Y), &mut self.hits, Some(parent.id()), false);
        self.hits.iter().any(|h| h.normal.y >= WALKABLE_NORMAL_Y)
    }
}

impl Component for BackgroundCollisionComponent {
    const KIND: ComponentKind = ComponentKind::BackgroundCollision;
    const PHASE: Phase = Phase::CollisionDetection;

    fn update(&mut self, _dt: f32, parent: &mut GameObject, frame: &mut FrameContext<'_>) {
        let was_grounded = parent.touching_ground;
        let fall_speed = -parent.velocity.y;

        parent.touching_ground = false;
        parent.touching_ceiling = false;
        parent.touching_left_wall = false;
        parent.touching_right_wall = false;

        let previous = self.previous_position.unwrap_or(parent.position);
        self.resolve_horizontal(parent, previous, frame);
        self.resolve_vertical(parent, previous, frame);

        if !parent.touching_ground && parent.velocity.y <= 0.0 {
            parent.touching_ground = self.probe_ground(parent, frame);
        }

        let hard_landing = self.landing_effect_speed.is_some_and(|speed| fall_speed > speed);
        if parent.touching_ground && !was_grounded && hard_landing {
            let feet = Vec2::new(parent.position.x + parent.width * 0.5, parent.position.y);
            frame.commands.spawn(ObjectType::Dust, feet, false);
        }

        self.previous_position = Some(parent.position);
    }

    fn reset(&mut self) {
        self.previous_position = None;
        self.hits.clear();
        self.landing_effect_speed = None;
    }

    super::downcasts!(BackgroundCollision);
}
