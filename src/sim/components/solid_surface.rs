use glam::Vec2;

use crate::sim::component::{Component, ComponentKind, Phase};
use crate::sim::context::FrameContext;
use crate::sim::geometry::LineSegment;
use crate::sim::object::GameObject;
use crate::sim::pool::FixedSizeArray;

const MAX_SURFACES: usize = 4;

/// Makes its owner solid by re-registering surfaces every frame.
///
/// Surfaces are relative to the owner's position and submitted as temporary
/// segments owned by the parent, so the parent never collides with itself.
#[derive(Debug, Clone)]
pub struct SolidSurfaceComponent {
    surfaces: FixedSizeArray<LineSegment>,
}

impl Default for SolidSurfaceComponent {
    fn default() -> Self {
        Self {
            surfaces: FixedSizeArray::new(MAX_SURFACES),
        }
    }
}

impl SolidSurfaceComponent {
    /// Returns false when the surface list is full
    pub fn add_surface(&mut self, start: Vec2, end: Vec2, normal: Vec2) -> bool {
        self.surfaces.add(LineSegment::new(start, end, normal)).is_ok()
    }

    pub fn surfaces(&self) -> &[LineSegment] {
        self.surfaces.as_slice()
    }
}

impl Component for SolidSurfaceComponent {
    const KIND: ComponentKind = ComponentKind::SolidSurface;
    const PHASE: Phase = Phase::CollisionDetection;

    fn update(&mut self, _dt: f32, parent: &mut GameObject, frame: &mut FrameContext<'_>) {
        let offset = parent.position;
        for surface in self.surfaces.iter() {
            frame.collision.add_temporary_surface(
                surface.start + offset,
                surface.end + offset,
                surface.normal,
                Some(parent.id()),
            );
        }
    }

    fn reset(&mut self) {
        self.surfaces.clear();
    }

    super::downcasts!(SolidSurface);
}
