use std::sync::Arc;

use crate::sim::archetype::AnimationSet;
use crate::sim::component::{Component, ComponentKind, Phase};
use crate::sim::context::FrameContext;
use crate::sim::object::{ActionType, GameObject};

/// Picks the render frame for the parent's current action.
///
/// The animation data is shared by every instance of an archetype; this
/// component only holds a reference to it and its own playback clock.
#[derive(Debug, Clone, Default)]
pub struct AnimationComponent {
    set: Option<Arc<AnimationSet>>,
    current: ActionType,
    elapsed: f32,
}

impl AnimationComponent {
    pub fn set_animations(&mut self, set: Arc<AnimationSet>) {
        self.set = Some(set);
        self.elapsed = 0.0;
    }

    pub fn animations(&self) -> Option<&Arc<AnimationSet>> {
        self.set.as_ref()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl Component for AnimationComponent {
    const KIND: ComponentKind = ComponentKind::Animation;
    const PHASE: Phase = Phase::RenderPrep;

    fn update(&mut self, dt: f32, parent: &mut GameObject, _frame: &mut FrameContext<'_>) {
        if parent.current_action != self.current {
            self.current = parent.current_action;
            self.elapsed = 0.0;
        } else {
            self.elapsed += dt;
        }

        if let Some(frame) = self.set.as_ref().and_then(|set| set.frame_at(self.current, self.elapsed)) {
            parent.render_frame = frame;
        }
    }

    fn reset(&mut self) {
        // Drops the reference only; the archetype table owns the data
        *self = Self::default();
    }

    super::downcasts!(Animation);
}
