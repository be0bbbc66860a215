//! Object archetypes and their shared data
//!
//! Every instance of an archetype references the same animation set. The
//! table owns that data and builds it lazily the first time the archetype is
//! spawned in a level; components only hold `Arc` references to it.

use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::LineSegment;
use super::object::ActionType;

/// Closed set of spawnable object kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Player,
    Patroller,
    MovingPlatform,
    Dust,
}

impl ObjectType {
    pub const COUNT: usize = 4;
    pub const ALL: [ObjectType; Self::COUNT] = [
        ObjectType::Player,
        ObjectType::Patroller,
        ObjectType::MovingPlatform,
        ObjectType::Dust,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ObjectType::Player => "player",
            ObjectType::Patroller => "patroller",
            ObjectType::MovingPlatform => "moving_platform",
            ObjectType::Dust => "dust",
        }
    }

    /// Collision box (width, height)
    pub fn size(self) -> Vec2 {
        match self {
            ObjectType::Player => Vec2::new(16.0, 24.0),
            ObjectType::Patroller => Vec2::new(16.0, 16.0),
            ObjectType::MovingPlatform => Vec2::new(64.0, 16.0),
            ObjectType::Dust => Vec2::new(8.0, 8.0),
        }
    }
}

/// A frame sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub frames: Vec<u16>,
    pub frame_duration: f32,
    pub looping: bool,
}

impl Animation {
    pub fn new(frames: Vec<u16>, frame_duration: f32, looping: bool) -> Self {
        Self {
            frames,
            frame_duration: frame_duration.max(f32::EPSILON),
            looping,
        }
    }

    /// Frame shown `elapsed` seconds in. Non-looping animations hold the last frame.
    pub fn frame_at(&self, elapsed: f32) -> Option<u16> {
        let len = self.frames.len();
        if len == 0 {
            return None;
        }
        let step = (elapsed.max(0.0) / self.frame_duration) as usize;
        let index = if self.looping { step % len } else { step.min(len - 1) };
        Some(self.frames[index])
    }
}

/// Animations keyed by action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationSet {
    animations: Vec<(ActionType, Animation)>,
}

impl AnimationSet {
    /// Add or replace the animation for `action`
    pub fn insert(&mut self, action: ActionType, animation: Animation) {
        match self.animations.iter_mut().find(|(a, _)| *a == action) {
            Some((_, existing)) => *existing = animation,
            None => self.animations.push((action, animation)),
        }
    }

    pub fn get(&self, action: ActionType) -> Option<&Animation> {
        self.animations.iter().find(|(a, _)| *a == action).map(|(_, anim)| anim)
    }

    pub fn frame_at(&self, action: ActionType, elapsed: f32) -> Option<u16> {
        self.get(action)?.frame_at(elapsed)
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}

/// Data shared by every instance of one object type
#[derive(Debug)]
pub struct Archetype {
    pub animations: Arc<AnimationSet>,
    /// Solid surfaces relative to the object's position (moving solids only)
    pub surfaces: Vec<LineSegment>,
}

impl Archetype {
    fn build(kind: ObjectType) -> Self {
        let mut animations = AnimationSet::default();
        let mut surfaces = Vec::new();

        match kind {
            ObjectType::Player => {
                animations.insert(ActionType::Idle, Animation::new(vec![0], 1.0, true));
                animations.insert(ActionType::Move, Animation::new(vec![1, 2, 3, 4], 0.08, true));
                animations.insert(ActionType::Death, Animation::new(vec![5, 6, 7], 0.15, false));
            }
            ObjectType::Patroller => {
                animations.insert(ActionType::Move, Animation::new(vec![16, 17], 0.2, true));
                animations.insert(ActionType::Death, Animation::new(vec![18], 1.0, false));
            }
            ObjectType::MovingPlatform => {
                animations.insert(ActionType::Move, Animation::new(vec![32], 1.0, true));
                let size = kind.size();
                surfaces.push(LineSegment::new(
                    Vec2::new(0.0, size.y),
                    Vec2::new(size.x, size.y),
                    Vec2::Y,
                ));
            }
            ObjectType::Dust => {
                animations.insert(ActionType::Idle, Animation::new(vec![48, 49, 50, 51], 0.1, false));
            }
        }

        Self {
            animations: Arc::new(animations),
            surfaces,
        }
    }
}

/// Lazily built archetypes, indexed by `ObjectType`
#[derive(Debug, Default)]
pub struct ArchetypeTable {
    entries: [Option<Archetype>; ObjectType::COUNT],
}

impl ArchetypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, kind: ObjectType) -> &Archetype {
        self.entries[kind.index()].get_or_insert_with(|| {
            log::debug!("Building archetype '{}'", kind.name());
            Archetype::build(kind)
        })
    }

    pub fn get(&self, kind: ObjectType) -> Option<&Archetype> {
        self.entries[kind.index()].as_ref()
    }

    /// Number of archetypes built so far
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all shared data (level teardown)
    pub fn clear(&mut self) {
        let count = self.len();
        self.entries = Default::default();
        log::info!("Released {} archetypes", count);
    }
}
