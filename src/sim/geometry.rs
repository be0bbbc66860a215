//! Geometry primitives for the collision world
//!
//! Vectors are `glam::Vec2` (in-place `+=`, `-=`, `*=`, `dot`, `length_squared`,
//! `distance_squared`, `normalize_or_zero`). This module adds:
//! - `LineSegment`: a solid surface with a repelling normal
//! - `Aabb`: axis-aligned box with world Y growing upward

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::object::ObjectId;

/// Denominators below this are treated as parallel lines
const PARALLEL_EPSILON: f32 = 1e-6;

/// A directed surface. The normal points to the side that pushes movers away.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Vec2,
    pub end: Vec2,
    /// Unit normal on the repelling side
    pub normal: Vec2,
    /// Object this surface is attached to (temporary surfaces only)
    #[serde(skip)]
    pub owner: Option<ObjectId>,
}

impl LineSegment {
    pub fn new(start: Vec2, end: Vec2, normal: Vec2) -> Self {
        Self {
            start,
            end,
            normal: normal.normalize_or_zero(),
            owner: None,
        }
    }

    pub fn with_owner(mut self, owner: Option<ObjectId>) -> Self {
        self.owner = owner;
        self
    }

    /// Copy of this segment shifted by `offset`
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
            ..*self
        }
    }

    #[inline]
    pub fn midpoint(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }

    /// True when a mover travelling along `movement` should collide with this surface.
    ///
    /// No direction (or a zero direction) accepts every surface.
    #[inline]
    pub fn opposes(&self, movement: Option<Vec2>) -> bool {
        match movement {
            Some(dir) if dir.length_squared() > 0.0 => dir.dot(self.normal) < 0.0,
            _ => true,
        }
    }

    /// Intersection point with the segment `a`→`b`, with this segment shifted by `offset`.
    ///
    /// Parallel and collinear segments never intersect.
    pub fn intersect_segment(&self, a: Vec2, b: Vec2, offset: Vec2) -> Option<Vec2> {
        let p = self.start + offset;
        let r = self.end - self.start;
        let s = b - a;

        let denom = r.perp_dot(s);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let qp = a - p;
        let t = qp.perp_dot(s) / denom;
        let u = qp.perp_dot(r) / denom;

        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some(p + r * t)
        } else {
            None
        }
    }

    /// Slab test against a box, with this segment shifted by `offset`.
    ///
    /// Returns the point where the segment enters the box (or its start when it
    /// begins inside).
    pub fn intersect_box(&self, bounds: &Aabb, offset: Vec2) -> Option<Vec2> {
        let origin = self.start + offset;
        let delta = self.end - self.start;

        let mut t_min = 0.0_f32;
        let mut t_max = 1.0_f32;

        for axis in 0..2 {
            let (o, d, lo, hi) = if axis == 0 {
                (origin.x, delta.x, bounds.min.x, bounds.max.x)
            } else {
                (origin.y, delta.y, bounds.min.y, bounds.max.y)
            };

            if d.abs() < PARALLEL_EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let mut t1 = (lo - o) / d;
            let mut t2 = (hi - o) / d;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }

        Some(origin + delta * t_min)
    }
}

/// Axis-aligned box. `min` is the bottom-left corner, `max` the top-right.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_edges(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self::new(Vec2::new(left, bottom), Vec2::new(right, top))
    }

    /// Box anchored at its bottom-left corner
    pub fn from_position(position: Vec2, width: f32, height: f32) -> Self {
        Self::new(position, position + Vec2::new(width, height))
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.min.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.max.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.max.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.min.y
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}
