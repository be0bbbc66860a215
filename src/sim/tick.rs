//! Fixed timestep simulation tick
//!
//! One tick: the manager runs every phase, commits buffered changes, then the
//! collision system rotates its temporary surfaces so next tick sees what this
//! tick submitted.

use super::state::World;
use crate::consts::{MAX_SUBSTEPS, SIM_DT};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Horizontal stick, -1 (left) to 1 (right)
    pub move_x: f32,
    /// Jump held
    pub jump: bool,
}

/// Advance the world by one step of `dt` seconds
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    let World {
        context, manager, ..
    } = world;

    manager.update(context, input, dt);
    manager.commit_updates(context);
    context.collision.update(dt);

    world.frame += 1;
}

/// Fixed-step accumulator: turns variable frame times into whole `SIM_DT` steps
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    accumulator: f32,
    dropped_time: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add elapsed real time and return how many steps to run.
    /// At most `MAX_SUBSTEPS`; any backlog beyond that is dropped.
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        self.accumulator += elapsed.max(0.0);
        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        if self.accumulator >= SIM_DT {
            self.dropped_time += self.accumulator;
            self.accumulator = 0.0;
        }
        steps
    }

    /// Fraction of a step left over, for render interpolation
    pub fn alpha(&self) -> f32 {
        self.accumulator / SIM_DT
    }

    /// Total simulation time discarded to stay within the substep cap
    pub fn dropped_time(&self) -> f32 {
        self.dropped_time
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
