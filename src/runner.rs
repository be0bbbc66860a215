//! Simulation thread
//!
//! A `World` runs on its own thread. Stopping is cooperative: the loop checks
//! a stop flag once per iteration and exits between ticks, then the level is
//! unloaded and its leak report returned with the summary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::consts::SIM_DT;
use crate::sim::{FrameClock, LeakReport, TickInput, World, tick};
use crate::telemetry::{TelemetryEvent, TelemetryHandle};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunConfig {
    /// Stop by itself after this many ticks
    pub max_frames: Option<u64>,
    /// Pace ticks against the wall clock instead of running flat out
    pub real_time: bool,
    /// Ticks between telemetry snapshots (0 disables snapshots)
    pub snapshot_interval: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_frames: None,
            real_time: true,
            snapshot_interval: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub objects: usize,
    pub player_alive: bool,
    /// True when the stop flag ended the run before `max_frames`
    pub stopped_early: bool,
    pub leaks: LeakReport,
}

pub struct SimulationThread {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<RunSummary>>,
}

impl SimulationThread {
    /// Move `world` onto a new thread. `input` is asked for each tick's input.
    pub fn spawn<F>(
        world: World,
        config: RunConfig,
        telemetry: TelemetryHandle,
        input: F,
    ) -> std::io::Result<Self>
    where
        F: FnMut(u64) -> TickInput + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let worker = thread::Builder::new()
            .name("simulation".into())
            .spawn(move || run(world, config, telemetry, input, &flag))?;
        Ok(Self {
            stop,
            worker: Some(worker),
        })
    }

    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Ask the loop to stop after the current tick
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Request a stop and wait for the thread
    pub fn stop(self) -> Option<RunSummary> {
        self.request_stop();
        self.join()
    }

    /// Wait for the run to end on its own (`max_frames`)
    pub fn join(mut self) -> Option<RunSummary> {
        let worker = self.worker.take()?;
        match worker.join() {
            Ok(summary) => Some(summary),
            Err(_) => {
                log::error!("Simulation thread panicked");
                None
            }
        }
    }
}

impl Drop for SimulationThread {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.stop.store(true, Ordering::Release);
            let _ = worker.join();
        }
    }
}

fn run<F>(
    mut world: World,
    config: RunConfig,
    telemetry: TelemetryHandle,
    mut input: F,
    stop: &AtomicBool,
) -> RunSummary
where
    F: FnMut(u64) -> TickInput,
{
    let mut clock = FrameClock::new();
    let mut last = Instant::now();
    let mut had_player = world.player().is_some();
    let mut stopped_early = false;

    log::info!("Simulation thread started");
    loop {
        if stop.load(Ordering::Acquire) {
            stopped_early = config.max_frames.is_none_or(|max| world.frame < max);
            break;
        }
        if config.max_frames.is_some_and(|max| world.frame >= max) {
            break;
        }

        let steps = if config.real_time {
            let now = Instant::now();
            let steps = clock.advance((now - last).as_secs_f32());
            last = now;
            if steps == 0 {
                thread::sleep(Duration::from_secs_f32(SIM_DT * 0.25));
            }
            steps
        } else {
            1
        };

        for _ in 0..steps {
            let tick_input = input(world.frame);
            tick(&mut world, &tick_input, SIM_DT);

            let has_player = world.player().is_some();
            if had_player && !has_player {
                telemetry.report(TelemetryEvent::PlayerLost { frame: world.frame });
            }
            had_player = has_player;

            if config.snapshot_interval > 0 && world.frame % config.snapshot_interval as u64 == 0 {
                telemetry.report(snapshot(&world));
            }
            if config.max_frames.is_some_and(|max| world.frame >= max) {
                break;
            }
        }
    }

    let frames = world.frame;
    let objects = world.manager.len();
    let player_alive = world.player().is_some();
    let leaks = world.unload_level();
    telemetry.report(TelemetryEvent::LevelUnloaded {
        frames,
        leaked_objects: leaks.objects,
        leaked_components: leaks.components.iter().map(|(_, n)| n).sum(),
    });
    log::info!("Simulation thread stopped after {} frames", frames);

    RunSummary {
        frames,
        objects,
        player_alive,
        stopped_early,
        leaks,
    }
}

fn snapshot(world: &World) -> TelemetryEvent {
    TelemetryEvent::Snapshot {
        frame: world.frame,
        objects: world.manager.len(),
        active: world.manager.active_count(),
        temporary_surfaces: world.context.collision.active_temporary_count(),
        player: world.player().map(|p| p.position.to_array()),
    }
}
