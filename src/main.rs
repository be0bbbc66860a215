//! Tilestep headless demo
//!
//! Generates a level, runs it on the simulation thread with scripted input
//! and reports what happened.
//!
//! Usage: `tilestep [settings.json] [seed] [frames]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::time::{SystemTime, UNIX_EPOCH};

    use tilestep::runner::{RunConfig, SimulationThread};
    use tilestep::settings::EngineSettings;
    use tilestep::sim::{TickInput, World, generate_level_with_tile_size};
    use tilestep::telemetry::{Telemetry, TelemetryEvent};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Tilestep (native) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = match args.first() {
        Some(path) if path != "-" => EngineSettings::load_or_default(path),
        _ => EngineSettings::default(),
    };
    let seed = args.get(1).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    });
    let frames = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(600);

    let level = match generate_level_with_tile_size(seed, 64, 18, settings.tile_size) {
        Ok(level) => level,
        Err(err) => {
            log::error!("Level generation failed: {}", err);
            std::process::exit(1);
        }
    };

    let mut world = World::new(&settings);
    if let Err(err) = world.load_level(&level) {
        log::warn!("Running without static collision: {}", err);
    }

    let telemetry = if settings.telemetry {
        Telemetry::spawn().unwrap_or_else(|err| {
            log::warn!("Telemetry unavailable: {}", err);
            Telemetry::disabled()
        })
    } else {
        Telemetry::disabled()
    };
    telemetry.handle().report(TelemetryEvent::LevelLoaded {
        seed,
        objects: world.manager.len(),
    });

    let config = RunConfig {
        max_frames: Some(frames),
        real_time: false,
        snapshot_interval: settings.telemetry_interval,
    };
    // Run right, turn around every four seconds, hop every second
    let script = |frame: u64| TickInput {
        move_x: if (frame / 240) % 2 == 0 { 1.0 } else { -1.0 },
        jump: frame % 60 == 30,
    };

    let summary = match SimulationThread::spawn(world, config, telemetry.handle(), script) {
        Ok(sim) => sim.join(),
        Err(err) => {
            log::error!("Could not start simulation thread: {}", err);
            None
        }
    };
    let reported = telemetry.shutdown();

    match summary {
        Some(summary) => {
            log::info!(
                "Ran {} frames (seed {}): {} objects left, player {}, {} telemetry events",
                summary.frames,
                seed,
                summary.objects,
                if summary.player_alive { "alive" } else { "lost" },
                reported
            );
            if !summary.leaks.is_clean() {
                log::warn!("Leaks at unload: {:?}", summary.leaks);
            }
        }
        None => std::process::exit(1),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is the product on the web; there is no wasm entry point
}
