//! Best-effort telemetry
//!
//! Events go through a channel to a reporter thread that serializes them to
//! JSON and logs them. Sending never blocks and never fails the caller; if the
//! reporter is gone the event is dropped.

use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::{self, JoinHandle};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelemetryEvent {
    LevelLoaded {
        seed: u64,
        objects: usize,
    },
    Snapshot {
        frame: u64,
        objects: usize,
        active: usize,
        temporary_surfaces: usize,
        player: Option<[f32; 2]>,
    },
    PlayerLost {
        frame: u64,
    },
    LevelUnloaded {
        frames: u64,
        leaked_objects: usize,
        leaked_components: usize,
    },
}

/// Cheap, cloneable sender side
#[derive(Debug, Clone, Default)]
pub struct TelemetryHandle {
    sender: Option<Sender<TelemetryEvent>>,
}

impl TelemetryHandle {
    /// A handle that drops everything
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    pub fn report(&self, event: TelemetryEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}

/// Owns the reporter thread
#[derive(Debug)]
pub struct Telemetry {
    handle: TelemetryHandle,
    worker: Option<JoinHandle<usize>>,
}

impl Telemetry {
    /// Start the reporter thread
    pub fn spawn() -> std::io::Result<Self> {
        let (sender, receiver) = channel();
        let worker = thread::Builder::new()
            .name("telemetry".into())
            .spawn(move || report_loop(receiver))?;
        Ok(Self {
            handle: TelemetryHandle {
                sender: Some(sender),
            },
            worker: Some(worker),
        })
    }

    /// No thread; every report is dropped
    pub fn disabled() -> Self {
        Self {
            handle: TelemetryHandle::disabled(),
            worker: None,
        }
    }

    pub fn handle(&self) -> TelemetryHandle {
        self.handle.clone()
    }

    /// Close the channel and join the reporter. Returns how many events it
    /// reported. Blocks until every outstanding handle has been dropped.
    pub fn shutdown(mut self) -> usize {
        self.handle = TelemetryHandle::disabled();
        match self.worker.take().map(JoinHandle::join) {
            Some(Ok(count)) => count,
            Some(Err(_)) => {
                log::error!("Telemetry reporter panicked");
                0
            }
            None => 0,
        }
    }
}

fn report_loop(receiver: Receiver<TelemetryEvent>) -> usize {
    let mut count = 0;
    for event in receiver {
        match serde_json::to_string(&event) {
            Ok(json) => log::info!(target: "telemetry", "{}", json),
            Err(err) => log::warn!(target: "telemetry", "Unserializable event {:?}: {}", event, err),
        }
        count += 1;
    }
    log::debug!("Telemetry reporter finished after {} events", count);
    count
}
