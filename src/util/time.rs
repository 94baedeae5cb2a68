//! Time utilities for game simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Default simulation tick rate. The per-tick decay factors in the hull
/// profiles are tuned against this rate (see `HullProfile::assumed_tick_hz`).
pub const DEFAULT_SIMULATION_TPS: u32 = 60;

/// Default snapshot broadcast rate
pub const DEFAULT_SNAPSHOT_TPS: u32 = 20;

/// Fixed per-tick delta in seconds for a given tick rate
pub fn tick_delta(tps: u32) -> f32 {
    1.0 / tps as f32
}

/// A simple timer for measuring durations
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Reset and return the seconds elapsed since the previous reset.
    /// The sim loop uses this for monotonic per-tick deltas.
    pub fn lap_secs(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.start).as_secs_f32();
        self.start = now;
        dt
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
