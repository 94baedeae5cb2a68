//! Snapshot buffering and delayed interpolation for remote entities
//!
//! Remote ships arrive as discrete timestamped poses at whatever cadence
//! the network delivers. Rendering samples a fixed `render_delay` behind
//! now and interpolates between the two snapshots that bracket that
//! time, trading a small bounded latency for jitter-free motion. The
//! buffer never extrapolates past its newest snapshot.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::util::math::{angle_lerp, lerp};
use crate::util::time::unix_millis;

/// Default number of snapshots retained per remote entity
pub const DEFAULT_BUFFER_CAPACITY: usize = 3;

/// Default render delay in milliseconds
pub const DEFAULT_RENDER_DELAY_MS: u64 = 100;

/// A renderable position + heading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

/// A timestamped pose sample received from the network
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Snapshot {
    pub pose: Pose,
    /// Unix milliseconds at which this pose was authoritative
    pub timestamp_ms: u64,
}

/// Fixed-capacity FIFO of the most recent snapshots for one entity
#[derive(Debug, Clone)]
pub struct SnapshotBuffer {
    snapshots: VecDeque<Snapshot>,
    capacity: usize,
    render_delay_ms: u64,
}

impl Default for SnapshotBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY, DEFAULT_RENDER_DELAY_MS)
    }
}

impl SnapshotBuffer {
    pub fn new(capacity: usize, render_delay_ms: u64) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            render_delay_ms,
        }
    }

    /// Append a snapshot, evicting the oldest once past capacity.
    pub fn add_snapshot(&mut self, pose: Pose, timestamp_ms: u64) {
        if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(Snapshot { pose, timestamp_ms });
    }

    /// Append a snapshot stamped with the current wall clock.
    pub fn add_snapshot_now(&mut self, pose: Pose) {
        self.add_snapshot(pose, unix_millis());
    }

    /// Sample the buffer `render_delay` behind `now_ms`.
    ///
    /// Returns `None` when empty and the single stored pose when only one
    /// snapshot exists. When the delayed render time falls outside the
    /// buffered range (not enough history yet, or clock skew), the most
    /// recent pose is returned unmodified rather than extrapolated.
    pub fn interpolated_pose(&self, now_ms: u64) -> Option<Pose> {
        let newest = self.snapshots.back()?;
        if self.snapshots.len() == 1 {
            return Some(newest.pose);
        }

        let render_time = now_ms.saturating_sub(self.render_delay_ms);

        for pair in self.snapshots.iter().zip(self.snapshots.iter().skip(1)) {
            let (from, to) = pair;
            if from.timestamp_ms <= render_time && render_time <= to.timestamp_ms {
                let span = to.timestamp_ms - from.timestamp_ms;
                let t = if span == 0 {
                    1.0
                } else {
                    (render_time - from.timestamp_ms) as f32 / span as f32
                };
                return Some(Pose {
                    x: lerp(from.pose.x, to.pose.x, t),
                    y: lerp(from.pose.y, to.pose.y, t),
                    rotation: angle_lerp(from.pose.rotation, to.pose.rotation, t),
                });
            }
        }

        // Render time outside the buffered range: clamp to latest.
        Some(newest.pose)
    }

    /// Drop all buffered snapshots (entity despawn, room transition).
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// At least two snapshots buffered, enough to interpolate between.
    pub fn has_enough_data(&self) -> bool {
        self.snapshots.len() >= 2
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Per-remote-entity snapshot buffers, owned by the presentation side.
///
/// A buffer is created the first time an entity is seen and removed when
/// it leaves scope (disconnect, room change).
#[derive(Debug)]
pub struct InterpBank {
    buffers: HashMap<Uuid, SnapshotBuffer>,
    capacity: usize,
    render_delay_ms: u64,
}

impl Default for InterpBank {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY, DEFAULT_RENDER_DELAY_MS)
    }
}

impl InterpBank {
    pub fn new(capacity: usize, render_delay_ms: u64) -> Self {
        Self {
            buffers: HashMap::new(),
            capacity: capacity.max(1),
            render_delay_ms,
        }
    }

    /// Record a pose for an entity, creating its buffer on first sight.
    pub fn record(&mut self, entity_id: Uuid, pose: Pose, timestamp_ms: u64) {
        let capacity = self.capacity;
        let render_delay_ms = self.render_delay_ms;
        self.buffers
            .entry(entity_id)
            .or_insert_with(|| {
                debug!(entity_id = %entity_id, "interpolation buffer created");
                SnapshotBuffer::new(capacity, render_delay_ms)
            })
            .add_snapshot(pose, timestamp_ms);
    }

    /// Delayed interpolated pose for one entity, if known.
    pub fn pose(&self, entity_id: &Uuid, now_ms: u64) -> Option<Pose> {
        self.buffers.get(entity_id)?.interpolated_pose(now_ms)
    }

    pub fn has_enough_data(&self, entity_id: &Uuid) -> bool {
        self.buffers
            .get(entity_id)
            .is_some_and(|b| b.has_enough_data())
    }

    /// Drop an entity's buffer entirely.
    pub fn forget(&mut self, entity_id: &Uuid) {
        if self.buffers.remove(entity_id).is_some() {
            debug!(entity_id = %entity_id, "interpolation buffer dropped");
        }
    }

    /// Drop every buffer (room transition).
    pub fn clear(&mut self) {
        self.buffers.clear();
    }

    pub fn tracked_entities(&self) -> usize {
        self.buffers.len()
    }
}
