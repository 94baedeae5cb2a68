//! Player movement on a ship's deck
//!
//! Input direction is world-absolute (pressing "up" walks north on
//! screen no matter where the bow points), while the player's position
//! lives in ship-local coordinates so it rides along with the hull.
//! Each tick therefore rotates the desired world velocity into the
//! ship's frame before integrating and clamping.

use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_1_SQRT_2;

use crate::util::math::{facing, wrap_angle};

/// Walkable half-extents of a deck, derived from the hull sprite size
/// minus the player's half-width/height margins.
#[derive(Debug, Clone, Copy)]
pub struct DeckBounds {
    pub max_x: f32,
    pub max_y: f32,
}

impl DeckBounds {
    pub fn new(max_x: f32, max_y: f32) -> Self {
        Self { max_x, max_y }
    }

    /// Clamp a local position into the walkable rectangle.
    pub fn clamp(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x.clamp(-self.max_x, self.max_x),
            y.clamp(-self.max_y, self.max_y),
        )
    }
}

/// Player state in the ship-local frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeckState {
    /// Position relative to the ship origin, always inside the deck bounds
    pub local_x: f32,
    pub local_y: f32,
    /// World-absolute facing, held while the player stands still
    pub last_rotation: f32,
}

impl DeckState {
    pub fn centered() -> Self {
        Self {
            local_x: 0.0,
            local_y: 0.0,
            last_rotation: facing::DOWN,
        }
    }
}

/// Directional key state for a single tick (world-absolute N/S/W/E)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DeckInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DeckInput {
    pub fn any_pressed(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

/// Deck movement for one hull's walkable area
#[derive(Debug, Clone, Copy)]
pub struct DeckPhysics {
    bounds: DeckBounds,
    /// Walk speed in world units per second
    pub walk_speed: f32,
}

impl DeckPhysics {
    pub fn new(bounds: DeckBounds, walk_speed: f32) -> Self {
        Self { bounds, walk_speed }
    }

    pub fn bounds(&self) -> &DeckBounds {
        &self.bounds
    }

    /// Advance one tick. Returns the new state and whether the player is
    /// moving (any directional key held). Pure and total.
    pub fn advance(
        &self,
        state: &DeckState,
        input: DeckInput,
        ship_rotation: f32,
        dt: f32,
    ) -> (DeckState, bool) {
        // World-frame desired velocity; screen "up" is -y.
        let mut world_vx = 0.0;
        let mut world_vy = 0.0;
        if input.up {
            world_vy -= self.walk_speed;
        }
        if input.down {
            world_vy += self.walk_speed;
        }
        if input.left {
            world_vx -= self.walk_speed;
        }
        if input.right {
            world_vx += self.walk_speed;
        }
        if world_vx != 0.0 && world_vy != 0.0 {
            world_vx *= FRAC_1_SQRT_2;
            world_vy *= FRAC_1_SQRT_2;
        }

        // Rotate into the ship-local frame by the inverse ship rotation.
        let (sin, cos) = (-ship_rotation).sin_cos();
        let local_vx = world_vx * cos - world_vy * sin;
        let local_vy = world_vx * sin + world_vy * cos;

        let (local_x, local_y) = self
            .bounds
            .clamp(state.local_x + local_vx * dt, state.local_y + local_vy * dt);

        let is_moving = input.any_pressed();
        let last_rotation = match facing_for(input) {
            Some(angle) => angle,
            // No table entry (idle, or a contradictory combo): hold facing.
            None => state.last_rotation,
        };

        (
            DeckState {
                local_x,
                local_y,
                last_rotation,
            },
            is_moving,
        )
    }

    /// Optional secondary behavior: while the player stands still, carry
    /// the ship's rotation delta into their facing so they keep looking
    /// at the same part of the deck. Call sites opt into this per frame;
    /// `advance` never applies it.
    pub fn carry_ship_turn(
        &self,
        state: &DeckState,
        ship_rotation_delta: f32,
        is_moving: bool,
    ) -> DeckState {
        if is_moving {
            return *state;
        }
        DeckState {
            last_rotation: wrap_angle(state.last_rotation + ship_rotation_delta),
            ..*state
        }
    }
}

/// Fixed 8-way facing lookup keyed by the exact key combination.
///
/// The key order is up, down, left, right; combinations outside the
/// eight cardinal/diagonal entries (opposing keys held together) have no
/// entry and resolve to `None`. Angles are fixed constants, not derived
/// from the velocity vector.
fn facing_for(input: DeckInput) -> Option<f32> {
    match (input.up, input.down, input.left, input.right) {
        (true, false, false, false) => Some(facing::UP),
        (false, true, false, false) => Some(facing::DOWN),
        (false, false, true, false) => Some(facing::LEFT),
        (false, false, false, true) => Some(facing::RIGHT),
        (true, false, true, false) => Some(facing::UP_LEFT),
        (true, false, false, true) => Some(facing::UP_RIGHT),
        (false, true, true, false) => Some(facing::DOWN_LEFT),
        (false, true, false, true) => Some(facing::DOWN_RIGHT),
        _ => None,
    }
}
