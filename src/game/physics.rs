//! Ship physics: steering, speed ramp, and position integration
//!
//! One algorithm, multiple hull profiles. The full-size ship and the
//! single-player small boat differ only in the constants injected via
//! `HullProfile`, never in the update logic itself.

use serde::{Deserialize, Serialize};

use crate::util::math::wrap_angle;

/// Helm steering lever range, mapped proportionally to turn rate
pub const STEERING_RANGE: f32 = 100.0;

/// Physics constants for a hull kind
#[derive(Debug, Clone, Copy)]
pub struct HullProfile {
    /// Steering lever change per tick while a turn key is held
    pub steering_step: f32,
    /// Lever snaps to exactly 0 inside this band when no turn input is active
    pub steering_deadzone: f32,
    /// Turn rate at full lever, radians per second
    pub turn_speed: f32,
    /// Cruising speed the hull ramps toward
    pub base_speed: f32,
    /// Exponential approach factor toward target speed, per tick
    pub acceleration_factor: f32,
    /// Multiplicative speed decay per tick while anchored
    pub anchor_deceleration: f32,
    /// Multiplicative angular velocity decay per tick while anchored
    pub anchor_angular_damping: f32,
    /// Tick rate the per-tick factors above were tuned at. Running the
    /// simulation at a different rate changes ramp and decay behavior.
    pub assumed_tick_hz: f32,
}

impl HullProfile {
    /// Full-size combat ship
    pub fn ship() -> Self {
        Self {
            steering_step: 2.0,
            steering_deadzone: 5.0,
            turn_speed: 0.6,
            base_speed: 100.0,
            acceleration_factor: 0.02,
            anchor_deceleration: 0.995,
            anchor_angular_damping: 0.995,
            assumed_tick_hz: 60.0,
        }
    }

    /// Small boat for the single-player survival mode: slower hull,
    /// sharper helm, quicker ramp, heavier anchor drag.
    pub fn small_boat() -> Self {
        Self {
            steering_step: 3.0,
            steering_deadzone: 5.0,
            turn_speed: 0.9,
            base_speed: 60.0,
            acceleration_factor: 0.03,
            anchor_deceleration: 0.99,
            anchor_angular_damping: 0.99,
            assumed_tick_hz: 60.0,
        }
    }
}

/// Authoritative ship state, advanced by exactly one simulation owner.
///
/// `velocity_x/y` and `angular_velocity` are recomputed from `rotation`,
/// `current_speed`, and `steering_direction` every tick; they are carried
/// for observers, never treated as independent truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipState {
    pub x: f32,
    pub y: f32,
    /// Heading in radians, always in (-PI, PI]
    pub rotation: f32,
    /// Helm lever position in [-100, 100]
    pub steering_direction: f32,
    pub current_speed: f32,
    pub is_anchored: bool,
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub angular_velocity: f32,
}

impl ShipState {
    pub fn at(x: f32, y: f32, rotation: f32) -> Self {
        Self {
            x,
            y,
            rotation: wrap_angle(rotation),
            steering_direction: 0.0,
            current_speed: 0.0,
            is_anchored: false,
            velocity_x: 0.0,
            velocity_y: 0.0,
            angular_velocity: 0.0,
        }
    }
}

/// Turn input for a single tick
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HelmInput {
    pub turn_left: bool,
    pub turn_right: bool,
}

/// Optional upgrade bonuses applied to a ship's target speed and turn rate
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ShipModifiers {
    /// Fractional bonus on top of base speed (0.2 = +20%)
    pub speed_bonus: f32,
    /// Fractional bonus on top of base turn rate
    pub turning_bonus: f32,
}

/// Ship physics for one hull profile
#[derive(Debug, Clone, Copy)]
pub struct ShipPhysics {
    profile: HullProfile,
}

impl ShipPhysics {
    pub fn new(profile: HullProfile) -> Self {
        Self { profile }
    }

    pub fn ship() -> Self {
        Self::new(HullProfile::ship())
    }

    pub fn small_boat() -> Self {
        Self::new(HullProfile::small_boat())
    }

    pub fn profile(&self) -> &HullProfile {
        &self.profile
    }

    /// Advance one tick. Pure and total over finite inputs.
    pub fn advance(
        &self,
        state: &ShipState,
        input: HelmInput,
        dt: f32,
        modifiers: Option<&ShipModifiers>,
    ) -> ShipState {
        let p = &self.profile;
        let (speed_multiplier, turn_multiplier) = match modifiers {
            Some(m) => (1.0 + m.speed_bonus, 1.0 + m.turning_bonus),
            None => (1.0, 1.0),
        };

        // 1. Steering lever. Left wins over right on simultaneous press
        // (else-if priority, preserved as policy). The lever holds its
        // position when released outside the deadzone and snaps to zero
        // once inside it.
        let mut steering = state.steering_direction;
        if input.turn_left {
            steering = (steering - p.steering_step).max(-STEERING_RANGE);
        } else if input.turn_right {
            steering = (steering + p.steering_step).min(STEERING_RANGE);
        } else if steering.abs() <= p.steering_deadzone {
            steering = 0.0;
        }

        // 2. Angular velocity: derived from the lever, except while
        // anchored where the previous value decays per tick instead of
        // tracking the lever.
        let angular_velocity = if state.is_anchored {
            state.angular_velocity * p.anchor_angular_damping
        } else {
            (steering / STEERING_RANGE) * p.turn_speed * turn_multiplier
        };

        // 3. Rotation integration
        let rotation = wrap_angle(state.rotation + angular_velocity * dt);

        // 4. Speed: per-tick anchored decay, else exponential approach
        // toward the (possibly boosted) cruising speed. The approach
        // factor never overshoots for factors in (0, 1].
        let current_speed = if state.is_anchored {
            state.current_speed * p.anchor_deceleration
        } else {
            let target = p.base_speed * speed_multiplier;
            state.current_speed + (target - state.current_speed) * p.acceleration_factor
        };

        // 5. Velocity vector. Sprite art points "up", so the world
        // forward axis sits a quarter turn behind the heading.
        let forward = rotation - std::f32::consts::FRAC_PI_2;
        let velocity_x = current_speed * forward.cos();
        let velocity_y = current_speed * forward.sin();

        // 6. Position integration
        ShipState {
            x: state.x + velocity_x * dt,
            y: state.y + velocity_y * dt,
            rotation,
            steering_direction: steering,
            current_speed,
            is_anchored: state.is_anchored,
            velocity_x,
            velocity_y,
            angular_velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const DT: f32 = 1.0 / 60.0;

    fn idle_helm() -> HelmInput {
        HelmInput::default()
    }

    #[test]
    fn speed_ramps_toward_base_speed_without_overshoot() {
        let physics = ShipPhysics::ship();
        let base = physics.profile().base_speed;
        let mut state = ShipState::at(0.0, 0.0, 0.0);
        let mut prev_speed = state.current_speed;

        for _ in 0..1000 {
            state = physics.advance(&state, idle_helm(), 1.0, None);
            assert!(state.current_speed >= prev_speed, "ramp must be monotonic");
            assert!(state.current_speed <= base, "ramp must not overshoot");
            prev_speed = state.current_speed;
        }

        assert!(
            (base - state.current_speed) / base < 0.01,
            "speed {} should converge within 1% of {}",
            state.current_speed,
            base
        );
    }

    #[test]
    fn anchored_speed_decays_monotonically_to_zero() {
        let physics = ShipPhysics::ship();
        let mut state = ShipState::at(0.0, 0.0, 0.0);
        state.current_speed = 80.0;
        state.is_anchored = true;
        let mut prev_speed = state.current_speed;

        for _ in 0..500 {
            state = physics.advance(&state, idle_helm(), DT, None);
            assert!(state.current_speed <= prev_speed);
            assert!(state.current_speed >= 0.0);
            prev_speed = state.current_speed;
        }
        assert!(state.current_speed < 80.0 * 0.1);
    }

    #[test]
    fn anchored_angular_velocity_decays() {
        let physics = ShipPhysics::ship();
        let mut state = ShipState::at(0.0, 0.0, 0.0);
        state.angular_velocity = 0.5;
        state.is_anchored = true;

        for _ in 0..200 {
            let prev = state.angular_velocity;
            state = physics.advance(&state, idle_helm(), DT, None);
            assert!(state.angular_velocity <= prev);
        }
        assert!(state.angular_velocity < 0.5 * 0.5);
    }

    #[test]
    fn rotation_stays_wrapped() {
        let physics = ShipPhysics::ship();
        let mut state = ShipState::at(0.0, 0.0, 3.0);
        let input = HelmInput {
            turn_left: false,
            turn_right: true,
        };

        for _ in 0..2000 {
            state = physics.advance(&state, input, DT, None);
            assert!(
                state.rotation > -PI && state.rotation <= PI,
                "rotation {} escaped (-PI, PI]",
                state.rotation
            );
        }
    }

    #[test]
    fn steering_clamps_to_lever_range() {
        let physics = ShipPhysics::ship();
        let mut state = ShipState::at(0.0, 0.0, 0.0);
        let input = HelmInput {
            turn_left: true,
            turn_right: false,
        };

        for _ in 0..200 {
            state = physics.advance(&state, input, DT, None);
        }
        assert_eq!(state.steering_direction, -STEERING_RANGE);
    }

    #[test]
    fn simultaneous_turn_input_resolves_left() {
        let physics = ShipPhysics::ship();
        let state = ShipState::at(0.0, 0.0, 0.0);
        let input = HelmInput {
            turn_left: true,
            turn_right: true,
        };

        let next = physics.advance(&state, input, DT, None);
        assert!(next.steering_direction < 0.0, "left branch takes priority");
    }

    #[test]
    fn steering_snaps_to_zero_inside_deadzone_only() {
        let physics = ShipPhysics::ship();
        let deadzone = physics.profile().steering_deadzone;

        let mut inside = ShipState::at(0.0, 0.0, 0.0);
        inside.steering_direction = deadzone;
        let next = physics.advance(&inside, idle_helm(), DT, None);
        assert_eq!(next.steering_direction, 0.0);

        let mut outside = ShipState::at(0.0, 0.0, 0.0);
        outside.steering_direction = deadzone + 1.0;
        let next = physics.advance(&outside, idle_helm(), DT, None);
        assert_eq!(next.steering_direction, deadzone + 1.0, "lever holds outside deadzone");
    }

    #[test]
    fn velocity_follows_forward_axis() {
        let physics = ShipPhysics::ship();
        // Heading 0 with "up"-facing sprite art means moving toward -y.
        let mut state = ShipState::at(0.0, 0.0, 0.0);
        state.current_speed = 50.0;

        let next = physics.advance(&state, idle_helm(), DT, None);
        assert!(next.velocity_y < 0.0);
        assert!(next.velocity_x.abs() < 1e-3);
        assert!(next.y < 0.0);
    }

    #[test]
    fn speed_bonus_raises_target_speed() {
        let physics = ShipPhysics::ship();
        let base = physics.profile().base_speed;
        let mods = ShipModifiers {
            speed_bonus: 0.5,
            turning_bonus: 0.0,
        };
        let mut state = ShipState::at(0.0, 0.0, 0.0);

        for _ in 0..1000 {
            state = physics.advance(&state, idle_helm(), 1.0, Some(&mods));
        }
        assert!(state.current_speed > base * 1.4);
    }

    #[test]
    fn small_boat_ramps_to_its_own_cruising_speed() {
        let ship = ShipPhysics::ship();
        let boat = ShipPhysics::small_boat();
        assert!(boat.profile().base_speed < ship.profile().base_speed);

        let mut state = ShipState::at(0.0, 0.0, 0.0);
        for _ in 0..1000 {
            state = boat.advance(&state, idle_helm(), 1.0, None);
        }
        let base = boat.profile().base_speed;
        assert!((base - state.current_speed) / base < 0.01);
    }
}
