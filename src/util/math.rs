//! Angle and interpolation helpers shared by physics and interpolation

use std::f32::consts::{PI, TAU};

/// Wrap an angle into (-PI, PI].
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Linear interpolation between `a` and `b` at parameter `t`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Shortest-path angular interpolation.
///
/// The difference is wrapped into [-PI, PI] before scaling, so angles
/// close across the PI boundary interpolate through the short arc
/// rather than sweeping through zero.
pub fn angle_lerp(from: f32, to: f32, t: f32) -> f32 {
    let delta = wrap_angle(to - from);
    wrap_angle(from + delta * t)
}

/// Absolute world facings for 8-way movement, radians.
///
/// Sprite convention: 0 faces south (+y on screen), PI faces north.
pub mod facing {
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    pub const UP: f32 = PI;
    pub const DOWN: f32 = 0.0;
    pub const LEFT: f32 = FRAC_PI_2;
    pub const RIGHT: f32 = -FRAC_PI_2;
    pub const UP_LEFT: f32 = 3.0 * FRAC_PI_4;
    pub const UP_RIGHT: f32 = -3.0 * FRAC_PI_4;
    pub const DOWN_LEFT: f32 = FRAC_PI_4;
    pub const DOWN_RIGHT: f32 = -FRAC_PI_4;
}
