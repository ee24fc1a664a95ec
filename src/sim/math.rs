//! Small numeric helpers shared by the movement, ability and status code.
//!
//! The damping functions follow the classic critically-damped spring used by
//! most game engines, so tuning values carry over from engine-side prototypes.

use bevy::math::EulerRot;
use bevy::prelude::*;
use std::f32::consts::{PI, TAU};

/// Smallest smoothing time accepted by [`smooth_damp`].
const MIN_SMOOTH_TIME: f32 = 0.0001;

/// Gradually moves `current` toward `target` using a critically damped spring.
///
/// `velocity` is the caller-owned spring state and must persist between calls.
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    // Never overshoot the target
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }

    output
}

/// Shortest signed difference between two angles in radians, in `(-PI, PI]`.
pub fn delta_angle(current: f32, target: f32) -> f32 {
    let mut delta = (target - current).rem_euclid(TAU);
    if delta > PI {
        delta -= TAU;
    }
    delta
}

/// [`smooth_damp`] for angles in radians, always turning the short way round.
pub fn smooth_damp_angle(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    let target = current + delta_angle(current, target);
    smooth_damp(current, target, velocity, smooth_time, dt)
}

/// Removes the component of `vector` along `normal`.
pub fn project_on_plane(vector: Vec3, normal: Vec3) -> Vec3 {
    let normal = normal.normalize_or_zero();
    if normal == Vec3::ZERO {
        return vector;
    }
    vector - normal * vector.dot(normal)
}

/// Yaw (radians about +Y) that turns the default forward axis (-Z) onto `direction`.
///
/// Returns `None` when `direction` has no horizontal component.
pub fn yaw_toward(direction: Vec3) -> Option<f32> {
    let flat = Vec2::new(direction.x, direction.z);
    if flat.length_squared() <= f32::EPSILON {
        return None;
    }
    Some((-direction.x).atan2(-direction.z))
}

/// Current yaw of a rotation, in radians.
pub fn yaw_of(rotation: Quat) -> f32 {
    let (yaw, _, _) = rotation.to_euler(EulerRot::YXZ);
    yaw
}

/// Angle between a surface normal and world up, in degrees.
pub fn slope_angle_degrees(normal: Vec3) -> f32 {
    normal.normalize_or_zero().angle_between(Vec3::Y).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_damp_converges_without_overshoot() {
        let mut velocity = 0.0;
        let mut value = 0.0;
        for _ in 0..600 {
            value = smooth_damp(value, 10.0, &mut velocity, 0.1, 1.0 / 60.0);
            assert!(value <= 10.0, "smooth_damp overshot: {}", value);
        }
        assert!((value - 10.0).abs() < 0.01, "Expected convergence, got {}", value);
    }

    #[test]
    fn test_smooth_damp_zero_dt_is_identity() {
        let mut velocity = 3.0;
        assert_eq!(smooth_damp(2.0, 10.0, &mut velocity, 0.1, 0.0), 2.0);
        assert_eq!(velocity, 3.0);
    }

    #[test]
    fn test_delta_angle_wraps() {
        let d = delta_angle(170f32.to_radians(), (-170f32).to_radians());
        assert!((d - 20f32.to_radians()).abs() < 1e-4, "got {}", d.to_degrees());
    }

    #[test]
    fn test_project_on_plane_flattens() {
        let projected = project_on_plane(Vec3::new(1.0, 2.0, 0.0), Vec3::Y);
        assert!((projected - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_yaw_toward_forward_is_zero() {
        assert!(yaw_toward(Vec3::NEG_Z).unwrap().abs() < 1e-6);
        assert!(yaw_toward(Vec3::Y).is_none());
        let rotation = Quat::from_rotation_y(yaw_toward(Vec3::X).unwrap());
        assert!((rotation * Vec3::NEG_Z - Vec3::X).length() < 1e-5);
    }
}
