//! Mathematical utilities

use crate::constant::PI;
use nalgebra::{UnitQuaternion, Vector3};

/// Maps an angle difference into the interval `(-pi, pi]`.
pub fn wrap_angle(angle: f64) -> f64 {
    let mut wrapped = angle % (2.0 * PI);
    if wrapped <= -PI {
        wrapped += 2.0 * PI;
    } else if wrapped > PI {
        wrapped -= 2.0 * PI;
    }
    wrapped
}

/// Clamps `value` to `[min, max]`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Linear interpolation between two points.
pub fn lerp_vector(a: &Vector3<f64>, b: &Vector3<f64>, amount: f64) -> Vector3<f64> {
    a * (1.0 - amount) + b * amount
}

/// Rotation taking the local `+x` axis onto `direction`.
///
/// Falls back to the identity for a zero direction, and to a half turn about `y` when the
/// direction is exactly `-x` (where the shortest-arc rotation is not unique).
pub fn orient_x_along(direction: &Vector3<f64>) -> UnitQuaternion<f64> {
    if direction.norm_squared() < 1e-24 {
        return UnitQuaternion::identity();
    }
    UnitQuaternion::rotation_between(&Vector3::x(), direction)
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vector3::y_axis(), PI))
}

/// Get minimum distance between a point and a line segment.
///
/// # Arguments
///
/// `pos`: position of the point
///
/// `start`: first end of the segment
///
/// `end`: second end of the segment
pub fn distance_to_segment(pos: &Vector3<f64>, start: &Vector3<f64>, end: &Vector3<f64>) -> f64 {
    let segment = end - start;
    let length_squared = segment.norm_squared();
    if length_squared == 0.0 {
        return (pos - start).norm();
    }
    let fraction = clamp((pos - start).dot(&segment) / length_squared, 0.0, 1.0);
    (pos - (start + segment * fraction)).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_wrap_angle() {
        assert_approx_eq!(wrap_angle(0.5), 0.5);
        assert_approx_eq!(wrap_angle(3.0 * PI / 2.0), -PI / 2.0);
        assert_approx_eq!(wrap_angle(-3.0 * PI / 2.0), PI / 2.0);
        assert_approx_eq!(wrap_angle(PI), PI);
        assert_approx_eq!(wrap_angle(-PI), PI);
    }

    #[test]
    fn test_orient_x_along() {
        let direction = Vector3::new(0.0, 0.0, 2.0);
        let rotated = orient_x_along(&direction) * Vector3::x();
        assert_approx_eq!(rotated.z, 1.0, 1e-12);

        let flipped = orient_x_along(&Vector3::new(-1.0, 0.0, 0.0)) * Vector3::x();
        assert_approx_eq!(flipped.x, -1.0, 1e-12);
    }

    #[test]
    fn test_distance_to_segment() {
        let start = Vector3::new(0.0, 0.0, 0.0);
        let end = Vector3::new(2.0, 0.0, 0.0);
        assert_approx_eq!(distance_to_segment(&Vector3::new(1.0, 1.0, 0.0), &start, &end), 1.0);
        assert_approx_eq!(distance_to_segment(&Vector3::new(3.0, 0.0, 0.0), &start, &end), 1.0);
        assert_approx_eq!(distance_to_segment(&Vector3::new(1.0, 0.0, 0.0), &start, &start), 1.0);
    }
}
