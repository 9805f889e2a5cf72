//! Planar vector helpers.
//! Headings, cone angles, and the distance metrics used by capture and
//! out-of-bounds checks.
use glam::Vec2;
use std::f32::consts::{PI, TAU};

/// Unit vector pointing along `heading` (radians, counter-clockwise from +x).
///
/// # Examples
/// ```
/// use hideseek::vector_math::forward;
/// let f = forward(std::f32::consts::FRAC_PI_2);
/// assert!(f.x.abs() < 1e-6);
/// assert!((f.y - 1.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn forward(heading: f32) -> Vec2 {
    Vec2::from_angle(heading)
}

/// Unsigned angle between two vectors in degrees.
///
/// Returns `None` when either vector is zero or non-finite, since no
/// direction can be derived from it.
#[must_use]
pub fn angle_between_deg(lhs: Vec2, rhs: Vec2) -> Option<f32> {
    let unit_lhs = lhs.try_normalize()?;
    let unit_rhs = rhs.try_normalize()?;
    Some(unit_lhs.dot(unit_rhs).clamp(-1.0, 1.0).acos().to_degrees())
}

/// Euclidean distance on the ground plane.
#[must_use]
pub fn planar_distance(lhs: Vec2, rhs: Vec2) -> f32 {
    lhs.distance(rhs)
}

/// Largest per-axis offset between two points.
///
/// # Examples
/// ```
/// use glam::Vec2;
/// use hideseek::vector_math::chebyshev_distance;
/// let d = chebyshev_distance(Vec2::new(1.0, -4.0), Vec2::ZERO);
/// assert!((d - 4.0).abs() < f32::EPSILON);
/// ```
#[must_use]
pub fn chebyshev_distance(lhs: Vec2, rhs: Vec2) -> f32 {
    let offset = (lhs - rhs).abs();
    offset.x.max(offset.y)
}

/// Wraps an angle in radians into `[-π, π)`.
#[must_use]
pub fn normalize_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::f32::consts::FRAC_PI_2;

    #[rstest]
    #[case(Vec2::X, Vec2::X, 0.0)]
    #[case(Vec2::X, Vec2::Y, 90.0)]
    #[case(Vec2::X, Vec2::NEG_X, 180.0)]
    #[case(Vec2::new(1.0, 1.0), Vec2::X, 45.0)]
    fn angle_cases(#[case] lhs: Vec2, #[case] rhs: Vec2, #[case] expected: f32) {
        let angle = angle_between_deg(lhs, rhs).expect("non-zero vectors have an angle");
        assert_relative_eq!(angle, expected, epsilon = 1e-3);
    }

    #[rstest]
    fn angle_is_undefined_for_zero_vector() {
        assert!(angle_between_deg(Vec2::ZERO, Vec2::X).is_none());
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(1.5 * PI, -FRAC_PI_2)]
    #[case(-FRAC_PI_2, -FRAC_PI_2)]
    #[case(TAU + 0.5, 0.5)]
    fn normalize_cases(#[case] angle: f32, #[case] expected: f32) {
        assert_relative_eq!(normalize_angle(angle), expected, epsilon = 1e-5);
    }
}
