//! Numeric conversion helpers used across the project.
//!
//! These utilities guard conversions between integer counters and the
//! floating-point domain used for statistics. They rely on debug assertions
//! to flag unexpected overflows while keeping the call-sites ergonomic.

/// Convert a finite `f64` into `f32`, asserting that it fits the target type.
#[expect(
    clippy::cast_possible_truncation,
    reason = "Callers assert that the value fits within f32 bounds."
)]
#[must_use]
pub fn expect_f32(value: f64) -> f32 {
    debug_assert!(value.is_finite(), "expected finite f64 for f32 conversion");
    debug_assert!(
        value <= f64::from(f32::MAX),
        "f64 value {value} exceeds f32::MAX"
    );
    debug_assert!(
        value >= f64::from(f32::MIN),
        "f64 value {value} is below f32::MIN"
    );
    value as f32
}

/// Convert a roster or item count into `f32`.
#[expect(
    clippy::cast_precision_loss,
    reason = "Roster and item counts stay far below 2^24."
)]
#[must_use]
pub const fn count_to_f32(count: usize) -> f32 {
    count as f32
}

/// Ratio of two step counters, or `0.0` when no steps were counted.
///
/// # Examples
/// ```
/// use hideseek::numeric::step_ratio;
/// assert!((step_ratio(30, 60) - 0.5).abs() < f32::EPSILON);
/// assert_eq!(step_ratio(5, 0), 0.0);
/// ```
#[must_use]
pub fn step_ratio(numerator: u32, denominator: u32) -> f32 {
    if denominator == 0 {
        return 0.0;
    }
    expect_f32(f64::from(numerator) / f64::from(denominator))
}
