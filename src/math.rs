//! Scalar helpers shared by the stages.

/// Tolerance used when comparing floats for "close enough".
pub const SMALL_NUMBER: f32 = 1e-8;
pub const KINDA_SMALL_NUMBER: f32 = 1e-4;

/// Linear interpolation from `a` to `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Cubic Hermite ramp from 0 at `edge0` to 1 at `edge1`.
///
/// The band width is floored so coincident edges still produce a step
/// instead of a division by zero.
#[inline]
pub fn smooth_step(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = clamp01((x - edge0) / (edge1 - edge0).max(KINDA_SMALL_NUMBER));
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn is_nearly_equal(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(2.0, 6.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 6.0, 1.0), 6.0);
        assert_eq!(lerp(2.0, 6.0, 0.25), 3.0);
    }

    #[test]
    fn test_smooth_step_shape() {
        assert_eq!(smooth_step(0.2, 0.4, 0.1), 0.0);
        assert_eq!(smooth_step(0.2, 0.4, 0.5), 1.0);
        assert!((smooth_step(0.2, 0.4, 0.3) - 0.5).abs() < 1e-5);
        // Degenerate band behaves like a step
        assert_eq!(smooth_step(0.5, 0.5, 0.49), 0.0);
        assert_eq!(smooth_step(0.5, 0.5, 0.51), 1.0);
    }

    #[test]
    fn test_nearly_equal() {
        assert!(is_nearly_equal(1.0, 1.0 + 1e-9, SMALL_NUMBER));
        assert!(!is_nearly_equal(1.0, 1.001, SMALL_NUMBER));
    }
}
