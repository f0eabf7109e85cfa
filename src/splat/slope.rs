//! Per-pixel slope derived from the final height field.

use crate::math::SMALL_NUMBER;
use crate::tilemap::Tilemap;

/// Central-difference gradient magnitude at every pixel, edges clamped,
/// scaled so the steepest pixel is 1. A flat map stays all zero.
pub fn compute_slope_field(heights: &Tilemap<f32>) -> Tilemap<f32> {
    let mut slope = Tilemap::new_with(heights.width, heights.height, 0.0f32);
    let mut max_slope = 0.0f32;

    for (x, y, s) in slope.iter_mut() {
        let (x, y) = (x as i64, y as i64);
        let dzdx = (heights.get_clamped(x + 1, y) - heights.get_clamped(x - 1, y)) * 0.5;
        let dzdy = (heights.get_clamped(x, y + 1) - heights.get_clamped(x, y - 1)) * 0.5;
        let g = (dzdx * dzdx + dzdy * dzdy).sqrt();
        *s = g;
        max_slope = max_slope.max(g);
    }

    if max_slope > SMALL_NUMBER {
        let inv = 1.0 / max_slope;
        for v in slope.as_mut_slice() {
            *v *= inv;
        }
    }
    slope
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_map_has_zero_slope() {
        let slope = compute_slope_field(&Tilemap::new_with(6, 6, 0.4f32));
        assert!(slope.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_ramp_slope_is_normalized() {
        let mut heights = Tilemap::new_with(8, 4, 0.0f32);
        for (x, _, v) in heights.iter_mut() {
            *v = x as f32 * 0.1;
        }
        let slope = compute_slope_field(&heights);
        // Interior pixels see the full step, edges only half of it
        assert!((slope.get(3, 2) - 1.0).abs() < 1e-6);
        assert!((slope.get(0, 2) - 0.5).abs() < 1e-6);
        assert!(slope.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
