//! Utility functions for erosion calculations
//!
//! Bilinear height and gradient over the cell quad a droplet is standing in.

use crate::math::lerp;
use crate::tilemap::Tilemap;

/// Interpolated height and gradient at a fractional position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellSample {
    pub height: f32,
    pub gradient_x: f32,
    pub gradient_y: f32,
}

/// Sample the quad whose top-left corner is `(ix, iy)` at offsets `(ox, oy)`.
///
/// Caller guarantees `ix + 1 < width` and `iy + 1 < height`.
#[inline]
pub fn sample_cell(heightmap: &Tilemap<f32>, ix: usize, iy: usize, ox: f32, oy: f32) -> CellSample {
    let tl = *heightmap.get(ix, iy);
    let tr = *heightmap.get(ix + 1, iy);
    let bl = *heightmap.get(ix, iy + 1);
    let br = *heightmap.get(ix + 1, iy + 1);

    let height = lerp(lerp(tl, tr, ox), lerp(bl, br, ox), oy);

    // dh/dx blended across rows, dh/dy blended across columns
    let gradient_x = (tr - tl) * (1.0 - oy) + (br - bl) * oy;
    let gradient_y = (bl - tl) * (1.0 - ox) + (br - tr) * ox;

    CellSample {
        height,
        gradient_x,
        gradient_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_x() -> Tilemap<f32> {
        let mut map = Tilemap::new_with(4, 4, 0.0f32);
        for (x, _, v) in map.iter_mut() {
            *v = x as f32 * 0.5;
        }
        map
    }

    #[test]
    fn test_gradient_points_uphill() {
        let s = sample_cell(&ramp_x(), 1, 1, 0.25, 0.5);
        assert!((s.gradient_x - 0.5).abs() < 1e-6);
        assert!(s.gradient_y.abs() < 1e-6);
        assert!((s.height - 0.625).abs() < 1e-6);
    }

    #[test]
    fn test_corner_offsets_hit_exact_values() {
        let map = Tilemap::from_vec(2, 2, vec![0.1f32, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(sample_cell(&map, 0, 0, 0.0, 0.0).height, 0.1);
        assert!((sample_cell(&map, 0, 0, 1.0, 1.0).height - 0.4).abs() < 1e-6);
    }
}
