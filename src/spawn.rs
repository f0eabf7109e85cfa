//! Spawn point selection on a finished height field.
//!
//! The field is treated as a triangle mesh with two triangles per grid
//! quad, scaled to world units. Triangles flat enough qualify, are
//! shuffled, then accepted greedily while they keep a minimum distance
//! from every point already chosen.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::heightfield::HeightField;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnParams {
    /// Number of points wanted; 0 disables the stage
    pub count: usize,
    /// Steepest allowed surface, measured from horizontal
    pub max_slope_degrees: f32,
    /// Minimum world-space distance between accepted points
    pub min_separation: f32,
    /// World units per grid cell
    pub xy_scale: f32,
    /// World units for a full 0..1 height change
    pub z_scale: f32,
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            count: 0,
            max_slope_degrees: 20.0,
            min_separation: 500.0,
            xy_scale: 10.0,
            z_scale: 10.0,
        }
    }
}

/// A world-space position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl SpawnPoint {
    pub fn distance_squared(&self, other: &SpawnPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

type Vec3 = [f32; 3];

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// The two triangles of the quad at `(x, y)`, as world-space corners.
fn quad_triangles(field: &HeightField, x: usize, y: usize, params: &SpawnParams) -> [[Vec3; 3]; 2] {
    let corner = |cx: usize, cy: usize| -> Vec3 {
        [
            cx as f32 * params.xy_scale,
            cy as f32 * params.xy_scale,
            field.get(cx, cy) * params.z_scale,
        ]
    };
    let v00 = corner(x, y);
    let v10 = corner(x + 1, y);
    let v01 = corner(x, y + 1);
    let v11 = corner(x + 1, y + 1);
    [[v00, v01, v11], [v00, v11, v10]]
}

/// Vertical component of the unit normal, sign-flipped to face up.
fn normal_z(tri: &[Vec3; 3]) -> f32 {
    let n = cross(sub(tri[2], tri[0]), sub(tri[1], tri[0]));
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len <= f32::EPSILON {
        return 0.0;
    }
    (n[2] / len).abs()
}

fn centroid(tri: &[Vec3; 3]) -> SpawnPoint {
    SpawnPoint {
        x: (tri[0][0] + tri[1][0] + tri[2][0]) / 3.0,
        y: (tri[0][1] + tri[1][1] + tri[2][1]) / 3.0,
        z: (tri[0][2] + tri[1][2] + tri[2][2]) / 3.0,
    }
}

/// Pick up to `params.count` spawn points, drawing the shuffle from `rng`.
pub fn find_spawn_points<R: Rng + ?Sized>(
    field: &HeightField,
    params: &SpawnParams,
    rng: &mut R,
) -> Vec<SpawnPoint> {
    let (w, h) = (field.width(), field.height());
    if params.count == 0 || w < 2 || h < 2 {
        return Vec::new();
    }

    let min_cos = params.max_slope_degrees.clamp(0.0, 90.0).to_radians().cos();
    let quads_per_row = w - 1;

    // Triangle ids: quad index * 2 + triangle within quad
    let mut candidates: Vec<u32> = Vec::new();
    for y in 0..h - 1 {
        for x in 0..w - 1 {
            let tris = quad_triangles(field, x, y, params);
            for (t, tri) in tris.iter().enumerate() {
                if normal_z(tri) >= min_cos {
                    candidates.push(((y * quads_per_row + x) * 2 + t) as u32);
                }
            }
        }
    }
    if candidates.is_empty() {
        return Vec::new();
    }

    candidates.shuffle(rng);

    let min_sep_sq = params.min_separation * params.min_separation;
    let mut points: Vec<SpawnPoint> = Vec::with_capacity(params.count);
    for id in candidates {
        if points.len() >= params.count {
            break;
        }
        let id = id as usize;
        let quad = id / 2;
        let tris = quad_triangles(field, quad % quads_per_row, quad / quads_per_row, params);
        let candidate = centroid(&tris[id % 2]);
        if points.iter().all(|p| p.distance_squared(&candidate) >= min_sep_sq) {
            points.push(candidate);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn params(count: usize, sep: f32) -> SpawnParams {
        SpawnParams {
            count,
            min_separation: sep,
            ..SpawnParams::default()
        }
    }

    #[test]
    fn test_flat_field_respects_separation() {
        let field = HeightField::new(32, 32, 1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let points = find_spawn_points(&field, &params(6, 40.0), &mut rng);
        assert_eq!(points.len(), 6);
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                assert!(a.distance_squared(b) >= 40.0 * 40.0);
            }
        }
    }

    #[test]
    fn test_steep_field_has_no_candidates() {
        // 45 degree ramp in world units, limit at 20 degrees
        let values = (0..16 * 16).map(|i| (i % 16) as f32).collect();
        let field = HeightField::from_values(16, 16, 0, values).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert!(find_spawn_points(&field, &params(3, 0.0), &mut rng).is_empty());
    }

    #[test]
    fn test_same_rng_same_points() {
        let field = HeightField::new(24, 24, 1).unwrap();
        let a = find_spawn_points(&field, &params(4, 30.0), &mut ChaCha8Rng::seed_from_u64(9));
        let b = find_spawn_points(&field, &params(4, 30.0), &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_count_is_empty() {
        let field = HeightField::new(8, 8, 1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(find_spawn_points(&field, &params(0, 0.0), &mut rng).is_empty());
    }

    #[test]
    fn test_separation_limits_count() {
        // 4x4 cells of 10 units: nothing fits twice with a 1000 unit gap
        let field = HeightField::new(5, 5, 1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let points = find_spawn_points(&field, &params(10, 1000.0), &mut rng);
        assert_eq!(points.len(), 1);
    }
}
