//! Thermal erosion: nudges every interior cell toward the average of its
//! four orthogonal neighbours.
//!
//! Each sweep updates the buffer in place in row-major order, so a cell sees
//! the already-updated values of its left and upper neighbours from the same
//! sweep. Results depend on that ordering; a double-buffered variant would
//! produce different terrain.

use tracing::warn;

use crate::erosion::params::ThermalParams;
use crate::erosion::ErosionStats;
use crate::heightfield::HeightField;
use crate::tilemap::Tilemap;

/// Run all sweeps without the final normalization.
pub fn thermal_sweeps(heightmap: &mut Tilemap<f32>, params: &ThermalParams) -> ErosionStats {
    let width = heightmap.width;
    let height = heightmap.height;
    let mut stats = ErosionStats {
        iterations: params.iterations as usize,
        ..ErosionStats::default()
    };

    if width < 3 || height < 3 {
        return stats;
    }
    if !params.diffusion_rate.is_finite() {
        warn!(rate = params.diffusion_rate, "non-finite thermal diffusion rate, skipping");
        stats.iterations = 0;
        return stats;
    }

    let rate = params.diffusion_rate;
    let data = heightmap.as_mut_slice();

    for _ in 0..params.iterations {
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let idx = y * width + x;
                let center = data[idx];
                let avg = (data[idx - 1] + data[idx + 1] + data[idx - width] + data[idx + width]) * 0.25;
                let delta = (avg - center) * rate;
                data[idx] += delta;

                stats.steps_taken += 1;
                if delta < 0.0 {
                    stats.total_eroded += -delta as f64;
                    stats.max_erosion = stats.max_erosion.max(-delta);
                } else {
                    stats.total_deposited += delta as f64;
                    stats.max_deposition = stats.max_deposition.max(delta);
                }
            }
        }
    }

    stats
}

/// Smooth the field for `iterations` sweeps, then normalize.
///
/// A non-finite diffusion rate leaves the field untouched.
pub fn apply_thermal_erosion(field: &mut HeightField, params: &ThermalParams) -> ErosionStats {
    let stats = thermal_sweeps(field.map_mut(), params);
    if stats.iterations > 0 {
        field.normalize();
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fractal::{synthesize_fractal, FbmParams};

    fn rough_field(seed: u64) -> HeightField {
        let mut field = HeightField::new(64, 64, seed).unwrap();
        synthesize_fractal(
            &mut field,
            &FbmParams {
                scale: 16.0,
                octaves: 5,
                ..FbmParams::default()
            },
        );
        field
    }

    #[test]
    fn test_zero_rate_is_identity() {
        let mut field = rough_field(3);
        let before = field.values().to_vec();
        apply_thermal_erosion(
            &mut field,
            &ThermalParams {
                iterations: 5,
                diffusion_rate: 0.0,
            },
        );
        for (a, b) in before.iter().zip(field.values()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_zero_iterations_is_identity() {
        let mut field = rough_field(4);
        let before = field.values().to_vec();
        apply_thermal_erosion(
            &mut field,
            &ThermalParams {
                iterations: 0,
                diffusion_rate: 0.5,
            },
        );
        for (a, b) in before.iter().zip(field.values()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_border_untouched_by_sweeps() {
        let mut field = rough_field(5);
        let before = field.map().clone();
        thermal_sweeps(
            field.map_mut(),
            &ThermalParams {
                iterations: 3,
                diffusion_rate: 0.25,
            },
        );
        let w = before.width;
        let h = before.height;
        for x in 0..w {
            assert_eq!(before.get(x, 0), field.map().get(x, 0));
            assert_eq!(before.get(x, h - 1), field.map().get(x, h - 1));
        }
        for y in 0..h {
            assert_eq!(before.get(0, y), field.map().get(0, y));
            assert_eq!(before.get(w - 1, y), field.map().get(w - 1, y));
        }
    }

    #[test]
    fn test_spike_flattens() {
        let mut map = Tilemap::new_with(5, 5, 0.0f32);
        map.set(2, 2, 1.0);
        let stats = thermal_sweeps(
            &mut map,
            &ThermalParams {
                iterations: 1,
                diffusion_rate: 0.5,
            },
        );
        assert!(*map.get(2, 2) < 1.0);
        assert!(stats.total_eroded > 0.0);
    }

    #[test]
    fn test_in_place_sweep_reads_updated_neighbours() {
        let mut map = Tilemap::new_with(5, 5, 0.0f32);
        map.set(2, 1, 1.0);
        thermal_sweeps(
            &mut map,
            &ThermalParams {
                iterations: 1,
                diffusion_rate: 1.0,
            },
        );
        // (1,1) saw the spike to its right
        assert!((*map.get(1, 1) - 0.25).abs() < 1e-6);
        // (2,1) averaged the freshly written 0.25 on its left, not the old 0
        assert!((*map.get(2, 1) - 0.0625).abs() < 1e-6);
        // (3,1) saw the already-flattened spike
        assert!((*map.get(3, 1) - 0.015625).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_rate_skips_stage() {
        for rate in [f32::INFINITY, f32::NAN] {
            let mut field = rough_field(7);
            let before = field.values().to_vec();
            let stats = apply_thermal_erosion(
                &mut field,
                &ThermalParams {
                    iterations: 5,
                    diffusion_rate: rate,
                },
            );
            assert_eq!(stats.steps_taken, 0);
            assert_eq!(field.values(), before.as_slice());
        }
    }

    #[test]
    fn test_output_in_unit_range() {
        let mut field = rough_field(6);
        apply_thermal_erosion(&mut field, &ThermalParams::default());
        assert!(field.values().iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
