//! The normalized elevation grid every stage reads and writes in place.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use crate::error::{Result, TerrainError};
use crate::tilemap::Tilemap;

/// Floor applied to the height range so flat fields normalize to 0 instead of NaN.
pub const MIN_NORMALIZE_RANGE: f32 = 1e-6;

/// Dense `width x height` grid of elevations plus the seeded random stream
/// that drives every stochastic stage run on it.
#[derive(Clone, Debug)]
pub struct HeightField {
    map: Tilemap<f32>,
    seed: u64,
    rng: ChaCha8Rng,
}

impl HeightField {
    /// Allocate a zeroed field. Zero-sized dimensions are rejected before
    /// anything is allocated.
    pub fn new(width: usize, height: usize, seed: u64) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TerrainError::InvalidDimensions { width, height });
        }
        Ok(Self {
            map: Tilemap::new_with(width, height, 0.0),
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Adopt an existing grid (e.g. an imported heightmap).
    pub fn from_tilemap(map: Tilemap<f32>, seed: u64) -> Result<Self> {
        if map.width == 0 || map.height == 0 {
            return Err(TerrainError::InvalidDimensions {
                width: map.width,
                height: map.height,
            });
        }
        Ok(Self {
            map,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Adopt a row-major buffer of `width * height` samples.
    pub fn from_values(width: usize, height: usize, seed: u64, values: Vec<f32>) -> Result<Self> {
        let actual = values.len();
        let map = Tilemap::from_vec(width, height, values).ok_or(TerrainError::BufferSize {
            expected: width * height,
            actual,
        })?;
        Self::from_tilemap(map, seed)
    }

    pub fn width(&self) -> usize {
        self.map.width
    }

    pub fn height(&self) -> usize {
        self.map.height
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        *self.map.get(x, y)
    }

    pub fn map(&self) -> &Tilemap<f32> {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut Tilemap<f32> {
        &mut self.map
    }

    /// Row-major samples, as handed to mesh builders.
    pub fn values(&self) -> &[f32] {
        self.map.as_slice()
    }

    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Borrow the grid and the random stream at the same time.
    pub fn parts_mut(&mut self) -> (&mut Tilemap<f32>, &mut ChaCha8Rng) {
        (&mut self.map, &mut self.rng)
    }

    /// Linearly rescale the whole buffer so it spans [0, 1].
    ///
    /// A flat field collapses to all zeros. Non-finite cells are reset to 0
    /// and left out of the range.
    pub fn normalize(&mut self) {
        let (mut min_val, mut max_val) = (f64::INFINITY, f64::NEG_INFINITY);
        for &v in self.values().iter().filter(|v| v.is_finite()) {
            min_val = min_val.min(v as f64);
            max_val = max_val.max(v as f64);
        }
        if min_val > max_val {
            min_val = 0.0;
            max_val = 0.0;
        }

        let range = (max_val - min_val).max(MIN_NORMALIZE_RANGE as f64);
        let mut scrubbed = 0usize;
        for v in self.map.as_mut_slice() {
            if v.is_finite() {
                *v = ((*v as f64 - min_val) / range).clamp(0.0, 1.0) as f32;
            } else {
                *v = 0.0;
                scrubbed += 1;
            }
        }
        if scrubbed > 0 {
            warn!(cells = scrubbed, "non-finite heights reset to 0");
        }
    }

    pub fn min_max(&self) -> (f32, f32) {
        self.map.min_max().unwrap_or((0.0, 0.0))
    }

    pub fn mean(&self) -> f64 {
        let sum: f64 = self.values().iter().map(|&v| v as f64).sum();
        sum / self.map.len() as f64
    }

    /// Sum of squared deviations from the mean.
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        self.values()
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum()
    }

    /// Sum of squared differences between orthogonally adjacent cells.
    pub fn roughness(&self) -> f64 {
        let (w, h) = (self.width(), self.height());
        let mut total = 0.0f64;
        for y in 0..h {
            for x in 0..w {
                let v = self.get(x, y) as f64;
                if x + 1 < w {
                    let d = self.get(x + 1, y) as f64 - v;
                    total += d * d;
                }
                if y + 1 < h {
                    let d = self.get(x, y + 1) as f64 - v;
                    total += d * d;
                }
            }
        }
        total
    }

    /// 8-bit grayscale samples, rounded.
    pub fn to_gray8(&self) -> Vec<u8> {
        self.values()
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }

    /// 16-bit grayscale samples, rounded.
    pub fn to_gray16(&self) -> Vec<u16> {
        self.values()
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 65535.0).round() as u16)
            .collect()
    }
}

/// Print a histogram of height values for debugging.
pub fn print_height_histogram(field: &HeightField, num_bins: usize) {
    let num_bins = num_bins.clamp(5, 50);
    let (min_h, max_h) = field.min_max();
    let count = field.values().len();
    let mean = field.mean();
    let std_dev = (field.variance() / count as f64).sqrt();

    let range = (max_h - min_h).max(MIN_NORMALIZE_RANGE);
    let mut bins = vec![0usize; num_bins];
    for &h in field.values() {
        let bin_idx = (((h - min_h) / range) * num_bins as f32) as usize;
        bins[bin_idx.min(num_bins - 1)] += 1;
    }

    let max_bin = bins.iter().copied().max().unwrap_or(1).max(1);
    let bar_max_width = 40;

    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║                   HEIGHT DISTRIBUTION                      ║");
    println!("╠════════════════════════════════════════════════════════════╣");
    println!("║ Min: {:>7.4}  Max: {:>7.4}  Mean: {:>7.4}  Std: {:>7.4} ║", min_h, max_h, mean, std_dev);
    println!("╠════════════════════════════════════════════════════════════╣");
    for (i, &n) in bins.iter().enumerate() {
        let lo = min_h + range * i as f32 / num_bins as f32;
        let bar_len = n * bar_max_width / max_bin;
        println!(
            "║ {:>6.3} │{:<40}│ {:>5.1}% ║",
            lo,
            "█".repeat(bar_len),
            100.0 * n as f64 / count as f64
        );
    }
    println!("╚════════════════════════════════════════════════════════════╝");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            HeightField::new(0, 10, 1),
            Err(TerrainError::InvalidDimensions { width: 0, height: 10 })
        ));
        assert!(HeightField::new(10, 0, 1).is_err());
    }

    #[test]
    fn test_normalize_spans_unit_range() {
        let mut field =
            HeightField::from_values(2, 2, 0, vec![-3.0, 1.0, 5.0, 2.0]).unwrap();
        field.normalize();
        let (lo, hi) = field.min_max();
        assert!(lo.abs() < 1e-6);
        assert!((hi - 1.0).abs() < 1e-6);
        assert!((field.get(1, 0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_flat_field_is_zero() {
        let mut field = HeightField::from_values(3, 3, 0, vec![0.7; 9]).unwrap();
        field.normalize();
        assert!(field.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_normalize_resets_non_finite_cells() {
        let values = vec![f32::NAN, 2.0, f32::INFINITY, 4.0, f32::NEG_INFINITY, 3.0];
        let mut field = HeightField::from_values(3, 2, 0, values).unwrap();
        field.normalize();
        assert_eq!(field.values(), &[0.0, 0.0, 0.0, 1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_normalize_all_nan_is_zero() {
        let mut field = HeightField::from_values(2, 2, 0, vec![f32::NAN; 4]).unwrap();
        field.normalize();
        assert!(field.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_buffer_size_checked() {
        let err = HeightField::from_values(4, 4, 0, vec![0.0; 15]).unwrap_err();
        assert!(matches!(err, TerrainError::BufferSize { expected: 16, actual: 15 }));
    }

    #[test]
    fn test_variance_and_roughness() {
        let field = HeightField::from_values(2, 1, 0, vec![0.0, 1.0]).unwrap();
        assert!((field.variance() - 0.5).abs() < 1e-12);
        assert!((field.roughness() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_gray8_rounds() {
        let field = HeightField::from_values(3, 1, 0, vec![0.0, 0.5, 1.0]).unwrap();
        assert_eq!(field.to_gray8(), vec![0, 128, 255]);
    }
}
