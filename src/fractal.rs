//! Fractional Brownian motion synthesis of the base terrain.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, TerrainError};
use crate::heightfield::HeightField;
use crate::noise_field::{DomainWarp, NoiseField, NoiseKind};

/// Smallest spatial period accepted; lower values are clamped up to it.
pub const MIN_SCALE: f32 = 1e-3;

/// Noise generator configuration for fBm synthesis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FbmParams {
    /// Noise basis
    pub noise: NoiseKind,
    /// Spatial period of the first octave, in pixels
    pub scale: f32,
    pub octaves: u32,
    /// Amplitude multiplier per octave
    pub persistence: f32,
    /// Frequency multiplier per octave
    pub lacunarity: f32,
    /// Warp displacement in pixels; 0 disables warping
    pub warp_strength: f32,
    /// Period of the first warp octave, in pixels
    pub warp_scale: f32,
}

impl Default for FbmParams {
    fn default() -> Self {
        Self {
            noise: NoiseKind::Simplex,
            scale: 400.0,
            octaves: 8,
            persistence: 0.5,
            lacunarity: 2.0,
            warp_strength: 0.0,
            warp_scale: 50.0,
        }
    }
}

impl FbmParams {
    /// Reject values that cannot produce a meaningful field.
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.scale,
            self.persistence,
            self.lacunarity,
            self.warp_strength,
            self.warp_scale,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(TerrainError::InvalidConfig("fbm parameters must be finite".into()));
        }
        if self.scale <= 0.0 {
            return Err(TerrainError::InvalidConfig(format!(
                "fbm scale must be positive, got {}",
                self.scale
            )));
        }
        if self.warp_strength < 0.0 {
            return Err(TerrainError::InvalidConfig(format!(
                "warp strength must not be negative, got {}",
                self.warp_strength
            )));
        }
        Ok(())
    }

    pub fn warp_enabled(&self) -> bool {
        self.warp_strength > 0.0
    }

    /// Copy with every non-finite shaping value replaced by its default.
    /// Negative warp strength disables warping.
    pub fn sanitized(&self) -> FbmParams {
        let defaults = FbmParams::default();
        let mut out = self.clone();
        let fields = [
            ("persistence", &mut out.persistence, defaults.persistence),
            ("lacunarity", &mut out.lacunarity, defaults.lacunarity),
            ("warp_strength", &mut out.warp_strength, defaults.warp_strength),
            ("warp_scale", &mut out.warp_scale, defaults.warp_scale),
        ];
        for (name, value, fallback) in fields {
            if !value.is_finite() {
                warn!(field = name, value = %value, fallback, "non-finite fbm parameter, using default");
                *value = fallback;
            }
        }
        if out.warp_strength < 0.0 {
            warn!(warp_strength = out.warp_strength, "negative warp strength, warping disabled");
            out.warp_strength = 0.0;
        }
        out
    }

    /// Scale actually used for sampling, after the non-positive guard.
    pub fn effective_scale(&self) -> f32 {
        if self.scale.is_finite() && self.scale > MIN_SCALE {
            self.scale
        } else {
            MIN_SCALE
        }
    }
}

/// Accumulate `octaves` layers of (optionally warped) noise into the field,
/// then normalize.
///
/// Two seeds are drawn from the field's random stream, primary then warp,
/// whether or not warping is enabled.
pub fn synthesize_fractal(field: &mut HeightField, params: &FbmParams) {
    let params = &params.sanitized();
    if params.scale <= 0.0 || !params.scale.is_finite() {
        warn!(scale = params.scale, fallback = MIN_SCALE, "invalid fbm scale, clamping");
    }

    let rng = field.rng_mut();
    let primary_seed: u32 = rng.gen();
    let warp_seed: u32 = rng.gen();

    let primary = NoiseField::new(params.noise, primary_seed);
    let warp = params.warp_enabled().then(|| {
        DomainWarp::new(
            NoiseField::new(params.noise, warp_seed),
            params.warp_scale as f64,
            params.warp_strength as f64,
        )
    });

    let width = field.width();
    let mut amplitude = 1.0f64;
    let mut frequency = 1.0 / params.effective_scale() as f64;

    for _ in 0..params.octaves {
        field
            .map_mut()
            .as_mut_slice()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, cell) in row.iter_mut().enumerate() {
                    let (px, py) = match &warp {
                        Some(w) => w.warp(x as f64, y as f64),
                        None => (x as f64, y as f64),
                    };
                    *cell += (primary.sample(px * frequency, py * frequency) * amplitude) as f32;
                }
            });
        amplitude *= params.persistence as f64;
        frequency *= params.lacunarity as f64;
    }

    field.normalize();
    debug!(
        noise = %params.noise,
        octaves = params.octaves,
        warp = params.warp_enabled(),
        "fractal synthesis complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> FbmParams {
        FbmParams {
            scale: 16.0,
            octaves: 4,
            ..FbmParams::default()
        }
    }

    #[test]
    fn test_synthesis_is_normalized() {
        let mut field = HeightField::new(48, 40, 5).unwrap();
        synthesize_fractal(&mut field, &small_params());
        let (lo, hi) = field.min_max();
        assert!(lo.abs() < 1e-5);
        assert!((hi - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_synthesis_deterministic() {
        for &noise in NoiseKind::all() {
            let params = FbmParams {
                noise,
                warp_strength: 6.0,
                warp_scale: 20.0,
                ..small_params()
            };
            let mut a = HeightField::new(33, 33, 99).unwrap();
            let mut b = HeightField::new(33, 33, 99).unwrap();
            synthesize_fractal(&mut a, &params);
            synthesize_fractal(&mut b, &params);
            assert_eq!(a.values(), b.values());
        }
    }

    #[test]
    fn test_seed_changes_terrain() {
        let mut a = HeightField::new(32, 32, 1).unwrap();
        let mut b = HeightField::new(32, 32, 2).unwrap();
        synthesize_fractal(&mut a, &small_params());
        synthesize_fractal(&mut b, &small_params());
        assert_ne!(a.values(), b.values());
    }

    #[test]
    fn test_warp_changes_terrain() {
        let mut plain = HeightField::new(32, 32, 4).unwrap();
        let mut warped = HeightField::new(32, 32, 4).unwrap();
        synthesize_fractal(&mut plain, &small_params());
        synthesize_fractal(
            &mut warped,
            &FbmParams {
                warp_strength: 10.0,
                warp_scale: 12.0,
                ..small_params()
            },
        );
        assert_ne!(plain.values(), warped.values());
    }

    #[test]
    fn test_zero_scale_does_not_poison_field() {
        let mut field = HeightField::new(16, 16, 3).unwrap();
        let params = FbmParams {
            scale: 0.0,
            ..small_params()
        };
        assert!(params.validate().is_err());
        synthesize_fractal(&mut field, &params);
        assert!(field.values().iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_non_finite_shaping_falls_back_to_defaults() {
        let mut reference = HeightField::new(24, 24, 6).unwrap();
        synthesize_fractal(&mut reference, &small_params());

        let broken = FbmParams {
            persistence: f32::NAN,
            lacunarity: f32::INFINITY,
            warp_strength: f32::NAN,
            warp_scale: f32::NEG_INFINITY,
            ..small_params()
        };
        assert!(broken.validate().is_err());
        let mut field = HeightField::new(24, 24, 6).unwrap();
        synthesize_fractal(&mut field, &broken);

        assert!(field.values().iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
        assert_eq!(field.values(), reference.values());
    }

    #[test]
    fn test_negative_warp_disables_warping() {
        let p = FbmParams {
            warp_strength: -3.0,
            ..small_params()
        }
        .sanitized();
        assert!(!p.warp_enabled());
    }

    #[test]
    fn test_default_params_validate() {
        assert!(FbmParams::default().validate().is_ok());
    }
}
