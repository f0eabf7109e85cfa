//! Seeded coherent noise sources used by fractal synthesis.
//!
//! Both kinds return values roughly in [-1, 1] and depend only on the seed
//! and the sample coordinates, so identical inputs give identical terrain
//! across runs and platforms.

use noise::{NoiseFn, OpenSimplex, Perlin};
use serde::{Deserialize, Serialize};

/// Which gradient-noise basis to sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    /// Classic lattice gradient noise
    Perlin,
    /// Simplex-style gradient noise
    #[default]
    Simplex,
}

impl NoiseKind {
    pub fn all() -> &'static [Self] {
        &[Self::Perlin, Self::Simplex]
    }
}

impl std::fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Perlin => write!(f, "perlin"),
            Self::Simplex => write!(f, "simplex"),
        }
    }
}

#[derive(Clone, Debug)]
enum Source {
    Perlin(Perlin),
    Simplex(OpenSimplex),
}

/// A single seeded 2D noise generator.
#[derive(Clone, Debug)]
pub struct NoiseField {
    source: Source,
}

impl NoiseField {
    pub fn new(kind: NoiseKind, seed: u32) -> Self {
        let source = match kind {
            NoiseKind::Perlin => Source::Perlin(Perlin::new(seed)),
            NoiseKind::Simplex => Source::Simplex(OpenSimplex::new(seed)),
        };
        Self { source }
    }

    #[inline]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        match &self.source {
            Source::Perlin(n) => n.get([x, y]),
            Source::Simplex(n) => n.get([x, y]),
        }
    }
}

/// Number of octaves summed by the warp field.
pub const WARP_OCTAVES: usize = 3;

const WARP_OFFSET_X: f64 = 1000.0;
const WARP_OFFSET_Y: f64 = 2000.0;

/// Coordinate perturbation driven by a second, independently seeded field.
#[derive(Clone, Debug)]
pub struct DomainWarp {
    field: NoiseField,
    base_frequency: f64,
    strength: f64,
}

impl DomainWarp {
    /// `scale` is the period of the first warp octave in pixels; a
    /// non-positive scale samples the warp field at a single point.
    pub fn new(field: NoiseField, scale: f64, strength: f64) -> Self {
        let base_frequency = if scale > 0.0 { 1.0 / scale } else { 0.0 };
        Self {
            field,
            base_frequency,
            strength,
        }
    }

    /// Displace a pixel-space coordinate.
    ///
    /// The two axes read the same field at fixed offsets so they decorrelate.
    pub fn warp(&self, x: f64, y: f64) -> (f64, f64) {
        let mut wx = 0.0;
        let mut wy = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.base_frequency;
        for _ in 0..WARP_OCTAVES {
            wx += self.field.sample(x * frequency + WARP_OFFSET_X, y * frequency + WARP_OFFSET_X) * amplitude;
            wy += self.field.sample(x * frequency + WARP_OFFSET_Y, y * frequency + WARP_OFFSET_Y) * amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        (x + wx * self.strength, y + wy * self.strength)
    }
}
