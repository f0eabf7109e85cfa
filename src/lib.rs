//! Terrain generation library
//!
//! Deterministic heightfield synthesis (noise, fBm, domain warp), thermal and
//! hydraulic erosion, height redistribution and splat-mask classification.
//! Re-exports modules for use by binaries and tools.

pub mod cache;
pub mod erosion;
pub mod error;
pub mod export;
pub mod fractal;
pub mod heightfield;
pub mod logging;
pub mod math;
pub mod noise_field;
pub mod pipeline;
pub mod preset;
pub mod redistribution;
pub mod spawn;
pub mod splat;
pub mod tilemap;

pub use erosion::{apply_hydraulic_erosion, apply_thermal_erosion, ErosionPreset, ErosionStats};
pub use error::{Result, TerrainError};
pub use fractal::{synthesize_fractal, FbmParams};
pub use heightfield::HeightField;
pub use noise_field::NoiseKind;
pub use pipeline::{GenerationOutput, StageEvent, StageId, TerrainPipeline};
pub use preset::{PresetDefinition, PresetRegistry};
pub use redistribution::apply_redistribution;
pub use splat::{generate_splat_masks, SplatOutput, SplatRules};
