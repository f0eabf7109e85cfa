//! Texture splat classification
//!
//! Turns the finished height field into per-group RGBA weight masks driven
//! by altitude and slope rules.

pub mod classify;
pub mod rules;
pub mod slope;

pub use classify::{classify_group, generate_splat_masks, GroupWeights, SplatMask, SplatOutput};
pub use rules::{Channel, LayerDefinition, LayerRules, OutputGroup, SplatDiagnostic, SplatRules};
pub use slope::compute_slope_field;
