//! Power-curve height redistribution.
//!
//! Exponents above 1 push mid heights down (wide valleys, sharp peaks);
//! exponents below 1 lift them toward plateaus.

use crate::heightfield::HeightField;
use crate::math::{is_nearly_equal, SMALL_NUMBER};

/// Raise every cell to `exponent` without renormalizing.
pub fn power_curve(field: &mut HeightField, exponent: f32) {
    for v in field.map_mut().as_mut_slice() {
        *v = v.powf(exponent);
    }
}

/// Apply the power curve and renormalize. An exponent of 1 is a no-op.
///
/// Returns whether the field was modified.
pub fn apply_redistribution(field: &mut HeightField, exponent: f32) -> bool {
    if is_nearly_equal(exponent, 1.0, SMALL_NUMBER) {
        return false;
    }
    if !exponent.is_finite() || exponent <= 0.0 {
        tracing::warn!(exponent, "invalid redistribution exponent, skipping");
        return false;
    }
    power_curve(field, exponent);
    field.normalize();
    true
}
