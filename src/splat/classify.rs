//! Altitude/slope driven layer weights, packed into RGBA masks per group.

use std::collections::BTreeMap;

use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::heightfield::HeightField;
use crate::math::{clamp01, smooth_step};
use crate::splat::rules::{
    Channel, LayerRules, ResolvedGroup, SplatDiagnostic, SplatRules, DEFAULT_BLEND_DISTANCE,
};
use crate::splat::slope::compute_slope_field;
use crate::tilemap::Tilemap;

/// Product of every active gate for one pixel.
#[inline]
pub fn layer_influence(rules: &LayerRules, altitude: f32, slope: f32, blend: f32) -> f32 {
    let rise = |t: f32, v: f32| smooth_step(t - blend, t + blend, v);
    let mut influence = 1.0;
    if let Some(t) = rules.min_altitude {
        influence *= rise(t, altitude);
    }
    if let Some(t) = rules.max_altitude {
        influence *= 1.0 - rise(t, altitude);
    }
    if let Some(t) = rules.min_slope {
        influence *= rise(t, slope);
    }
    if let Some(t) = rules.max_slope {
        influence *= 1.0 - rise(t, slope);
    }
    // A NaN threshold gives the layer no weight
    if influence.is_finite() {
        influence
    } else {
        0.0
    }
}

/// Float weights for one layer.
#[derive(Clone, Debug)]
pub struct LayerWeights {
    pub name: String,
    pub channel: Channel,
    pub weights: Tilemap<f32>,
}

/// Weights for every packed layer of a group; they sum to 1 per pixel.
#[derive(Clone, Debug)]
pub struct GroupWeights {
    pub group: String,
    pub explicit: Vec<LayerWeights>,
    pub base: LayerWeights,
}

impl GroupWeights {
    /// Sum of all layer weights at a pixel.
    pub fn total_at(&self, x: usize, y: usize) -> f32 {
        self.explicit.iter().map(|l| *l.weights.get(x, y)).sum::<f32>() + *self.base.weights.get(x, y)
    }

    /// Quantize to 8 bits per channel. Truncates, so 0.999 packs as 254.
    pub fn pack(&self) -> RgbaImage {
        let width = self.base.weights.width as u32;
        let height = self.base.weights.height as u32;
        let mut image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));

        let layers = self.explicit.iter().chain(std::iter::once(&self.base));
        for layer in layers {
            let c = layer.channel.index();
            for (x, y, &w) in layer.weights.iter() {
                image.get_pixel_mut(x as u32, y as u32).0[c] = quantize(w);
            }
        }
        image
    }
}

#[inline]
fn quantize(w: f32) -> u8 {
    (w * 255.0).clamp(0.0, 255.0) as u8
}

/// Compute normalized weights for a resolved group.
///
/// Explicit influences are divided by their sum where it exceeds 1; the
/// base layer takes the remainder.
pub fn classify_group(
    altitude: &Tilemap<f32>,
    slope: &Tilemap<f32>,
    group: &ResolvedGroup,
    blend: f32,
) -> GroupWeights {
    let (width, height) = (altitude.width, altitude.height);

    let mut explicit: Vec<LayerWeights> = group
        .layers
        .par_iter()
        .map(|(layer, channel)| {
            let weights: Vec<f32> = altitude
                .as_slice()
                .iter()
                .zip(slope.as_slice())
                .map(|(&a, &s)| layer_influence(&layer.rules, a, s, blend))
                .collect();
            LayerWeights {
                name: layer.name.clone(),
                channel: *channel,
                weights: Tilemap::from_vec(width, height, weights)
                    .unwrap_or_else(|| Tilemap::new_with(width, height, 0.0)),
            }
        })
        .collect();

    let mut base = Tilemap::new_with(width, height, 0.0f32);
    for (i, b) in base.as_mut_slice().iter_mut().enumerate() {
        let sum: f32 = explicit.iter().map(|l| l.weights.as_slice()[i]).sum();
        let den = sum.max(1.0);
        let mut normalized_sum = 0.0;
        for layer in explicit.iter_mut() {
            let w = &mut layer.weights.as_mut_slice()[i];
            *w /= den;
            normalized_sum += *w;
        }
        *b = clamp01(1.0 - normalized_sum);
    }

    GroupWeights {
        group: group.name.clone(),
        explicit,
        base: LayerWeights {
            name: group.base_layer.clone(),
            channel: group.base_channel,
            weights: base,
        },
    }
}

/// One packed group texture plus which layer went where.
#[derive(Clone, Debug)]
pub struct SplatMask {
    pub group: String,
    pub image: RgbaImage,
    pub channels: BTreeMap<String, Channel>,
}

/// Everything the classifier produced for a height field.
#[derive(Clone, Debug, Default)]
pub struct SplatOutput {
    /// Packed masks in group declaration order
    pub masks: Vec<SplatMask>,
    /// Names of the groups that were generated
    pub groups: Vec<String>,
    /// Unique layer names declared by the generated groups
    pub layers: Vec<String>,
    pub diagnostics: Vec<SplatDiagnostic>,
}

impl SplatOutput {
    pub fn mask(&self, group: &str) -> Option<&SplatMask> {
        self.masks.iter().find(|m| m.group == group)
    }

    /// Group name to packed image.
    pub fn images(&self) -> BTreeMap<&str, &RgbaImage> {
        self.masks.iter().map(|m| (m.group.as_str(), &m.image)).collect()
    }
}

/// Classify every group of `rules` (or the default rules when none are
/// declared) over the field. Malformed groups and layers are logged and
/// skipped.
pub fn generate_splat_masks(field: &HeightField, rules: &SplatRules) -> SplatOutput {
    let rules = rules.or_default();
    let blend = if rules.blend_distance.is_finite() {
        rules.blend_distance
    } else {
        warn!(blend = rules.blend_distance, fallback = DEFAULT_BLEND_DISTANCE, "non-finite blend distance");
        DEFAULT_BLEND_DISTANCE
    };
    let altitude = field.map();
    let slope = compute_slope_field(altitude);
    let mut output = SplatOutput::default();

    for group in &rules.groups {
        let (resolved, diagnostics) = group.resolve();
        for d in &diagnostics {
            warn!(group = %group.name, "{d}");
        }
        output.diagnostics.extend(diagnostics);

        let Some(resolved) = resolved else {
            continue;
        };

        if !output.groups.contains(&resolved.name) {
            output.groups.push(resolved.name.clone());
        }
        for layer in &resolved.declared_layers {
            if !output.layers.contains(layer) {
                output.layers.push(layer.clone());
            }
        }

        let weights = classify_group(altitude, &slope, &resolved, blend);
        let mut channels: BTreeMap<String, Channel> = weights
            .explicit
            .iter()
            .map(|l| (l.name.clone(), l.channel))
            .collect();
        channels.insert(weights.base.name.clone(), weights.base.channel);

        debug!(group = %resolved.name, layers = channels.len(), "packed splat group");
        output.masks.push(SplatMask {
            group: resolved.name.clone(),
            image: weights.pack(),
            channels,
        });
    }

    output
}
