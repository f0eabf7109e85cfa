//! Named terrain configurations.
//!
//! A [`PresetDefinition`] bundles everything one generation run needs. The
//! [`PresetRegistry`] maps names to definitions; it ships with the built-in
//! biome catalog and can load more from JSON.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::erosion::{HydraulicParams, ThermalParams};
use crate::error::{Result, TerrainError};
use crate::fractal::FbmParams;
use crate::noise_field::NoiseKind;
use crate::spawn::SpawnParams;
use crate::splat::SplatRules;

/// Complete configuration for one generation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetDefinition {
    pub width: usize,
    pub height: usize,
    pub seed: u64,
    /// Carried through for consumers; the pipeline does not use it
    pub sea_level: f32,
    pub fbm: FbmParams,
    pub thermal_enabled: bool,
    pub thermal: ThermalParams,
    pub hydraulic_enabled: bool,
    pub hydraulic: HydraulicParams,
    /// Power-curve exponent; 1.0 leaves heights alone
    pub redistribution_exponent: f32,
    /// Empty means the default grass/rock/dirt rules
    pub splat: SplatRules,
    pub spawn: SpawnParams,
}

impl Default for PresetDefinition {
    fn default() -> Self {
        Self {
            width: 1025,
            height: 1025,
            seed: 1337,
            sea_level: 0.5,
            fbm: FbmParams::default(),
            thermal_enabled: true,
            thermal: ThermalParams::default(),
            hydraulic_enabled: true,
            hydraulic: HydraulicParams::default(),
            redistribution_exponent: 1.0,
            splat: SplatRules::default(),
            spawn: SpawnParams::default(),
        }
    }
}

fn hash_f32<H: Hasher>(state: &mut H, v: f32) {
    v.to_bits().hash(state);
}

impl PresetDefinition {
    /// Check everything that would make the run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TerrainError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        self.fbm.validate()?;
        if !self.thermal.diffusion_rate.is_finite() {
            return Err(TerrainError::InvalidConfig("thermal diffusion rate must be finite".into()));
        }
        if !self.hydraulic.is_finite() {
            return Err(TerrainError::InvalidConfig("hydraulic parameters must be finite".into()));
        }
        if !(0.0..=1.0).contains(&self.hydraulic.inertia) {
            return Err(TerrainError::InvalidConfig(format!(
                "hydraulic inertia must be within [0, 1], got {}",
                self.hydraulic.inertia
            )));
        }
        if !self.redistribution_exponent.is_finite() || self.redistribution_exponent <= 0.0 {
            return Err(TerrainError::InvalidConfig(format!(
                "redistribution exponent must be positive, got {}",
                self.redistribution_exponent
            )));
        }
        Ok(())
    }

    /// Hash of every setting that shapes the height field.
    ///
    /// Splat rules, spawn settings and sea level do not contribute, so two
    /// presets that differ only there share cached terrain.
    pub fn terrain_fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.width.hash(&mut hasher);
        self.height.hash(&mut hasher);
        self.seed.hash(&mut hasher);

        let f = &self.fbm;
        f.noise.hash(&mut hasher);
        hash_f32(&mut hasher, f.scale);
        f.octaves.hash(&mut hasher);
        hash_f32(&mut hasher, f.persistence);
        hash_f32(&mut hasher, f.lacunarity);
        hash_f32(&mut hasher, f.warp_strength);
        hash_f32(&mut hasher, f.warp_scale);

        self.thermal_enabled.hash(&mut hasher);
        if self.thermal_enabled {
            self.thermal.iterations.hash(&mut hasher);
            hash_f32(&mut hasher, self.thermal.diffusion_rate);
        }

        self.hydraulic_enabled.hash(&mut hasher);
        if self.hydraulic_enabled {
            let p = &self.hydraulic;
            p.droplets.hash(&mut hasher);
            hash_f32(&mut hasher, p.inertia);
            hash_f32(&mut hasher, p.capacity_factor);
            hash_f32(&mut hasher, p.min_capacity);
            hash_f32(&mut hasher, p.erosion_rate);
            hash_f32(&mut hasher, p.deposition_rate);
            hash_f32(&mut hasher, p.gravity);
            p.max_lifetime.hash(&mut hasher);
        }

        hash_f32(&mut hasher, self.redistribution_exponent);
        hasher.finish()
    }

    fn catalog_entry(
        size: usize,
        seed: u64,
        noise: NoiseKind,
        scale: f32,
        octaves: u32,
        persistence: f32,
        lacunarity: f32,
    ) -> Self {
        Self {
            width: size,
            height: size,
            seed,
            fbm: FbmParams {
                noise,
                scale,
                octaves,
                persistence,
                lacunarity,
                ..FbmParams::default()
            },
            ..Self::default()
        }
    }

    pub fn downtown_ruins() -> Self {
        let mut p = Self::catalog_entry(2049, 2077, NoiseKind::Perlin, 600.0, 9, 0.55, 2.1);
        p.thermal = ThermalParams { iterations: 4, diffusion_rate: 0.01 };
        p.hydraulic.droplets = 150_000;
        p.hydraulic.erosion_rate = 0.05;
        p
    }

    pub fn crystalline_bloomfall_zone() -> Self {
        let mut p = Self::catalog_entry(4097, 8008, NoiseKind::Perlin, 800.0, 8, 0.7, 2.2);
        p.thermal_enabled = false;
        p.hydraulic.droplets = 200_000;
        p.hydraulic.erosion_rate = 0.3;
        p.hydraulic.deposition_rate = 0.0;
        p
    }

    pub fn mutated_swamplands() -> Self {
        let mut p = Self::catalog_entry(4097, 65_000_000, NoiseKind::Simplex, 1800.0, 6, 0.35, 2.0);
        p.hydraulic.droplets = 1_200_000;
        p.hydraulic.erosion_rate = 0.1;
        p.hydraulic.deposition_rate = 0.35;
        p
    }

    pub fn irradiated_badlands() -> Self {
        let mut p = Self::catalog_entry(4097, 1986, NoiseKind::Perlin, 1200.0, 7, 0.45, 2.1);
        p.thermal = ThermalParams { iterations: 12, diffusion_rate: 0.008 };
        p.hydraulic.droplets = 250_000;
        p.hydraulic.erosion_rate = 0.2;
        p
    }

    pub fn old_world_anomaly() -> Self {
        let mut p = Self::catalog_entry(2049, 1066, NoiseKind::Simplex, 1400.0, 8, 0.4, 2.0);
        p.thermal = ThermalParams { iterations: 15, diffusion_rate: 0.02 };
        p.hydraulic.droplets = 300_000;
        p.hydraulic.erosion_rate = 0.05;
        p
    }

    pub fn gothic_cathedral_approach() -> Self {
        let mut p = Self::catalog_entry(2049, 1888, NoiseKind::Perlin, 700.0, 9, 0.6, 2.3);
        p.thermal.iterations = 3;
        p.hydraulic_enabled = false;
        p
    }

    pub fn mangrove_delta_full() -> Self {
        let mut p = Self::catalog_entry(4097, 1619, NoiseKind::Simplex, 1500.0, 5, 0.3, 2.0);
        p.thermal_enabled = false;
        p.hydraulic.droplets = 1_000_000;
        p.hydraulic.erosion_rate = 0.1;
        p.hydraulic.deposition_rate = 0.3;
        p
    }

    pub fn proving_grounds_small() -> Self {
        let mut p = Self::catalog_entry(1025, 2025, NoiseKind::Simplex, 800.0, 6, 0.45, 2.0);
        p.thermal = ThermalParams { iterations: 5, diffusion_rate: 0.01 };
        p.hydraulic.droplets = 50_000;
        p.hydraulic.erosion_rate = 0.1;
        p.hydraulic.deposition_rate = 0.2;
        p
    }

    pub fn arena_tiny_513() -> Self {
        let mut p = Self::catalog_entry(513, 1111, NoiseKind::Simplex, 400.0, 5, 0.5, 2.0);
        p.thermal.iterations = 3;
        p.hydraulic.droplets = 15_000;
        p
    }
}

/// Lowercase, with spaces and dashes folded to underscores.
fn canonical_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Name to preset lookup table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetRegistry {
    presets: BTreeMap<String, PresetDefinition>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The nine built-in biome presets.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let entries: [(&str, fn() -> PresetDefinition); 9] = [
            ("downtown_ruins", PresetDefinition::downtown_ruins),
            ("crystalline_bloomfall_zone", PresetDefinition::crystalline_bloomfall_zone),
            ("mutated_swamplands", PresetDefinition::mutated_swamplands),
            ("irradiated_badlands", PresetDefinition::irradiated_badlands),
            ("old_world_anomaly", PresetDefinition::old_world_anomaly),
            ("gothic_cathedral_approach", PresetDefinition::gothic_cathedral_approach),
            ("mangrove_delta_full", PresetDefinition::mangrove_delta_full),
            ("proving_grounds_small", PresetDefinition::proving_grounds_small),
            ("arena_tiny_513", PresetDefinition::arena_tiny_513),
        ];
        for (name, build) in entries {
            registry.insert(name, build());
        }
        registry
    }

    /// Parse a JSON object of `{ "name": { ...preset... } }`.
    /// Missing preset fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, PresetDefinition> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for (name, preset) in raw {
            registry.insert(&name, preset);
        }
        Ok(registry)
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.presets)?)
    }

    pub fn insert(&mut self, name: &str, preset: PresetDefinition) {
        self.presets.insert(canonical_name(name), preset);
    }

    /// Add every preset from `other`, replacing same-named entries.
    pub fn merge(&mut self, other: PresetRegistry) {
        self.presets.extend(other.presets);
    }

    pub fn get(&self, name: &str) -> Result<&PresetDefinition> {
        self.presets
            .get(&canonical_name(name))
            .ok_or_else(|| TerrainError::UnknownPreset(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PresetDefinition)> {
        self.presets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
