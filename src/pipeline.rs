//! Generation pipeline orchestration.
//!
//! Runs the stages a preset enables, in fixed order, on a single height
//! field: synthesis, thermal, hydraulic, redistribution, then the splat and
//! spawn post-processes. Stage functions never fail; only invalid
//! dimensions abort a run.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::cache::HeightFieldCache;
use crate::erosion::{apply_hydraulic_erosion, apply_thermal_erosion, ErosionStats};
use crate::error::Result;
use crate::fractal::synthesize_fractal;
use crate::heightfield::HeightField;
use crate::math::{is_nearly_equal, SMALL_NUMBER};
use crate::preset::PresetDefinition;
use crate::redistribution::apply_redistribution;
use crate::spawn::{find_spawn_points, SpawnPoint};
use crate::splat::{generate_splat_masks, SplatOutput};

/// Unique identifier for generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    Synthesis,
    Thermal,
    Hydraulic,
    Redistribution,
    Splat,
    SpawnPoints,
}

impl StageId {
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Synthesis => "synthesis",
            StageId::Thermal => "thermal",
            StageId::Hydraulic => "hydraulic",
            StageId::Redistribution => "redistribution",
            StageId::Splat => "splat",
            StageId::SpawnPoints => "spawn_points",
        }
    }

    /// Whether the stage shapes the height field (and is therefore cached).
    pub fn is_terrain(&self) -> bool {
        matches!(
            self,
            StageId::Synthesis | StageId::Thermal | StageId::Hydraulic | StageId::Redistribution
        )
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fired after each stage finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct StageEvent {
    pub stage: StageId,
    /// Zero-based position among the stages of this run
    pub index: usize,
    pub total: usize,
    pub elapsed: Duration,
    /// The result came from the cache instead of being computed
    pub cached: bool,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub heightfield: HeightField,
    pub splat: Option<SplatOutput>,
    pub spawn_points: Vec<SpawnPoint>,
    pub thermal_stats: Option<ErosionStats>,
    pub hydraulic_stats: Option<ErosionStats>,
    pub from_cache: bool,
    pub timings: Vec<(StageId, Duration)>,
}

/// Orchestrates the stages and owns the optional terrain cache.
#[derive(Debug, Clone)]
pub struct TerrainPipeline {
    generate_splat: bool,
    cache: Option<HeightFieldCache>,
}

impl Default for TerrainPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl TerrainPipeline {
    /// Splat generation on, no cache.
    pub fn new() -> Self {
        Self {
            generate_splat: true,
            cache: None,
        }
    }

    pub fn with_splat(mut self, enabled: bool) -> Self {
        self.generate_splat = enabled;
        self
    }

    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = Some(HeightFieldCache::new(capacity));
        self
    }

    pub fn cache(&self) -> Option<&HeightFieldCache> {
        self.cache.as_ref()
    }

    /// Stages a run of `preset` will execute, in order.
    pub fn stages(&self, preset: &PresetDefinition) -> Vec<StageId> {
        let mut stages = vec![StageId::Synthesis];
        stages.extend(self.post_synthesis_stages(preset));
        stages
    }

    fn post_synthesis_stages(&self, preset: &PresetDefinition) -> Vec<StageId> {
        let mut stages = Vec::new();
        if preset.thermal_enabled {
            stages.push(StageId::Thermal);
        }
        if preset.hydraulic_enabled {
            stages.push(StageId::Hydraulic);
        }
        if !is_nearly_equal(preset.redistribution_exponent, 1.0, SMALL_NUMBER) {
            stages.push(StageId::Redistribution);
        }
        if self.generate_splat {
            stages.push(StageId::Splat);
        }
        if preset.spawn.count > 0 {
            stages.push(StageId::SpawnPoints);
        }
        stages
    }

    pub fn run(&mut self, preset: &PresetDefinition) -> Result<GenerationOutput> {
        self.run_with_callback(preset, |_| {})
    }

    /// Run every enabled stage, calling `on_stage_complete` after each.
    pub fn run_with_callback<F>(
        &mut self,
        preset: &PresetDefinition,
        on_stage_complete: F,
    ) -> Result<GenerationOutput>
    where
        F: FnMut(&StageEvent),
    {
        let field = HeightField::new(preset.width, preset.height, preset.seed)?;
        if let Err(err) = preset.validate() {
            warn!(%err, "preset has invalid settings, stages will fall back");
        }

        let stages = self.stages(preset);
        let key = preset.terrain_fingerprint();
        let cached = self.cache.as_mut().and_then(|c| c.get(key));

        let mut run = StageRun::new(stages, on_stage_complete);
        let from_cache = cached.is_some();

        let field = match cached {
            Some(field) => {
                info!(key, "terrain cache hit");
                for stage in run.stages.clone().into_iter().filter(StageId::is_terrain) {
                    run.complete(stage, Duration::ZERO, true);
                }
                field
            }
            None => {
                let mut field = field;
                let started = Instant::now();
                synthesize_fractal(&mut field, &preset.fbm);
                run.complete(StageId::Synthesis, started.elapsed(), false);
                let field = self.erode_and_redistribute(field, preset, &mut run);
                if let Some(cache) = self.cache.as_mut() {
                    cache.insert(key, field.clone());
                }
                field
            }
        };

        Ok(self.finish(field, preset, run, from_cache))
    }

    /// Run everything after synthesis on an existing field, e.g. an imported
    /// heightmap. The cache is bypassed.
    pub fn run_on_heightfield<F>(
        &mut self,
        field: HeightField,
        preset: &PresetDefinition,
        on_stage_complete: F,
    ) -> GenerationOutput
    where
        F: FnMut(&StageEvent),
    {
        let mut run = StageRun::new(self.post_synthesis_stages(preset), on_stage_complete);
        let field = self.erode_and_redistribute(field, preset, &mut run);
        self.finish(field, preset, run, false)
    }

    fn erode_and_redistribute<F: FnMut(&StageEvent)>(
        &self,
        mut field: HeightField,
        preset: &PresetDefinition,
        run: &mut StageRun<F>,
    ) -> HeightField {
        if preset.thermal_enabled {
            let started = Instant::now();
            let stats = apply_thermal_erosion(&mut field, &preset.thermal);
            info!(%stats, "thermal erosion");
            run.thermal_stats = Some(stats);
            run.complete(StageId::Thermal, started.elapsed(), false);
        }
        if preset.hydraulic_enabled {
            let started = Instant::now();
            let stats = apply_hydraulic_erosion(&mut field, &preset.hydraulic);
            info!(%stats, "hydraulic erosion");
            run.hydraulic_stats = Some(stats);
            run.complete(StageId::Hydraulic, started.elapsed(), false);
        }
        if run.stages.contains(&StageId::Redistribution) {
            let started = Instant::now();
            apply_redistribution(&mut field, preset.redistribution_exponent);
            run.complete(StageId::Redistribution, started.elapsed(), false);
        }
        field
    }

    fn finish<F: FnMut(&StageEvent)>(
        &self,
        mut field: HeightField,
        preset: &PresetDefinition,
        mut run: StageRun<F>,
        from_cache: bool,
    ) -> GenerationOutput {
        let splat = if self.generate_splat {
            let started = Instant::now();
            let out = generate_splat_masks(&field, &preset.splat);
            run.complete(StageId::Splat, started.elapsed(), false);
            Some(out)
        } else {
            None
        };

        let spawn_points = if preset.spawn.count > 0 {
            let started = Instant::now();
            // Continue the field's own random stream
            let mut rng = field.rng_mut().clone();
            let points = find_spawn_points(&field, &preset.spawn, &mut rng);
            *field.rng_mut() = rng;
            if points.len() < preset.spawn.count {
                warn!(
                    wanted = preset.spawn.count,
                    found = points.len(),
                    "not enough flat, separated spawn locations"
                );
            }
            run.complete(StageId::SpawnPoints, started.elapsed(), false);
            points
        } else {
            Vec::new()
        };

        GenerationOutput {
            heightfield: field,
            splat,
            spawn_points,
            thermal_stats: run.thermal_stats,
            hydraulic_stats: run.hydraulic_stats,
            from_cache,
            timings: run.timings,
        }
    }
}

/// Bookkeeping for one run: event numbering, timings, stage stats.
struct StageRun<F> {
    stages: Vec<StageId>,
    completed: usize,
    on_stage_complete: F,
    timings: Vec<(StageId, Duration)>,
    thermal_stats: Option<ErosionStats>,
    hydraulic_stats: Option<ErosionStats>,
}

impl<F: FnMut(&StageEvent)> StageRun<F> {
    fn new(stages: Vec<StageId>, on_stage_complete: F) -> Self {
        Self {
            stages,
            completed: 0,
            on_stage_complete,
            timings: Vec::new(),
            thermal_stats: None,
            hydraulic_stats: None,
        }
    }

    fn complete(&mut self, stage: StageId, elapsed: Duration, cached: bool) {
        let event = StageEvent {
            stage,
            index: self.completed,
            total: self.stages.len(),
            elapsed,
            cached,
        };
        self.completed += 1;
        self.timings.push((stage, elapsed));
        (self.on_stage_complete)(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erosion::{thermal_sweeps, ThermalParams};
    use crate::error::TerrainError;
    use crate::fractal::FbmParams;

    fn small_preset() -> PresetDefinition {
        let mut p = PresetDefinition {
            width: 48,
            height: 40,
            seed: 11,
            fbm: FbmParams {
                scale: 16.0,
                octaves: 4,
                ..FbmParams::default()
            },
            ..PresetDefinition::default()
        };
        p.hydraulic.droplets = 300;
        p
    }

    #[test]
    fn test_stage_plan_follows_flags() {
        let pipeline = TerrainPipeline::new();
        let mut preset = small_preset();
        assert_eq!(
            pipeline.stages(&preset),
            vec![StageId::Synthesis, StageId::Thermal, StageId::Hydraulic, StageId::Splat]
        );
        preset.thermal_enabled = false;
        preset.redistribution_exponent = 1.5;
        preset.spawn.count = 2;
        assert_eq!(
            pipeline.with_splat(false).stages(&preset),
            vec![
                StageId::Synthesis,
                StageId::Hydraulic,
                StageId::Redistribution,
                StageId::SpawnPoints
            ]
        );
    }

    #[test]
    fn test_events_numbered_in_order() {
        let mut events = Vec::new();
        let mut pipeline = TerrainPipeline::new();
        let out = pipeline
            .run_with_callback(&small_preset(), |e| events.push(e.clone()))
            .unwrap();
        let stages: Vec<StageId> = events.iter().map(|e| e.stage).collect();
        assert_eq!(stages, pipeline.stages(&small_preset()));
        for (i, e) in events.iter().enumerate() {
            assert_eq!(e.index, i);
            assert_eq!(e.total, events.len());
            assert!(!e.cached);
        }
        assert!(out.thermal_stats.is_some());
        assert!(out.hydraulic_stats.is_some());
        assert!(out.splat.is_some());
    }

    #[test]
    fn test_zero_dimensions_fail_fast() {
        let preset = PresetDefinition {
            width: 0,
            ..small_preset()
        };
        let mut called = false;
        let result = TerrainPipeline::new().run_with_callback(&preset, |_| called = true);
        assert!(matches!(result, Err(TerrainError::InvalidDimensions { .. })));
        assert!(!called);
    }

    #[test]
    fn test_values_stay_in_unit_range() {
        let mut preset = small_preset();
        preset.redistribution_exponent = 2.2;
        preset.spawn.count = 3;
        preset.spawn.min_separation = 20.0;
        let out = TerrainPipeline::new().run(&preset).unwrap();
        assert!(out
            .heightfield
            .values()
            .iter()
            .all(|v| (0.0..=1.0).contains(v)));
        assert!(!out.spawn_points.is_empty());
    }

    #[test]
    fn test_imported_field_skips_synthesis() {
        let field = HeightField::from_values(8, 8, 1, (0..64).map(|i| i as f32 / 63.0).collect()).unwrap();
        let mut seen = Vec::new();
        let out = TerrainPipeline::new().run_on_heightfield(field, &small_preset(), |e| seen.push(e.stage));
        assert!(!seen.contains(&StageId::Synthesis));
        assert_eq!(out.heightfield.width(), 8);
    }

    fn reference_preset() -> PresetDefinition {
        PresetDefinition {
            width: 129,
            height: 129,
            seed: 42,
            fbm: FbmParams {
                scale: 64.0,
                octaves: 4,
                persistence: 0.5,
                lacunarity: 2.0,
                warp_strength: 0.0,
                ..FbmParams::default()
            },
            thermal_enabled: false,
            hydraulic_enabled: false,
            ..PresetDefinition::default()
        }
    }

    #[test]
    fn test_reference_terrain_normalized_and_reproducible() {
        let preset = reference_preset();
        let mut pipeline = TerrainPipeline::new().with_splat(false);
        let a = pipeline.run(&preset).unwrap();
        let b = pipeline.run(&preset).unwrap();

        let (min_h, max_h) = a.heightfield.min_max();
        assert!(min_h.abs() < 1e-6);
        assert!((max_h - 1.0).abs() < 1e-6);
        assert_eq!(a.heightfield.values(), b.heightfield.values());
        assert!(a.thermal_stats.is_none() && a.hydraulic_stats.is_none());
    }

    #[test]
    fn test_thermal_smoothing_is_measurable() {
        let before = TerrainPipeline::new()
            .with_splat(false)
            .run(&reference_preset())
            .unwrap()
            .heightfield;
        let params = ThermalParams {
            iterations: 5,
            diffusion_rate: 0.01,
        };

        // Measured before the stage renormalizes, which can stretch the range again
        let mut after = before.clone();
        thermal_sweeps(after.map_mut(), &params);
        assert!(after.variance() < before.variance());
        assert!(after.roughness() < before.roughness());
    }

    #[test]
    fn test_cache_serves_second_run() {
        let preset = small_preset();
        let mut pipeline = TerrainPipeline::new().with_cache(2);
        let first = pipeline.run(&preset).unwrap();

        let mut events = Vec::new();
        let second = pipeline
            .run_with_callback(&preset, |e| events.push(e.clone()))
            .unwrap();
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.heightfield.values(), second.heightfield.values());
        assert!(second.hydraulic_stats.is_none());
        assert!(events.iter().filter(|e| e.stage.is_terrain()).all(|e| e.cached));
        assert!(events.iter().any(|e| e.stage == StageId::Splat && !e.cached));

        let cache = pipeline.cache().unwrap();
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn test_splat_only_change_reuses_terrain() {
        let preset = small_preset();
        let mut other = preset.clone();
        other.splat = crate::splat::SplatRules::default_rules();
        other.spawn.count = 1;
        let mut pipeline = TerrainPipeline::new().with_cache(2);
        pipeline.run(&preset).unwrap();
        assert!(pipeline.run(&other).unwrap().from_cache);
    }

    #[test]
    fn test_splat_weights_conserved_end_to_end() {
        let out = TerrainPipeline::new().run(&small_preset()).unwrap();
        let splat = out.splat.unwrap();
        assert_eq!(splat.masks.len(), 1);
        for px in splat.masks[0].image.pixels() {
            let total: u32 = px.0.iter().map(|&c| c as u32).sum();
            assert!((252..=255).contains(&total), "total {}", total);
        }
    }

    fn assert_clean(out: &GenerationOutput) {
        assert!(out
            .heightfield
            .values()
            .iter()
            .all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
        if let Some(splat) = &out.splat {
            for px in splat.masks[0].image.pixels() {
                let total: u32 = px.0.iter().map(|&c| c as u32).sum();
                assert!((252..=255).contains(&total), "total {}", total);
            }
        }
    }

    #[test]
    fn test_nan_fbm_shaping_falls_back() {
        let mut preset = small_preset();
        preset.width = 40;
        preset.height = 40;
        preset.fbm.persistence = f32::NAN;
        preset.fbm.lacunarity = f32::INFINITY;
        preset.fbm.warp_strength = f32::NAN;
        assert!(preset.validate().is_err());
        let out = TerrainPipeline::new().run(&preset).unwrap();
        assert_clean(&out);
        let (lo, hi) = out.heightfield.min_max();
        assert!(hi - lo > 0.5);
    }

    #[test]
    fn test_infinite_thermal_rate_skips_thermal() {
        let mut preset = small_preset();
        preset.width = 40;
        preset.height = 40;
        preset.hydraulic_enabled = false;
        preset.thermal.diffusion_rate = f32::INFINITY;
        let out = TerrainPipeline::new().run(&preset).unwrap();
        assert_clean(&out);
        assert_eq!(out.thermal_stats.map(|s| s.steps_taken), Some(0));

        preset.thermal_enabled = false;
        let untouched = TerrainPipeline::new().run(&preset).unwrap();
        assert_eq!(out.heightfield.values(), untouched.heightfield.values());
    }

    #[test]
    fn test_nan_hydraulic_params_skip_hydraulic() {
        let mut preset = small_preset();
        preset.hydraulic.inertia = f32::NAN;
        preset.hydraulic.erosion_rate = f32::INFINITY;
        let out = TerrainPipeline::new().run(&preset).unwrap();
        assert_clean(&out);
        assert_eq!(out.hydraulic_stats.map(|s| s.iterations), Some(0));
    }
}
