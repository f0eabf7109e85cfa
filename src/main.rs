use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use terrain_generator::error::Result;
use terrain_generator::export::{self, BitDepth};
use terrain_generator::heightfield::print_height_histogram;
use terrain_generator::logging::init_logging;
use terrain_generator::pipeline::{GenerationOutput, StageEvent, TerrainPipeline};
use terrain_generator::preset::{PresetDefinition, PresetRegistry};
use terrain_generator::splat::SplatRules;

#[derive(Parser, Debug)]
#[command(name = "terrain_generator")]
#[command(about = "Generate eroded heightmaps and splat masks from named presets")]
struct Args {
    /// Preset to generate
    #[arg(short, long, default_value = "arena_tiny_513")]
    preset: String,

    /// Extra presets to load from a JSON file (name -> definition)
    #[arg(long)]
    preset_file: Option<PathBuf>,

    /// List available presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Override the preset seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Override the field width
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Override the field height
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Import a grayscale PNG instead of synthesizing terrain
    #[arg(long)]
    import: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Skip thermal erosion
    #[arg(long)]
    no_thermal: bool,

    /// Skip hydraulic erosion
    #[arg(long)]
    no_hydraulic: bool,

    /// Override the number of hydraulic droplets
    #[arg(long)]
    droplets: Option<u32>,

    /// Override the redistribution exponent
    #[arg(long)]
    redistribution: Option<f32>,

    /// Skip splat mask generation
    #[arg(long)]
    no_splat: bool,

    /// Splat rules JSON file (replaces the preset's rules)
    #[arg(long)]
    splat_rules: Option<PathBuf>,

    /// Number of spawn points to pick
    #[arg(long)]
    spawn_points: Option<usize>,

    /// Write the heightmap as 16-bit grayscale
    #[arg(long)]
    sixteen_bit: bool,

    /// Print a height histogram after generation
    #[arg(long)]
    histogram: bool,

    /// Log filter, e.g. "debug" or "terrain_generator::erosion=trace"
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut registry = PresetRegistry::builtin();
    if let Some(ref path) = args.preset_file {
        registry.merge(PresetRegistry::load_json(path)?);
    }

    if args.list_presets {
        println!("Available presets:");
        for (name, preset) in registry.iter() {
            println!(
                "  {:<28} {}x{}  seed {}  {}",
                name, preset.width, preset.height, preset.seed, preset.fbm.noise
            );
        }
        return Ok(());
    }

    let preset = apply_overrides(registry.get(&args.preset)?.clone(), args)?;

    println!("Generating preset '{}' with seed: {}", args.preset, preset.seed);
    println!("Map size: {}x{}", preset.width, preset.height);

    let mut pipeline = TerrainPipeline::new().with_splat(!args.no_splat);
    let report = |e: &StageEvent| {
        println!(
            "  [{}/{}] {:<15} {:>8.1} ms{}",
            e.index + 1,
            e.total,
            e.stage.name(),
            e.elapsed.as_secs_f64() * 1000.0,
            if e.cached { " (cached)" } else { "" }
        );
    };

    let output = match args.import {
        Some(ref path) => {
            println!("Importing heightmap from {}", path.display());
            let field = export::load_heightfield_png(path, preset.seed)?;
            pipeline.run_on_heightfield(field, &preset, report)
        }
        None => pipeline.run_with_callback(&preset, report)?,
    };

    print_summary(&output);
    if args.histogram {
        print_height_histogram(&output.heightfield, 20);
    }

    write_outputs(args, &output)
}

fn apply_overrides(mut preset: PresetDefinition, args: &Args) -> Result<PresetDefinition> {
    if let Some(seed) = args.seed {
        preset.seed = seed;
    }
    if let Some(w) = args.width {
        preset.width = w;
    }
    if let Some(h) = args.height {
        preset.height = h;
    }
    if args.no_thermal {
        preset.thermal_enabled = false;
    }
    if args.no_hydraulic {
        preset.hydraulic_enabled = false;
    }
    if let Some(droplets) = args.droplets {
        preset.hydraulic.droplets = droplets;
    }
    if let Some(exp) = args.redistribution {
        preset.redistribution_exponent = exp;
    }
    if let Some(ref path) = args.splat_rules {
        let rules: SplatRules = serde_json::from_str(&fs::read_to_string(path)?)?;
        preset.splat = rules;
    }
    if let Some(count) = args.spawn_points {
        preset.spawn.count = count;
    }
    Ok(preset)
}

fn print_summary(output: &GenerationOutput) {
    let field = &output.heightfield;
    let (min_h, max_h) = field.min_max();
    println!("Height range: {:.3} to {:.3} (mean {:.3})", min_h, max_h, field.mean());
    if output.from_cache {
        println!("Terrain served from cache");
    }
    if let Some(ref stats) = output.thermal_stats {
        println!("Thermal erosion: {}", stats);
    }
    if let Some(ref stats) = output.hydraulic_stats {
        println!("Hydraulic erosion: {}", stats);
    }
    if let Some(ref splat) = output.splat {
        println!("Splat masks: {} group(s)", splat.masks.len());
        for diag in &splat.diagnostics {
            println!("  warning: {}", diag);
        }
    }
    if !output.spawn_points.is_empty() {
        println!("Spawn points: {}", output.spawn_points.len());
    }
}

fn write_outputs(args: &Args, output: &GenerationOutput) -> Result<()> {
    fs::create_dir_all(&args.output)?;
    let depth = if args.sixteen_bit { BitDepth::Sixteen } else { BitDepth::Eight };

    let height_path = args.output.join(format!("{}_height.png", args.preset));
    export::save_heightfield_png(&output.heightfield, &height_path, depth)?;
    println!("Heightmap saved to: {}", height_path.display());

    if let Some(ref splat) = output.splat {
        let written = export::save_splat_masks(splat, &args.output, &args.preset)?;
        let channels = args.output.join(format!("{}_splat_channels.json", args.preset));
        export::save_splat_channels(splat, &channels)?;
        println!("Wrote {} splat mask(s) and {}", written.len(), channels.display());
    }

    if !output.spawn_points.is_empty() {
        let path = args.output.join(format!("{}_spawn_points.json", args.preset));
        export::save_spawn_points(&output.spawn_points, &path)?;
        println!("Spawn points saved to: {}", path.display());
    }
    Ok(())
}
