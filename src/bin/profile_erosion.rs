//! Profiling tool to identify performance bottlenecks
//!
//! Usage: profile_erosion [preset]  (defaults to proving_grounds_small)

use std::time::{Duration, Instant};

use terrain_generator::erosion::{apply_hydraulic_erosion, apply_thermal_erosion};
use terrain_generator::fractal::synthesize_fractal;
use terrain_generator::heightfield::HeightField;
use terrain_generator::preset::PresetRegistry;
use terrain_generator::redistribution::apply_redistribution;
use terrain_generator::splat::generate_splat_masks;

fn main() {
    let name = std::env::args().nth(1).unwrap_or_else(|| "proving_grounds_small".to_string());
    let registry = PresetRegistry::builtin();
    let preset = match registry.get(&name) {
        Ok(p) => p.clone(),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    println!("=== Performance Profiling: {} ===", name);
    println!(
        "Map size: {}x{} ({} cells)",
        preset.width,
        preset.height,
        preset.width * preset.height
    );
    println!();

    let mut field = match HeightField::new(preset.width, preset.height, preset.seed) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let mut timings: Vec<(&str, Duration)> = Vec::new();

    let start = Instant::now();
    synthesize_fractal(&mut field, &preset.fbm);
    timings.push(("Synthesis", start.elapsed()));
    println!("fBm synthesis ({} octaves): {:?}", preset.fbm.octaves, start.elapsed());

    if preset.thermal_enabled {
        let start = Instant::now();
        let stats = apply_thermal_erosion(&mut field, &preset.thermal);
        timings.push(("Thermal", start.elapsed()));
        println!("Thermal erosion ({} sweeps): {:?}", preset.thermal.iterations, start.elapsed());
        println!("  {}", stats);
    }

    if preset.hydraulic_enabled {
        let start = Instant::now();
        let stats = apply_hydraulic_erosion(&mut field, &preset.hydraulic);
        timings.push(("Hydraulic", start.elapsed()));
        println!("Hydraulic erosion ({} droplets): {:?}", preset.hydraulic.droplets, start.elapsed());
        println!("  Eroded: {:.3} units", stats.total_eroded);
        println!("  Deposited: {:.3} units", stats.total_deposited);
        println!("  Steps: {}", stats.steps_taken);
    }

    let start = Instant::now();
    apply_redistribution(&mut field, preset.redistribution_exponent);
    timings.push(("Redistribution", start.elapsed()));

    let start = Instant::now();
    let splat = generate_splat_masks(&field, &preset.splat);
    timings.push(("Splat", start.elapsed()));
    println!("Splat classification ({} groups): {:?}", splat.masks.len(), start.elapsed());

    let total: Duration = timings.iter().map(|(_, t)| *t).sum();
    println!("\n=== Summary ===");
    for (stage, time) in &timings {
        println!(
            "{:<16}{:>8.2}% ({:?})",
            format!("{}:", stage),
            100.0 * time.as_secs_f64() / total.as_secs_f64().max(f64::EPSILON),
            time
        );
    }
    println!("─────────────────────────────────");
    println!("TOTAL:          {:>8}  {:?}", "100%", total);
}
