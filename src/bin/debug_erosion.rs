//! Debug tool for comparing erosion presets visually
//! Generates a grid of shaded heightmaps, one per erosion preset, from the same base terrain

use std::process::ExitCode;

use image::{ImageBuffer, Rgb, RgbImage};
use terrain_generator::erosion::{apply_hydraulic_erosion, apply_thermal_erosion, ErosionPreset};
use terrain_generator::fractal::{synthesize_fractal, FbmParams};
use terrain_generator::heightfield::HeightField;
use terrain_generator::logging::init_logging;

const WIDTH: usize = 256;
const HEIGHT: usize = 256;
const SEED: u64 = 42;
const SEA_LEVEL: f32 = 0.3;

fn main() -> ExitCode {
    init_logging(Some("warn"));
    println!("Generating erosion comparison grid...");

    let mut base = match HeightField::new(WIDTH, HEIGHT, SEED) {
        Ok(field) => field,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let fbm = FbmParams {
        scale: 96.0,
        octaves: 6,
        warp_strength: 20.0,
        ..FbmParams::default()
    };
    synthesize_fractal(&mut base, &fbm);

    let mut images: Vec<(String, RgbImage)> = Vec::new();
    for preset in ErosionPreset::all() {
        println!("  Processing: {}", preset);
        // Each variant continues from the same random state
        let mut field = base.clone();
        if let Some(thermal) = preset.thermal() {
            apply_thermal_erosion(&mut field, &thermal);
        }
        if let Some(hydraulic) = preset.hydraulic(WIDTH * HEIGHT) {
            let stats = apply_hydraulic_erosion(&mut field, &hydraulic);
            println!("    {}", stats);
            println!("    net change {:+.4}", stats.net_change());
        }
        images.push((preset.to_string(), render_shaded_heightmap(&field)));
    }

    let cols = 3;
    let rows = images.len().div_ceil(cols);
    let grid = create_grid(&images, cols, rows);
    if let Err(e) = grid.save("erosion_comparison.png") {
        eprintln!("Failed to save grid: {}", e);
        return ExitCode::FAILURE;
    }

    println!("Saved erosion_comparison.png");
    ExitCode::SUCCESS
}

fn render_shaded_heightmap(field: &HeightField) -> RgbImage {
    let width = field.width();
    let height = field.height();
    let mut img = ImageBuffer::new(width as u32, height as u32);

    // Light from the upper left
    let (lx, ly, lz) = {
        let (x, y, z) = (-0.7f32, -0.7f32, 0.5f32);
        let len = (x * x + y * y + z * z).sqrt();
        (x / len, y / len, z / len)
    };

    for y in 0..height {
        for x in 0..width {
            let h = field.get(x, y);
            let h_left = field.get(x.saturating_sub(1), y);
            let h_right = field.get((x + 1).min(width - 1), y);
            let h_up = field.get(x, y.saturating_sub(1));
            let h_down = field.get(x, (y + 1).min(height - 1));

            // Unit heights are tiny next to cell spacing, exaggerate them
            let relief = 40.0;
            let nx = (h_left - h_right) * relief;
            let ny = (h_up - h_down) * relief;
            let nlen = (nx * nx + ny * ny + 1.0).sqrt();
            let diffuse = ((nx * lx + ny * ly + lz) / nlen).max(0.0);
            let lighting = (0.3 + 0.7 * diffuse).min(1.0);

            let color = if h < SEA_LEVEL {
                let depth = (SEA_LEVEL - h) / SEA_LEVEL;
                Rgb([30, (150.0 - depth * 100.0) as u8, (200.0 - depth * 150.0) as u8])
            } else {
                let t = (h - SEA_LEVEL) / (1.0 - SEA_LEVEL);
                let base = if t < 0.3 {
                    [80.0, 140.0, 60.0]
                } else if t < 0.6 {
                    let s = (t - 0.3) / 0.3;
                    [80.0 + s * 80.0, 140.0 - s * 60.0, 60.0 - s * 20.0]
                } else if t < 0.85 {
                    let v = 160.0 - (t - 0.6) / 0.25 * 40.0;
                    [v, v - 10.0, v - 20.0]
                } else {
                    [240.0, 240.0, 245.0]
                };
                Rgb(base.map(|c| (c * lighting) as u8))
            };

            img.put_pixel(x as u32, y as u32, color);
        }
    }

    img
}

fn create_grid(images: &[(String, RgbImage)], cols: usize, rows: usize) -> RgbImage {
    let Some((_, first)) = images.first() else {
        return ImageBuffer::new(1, 1);
    };

    let (cell_width, cell_height) = first.dimensions();
    let label_height = 20u32;
    let total_cell_height = cell_height + label_height;

    let mut grid: RgbImage = ImageBuffer::from_pixel(
        cell_width * cols as u32,
        total_cell_height * rows as u32,
        Rgb([40, 40, 40]),
    );

    for (idx, (name, img)) in images.iter().enumerate() {
        let (col, row) = ((idx % cols) as u32, (idx / cols) as u32);
        if row as usize >= rows {
            break;
        }
        let x_offset = col * cell_width;
        let label_y = row * total_cell_height;

        for (x, y, pixel) in img.enumerate_pixels() {
            grid.put_pixel(x_offset + x, label_y + label_height + y, *pixel);
        }
        for y in 0..label_height {
            for x in 0..cell_width {
                grid.put_pixel(x_offset + x, label_y + y, Rgb([30, 30, 30]));
            }
        }
        draw_text(&mut grid, x_offset + 5, label_y + 5, name);
    }

    grid
}

// 5x7 bitmap glyphs, letters only; anything else renders blank
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01110, 0b10001, 0b10000, 0b01110, 0b00001, 0b10001, 0b01110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        _ => [0; 7],
    }
}

fn draw_text(img: &mut RgbImage, x: u32, y: u32, text: &str) {
    let white = Rgb([255, 255, 255]);
    for (i, c) in text.chars().enumerate() {
        let cx = x + i as u32 * 6;
        if cx + 5 >= img.width() {
            break;
        }
        for (row, &bits) in glyph(c).iter().enumerate() {
            for col in 0..5 {
                let (px, py) = (cx + col, y + row as u32);
                if (bits >> (4 - col)) & 1 == 1 && py < img.height() {
                    img.put_pixel(px, py, white);
                }
            }
        }
    }
}
