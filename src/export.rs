//! PNG and JSON persistence for heightfields, splat masks and spawn points.

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageBuffer, Luma, Primitive};
use tracing::info;

use crate::error::{Result, TerrainError};
use crate::heightfield::HeightField;
use crate::spawn::SpawnPoint;
use crate::splat::SplatOutput;

/// Sample depth for grayscale height images.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BitDepth {
    #[default]
    Eight,
    Sixteen,
}

/// Wrap row-major grayscale samples, checking the length against the size.
fn gray_buffer<T: Primitive>(
    width: u32,
    height: u32,
    samples: Vec<T>,
) -> Result<ImageBuffer<Luma<T>, Vec<T>>> {
    let expected = width as usize * height as usize;
    let actual = samples.len();
    ImageBuffer::from_raw(width, height, samples).ok_or(TerrainError::BufferSize { expected, actual })
}

/// Write the field as a single-channel PNG.
pub fn save_heightfield_png(field: &HeightField, path: &Path, depth: BitDepth) -> Result<()> {
    let (w, h) = (field.width() as u32, field.height() as u32);
    match depth {
        BitDepth::Eight => gray_buffer(w, h, field.to_gray8())?.save(path)?,
        BitDepth::Sixteen => gray_buffer(w, h, field.to_gray16())?.save(path)?,
    }
    info!(path = %path.display(), width = w, height = h, "saved heightfield");
    Ok(())
}

/// Read a grayscale PNG into a height field. 16-bit images keep their
/// precision; everything else is reduced to 8-bit luma.
pub fn load_heightfield_png(path: &Path, seed: u64) -> Result<HeightField> {
    let img = image::open(path)?;
    let (w, h) = (img.width() as usize, img.height() as usize);
    let values: Vec<f32> = match &img {
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => img
            .to_luma16()
            .into_raw()
            .into_iter()
            .map(|v| v as f32 / 65535.0)
            .collect(),
        _ => img
            .to_luma8()
            .into_raw()
            .into_iter()
            .map(|v| v as f32 / 255.0)
            .collect(),
    };
    HeightField::from_values(w, h, seed, values)
}

/// Write one `<prefix>_<group>.png` per mask into `dir`.
pub fn save_splat_masks(output: &SplatOutput, dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(output.masks.len());
    for mask in &output.masks {
        let path = dir.join(format!("{}_{}.png", prefix, mask.group));
        mask.image.save(&path)?;
        written.push(path);
    }
    Ok(written)
}

/// Write the layer-to-channel map of every group as JSON.
pub fn save_splat_channels(output: &SplatOutput, path: &Path) -> Result<()> {
    let map: std::collections::BTreeMap<&str, _> = output
        .masks
        .iter()
        .map(|m| (m.group.as_str(), &m.channels))
        .collect();
    fs::write(path, serde_json::to_string_pretty(&map)?)?;
    Ok(())
}

pub fn save_spawn_points(points: &[SpawnPoint], path: &Path) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(points)?)?;
    Ok(())
}
