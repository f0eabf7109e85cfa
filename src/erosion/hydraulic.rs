//! Hydraulic erosion simulation using particle-based water droplets.
//!
//! Each droplet follows the local gradient across the height field, picking
//! up sediment while it runs downhill with spare capacity and dropping it
//! when it slows, climbs, or is overloaded. Erosion and deposition land on
//! the integer cell the droplet occupied *before* the step.
//!
//! Droplets run strictly one after another. Every droplet sees the terrain
//! left behind by all earlier ones, and spawn positions come from the
//! field's single random stream, so the result depends on droplet order.

use rand::Rng;
use tracing::{debug, warn};

use crate::erosion::params::HydraulicParams;
use crate::erosion::utils::sample_cell;
use crate::erosion::ErosionStats;
use crate::heightfield::HeightField;
use crate::tilemap::Tilemap;

/// Fraction of water kept after each step.
pub const EVAPORATION_KEEP: f32 = 0.99;

/// Droplets with less water than this stop.
pub const MIN_WATER: f32 = 0.01;

/// Floor on the direction length before normalizing.
const MIN_DIRECTION_LENGTH: f32 = 1e-6;

/// A water droplet for hydraulic erosion simulation
#[derive(Clone, Debug)]
struct WaterDroplet {
    /// Position (floating point for interpolation)
    x: f32,
    y: f32,
    /// Movement direction (unit length after the first step)
    dir_x: f32,
    dir_y: f32,
    speed: f32,
    water: f32,
    sediment: f32,
}

impl WaterDroplet {
    fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            dir_x: 0.0,
            dir_y: 0.0,
            speed: 0.0,
            water: 1.0,
            sediment: 0.0,
        }
    }

    /// Whether the droplet's quad fits inside the grid.
    fn inside(&self, width: usize, height: usize) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.x < (width - 1) as f32
            && self.y < (height - 1) as f32
    }
}

/// Trace one droplet from `(x, y)` until it dies or leaves the grid,
/// writing its erosion and deposition into `heightmap`.
///
/// The grid must be at least 2x2.
pub fn simulate_droplet(
    heightmap: &mut Tilemap<f32>,
    x: f32,
    y: f32,
    params: &HydraulicParams,
    stats: &mut ErosionStats,
) {
    let width = heightmap.width;
    let height = heightmap.height;
    let mut droplet = WaterDroplet::new(x, y);

    for _ in 0..params.max_lifetime {
        if !droplet.inside(width, height) {
            break;
        }
        let ix = droplet.x as usize;
        let iy = droplet.y as usize;

        let cell = sample_cell(
            heightmap,
            ix,
            iy,
            droplet.x - ix as f32,
            droplet.y - iy as f32,
        );

        // Update direction with inertia, then normalize
        droplet.dir_x = droplet.dir_x * params.inertia - cell.gradient_x * (1.0 - params.inertia);
        droplet.dir_y = droplet.dir_y * params.inertia - cell.gradient_y * (1.0 - params.inertia);
        let len = (droplet.dir_x * droplet.dir_x + droplet.dir_y * droplet.dir_y)
            .sqrt()
            .max(MIN_DIRECTION_LENGTH);
        droplet.dir_x /= len;
        droplet.dir_y /= len;

        droplet.x += droplet.dir_x;
        droplet.y += droplet.dir_y;
        if !droplet.inside(width, height) {
            break;
        }
        stats.steps_taken += 1;

        // New height comes from the cell the droplet moved into
        let new_height = *heightmap.get(droplet.x as usize, droplet.y as usize);
        let delta_h = new_height - cell.height;

        let capacity = (-delta_h * droplet.speed * droplet.water * params.capacity_factor)
            .max(params.min_capacity);

        let origin = heightmap.get_mut(ix, iy);
        if droplet.sediment > capacity || delta_h > 0.0 {
            // Uphill with spare capacity gives a negative deposit, i.e. a pickup
            let deposit = (droplet.sediment - capacity) * params.deposition_rate;
            droplet.sediment -= deposit;
            *origin += deposit;
            if deposit >= 0.0 {
                stats.total_deposited += deposit as f64;
                stats.max_deposition = stats.max_deposition.max(deposit);
            } else {
                stats.total_eroded += -deposit as f64;
                stats.max_erosion = stats.max_erosion.max(-deposit);
            }
        } else {
            let erode = ((capacity - droplet.sediment) * params.erosion_rate).min(-delta_h);
            droplet.sediment += erode;
            *origin -= erode;
            stats.total_eroded += erode as f64;
            stats.max_erosion = stats.max_erosion.max(erode);
        }

        droplet.speed = (droplet.speed * droplet.speed + delta_h * params.gravity)
            .max(0.0)
            .sqrt();
        droplet.water *= EVAPORATION_KEEP;
        if droplet.water < MIN_WATER {
            break;
        }
    }
}

/// Run hydraulic erosion simulation.
///
/// Algorithm:
/// 1. Spawn droplet uniformly in [0, width-2] x [0, height-2]
/// 2. For up to `max_lifetime` steps:
///    a. Sample height and gradient over the current cell quad
///    b. Blend direction with the downhill gradient using inertia, normalize
///    c. Move one unit; stop if the droplet leaves the grid
///    d. Compare the new cell height against the interpolated old height
///    e. Deposit when overloaded or climbing, otherwise erode
///    f. Update speed from the height change, evaporate some water
/// 3. Normalize the field once all droplets have run
pub fn apply_hydraulic_erosion(field: &mut HeightField, params: &HydraulicParams) -> ErosionStats {
    let mut stats = ErosionStats::default();
    let width = field.width();
    let height = field.height();

    if width < 3 || height < 3 {
        warn!(width, height, "heightfield too small for hydraulic erosion, skipping");
        return stats;
    }
    if !params.is_finite() {
        warn!(?params, "non-finite hydraulic parameters, skipping");
        return stats;
    }

    let max_x = (width - 2) as f32;
    let max_y = (height - 2) as f32;
    let (heightmap, rng) = field.parts_mut();

    for _ in 0..params.droplets {
        let x = rng.gen_range(0.0..=max_x);
        let y = rng.gen_range(0.0..=max_y);
        simulate_droplet(heightmap, x, y, params, &mut stats);
        stats.iterations += 1;
    }

    field.normalize();
    debug!(
        droplets = stats.iterations,
        steps = stats.steps_taken,
        eroded = stats.total_eroded,
        deposited = stats.total_deposited,
        "hydraulic erosion complete"
    );
    stats
}
