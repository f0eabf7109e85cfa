//! Erosion simulation parameters and configuration

use serde::{Deserialize, Serialize};

/// Talus-style smoothing toward the 4-neighbour average.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalParams {
    /// Number of full sweeps over the interior
    pub iterations: u32,
    /// Fraction of (neighbour average - height) applied per sweep
    pub diffusion_rate: f32,
}

impl Default for ThermalParams {
    fn default() -> Self {
        Self {
            iterations: 5,
            diffusion_rate: 0.01,
        }
    }
}

/// Particle-based hydraulic erosion parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydraulicParams {
    /// Number of water droplets to simulate
    pub droplets: u32,

    /// Momentum conservation factor (0.0-1.0)
    /// Higher values = droplets maintain direction longer
    pub inertia: f32,

    /// Sediment carrying capacity multiplier
    pub capacity_factor: f32,

    /// Capacity floor, so slow droplets still carry a little
    pub min_capacity: f32,

    /// Fraction of spare capacity eroded per step (0.0-1.0)
    pub erosion_rate: f32,

    /// Fraction of excess sediment deposited per step (0.0-1.0)
    pub deposition_rate: f32,

    /// Acceleration from height loss
    pub gravity: f32,

    /// Maximum path length (steps) per droplet
    pub max_lifetime: u32,
}

impl Default for HydraulicParams {
    fn default() -> Self {
        Self {
            droplets: 70_000,
            inertia: 0.3,
            capacity_factor: 4.0,
            min_capacity: 0.01,
            erosion_rate: 0.3,
            deposition_rate: 0.3,
            gravity: 4.0,
            max_lifetime: 30,
        }
    }
}

impl HydraulicParams {
    /// Whether every float setting is finite.
    pub fn is_finite(&self) -> bool {
        [
            self.inertia,
            self.capacity_factor,
            self.min_capacity,
            self.erosion_rate,
            self.deposition_rate,
            self.gravity,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Erosion intensity preset, used by the diagnostic tools to compare variants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ErosionPreset {
    /// No erosion - raw fBm terrain
    None,
    /// Thermal smoothing only
    ThermalOnly,
    /// Droplet erosion only
    HydraulicOnly,
    /// Both stages with reference settings
    #[default]
    Normal,
    /// Long thermal run and dense droplets
    Heavy,
}

impl ErosionPreset {
    pub fn all() -> &'static [Self] {
        &[
            Self::None,
            Self::ThermalOnly,
            Self::HydraulicOnly,
            Self::Normal,
            Self::Heavy,
        ]
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::None => "No erosion (raw terrain)",
            Self::ThermalOnly => "Talus smoothing only",
            Self::HydraulicOnly => "Droplet carving only",
            Self::Normal => "Reference thermal + hydraulic",
            Self::Heavy => "Heavy smoothing and carving",
        }
    }

    /// Thermal settings for this preset, `None` when the stage is skipped.
    pub fn thermal(&self) -> Option<ThermalParams> {
        match self {
            Self::None | Self::HydraulicOnly => None,
            Self::ThermalOnly | Self::Normal => Some(ThermalParams::default()),
            Self::Heavy => Some(ThermalParams {
                iterations: 20,
                diffusion_rate: 0.05,
            }),
        }
    }

    /// Hydraulic settings scaled to a field of `cells` samples.
    ///
    /// Droplet counts follow the reference density of 70k droplets per
    /// 1025x1025 field.
    pub fn hydraulic(&self, cells: usize) -> Option<HydraulicParams> {
        let density = HydraulicParams::default().droplets as f64 / (1025.0 * 1025.0);
        let scaled = ((cells as f64 * density).round() as u32).max(1);
        match self {
            Self::None | Self::ThermalOnly => None,
            Self::HydraulicOnly | Self::Normal => Some(HydraulicParams {
                droplets: scaled,
                ..HydraulicParams::default()
            }),
            Self::Heavy => Some(HydraulicParams {
                droplets: scaled * 4,
                erosion_rate: 0.5,
                max_lifetime: 60,
                ..HydraulicParams::default()
            }),
        }
    }
}

impl std::fmt::Display for ErosionPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::ThermalOnly => write!(f, "thermal"),
            Self::HydraulicOnly => write!(f, "hydraulic"),
            Self::Normal => write!(f, "normal"),
            Self::Heavy => write!(f, "heavy"),
        }
    }
}
