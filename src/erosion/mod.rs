//! Erosion simulation module
//!
//! Implements two complementary erosion techniques:
//! - **Thermal erosion**: in-place relaxation toward the 4-neighbour average
//! - **Hydraulic erosion**: particle-based water droplet simulation

pub mod hydraulic;
pub mod params;
pub mod thermal;
pub mod utils;

pub use hydraulic::{apply_hydraulic_erosion, simulate_droplet};
pub use params::{ErosionPreset, HydraulicParams, ThermalParams};
pub use thermal::{apply_thermal_erosion, thermal_sweeps};

/// Statistics from an erosion stage
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErosionStats {
    /// Total material eroded (in height units, before normalization)
    pub total_eroded: f64,
    /// Total material deposited
    pub total_deposited: f64,
    /// Total number of simulation steps taken (droplet steps or cell updates)
    pub steps_taken: u64,
    /// Number of iterations/droplets processed
    pub iterations: usize,
    /// Maximum erosion at any single step
    pub max_erosion: f32,
    /// Maximum deposition at any single step
    pub max_deposition: f32,
}

impl ErosionStats {
    /// Deposited minus eroded material.
    pub fn net_change(&self) -> f64 {
        self.total_deposited - self.total_eroded
    }
}

impl std::fmt::Display for ErosionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} iterations, {} steps, eroded {:.4}, deposited {:.4}, max erosion {:.4}, max deposition {:.4}",
            self.iterations,
            self.steps_taken,
            self.total_eroded,
            self.total_deposited,
            self.max_erosion,
            self.max_deposition
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_change_is_deposit_minus_erosion() {
        let stats = ErosionStats {
            total_eroded: 1.5,
            total_deposited: 0.25,
            ..ErosionStats::default()
        };
        assert_eq!(stats.net_change(), -1.25);
        assert!(stats.to_string().contains("eroded 1.5000"));
    }
}
