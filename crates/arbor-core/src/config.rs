//! Configuration types for the simulation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// World grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Width of the world grid (x axis)
    pub width: i32,
    /// Height of the world grid (y axis; sunlight enters at the top layer)
    pub height: i32,
    /// Depth of the world grid (z axis)
    pub depth: i32,
    /// Light intensity at the topmost layer of every column
    pub sun_value: u32,
    /// Intensity lost below each occupied voxel in a column
    pub block_decrease: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 15,
            depth: 20,
            sun_value: 5,
            block_decrease: 1,
        }
    }
}

/// Genome configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenomeConfig {
    /// RNG seed for first-generation genomes
    pub seed: u64,
    /// Number of genes per genome; gene ids run 1..=genome_size
    pub genome_size: u16,
    /// Per-gene replacement probability in offspring genomes (0.0 to 1.0)
    pub mutation_rate: f32,
    /// Reserved gene id that grows a seed cell instead of a plant cell
    pub seed_gene_id: u16,
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            genome_size: 10,
            mutation_rate: 0.1,
            seed_gene_id: 10,
        }
    }
}

/// Energy and cost configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Starting energy balance for founder trees and shed seeds
    pub initial_energy: i64,
    /// Base upkeep per plant cell per day
    pub cell_energy_consumption: u32,
    /// Growth cost multiplier; a growth attempt at age `a` costs `a * growth_cost`
    pub growth_cost: i64,
    /// Linear aging tax: per-cell upkeep scales by `floor(1 + age * rate)`
    pub consumption_increase_rate: f32,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            initial_energy: 100,
            cell_energy_consumption: 1,
            growth_cost: 1,
            consumption_increase_rate: 0.1,
        }
    }
}

/// When the world's energy field is recomputed during a day.
///
/// The two policies harvest different totals once occupancy changes mid-day,
/// so the choice is part of the experiment configuration rather than a fixed
/// engine behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyPolicy {
    /// Recompute before every tree's turn
    PerTree,
    /// Recompute once at the start of each day
    PerDay,
}

/// Full experiment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of days to simulate
    pub num_days: u32,
    /// Number of founder trees
    pub initial_population: u32,
    /// Run seed (daily shuffle, founder placement, mutation draws)
    pub seed: u64,
    /// Energy field recomputation policy
    pub energy_policy: EnergyPolicy,
    /// Keep an in-memory world snapshot per day
    pub keep_history: bool,
    /// World configuration
    pub world: WorldConfig,
    /// Genome configuration
    pub genome: GenomeConfig,
    /// Energy configuration
    pub energy: EnergyConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_days: 50,
            initial_population: 5,
            seed: 0,
            energy_policy: EnergyPolicy::PerTree,
            keep_history: false,
            world: WorldConfig::default(),
            genome: GenomeConfig::default(),
            energy: EnergyConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Check the cross-field invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        if self.world.width <= 0 || self.world.height <= 0 || self.world.depth <= 0 {
            return Err(Error::InvalidConfig(format!(
                "world dimensions must be positive, got {}x{}x{}",
                self.world.width, self.world.height, self.world.depth
            )));
        }
        let volume =
            self.world.width as u64 * self.world.height as u64 * self.world.depth as u64;
        if volume > u32::MAX as u64 {
            return Err(Error::InvalidConfig(format!(
                "world volume {volume} exceeds the limit of {} voxels",
                u32::MAX
            )));
        }
        if self.genome.genome_size == 0 {
            return Err(Error::InvalidConfig(
                "genome_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.genome.mutation_rate) {
            return Err(Error::InvalidConfig(format!(
                "mutation_rate must be in [0, 1], got {}",
                self.genome.mutation_rate
            )));
        }
        // Every genome must be able to resolve the seed gene, and gene 1
        // founds every tree, so it cannot double as the seed gene.
        if self.genome.seed_gene_id < 2 || self.genome.seed_gene_id > self.genome.genome_size {
            return Err(Error::InvalidConfig(format!(
                "seed_gene_id must be in [2, {}], got {}",
                self.genome.genome_size, self.genome.seed_gene_id
            )));
        }
        if self.initial_population == 0 {
            return Err(Error::InvalidConfig(
                "initial_population must be at least 1".to_string(),
            ));
        }
        if !self.energy.consumption_increase_rate.is_finite()
            || self.energy.consumption_increase_rate < 0.0
        {
            return Err(Error::InvalidConfig(format!(
                "consumption_increase_rate must be non-negative, got {}",
                self.energy.consumption_increase_rate
            )));
        }
        Ok(())
    }
}
