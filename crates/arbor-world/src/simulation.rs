//! Experiment driver: owns the world and the tree population, advances
//! time, and routes seeds from dead trees into new trees.

use crate::genome::Genome;
use crate::tree::Tree;
use crate::world::World;
use arbor_core::{
    EnergyPolicy, Error, OwnerId, Position, Result, SimulationConfig, TreeId, GROUND,
};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub days_run: u32,
    pub births: u64,
    pub deaths: u64,
    pub peak_population: usize,
    pub final_population: usize,
}

/// The sequential simulation loop.
///
/// Strictly single-threaded: exactly one tree mutates the world at a time,
/// in shuffled order, one full day per [`Simulation::step`]. The run RNG
/// drives founder placement, the daily shuffle, and every mutation draw, so
/// a run is fully deterministic given its configuration.
pub struct Simulation {
    config: SimulationConfig,
    world: World,
    population: Vec<Tree>,
    graveyard: Vec<TreeId>,
    history: Vec<World>,
    rng: ChaCha8Rng,
    day: u32,
    next_owner: u32,
    births: u64,
    deaths: u64,
    peak_population: usize,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut world = World::new(&config.world);
        world.update_energy_map();

        let mut sim = Self {
            world,
            population: Vec::new(),
            graveyard: Vec::new(),
            history: Vec::new(),
            rng,
            day: 0,
            next_owner: 1,
            births: 0,
            deaths: 0,
            peak_population: 0,
            config,
        };

        for index in 1..=sim.config.initial_population {
            sim.spawn_founder(index)?;
        }
        sim.peak_population = sim.population.len();
        if sim.config.keep_history {
            sim.history.push(sim.world.clone());
        }
        Ok(sim)
    }

    /// Plant one founder tree at a random free ground voxel.
    ///
    /// Every founder genome is drawn from a generator seeded with
    /// `GenomeConfig::seed`, so all founders start with identical
    /// first-generation genomes; divergence comes entirely from mutation.
    fn spawn_founder(&mut self, index: u32) -> Result<()> {
        let mut genome_rng = ChaCha8Rng::seed_from_u64(self.config.genome.seed);
        let genome = Genome::random(&self.config.genome, &mut genome_rng);
        let pos = self.free_ground_voxel()?;
        let owner = self.alloc_owner();
        let id = TreeId::founder(index);
        info!(tree = %id, x = pos.x, z = pos.z, "planting founder");
        let tree = Tree::sprout(&mut self.world, id, owner, pos, genome, &self.config.energy);
        self.population.push(tree);
        Ok(())
    }

    fn alloc_owner(&mut self) -> OwnerId {
        let owner = OwnerId::new(self.next_owner);
        self.next_owner += 1;
        owner
    }

    /// Pick a random unoccupied ground voxel, falling back to a scan when
    /// random probing keeps colliding.
    fn free_ground_voxel(&mut self) -> Result<Position> {
        for _ in 0..64 {
            let pos = Position::new(
                self.rng.gen_range(0..self.config.world.width),
                GROUND,
                self.rng.gen_range(0..self.config.world.depth),
            );
            if self.world.is_free(pos) {
                return Ok(pos);
            }
        }
        for x in 0..self.config.world.width {
            for z in 0..self.config.world.depth {
                let pos = Position::new(x, GROUND, z);
                if self.world.is_free(pos) {
                    return Ok(pos);
                }
            }
        }
        Err(Error::InvalidState(
            "no free ground voxel left for planting".to_string(),
        ))
    }

    /// Advance the simulation by one day.
    ///
    /// The population is shuffled, then each tree takes its turn with
    /// exclusive access to the world. Dead trees are torn down immediately
    /// and their grounded seeds germinate into new trees, which join the
    /// population starting the following day.
    pub fn step(&mut self) {
        self.day += 1;
        debug!(day = self.day, population = self.population.len(), "day begins");

        if self.config.energy_policy == EnergyPolicy::PerDay {
            self.world.update_energy_map();
        }
        self.population.shuffle(&mut self.rng);

        let mut survivors = Vec::with_capacity(self.population.len());
        let mut newborn = Vec::new();
        for mut tree in std::mem::take(&mut self.population) {
            if self.config.energy_policy == EnergyPolicy::PerTree {
                self.world.update_energy_map();
            }
            if tree.day_behaviour(&mut self.world, &self.config, &mut self.rng) {
                survivors.push(tree);
                continue;
            }
            self.deaths += 1;
            let seeds = tree.die_procedure(&mut self.world);
            for (seed_number, seed) in seeds.into_iter().enumerate() {
                let owner = self.alloc_owner();
                match seed.germinate(
                    &mut self.world,
                    seed_number as u32,
                    owner,
                    &self.config.energy,
                ) {
                    Ok(offspring) => {
                        self.births += 1;
                        newborn.push(offspring);
                    }
                    // Reference driver policy: seeds that did not reach the
                    // ground are not re-queued.
                    Err(_lost) => {}
                }
            }
            self.graveyard.push(tree.id().clone());
        }
        self.population = survivors;
        self.population.extend(newborn);
        self.peak_population = self.peak_population.max(self.population.len());

        if self.config.keep_history {
            self.history.push(self.world.clone());
        }
        if self.day % 10 == 0 {
            self.emit_population_metrics();
        }
    }

    fn emit_population_metrics(&self) {
        let population = self.population.len();
        let total_cells: usize = self.population.iter().map(|t| t.cells().len()).sum();
        let avg_energy = if population > 0 {
            self.population.iter().map(Tree::energy).sum::<i64>() / population as i64
        } else {
            0
        };
        let max_age = self.population.iter().map(Tree::age).max().unwrap_or(0);
        info!(
            day = self.day,
            population,
            total_cells,
            avg_energy,
            max_age,
            births = self.births,
            deaths = self.deaths,
            "population metrics"
        );
    }

    /// Run for the configured number of days (stopping early once the
    /// population is extinct) and summarize.
    pub fn run(&mut self) -> SimulationReport {
        info!(
            days = self.config.num_days,
            founders = self.config.initial_population,
            "starting run"
        );
        for _ in 0..self.config.num_days {
            if self.population.is_empty() {
                info!(day = self.day, "population extinct, stopping early");
                break;
            }
            self.step();
        }
        let report = SimulationReport {
            days_run: self.day,
            births: self.births,
            deaths: self.deaths,
            peak_population: self.peak_population,
            final_population: self.population.len(),
        };
        info!(
            days_run = report.days_run,
            births = report.births,
            deaths = report.deaths,
            peak_population = report.peak_population,
            final_population = report.final_population,
            "run complete"
        );
        report
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn population(&self) -> &[Tree] {
        &self.population
    }

    /// Identifiers of every tree that has died, in death order.
    pub fn graveyard(&self) -> &[TreeId] {
        &self.graveyard
    }

    /// Per-day world snapshots (only recorded with `keep_history`).
    pub fn history(&self) -> &[World] {
        &self.history
    }
}
