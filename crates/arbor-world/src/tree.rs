//! Tree lifecycle: energy ledger, aging, growth and death.

use crate::cell::Cell;
use crate::genome::Genome;
use crate::world::World;
use arbor_core::{EnergyConfig, OwnerId, Position, SimulationConfig, TreeId};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A reproducing organism: the cells it owns (in growth order), its genome,
/// an energy ledger, and an age counter. `alive -> dead` is the only state
/// transition and it happens exactly when the balance drops to zero or
/// below after the daily consumption step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    id: TreeId,
    owner: OwnerId,
    cells: Vec<Cell>,
    genome: Genome,
    energy: i64,
    alive: bool,
    age: u32,
    growth_cost: i64,
}

impl Tree {
    pub fn new(
        id: TreeId,
        owner: OwnerId,
        cells: Vec<Cell>,
        genome: Genome,
        energy: i64,
        growth_cost: i64,
    ) -> Self {
        Self {
            id,
            owner,
            cells,
            genome,
            energy,
            alive: true,
            age: 0,
            growth_cost,
        }
    }

    /// Plant a founder tree: a single active cell with gene 1 at `pos`.
    pub fn sprout(
        world: &mut World,
        id: TreeId,
        owner: OwnerId,
        pos: Position,
        genome: Genome,
        energy_config: &EnergyConfig,
    ) -> Self {
        let cell = Cell::new(
            world,
            id.clone(),
            owner,
            pos,
            1,
            energy_config.cell_energy_consumption,
        );
        Self::new(
            id,
            owner,
            vec![cell],
            genome,
            energy_config.initial_energy,
            energy_config.growth_cost,
        )
    }

    pub fn id(&self) -> &TreeId {
        &self.id
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn energy(&self) -> i64 {
        self.energy
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// One daily tick: age, photosynthesize, pay upkeep, and (while still
    /// alive and affordable) grow. Returns the post-tick alive flag.
    pub fn day_behaviour(
        &mut self,
        world: &mut World,
        config: &SimulationConfig,
        rng: &mut ChaCha8Rng,
    ) -> bool {
        if !self.alive {
            return false;
        }
        self.age += 1;
        self.produce_energy(world);
        self.consume_energy(&config.energy);
        if self.alive {
            self.grow(world, config, rng);
        }
        self.alive
    }

    /// Sum the energy captured by every cell and add it to the ledger.
    fn produce_energy(&mut self, world: &World) {
        let produced: u32 = self.cells.iter().map(|cell| cell.produce_energy(world)).sum();
        self.energy += produced as i64;
        debug!(tree = %self.id, produced, balance = self.energy, "energy produced");
    }

    /// Charge every cell's upkeep, scaled by the aging tax
    /// `floor(1 + age * consumption_increase_rate)`. Kills the tree when
    /// the balance drops to zero or below.
    fn consume_energy(&mut self, energy_config: &EnergyConfig) {
        let aging_factor =
            (1.0 + self.age as f32 * energy_config.consumption_increase_rate).floor() as i64;
        let consumed: i64 = self
            .cells
            .iter()
            .map(|cell| cell.upkeep() as i64 * aging_factor)
            .sum();
        self.energy -= consumed;
        debug!(tree = %self.id, consumed, balance = self.energy, "energy consumed");
        if self.energy <= 0 {
            self.alive = false;
            info!(tree = %self.id, age = self.age, cells = self.cells.len(), "tree has died");
        }
    }

    /// Let every cell (in stored insertion order) attempt division, if the
    /// balance covers this age's growth cost. The cost is only charged when
    /// at least one new cell was actually produced; an all-blocked attempt
    /// is free.
    fn grow(&mut self, world: &mut World, config: &SimulationConfig, rng: &mut ChaCha8Rng) {
        let cost = self.age as i64 * self.growth_cost;
        if self.energy < cost {
            debug!(tree = %self.id, balance = self.energy, cost, "not enough energy to grow");
            return;
        }
        let mut newborn = Vec::new();
        for i in 0..self.cells.len() {
            newborn.extend(self.cells[i].divide(
                world,
                &self.genome,
                &config.genome,
                &config.energy,
                rng,
            ));
        }
        if !newborn.is_empty() {
            debug!(tree = %self.id, new_cells = newborn.len(), cost, "tree grew");
            self.cells.extend(newborn);
            self.energy -= cost;
        }
    }

    /// Tear the tree out of the world. Ungerminated seeds detach and fall;
    /// every other cell's voxel is cleared. Returns the surviving seed
    /// cells as germination candidates for the driver (lodged seeds are
    /// returned too, but can never pass germination's ground check).
    pub fn die_procedure(&mut self, world: &mut World) -> Vec<Cell> {
        info!(tree = %self.id, age = self.age, cells = self.cells.len(), "removing dead tree");
        for cell in &mut self.cells {
            if cell.is_seed() {
                cell.fall_to_ground(world);
            } else {
                world.set_voxel(cell.pos(), None);
            }
        }
        let cells = std::mem::take(&mut self.cells);
        cells.into_iter().filter(|cell| cell.is_seed()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Gene;
    use arbor_core::{GenomeConfig, WorldConfig};
    use rand::SeedableRng;

    /// 5x5x5 world, sun 5, block decrease 1; genome where gene 1 grows
    /// gene 2 upward and gene 2 is terminal. Gene 3 is the (unused) seed
    /// gene.
    fn scenario() -> (World, SimulationConfig, Genome) {
        let config = SimulationConfig {
            world: WorldConfig {
                width: 5,
                height: 5,
                depth: 5,
                sun_value: 5,
                block_decrease: 1,
            },
            genome: GenomeConfig {
                seed: 0,
                genome_size: 3,
                mutation_rate: 0.0,
                seed_gene_id: 3,
            },
            ..SimulationConfig::default()
        };
        let mut world = World::new(&config.world);
        world.update_energy_map();
        let genome = Genome::from_genes(
            vec![
                Gene::with_links(1, [2, 0, 0, 0, 0, 0]),
                Gene::terminal(2),
                Gene::terminal(3),
            ],
            0.0,
        );
        (world, config, genome)
    }

    #[test]
    fn test_first_day_energy_accounting_and_growth() {
        let (mut world, config, genome) = scenario();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut tree = Tree::sprout(
            &mut world,
            TreeId::founder(1),
            OwnerId::new(1),
            Position::new(2, 0, 2),
            genome,
            &config.energy,
        );
        world.update_energy_map();
        let initial = tree.energy();

        assert!(tree.day_behaviour(&mut world, &config, &mut rng));

        // Produced 5 (clear column), consumed 1, grew for age * cost = 1.
        assert_eq!(tree.age(), 1);
        assert_eq!(tree.energy(), initial + 5 - 1 - 1);
        assert_eq!(tree.cells().len(), 2);
        assert_eq!(tree.cells()[1].pos(), Position::new(2, 1, 2));
        assert_eq!(tree.cells()[1].gene_id(), 2);
        assert_eq!(world.voxel(Position::new(2, 1, 2)), Some(OwnerId::new(1)));

        // Occlusion from the new cell shows up on the next recompute.
        world.update_energy_map();
        assert_eq!(world.voxel_energy(Position::new(2, 0, 2)), 4);
        assert_eq!(world.voxel_energy(Position::new(2, 1, 2)), 5);
    }

    #[test]
    fn test_no_growth_on_the_day_energy_runs_out() {
        let (mut world, mut config, genome) = scenario();
        config.energy.initial_energy = 1;
        // Upkeep exceeds anything the single cell can produce.
        config.energy.cell_energy_consumption = 10;
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut tree = Tree::sprout(
            &mut world,
            TreeId::founder(1),
            OwnerId::new(1),
            Position::new(2, 0, 2),
            genome,
            &config.energy,
        );
        world.update_energy_map();

        assert!(!tree.day_behaviour(&mut world, &config, &mut rng));
        assert!(!tree.is_alive());
        // Death stops the day: the cell never attempted division.
        assert_eq!(tree.cells().len(), 1);
        assert!(tree.cells()[0].is_active());
        assert!(world.is_free(Position::new(2, 1, 2)));

        // Dead trees no-op on later ticks.
        assert!(!tree.day_behaviour(&mut world, &config, &mut rng));
        assert_eq!(tree.age(), 1);
    }

    #[test]
    fn test_all_blocked_growth_costs_nothing() {
        let (mut world, config, genome) = scenario();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut tree = Tree::sprout(
            &mut world,
            TreeId::founder(1),
            OwnerId::new(1),
            Position::new(2, 0, 2),
            genome,
            &config.energy,
        );
        // Block the only growth direction with a foreign tree.
        world.set_voxel(Position::new(2, 1, 2), Some(OwnerId::new(9)));
        world.update_energy_map();
        let initial = tree.energy();

        assert!(tree.day_behaviour(&mut world, &config, &mut rng));

        // The blocker shades the founder's column, so it produced 4 and
        // consumed 1; the blocked growth attempt itself was free.
        assert_eq!(tree.energy(), initial + 4 - 1);
        assert_eq!(tree.cells().len(), 1);
        // The attempt still deactivated the cell.
        assert!(!tree.cells()[0].is_active());
    }

    #[test]
    fn test_growth_skipped_below_growth_budget() {
        let (mut world, mut config, genome) = scenario();
        // Balance after production stays below age * growth_cost.
        config.energy.initial_energy = 2;
        config.energy.growth_cost = 100;
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut tree = Tree::sprout(
            &mut world,
            TreeId::founder(1),
            OwnerId::new(1),
            Position::new(2, 0, 2),
            genome,
            &config.energy,
        );
        world.update_energy_map();

        assert!(tree.day_behaviour(&mut world, &config, &mut rng));
        assert_eq!(tree.cells().len(), 1);
        // The cell is still active: a skipped growth is not an attempt.
        assert!(tree.cells()[0].is_active());
    }

    #[test]
    fn test_aging_tax_scales_upkeep() {
        let (mut world, mut config, genome) = scenario();
        config.energy.consumption_increase_rate = 1.0;
        config.energy.growth_cost = 1000; // never grow
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut tree = Tree::sprout(
            &mut world,
            TreeId::founder(1),
            OwnerId::new(1),
            Position::new(2, 0, 2),
            genome,
            &config.energy,
        );
        world.update_energy_map();
        let initial = tree.energy();

        // Day 1: upkeep 1 * floor(1 + 1) = 2; day 2: 1 * floor(1 + 2) = 3.
        tree.day_behaviour(&mut world, &config, &mut rng);
        assert_eq!(tree.energy(), initial + 5 - 2);
        tree.day_behaviour(&mut world, &config, &mut rng);
        assert_eq!(tree.energy(), initial + 10 - 5);
    }

    #[test]
    fn test_die_procedure_clears_cells_and_returns_seeds() {
        let (mut world, config, _) = scenario();
        // Gene 1 grows Up to the seed gene 3 and Right to terminal gene 2.
        let genome = Genome::from_genes(
            vec![
                Gene::with_links(1, [3, 0, 0, 2, 0, 0]),
                Gene::terminal(2),
                Gene::terminal(3),
            ],
            0.0,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut tree = Tree::sprout(
            &mut world,
            TreeId::founder(1),
            OwnerId::new(1),
            Position::new(2, 0, 2),
            genome,
            &config.energy,
        );
        world.update_energy_map();
        assert!(tree.day_behaviour(&mut world, &config, &mut rng));
        assert_eq!(tree.cells().len(), 3);

        let seeds = tree.die_procedure(&mut world);
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].gene_id(), 3);
        // The plant cell at (3, 0, 2) vacated its voxel.
        assert!(world.is_free(Position::new(3, 0, 2)));
        // The seed fell from (2, 1, 2) into the ground voxel its dead
        // parent vacated.
        assert_eq!(seeds[0].pos(), Position::new(2, 0, 2));
        assert!(world.is_occupied(Position::new(2, 0, 2)));
    }
}
