//! Cells: the growth automaton, and the seed variant that detaches,
//! falls, and germinates.

use crate::genome::{GeneId, Genome, TERMINAL};
use crate::tree::Tree;
use crate::world::World;
use arbor_core::{Direction, EnergyConfig, GenomeConfig, OwnerId, Position, TreeId, GROUND};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What kind of occupant a cell is.
///
/// Seeds carry their own energy balance and an already-mutated genome for
/// the lineage they may found. A germinated seed becomes a [`CellKind::Sprout`]:
/// it grows like a plant cell but, like a seed, never photosynthesizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CellKind {
    Plant,
    Seed(SeedState),
    Sprout,
}

/// State carried by an ungerminated seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedState {
    pub genome: Genome,
    pub energy: i64,
}

/// One occupied voxel belonging to a tree, bound to one gene.
///
/// A cell attempts growth at most once: `active` flips to false after the
/// first [`Cell::divide`] call regardless of outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    tree: TreeId,
    owner: OwnerId,
    pos: Position,
    gene_id: GeneId,
    kind: CellKind,
    active: bool,
    upkeep: u32,
}

impl Cell {
    /// Create a plant cell and claim its voxel.
    pub fn new(
        world: &mut World,
        tree: TreeId,
        owner: OwnerId,
        pos: Position,
        gene_id: GeneId,
        upkeep: u32,
    ) -> Self {
        world.set_voxel(pos, Some(owner));
        Self {
            tree,
            owner,
            pos,
            gene_id,
            kind: CellKind::Plant,
            active: true,
            upkeep,
        }
    }

    /// Create a seed cell and claim its voxel. Seeds are inert growth
    /// agents (inactive, zero upkeep) carrying their own genome and energy.
    pub fn new_seed(
        world: &mut World,
        tree: TreeId,
        owner: OwnerId,
        pos: Position,
        gene_id: GeneId,
        genome: Genome,
        energy: i64,
    ) -> Self {
        world.set_voxel(pos, Some(owner));
        Self {
            tree,
            owner,
            pos,
            gene_id,
            kind: CellKind::Seed(SeedState { genome, energy }),
            active: false,
            upkeep: 0,
        }
    }

    pub fn pos(&self) -> Position {
        self.pos
    }

    pub fn gene_id(&self) -> GeneId {
        self.gene_id
    }

    pub fn tree(&self) -> &TreeId {
        &self.tree
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn upkeep(&self) -> u32 {
        self.upkeep
    }

    pub fn kind(&self) -> &CellKind {
        &self.kind
    }

    /// True for an ungerminated seed.
    pub fn is_seed(&self) -> bool {
        matches!(self.kind, CellKind::Seed(_))
    }

    /// Attempt growth into the six neighboring voxels.
    ///
    /// Each direction is evaluated independently in `Direction::all()`
    /// order: a terminal link or a non-free target voxel is silently
    /// skipped, otherwise the target is claimed immediately (first writer
    /// wins within a growth pass) and a new cell is created there with the
    /// linked gene. A link resolving to the reserved seed gene grows a seed
    /// carrying an offspring genome instead of a plant cell.
    ///
    /// Deactivates the cell unconditionally, even when nothing was grown.
    pub fn divide(
        &mut self,
        world: &mut World,
        genome: &Genome,
        genome_config: &GenomeConfig,
        energy_config: &EnergyConfig,
        rng: &mut ChaCha8Rng,
    ) -> Vec<Cell> {
        let mut offspring = Vec::new();
        if self.active {
            let gene = genome.gene(self.gene_id);
            if !gene.is_terminal() {
                for direction in Direction::all() {
                    let link = gene.link(direction);
                    if link == TERMINAL {
                        continue;
                    }
                    let target = self.pos.shifted(direction);
                    if !world.is_free(target) {
                        continue;
                    }
                    let cell = if link == genome_config.seed_gene_id {
                        Cell::new_seed(
                            world,
                            self.tree.clone(),
                            self.owner,
                            target,
                            link,
                            genome.create_offspring(rng),
                            energy_config.initial_energy,
                        )
                    } else {
                        Cell::new(
                            world,
                            self.tree.clone(),
                            self.owner,
                            target,
                            link,
                            self.upkeep,
                        )
                    };
                    offspring.push(cell);
                }
            }
        }
        self.active = false;
        offspring
    }

    /// Energy captured this day: the energy field at this cell's voxel.
    /// Seed-gene cells (seeds and sprouts alike) never photosynthesize.
    pub fn produce_energy(&self, world: &World) -> u32 {
        match self.kind {
            CellKind::Plant => world.voxel_energy(self.pos),
            CellKind::Seed(_) | CellKind::Sprout => 0,
        }
    }

    /// Drop a detached seed toward the ground.
    ///
    /// If every voxel strictly below is empty the seed relocates to ground
    /// level in its column, otherwise it lodges against the obstruction and
    /// is lost (its voxel is cleared and it never reaches germinable
    /// height).
    pub fn fall_to_ground(&mut self, world: &mut World) {
        if matches!(self.kind, CellKind::Sprout) {
            // Already germinated; just vacate the voxel.
            debug!(tree = %self.tree, "grown seed released its voxel");
            world.set_voxel(self.pos, None);
        }
        if world.column_clear_below(self.pos) {
            world.set_voxel(self.pos, None);
            self.pos.y = GROUND;
            world.set_voxel(self.pos, Some(self.owner));
        } else {
            debug!(tree = %self.tree, x = self.pos.x, y = self.pos.y, z = self.pos.z,
                "seed lodged mid-air and was lost");
            world.set_voxel(self.pos, None);
        }
    }

    /// Turn a grounded seed into a new single-cell tree.
    ///
    /// Fails (handing the unchanged cell back) unless the seed sits at
    /// ground level. On success the cell wakes up as a sprout with standard
    /// upkeep, re-identifies itself as `parent.{seed_number:03}` under the
    /// freshly allocated `owner`, re-claims its ground voxel, and becomes
    /// the sole cell of a new tree carrying the seed's own mutated genome
    /// and energy balance.
    pub fn germinate(
        mut self,
        world: &mut World,
        seed_number: u32,
        owner: OwnerId,
        energy_config: &EnergyConfig,
    ) -> Result<Tree, Cell> {
        if !self.pos.is_ground() {
            debug!(tree = %self.tree, y = self.pos.y, "seed is not on the ground");
            return Err(self);
        }
        let state = match std::mem::replace(&mut self.kind, CellKind::Sprout) {
            CellKind::Seed(state) => state,
            other => {
                self.kind = other;
                return Err(self);
            }
        };

        self.active = true;
        self.upkeep = energy_config.cell_energy_consumption;
        self.tree = self.tree.child(seed_number);
        self.owner = owner;
        world.set_voxel(self.pos, Some(owner));

        let id = self.tree.clone();
        debug!(tree = %id, "seed germinated");
        Ok(Tree::new(
            id,
            owner,
            vec![self],
            state.genome,
            state.energy,
            energy_config.growth_cost,
        ))
    }
}
