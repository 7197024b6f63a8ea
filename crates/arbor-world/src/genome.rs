//! Heritable growth program: genes and the genomes that carry them.

use arbor_core::{Direction, GenomeConfig};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Gene identifier. `0` is the terminal link ("no growth in this direction");
/// real genes are numbered `1..=genome_size`.
pub type GeneId = u16;

/// The terminal link value.
pub const TERMINAL: GeneId = 0;

/// A directional growth rule: one follow-on gene id (or terminal) per
/// spatial direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    pub id: GeneId,
    links: [GeneId; 6],
}

impl Gene {
    /// Randomize a gene's links.
    ///
    /// Each link is drawn uniformly from `[-genome_size, genome_size]` and
    /// clamped below at 0, so roughly half of all draws land on the terminal
    /// link. The asymmetric clamp is load-bearing: it biases growth programs
    /// toward sparse branching.
    pub fn random(id: GeneId, genome_size: u16, rng: &mut ChaCha8Rng) -> Self {
        let mut links = [TERMINAL; 6];
        for link in &mut links {
            let draw = rng.gen_range(-(genome_size as i32)..=genome_size as i32);
            *link = draw.max(0) as GeneId;
        }
        Self { id, links }
    }

    /// A gene with explicit links, in `Direction::all()` order.
    pub fn with_links(id: GeneId, links: [GeneId; 6]) -> Self {
        Self { id, links }
    }

    /// A gene that never grows.
    pub fn terminal(id: GeneId) -> Self {
        Self {
            id,
            links: [TERMINAL; 6],
        }
    }

    /// The follow-on gene id in `direction`, or [`TERMINAL`].
    pub fn link(&self, direction: Direction) -> GeneId {
        self.links[direction.index()]
    }

    /// True when every link is terminal.
    pub fn is_terminal(&self) -> bool {
        self.links.iter().all(|&link| link == TERMINAL)
    }
}

/// The full ordered gene set defining a lineage's growth program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    genes: Vec<Gene>,
    genome_size: u16,
    mutation_rate: f32,
}

impl Genome {
    /// Build a fresh genome with randomized genes numbered `1..=genome_size`.
    ///
    /// Deterministic given the RNG state; callers seed the RNG from
    /// `GenomeConfig::seed` for reproducible first generations.
    pub fn random(config: &GenomeConfig, rng: &mut ChaCha8Rng) -> Self {
        let genes = (1..=config.genome_size)
            .map(|id| Gene::random(id, config.genome_size, rng))
            .collect();
        Self {
            genes,
            genome_size: config.genome_size,
            mutation_rate: config.mutation_rate,
        }
    }

    /// Build a genome from an explicit gene sequence (ids must be
    /// `1..=len` in order).
    pub fn from_genes(genes: Vec<Gene>, mutation_rate: f32) -> Self {
        for (i, gene) in genes.iter().enumerate() {
            debug_assert_eq!(gene.id as usize, i + 1, "gene ids must be 1-based and dense");
        }
        let genome_size = genes.len() as u16;
        Self {
            genes,
            genome_size,
            mutation_rate,
        }
    }

    /// Look up a gene by its 1-based id.
    ///
    /// An id outside `[1, genome_size]` is a programmer or configuration
    /// error and panics rather than clamping.
    pub fn gene(&self, id: GeneId) -> &Gene {
        assert!(
            id >= 1 && id <= self.genome_size,
            "gene id {id} outside [1, {}]",
            self.genome_size
        );
        &self.genes[(id - 1) as usize]
    }

    pub fn size(&self) -> u16 {
        self.genome_size
    }

    pub fn mutation_rate(&self) -> f32 {
        self.mutation_rate
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    /// Derive an offspring genome: each gene is independently replaced by a
    /// freshly randomized gene with the same id (probability
    /// `mutation_rate`) or copied verbatim. Size and mutation rate carry
    /// forward.
    pub fn create_offspring(&self, rng: &mut ChaCha8Rng) -> Genome {
        let genes = self
            .genes
            .iter()
            .map(|gene| {
                if rng.gen::<f32>() < self.mutation_rate {
                    Gene::random(gene.id, self.genome_size, rng)
                } else {
                    gene.clone()
                }
            })
            .collect();
        Self {
            genes,
            genome_size: self.genome_size,
            mutation_rate: self.mutation_rate,
        }
    }
}
