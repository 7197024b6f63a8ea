//! Voxel-tree simulation engine.
//!
//! Genome-driven trees grow cell by cell through a 3D voxel world, competing
//! for sunlight. Trees that run out of energy die and shed seeds; seeds that
//! reach the ground germinate into mutated offspring, closing the
//! evolutionary loop.

pub mod cell;
pub mod genome;
pub mod simulation;
pub mod tree;
pub mod world;

pub use cell::{Cell, CellKind, SeedState};
pub use genome::{Gene, Genome};
pub use simulation::{Simulation, SimulationReport};
pub use tree::Tree;
pub use world::World;
