//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ground level of the world; seeds germinate only at this height.
pub const GROUND: i32 = 0;

/// Non-zero voxel occupancy handle. A voxel holding `0` is empty, anything
/// else is the handle of the tree occupying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(u32);

impl OwnerId {
    pub fn new(value: u32) -> Self {
        assert!(value != 0, "owner id 0 is reserved for empty voxels");
        Self(value)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lineage-encoding tree identifier.
///
/// Founders are `"001"`, `"002"`, ...; each germinated seed extends its
/// parent's identifier, so `"002.003"` is the fourth seed shed by founder 2.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeId(String);

impl TreeId {
    pub fn founder(index: u32) -> Self {
        Self(format!("{index:03}"))
    }

    /// Identifier for the `seed_number`-th seed germinated from this tree.
    pub fn child(&self, seed_number: u32) -> Self {
        Self(format!("{}.{seed_number:03}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Voxel coordinate in the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighboring coordinate one step in `direction`.
    pub fn shifted(&self, direction: Direction) -> Self {
        let (dx, dy, dz) = direction.to_delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    pub fn is_ground(&self) -> bool {
        self.y == GROUND
    }
}

/// Growth direction. `all()` returns the fixed order in which cells evaluate
/// their gene links; growth conflicts within a pass resolve first-writer-wins
/// in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Forward,
    Back,
}

impl Direction {
    pub fn to_delta(&self) -> (i32, i32, i32) {
        match self {
            Direction::Up => (0, 1, 0),
            Direction::Down => (0, -1, 0),
            Direction::Left => (-1, 0, 0),
            Direction::Right => (1, 0, 0),
            Direction::Forward => (0, 0, 1),
            Direction::Back => (0, 0, -1),
        }
    }

    /// Index of this direction into a gene's link table.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn all() -> [Direction; 6] {
        [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
            Direction::Forward,
            Direction::Back,
        ]
    }
}
