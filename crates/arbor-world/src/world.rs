//! 3D voxel grid with a derived sunlight energy field.

use arbor_core::{OwnerId, Position, WorldConfig};
use serde::{Deserialize, Serialize};

/// The world: a fixed-size occupancy grid plus a same-shaped energy field.
///
/// Occupancy holds `0` for empty voxels or the owning tree's handle. The
/// energy field is derived from occupancy by [`World::update_energy_map`]
/// and is stale until the next recompute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    width: i32,
    height: i32,
    depth: i32,
    sun_value: u32,
    block_decrease: u32,
    voxels: Vec<u32>,
    energy: Vec<u32>,
}

impl World {
    pub fn new(config: &WorldConfig) -> Self {
        // Volume arithmetic stays in usize: large grids overflow i32.
        let size = config.width as usize * config.height as usize * config.depth as usize;
        Self {
            width: config.width,
            height: config.height,
            depth: config.depth,
            sun_value: config.sun_value,
            block_decrease: config.block_decrease,
            voxels: vec![0; size],
            energy: vec![0; size],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Flat index for an in-bounds coordinate. Out-of-bounds access through
    /// the raw accessors is a precondition violation and panics; callers
    /// gate growth through [`World::is_free`] / [`World::is_occupied`].
    fn index(&self, pos: Position) -> usize {
        assert!(
            self.in_bounds(pos),
            "voxel access out of bounds: ({}, {}, {})",
            pos.x,
            pos.y,
            pos.z
        );
        (pos.x as usize * self.height as usize + pos.y as usize) * self.depth as usize
            + pos.z as usize
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        (0..self.width).contains(&pos.x)
            && (0..self.height).contains(&pos.y)
            && (0..self.depth).contains(&pos.z)
    }

    /// Direct occupancy read.
    pub fn voxel(&self, pos: Position) -> Option<OwnerId> {
        match self.voxels[self.index(pos)] {
            0 => None,
            value => Some(OwnerId::new(value)),
        }
    }

    /// Direct occupancy write; `None` clears the voxel.
    pub fn set_voxel(&mut self, pos: Position, owner: Option<OwnerId>) {
        let index = self.index(pos);
        self.voxels[index] = owner.map_or(0, |o| o.get());
    }

    /// True when the coordinate is inside the grid and empty. Out-of-bounds
    /// coordinates are never free: the boundary is an implicit wall growth
    /// cannot cross.
    pub fn is_free(&self, pos: Position) -> bool {
        self.in_bounds(pos) && self.voxels[self.index(pos)] == 0
    }

    /// True when the coordinate is inside the grid and occupied.
    pub fn is_occupied(&self, pos: Position) -> bool {
        self.in_bounds(pos) && self.voxels[self.index(pos)] != 0
    }

    /// True when every voxel strictly below `pos` in its column is empty.
    pub fn column_clear_below(&self, pos: Position) -> bool {
        (0..pos.y).all(|y| self.voxels[self.index(Position::new(pos.x, y, pos.z))] == 0)
    }

    /// Point read of the precomputed energy field; no recomputation.
    pub fn voxel_energy(&self, pos: Position) -> u32 {
        self.energy[self.index(pos)]
    }

    /// Recompute the whole energy field from current occupancy.
    ///
    /// Per (x, z) column, `sun_value` is carried down from the top layer;
    /// each occupied voxel reduces the carried value for the layers below it
    /// by `block_decrease`, floored at 0. A voxel's own energy is therefore
    /// `sun_value` minus `block_decrease` per occupied voxel strictly above
    /// it. Light occludes vertically only; there is no lateral shading.
    pub fn update_energy_map(&mut self) {
        for x in 0..self.width {
            for z in 0..self.depth {
                let mut carried = self.sun_value;
                for y in (0..self.height).rev() {
                    let index = self.index(Position::new(x, y, z));
                    self.energy[index] = carried;
                    if self.voxels[index] != 0 {
                        carried = carried.saturating_sub(self.block_decrease);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(width: i32, height: i32, depth: i32) -> World {
        World::new(&WorldConfig {
            width,
            height,
            depth,
            sun_value: 5,
            block_decrease: 1,
        })
    }

    #[test]
    fn test_new_world_is_empty() {
        let w = world(4, 4, 4);
        for x in 0..4 {
            for y in 0..4 {
                for z in 0..4 {
                    assert!(w.is_free(Position::new(x, y, z)));
                }
            }
        }
    }

    #[test]
    fn test_out_of_bounds_is_neither_free_nor_occupied() {
        let w = world(4, 4, 4);
        for pos in [
            Position::new(-1, 0, 0),
            Position::new(0, -1, 0),
            Position::new(0, 0, -1),
            Position::new(4, 0, 0),
            Position::new(0, 4, 0),
            Position::new(0, 0, 4),
        ] {
            assert!(!w.is_free(pos));
            assert!(!w.is_occupied(pos));
        }
    }

    #[test]
    fn test_set_and_clear_voxel() {
        let mut w = world(4, 4, 4);
        let pos = Position::new(1, 2, 3);
        let owner = OwnerId::new(7);

        w.set_voxel(pos, Some(owner));
        assert!(w.is_occupied(pos));
        assert_eq!(w.voxel(pos), Some(owner));

        w.set_voxel(pos, None);
        assert!(w.is_free(pos));
        assert_eq!(w.voxel(pos), None);
    }

    #[test]
    #[should_panic]
    fn test_raw_access_out_of_bounds_panics() {
        let w = world(4, 4, 4);
        w.voxel(Position::new(4, 0, 0));
    }

    #[test]
    fn test_energy_map_on_empty_grid() {
        let mut w = world(5, 5, 5);
        w.update_energy_map();
        for x in 0..5 {
            for y in 0..5 {
                for z in 0..5 {
                    assert_eq!(w.voxel_energy(Position::new(x, y, z)), 5);
                }
            }
        }
    }

    #[test]
    fn test_energy_map_single_block_occludes_below() {
        let mut w = world(5, 5, 5);
        let h = 3;
        w.set_voxel(Position::new(2, h, 2), Some(OwnerId::new(1)));
        w.update_energy_map();

        for y in 0..5 {
            let energy = w.voxel_energy(Position::new(2, y, 2));
            if y >= h {
                assert_eq!(energy, 5, "layer {y} at or above the block");
            } else {
                assert_eq!(energy, 4, "layer {y} below the block");
            }
        }
        // Other columns are unaffected.
        for y in 0..5 {
            assert_eq!(w.voxel_energy(Position::new(0, y, 0)), 5);
        }
    }

    #[test]
    fn test_energy_map_floors_at_zero() {
        let mut w = World::new(&WorldConfig {
            width: 1,
            height: 6,
            depth: 1,
            sun_value: 2,
            block_decrease: 1,
        });
        for y in 2..6 {
            w.set_voxel(Position::new(0, y, 0), Some(OwnerId::new(1)));
        }
        w.update_energy_map();
        // Four blocks above, sun 2: fully occluded at the bottom.
        assert_eq!(w.voxel_energy(Position::new(0, 0, 0)), 0);
        assert_eq!(w.voxel_energy(Position::new(0, 1, 0)), 0);
        assert_eq!(w.voxel_energy(Position::new(0, 5, 0)), 2);
    }

    #[test]
    fn test_energy_map_recompute_reflects_changes() {
        let mut w = world(3, 3, 3);
        w.update_energy_map();
        assert_eq!(w.voxel_energy(Position::new(1, 0, 1)), 5);

        w.set_voxel(Position::new(1, 2, 1), Some(OwnerId::new(2)));
        // Stale until recomputed.
        assert_eq!(w.voxel_energy(Position::new(1, 0, 1)), 5);
        w.update_energy_map();
        assert_eq!(w.voxel_energy(Position::new(1, 0, 1)), 4);
    }

    #[test]
    fn test_column_clear_below() {
        let mut w = world(4, 4, 4);
        assert!(w.column_clear_below(Position::new(1, 3, 1)));
        // A seed at ground level has nothing below it.
        assert!(w.column_clear_below(Position::new(1, 0, 1)));

        w.set_voxel(Position::new(1, 1, 1), Some(OwnerId::new(1)));
        assert!(!w.column_clear_below(Position::new(1, 3, 1)));
        // The occupied voxel itself does not block its own column check.
        assert!(w.column_clear_below(Position::new(1, 1, 1)));
    }
}
