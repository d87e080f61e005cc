//! Collision queries against a [`TileGridIndex`].
//!
//! Both queries walk the same candidate cells (see
//! [`TileGridIndex::for_each_tile_in_range`]), translate each solid tile's
//! collision rectangle to its cell, and test it against the query box in map
//! space. Overlap is strict: a box resting exactly on a tile edge does not
//! collide with it.
//!
//! ```ignore
//! let query = map.query();
//! if query.check_collision(&player_bb) {
//!     for hit in query.intersections(&player_bb) {
//!         // push the player out of `hit`
//!     }
//! }
//! ```

use std::ops::ControlFlow;

use crate::math::{BoundingBox, Vec2};
use crate::tilemap::{TileCell, TileGridIndex};

/// Read-only collision queries over one tile map.
#[derive(Debug, Clone, Copy)]
pub struct CollisionQuery<'a> {
    grid: &'a TileGridIndex,
}

impl<'a> CollisionQuery<'a> {
    pub fn new(grid: &'a TileGridIndex) -> Self {
        Self { grid }
    }

    /// Whether any solid tile overlaps `world_bb`.
    ///
    /// Stops at the first hit and does not say which tile it was.
    pub fn check_collision(&self, world_bb: &BoundingBox) -> bool {
        self.grid
            .for_each_tile_in_range(world_bb, |local, cell| match self.cell_rect(cell) {
                Some(rect) if rect.overlaps(local) => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            })
            .is_break()
    }

    /// World-space overlap with every solid tile `world_bb` touches.
    ///
    /// Results come in traversal order: layer by layer, then row-major.
    pub fn intersections(&self, world_bb: &BoundingBox) -> Vec<BoundingBox> {
        let model = self.grid.model();
        let mut hits = Vec::new();
        let _ = self.grid.for_each_tile_in_range(world_bb, |local, cell| {
            if let Some(overlap) = self.cell_rect(cell).and_then(|rect| rect.intersection(local)) {
                hits.push(overlap.transformed(&model));
            }
            ControlFlow::<()>::Continue(())
        });
        hits
    }

    /// The cell's collision rectangle in map space, if its tile is solid.
    fn cell_rect(&self, cell: TileCell) -> Option<BoundingBox> {
        self.grid
            .collision_rect(cell.gid)
            .map(|rect| rect.translated(Vec2::new(cell.x as f32, cell.y as f32)))
    }
}
