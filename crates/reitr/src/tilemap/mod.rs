//! # Tile Maps: The Grid as Spatial Index
//!
//! A [`TileGridIndex`] holds the tile ids of every tile layer, the tilesets
//! those ids resolve into, and a table of collision rectangles keyed by global
//! tile id. Tile maps are already a uniform grid, so the grid itself is the
//! broad phase: a query box is converted into map space, clamped to each
//! layer, and only the cells it touches are looked at.
//!
//! ## Coordinate spaces
//!
//! ```text
//! world ──inverse(model)──► map space (1 unit = 1 tile) ──model──► world
//! ```
//!
//! Collision rectangles are stored in tile units relative to their cell, so a
//! full-cell rectangle is `(0, 0, 1, 1)` whatever the tileset's pixel size.
//!
//! The index is immutable once built, which makes it safe to share between
//! threads and to query between transform updates.

pub mod description;
pub mod tileset;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::{ControlFlow, RangeInclusive};

use crate::collision::CollisionQuery;
use crate::error::{Error, Result};
use crate::math::{BoundingBox, Mat4, Rect};

pub use description::MapDescription;
pub use tileset::Tileset;

/// One tile layer: a row-major grid of global tile ids (`0` = empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    pub tile_ids: Vec<u32>,
    pub width: u32,
    pub height: u32,
}

impl Layer {
    /// Build a layer, checking that `tile_ids` fills exactly `width * height` cells.
    pub fn new(name: impl Into<String>, width: u32, height: u32, tile_ids: Vec<u32>) -> Result<Self> {
        let layer = Self {
            name: name.into(),
            tile_ids,
            width,
            height,
        };
        layer.validate()?;
        Ok(layer)
    }

    fn validate(&self) -> Result<()> {
        let cells = self.width as usize * self.height as usize;
        if self.tile_ids.len() != cells {
            return Err(Error::InvalidMap(format!(
                "layer `{}` is {}x{} but has {} tile ids",
                self.name,
                self.width,
                self.height,
                self.tile_ids.len()
            )));
        }
        Ok(())
    }

    /// Global tile id at `(x, y)`, or `None` outside the layer.
    pub fn tile_id(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tile_ids.get(x as usize + y as usize * self.width as usize).copied()
    }
}

/// A candidate cell produced by [`TileGridIndex::for_each_tile_in_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCell {
    /// Index into [`TileGridIndex::layers`].
    pub layer: usize,
    /// Row-major index into the layer's tile ids.
    pub index: usize,
    pub x: u32,
    pub y: u32,
    /// Global tile id stored in the cell.
    pub gid: u32,
}

/// Tile layers, tilesets and collision rectangles of one map.
#[derive(Debug, Clone)]
pub struct TileGridIndex {
    tilesets: Vec<Tileset>,
    layers: Vec<Layer>,
    collision_rects: HashMap<u32, BoundingBox>,
    model: Mat4,
    inverse_model: Mat4,
}

impl TileGridIndex {
    /// Build an index from already-normalized parts.
    ///
    /// `model` maps map space (one unit per tile) to world space and must be
    /// invertible. Tilesets are sorted by `first_gid`.
    pub fn new(
        mut tilesets: Vec<Tileset>,
        layers: Vec<Layer>,
        collision_rects: HashMap<u32, BoundingBox>,
        model: Mat4,
    ) -> Result<Self> {
        let determinant = model.determinant();
        if determinant == 0.0 || !determinant.is_finite() {
            return Err(Error::InvalidMap("model matrix is not invertible".into()));
        }
        for tileset in &tilesets {
            if tileset.tile_width == 0 || tileset.tile_height == 0 {
                return Err(Error::InvalidMap(format!(
                    "tileset `{}` has a zero tile size",
                    tileset.image
                )));
            }
            if tileset.first_gid == 0 {
                return Err(Error::InvalidMap(format!(
                    "tileset `{}` starts at reserved id 0",
                    tileset.image
                )));
            }
        }
        for layer in &layers {
            layer.validate()?;
        }

        // Stable, so among equal first ids the later tileset still wins lookups.
        tilesets.sort_by_key(|tileset| tileset.first_gid);

        log::debug!(
            "built tile grid: {} tilesets, {} layers, {} collision rects",
            tilesets.len(),
            layers.len(),
            collision_rects.len()
        );

        Ok(Self {
            tilesets,
            layers,
            collision_rects,
            model,
            inverse_model: model.inverse(),
        })
    }

    /// Build an index from a decoded map.
    ///
    /// Collision objects are converted from pixels to tile units using their
    /// tileset's tile size. Layers other than tile layers are skipped.
    pub fn from_description(map: &MapDescription, model: Mat4) -> Result<Self> {
        let mut tilesets = Vec::with_capacity(map.tilesets.len());
        let mut collision_rects = HashMap::new();

        for desc in &map.tilesets {
            if desc.tile_width == 0 || desc.tile_height == 0 {
                return Err(Error::InvalidMap(format!(
                    "tileset `{}` has a zero tile size",
                    desc.image
                )));
            }
            let (tw, th) = (desc.tile_width as f32, desc.tile_height as f32);

            for tile in &desc.tiles {
                let Some(group) = &tile.object_group else {
                    continue;
                };
                let gid = tile.id.checked_add(desc.first_gid).ok_or_else(|| {
                    Error::InvalidMap(format!(
                        "tile {} of tileset `{}` overflows the global id range",
                        tile.id, desc.image
                    ))
                })?;
                for (i, object) in group.objects.iter().enumerate() {
                    let rect = BoundingBox::new(
                        object.x / tw,
                        object.y / th,
                        object.width / tw,
                        object.height / th,
                    );
                    match collision_rects.entry(gid) {
                        Entry::Vacant(slot) => {
                            slot.insert(rect);
                        }
                        Entry::Occupied(_) => {
                            log::warn!("tile {gid}: ignoring extra collision object #{i}");
                        }
                    }
                }
            }
            tilesets.push(Tileset::from(desc));
        }

        let mut layers = Vec::new();
        for desc in &map.layers {
            if !desc.is_tile_layer() {
                log::debug!("skipping {} layer `{}`", desc.kind, desc.name);
                continue;
            }
            layers.push(Layer::new(desc.name.clone(), desc.width, desc.height, desc.data.clone())?);
        }

        Self::new(tilesets, layers, collision_rects, model)
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Position of the tileset covering `gid` in [`tilesets`](Self::tilesets).
    pub fn tileset_index(&self, gid: u32) -> Result<usize> {
        let candidates = self.tilesets.partition_point(|t| t.first_gid <= gid);
        match candidates.checked_sub(1) {
            Some(i) if self.tilesets[i].contains(gid) => Ok(i),
            _ => Err(Error::NoTileset(gid)),
        }
    }

    /// The tileset covering `gid`.
    ///
    /// Fails with [`Error::NoTileset`] for the empty id `0` and for ids outside
    /// every tileset.
    pub fn resolve_tileset(&self, gid: u32) -> Result<&Tileset> {
        self.tileset_index(gid).map(|i| &self.tilesets[i])
    }

    /// Texture-space rectangle of tile `gid` within its tileset image.
    pub fn tile_uv(&self, gid: u32) -> Result<Rect> {
        self.resolve_tileset(gid)?
            .tile_uv(gid)
            .ok_or(Error::NoTileset(gid))
    }

    /// Collision rectangle of `gid` in tile units, or `None` for non-solid tiles.
    pub fn collision_rect(&self, gid: u32) -> Option<BoundingBox> {
        self.collision_rects.get(&gid).copied()
    }

    pub fn collision_rect_count(&self) -> usize {
        self.collision_rects.len()
    }

    pub fn tilesets(&self) -> &[Tileset] {
        &self.tilesets
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Map space → world space.
    pub fn model(&self) -> Mat4 {
        self.model
    }

    /// World space → map space.
    pub fn inverse_model(&self) -> Mat4 {
        self.inverse_model
    }

    /// Collision queries against this map.
    pub fn query(&self) -> CollisionQuery<'_> {
        CollisionQuery::new(self)
    }

    // ── Traversal ────────────────────────────────────────────────────

    /// Convert a world-space box into map space.
    pub fn local_bounds(&self, world_bb: &BoundingBox) -> BoundingBox {
        world_bb.transformed(&self.inverse_model)
    }

    /// Visit every cell a world-space box may touch.
    ///
    /// The box is converted into map space and the inclusive cell range
    /// `floor(min) ..= floor(max)` is clamped to each layer. Cells come layer by
    /// layer, rows top to bottom, cells left to right. `visit` receives the
    /// map-space box with each cell; returning `Break` ends the whole traversal.
    pub fn for_each_tile_in_range<B>(
        &self,
        world_bb: &BoundingBox,
        mut visit: impl FnMut(&BoundingBox, TileCell) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        let local = self.local_bounds(world_bb);
        let (min, max) = (local.min().floor(), local.max().floor());

        for (layer_index, layer) in self.layers.iter().enumerate() {
            let (Some(xs), Some(ys)) = (
                clamp_range(min.x, max.x, layer.width),
                clamp_range(min.y, max.y, layer.height),
            ) else {
                continue;
            };

            for y in ys {
                for x in xs.clone() {
                    let index = x as usize + y as usize * layer.width as usize;
                    let cell = TileCell {
                        layer: layer_index,
                        index,
                        x,
                        y,
                        gid: layer.tile_ids[index],
                    };
                    if let ControlFlow::Break(b) = visit(&local, cell) {
                        return ControlFlow::Break(b);
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }
}

/// Clamp the floored range `lo..=hi` to `0..len`, or `None` if nothing is left.
fn clamp_range(lo: f32, hi: f32, len: u32) -> Option<RangeInclusive<u32>> {
    if len == 0 || lo.is_nan() || hi.is_nan() {
        return None;
    }
    let lo = lo.max(0.0);
    let hi = hi.min((len - 1) as f32);
    if hi < lo {
        return None;
    }
    Some(lo as u32..=hi as u32)
}
