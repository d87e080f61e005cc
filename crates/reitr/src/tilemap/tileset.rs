//! Tilesets: a grid of equally sized tiles cut from one image.

use crate::math::Rect;

use super::description::TilesetDescription;

/// One tileset and the global tile ids it covers.
///
/// Tile `first_gid + n` is the `n`-th tile of the image, counted left to right,
/// top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tileset {
    /// Image reference, opaque to this crate.
    pub image: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub image_width: u32,
    pub image_height: u32,
    pub first_gid: u32,
}

impl Tileset {
    /// Tiles per image row.
    pub fn columns(&self) -> u32 {
        self.image_width.checked_div(self.tile_width).unwrap_or(0)
    }

    /// Tiles per image column.
    pub fn rows(&self) -> u32 {
        self.image_height.checked_div(self.tile_height).unwrap_or(0)
    }

    /// Number of tiles in the image. Can exceed the `u32` id space.
    pub fn tile_count(&self) -> u64 {
        u64::from(self.columns()) * u64::from(self.rows())
    }

    /// Whether `gid` falls inside this tileset's id range.
    pub fn contains(&self, gid: u32) -> bool {
        gid >= self.first_gid && u64::from(gid - self.first_gid) < self.tile_count()
    }

    /// Texture-space rectangle of tile `gid`, or `None` if it is not in this tileset.
    pub fn tile_uv(&self, gid: u32) -> Option<Rect> {
        if !self.contains(gid) {
            return None;
        }
        let offset = gid - self.first_gid;
        let (col, row) = (offset % self.columns(), offset / self.columns());
        Some(Rect::from_pixels(
            (col * self.tile_width) as f32,
            (row * self.tile_height) as f32,
            self.tile_width as f32,
            self.tile_height as f32,
            self.image_width as f32,
            self.image_height as f32,
        ))
    }
}

impl From<&TilesetDescription> for Tileset {
    fn from(desc: &TilesetDescription) -> Self {
        Self {
            image: desc.image.clone(),
            tile_width: desc.tile_width,
            tile_height: desc.tile_height,
            image_width: desc.image_width,
            image_height: desc.image_height,
            first_gid: desc.first_gid,
        }
    }
}
