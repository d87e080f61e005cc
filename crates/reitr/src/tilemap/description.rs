//! Decoded map data, as handed over by a map loader.
//!
//! Field names follow Tiled's JSON export, so a `.tmj`/`.json` map can be read
//! straight into a [`MapDescription`] with `serde_json`. Anything this crate
//! does not use (properties, object layers' contents, editor settings) is
//! ignored.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A whole map: tilesets plus layers, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapDescription {
    #[serde(default)]
    pub tilesets: Vec<TilesetDescription>,
    #[serde(default)]
    pub layers: Vec<LayerDescription>,
}

impl MapDescription {
    /// Decode a map from Tiled-style JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TilesetDescription {
    /// Image path, relative to the map. Resolved by the asset layer.
    pub image: String,
    #[serde(rename = "tilewidth")]
    pub tile_width: u32,
    #[serde(rename = "tileheight")]
    pub tile_height: u32,
    #[serde(rename = "imagewidth")]
    pub image_width: u32,
    #[serde(rename = "imageheight")]
    pub image_height: u32,
    #[serde(rename = "firstgid")]
    pub first_gid: u32,
    /// Per-tile extras. Only tiles with collision shapes matter here.
    #[serde(default)]
    pub tiles: Vec<TileDescription>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileDescription {
    /// Tile id local to its tileset (global id minus `firstgid`).
    pub id: u32,
    #[serde(default, rename = "objectgroup", alias = "objectGroup")]
    pub object_group: Option<ObjectGroupDescription>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectGroupDescription {
    #[serde(default)]
    pub objects: Vec<ObjectDescription>,
}

/// A collision rectangle in pixels, relative to the tile's top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescription {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerDescription {
    /// Layer type tag. Only `"tilelayer"` layers are indexed.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Row-major global tile ids, `0` for empty cells.
    #[serde(default)]
    pub data: Vec<u32>,
}

impl LayerDescription {
    pub fn is_tile_layer(&self) -> bool {
        self.kind == "tilelayer"
    }
}
