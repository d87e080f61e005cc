//! # Reitr: Entity & Tile-Collision Core
//!
//! The data backbone of a small 2D engine: handle-based entities, typed
//! component stores, a parent/child transform hierarchy, and a tile-grid index
//! for collision queries against tile maps.
//!
//! Rendering, scripting, windowing and asset loading live elsewhere. This crate
//! takes already-decoded map data and already-resolved entity handles, and hands
//! back world transforms and collision results.
//!
//! Start with `use reitr::prelude::*`.

pub mod collider;
pub mod collision;
pub mod config;
pub mod ecs;
pub mod error;
pub mod math;
pub mod motion;
pub mod prelude;
pub mod scene;
pub mod tilemap;

pub use error::{Error, ErrorKind, Result};
