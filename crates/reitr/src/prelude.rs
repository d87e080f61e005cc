//! Convenience re-exports: `use reitr::prelude::*` for the common items.

// Core
pub use crate::config::CoreConfig;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::math::{BoundingBox, Mat4, Quat, Rect, Transform, Vec2, Vec3, Vec4};
pub use crate::scene::Scene;

// Entities and transforms
pub use crate::ecs::{
    ComponentStore, Entity, EntityHandle, EntityManager, HandleSlot, ObserverId, Space,
    TransformComponent, TransformUpdateEvent,
};

// Tile maps and collision
pub use crate::collider::{CompositeCollider, world_collider};
pub use crate::collision::CollisionQuery;
pub use crate::motion::{Velocity, integrate_velocities};
pub use crate::tilemap::{Layer, MapDescription, TileCell, TileGridIndex, Tileset};
