//! # Entities, Components and the Transform Hierarchy
//!
//! There is no central world object here. Each concern owns its own storage
//! and the caller keeps them in step:
//!
//! - [`entity`]: Monotonic handles and the handle → entity lookup
//! - [`component`]: Typed sparse-to-dense stores, one per component kind
//! - [`hierarchy`]: Transform store with parent/child links and propagation
//!
//! [`Scene`](crate::scene::Scene) bundles the common set for callers that want
//! one place to spawn and despawn from.

pub mod component;
pub mod entity;
pub mod hierarchy;

pub use component::ComponentStore;
pub use entity::{Entity, EntityHandle, EntityManager, HandleSlot};
pub use hierarchy::{ObserverId, Space, TransformComponent, TransformInstance, TransformUpdateEvent};
