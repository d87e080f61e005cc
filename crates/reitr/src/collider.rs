//! Composite colliders: hit geometry for entities that are not tiles.
//!
//! A [`CompositeCollider`] is a handful of axis-aligned rectangles in the
//! entity's own space. Move it into the entity's current pose with
//! [`transform`](CompositeCollider::transform) (or [`world_collider`]) and
//! test it against other colliders. Counts are tiny, so intersection is a
//! plain pairwise check.
//!
//! Deciding what happens on contact is up to the caller; this module only
//! answers whether and where two colliders overlap.

use serde::{Deserialize, Serialize};

use crate::ecs::{ComponentStore, EntityHandle, TransformComponent};
use crate::math::{BoundingBox, Mat4, Vec2};

/// A union of axis-aligned rectangles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeCollider {
    rects: Vec<BoundingBox>,
}

impl CompositeCollider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rects(rects: impl IntoIterator<Item = BoundingBox>) -> Self {
        Self {
            rects: rects.into_iter().collect(),
        }
    }

    pub fn add(&mut self, rect: BoundingBox) {
        self.rects.push(rect);
    }

    pub fn rects(&self) -> &[BoundingBox] {
        &self.rects
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Whether any rectangle contains `point`.
    pub fn contains(&self, point: Vec2) -> bool {
        self.rects.iter().any(|rect| rect.contains(point))
    }

    pub fn intersects_rect(&self, rect: &BoundingBox) -> bool {
        self.rects.iter().any(|own| own.overlaps(rect))
    }

    /// Overlap between `rect` and the first of our rectangles that touches it.
    pub fn intersection_rect(&self, rect: &BoundingBox) -> Option<BoundingBox> {
        self.rects.iter().find_map(|own| own.intersection(rect))
    }

    /// Whether any pair of rectangles from the two colliders overlaps.
    pub fn intersects(&self, other: &CompositeCollider) -> bool {
        other.rects.iter().any(|rect| self.intersects_rect(rect))
    }

    /// Overlap of the first intersecting pair, scanning our rectangles in order.
    pub fn intersection(&self, other: &CompositeCollider) -> Option<BoundingBox> {
        self.rects.iter().find_map(|own| other.intersection_rect(own))
    }

    /// A copy with every rectangle mapped through `matrix`.
    pub fn transform(&self, matrix: &Mat4) -> CompositeCollider {
        Self::from_rects(self.rects.iter().map(|rect| rect.transformed(matrix)))
    }

    /// Smallest box enclosing every rectangle, or `None` when empty.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.rects.iter().copied().reduce(|acc, rect| acc.union(&rect))
    }
}

/// The collider of `entity`, moved into its current world pose.
///
/// `None` if the entity has no collider. Entities without a transform sit at
/// the identity.
pub fn world_collider(
    transforms: &TransformComponent,
    colliders: &ComponentStore<CompositeCollider>,
    entity: EntityHandle,
) -> Option<CompositeCollider> {
    colliders
        .try_get(entity)
        .map(|collider| collider.transform(&transforms.world_transform(entity)))
}
