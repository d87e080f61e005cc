//! Linear motion: a velocity component and a per-tick integration step.
//!
//! Integration only moves things. Resolving contacts against the tile map or
//! other colliders is the caller's job, usually right after this step.

use serde::{Deserialize, Serialize};

use crate::ecs::{ComponentStore, Space, TransformComponent};
use crate::error::Result;
use crate::math::{Mat4, Vec2};

/// World-space velocity in units per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub Vec2);

impl Velocity {
    pub const ZERO: Self = Self(Vec2::ZERO);

    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    /// Displacement after `dt` seconds.
    pub fn displacement(&self, dt: f32) -> Vec2 {
        self.0 * dt
    }
}

/// Advance every entity with a [`Velocity`] by `velocity * dt`.
///
/// The translation is applied in world space, so a child keeps moving in the
/// same on-screen direction however its parent is rotated or scaled. Entities
/// at rest are skipped. Returns how many entities moved.
pub fn integrate_velocities(
    velocities: &ComponentStore<Velocity>,
    transforms: &mut TransformComponent,
    dt: f32,
) -> Result<usize> {
    let mut moved = 0;
    for handle in velocities.handles() {
        let Some(velocity) = velocities.try_get(handle) else {
            continue;
        };
        let step = velocity.displacement(dt);
        if step == Vec2::ZERO {
            continue;
        }
        transforms.multiply_transform(handle, Mat4::from_translation(step.extend(0.0)), Space::World)?;
        moved += 1;
    }
    log::trace!("integrated {moved} velocities over {dt}s");
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::EntityHandle;
    use crate::math::Vec3;

    fn translation(transforms: &TransformComponent, entity: EntityHandle) -> Vec3 {
        transforms.world_transform(entity).w_axis.truncate()
    }

    #[test]
    fn moves_roots_by_velocity_times_dt() {
        let (a, b, still) = (
            EntityHandle::from_raw(1),
            EntityHandle::from_raw(2),
            EntityHandle::from_raw(3),
        );
        let mut velocities = ComponentStore::new();
        velocities.create(a, Velocity::new(2.0, 0.0)).unwrap();
        velocities.create(b, Velocity::new(0.0, -4.0)).unwrap();
        velocities.create(still, Velocity::ZERO).unwrap();
        let mut transforms = TransformComponent::new();

        let moved = integrate_velocities(&velocities, &mut transforms, 0.5).unwrap();
        assert_eq!(moved, 2);
        assert_eq!(translation(&transforms, a), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(translation(&transforms, b), Vec3::new(0.0, -2.0, 0.0));
        assert!(!transforms.has_instance(still));
    }

    #[test]
    fn children_move_in_world_space() {
        let (parent, child) = (EntityHandle::from_raw(1), EntityHandle::from_raw(2));
        let mut transforms = TransformComponent::new();
        transforms
            .set_local_transform(parent, Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0)))
            .unwrap();
        transforms.set_parent(child, parent).unwrap();

        let mut velocities = ComponentStore::new();
        velocities.create(child, Velocity::new(4.0, 0.0)).unwrap();
        integrate_velocities(&velocities, &mut transforms, 1.0).unwrap();

        // Four world units, which is two units in the scaled parent's frame.
        assert_eq!(translation(&transforms, child), Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(
            transforms.local_transform(child).w_axis.truncate(),
            Vec3::new(2.0, 0.0, 0.0)
        );
    }

    #[test]
    fn moving_a_parent_carries_its_children() {
        let (parent, child) = (EntityHandle::from_raw(1), EntityHandle::from_raw(2));
        let mut transforms = TransformComponent::new();
        transforms
            .set_local_transform(child, Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)))
            .unwrap();
        transforms.set_parent(child, parent).unwrap();

        let mut velocities = ComponentStore::new();
        velocities.create(parent, Velocity::new(3.0, 0.0)).unwrap();
        integrate_velocities(&velocities, &mut transforms, 1.0).unwrap();

        assert_eq!(translation(&transforms, child), Vec3::new(3.0, 1.0, 0.0));
    }
}
