//! # Scene: One Place to Spawn and Despawn
//!
//! The ECS pieces do not know about each other: unregistering a handle leaves
//! its component entries behind. [`Scene`] bundles the manager with the stores
//! this crate ships, so despawning cleans up every one of them.
//!
//! Fields are public so systems can borrow stores side by side:
//!
//! ```ignore
//! let mut scene: Scene<Actor> = Scene::new(&CoreConfig::default());
//! let player = scene.spawn(&actor)?;
//! scene.velocities.create(player, Velocity::new(2.0, 0.0))?;
//! integrate_velocities(&scene.velocities, &mut scene.transforms, dt)?;
//! ```
//!
//! Games with extra component kinds keep their own stores next to the scene
//! and remove from them alongside [`Scene::despawn`].

use std::rc::Rc;

use crate::collider::{CompositeCollider, world_collider};
use crate::config::CoreConfig;
use crate::ecs::{ComponentStore, Entity, EntityHandle, EntityManager, TransformComponent};
use crate::error::Result;
use crate::motion::{Velocity, integrate_velocities};

pub struct Scene<E: Entity> {
    pub entities: EntityManager<E>,
    pub transforms: TransformComponent,
    pub colliders: ComponentStore<CompositeCollider>,
    pub velocities: ComponentStore<Velocity>,
}

impl<E: Entity> Scene<E> {
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            entities: EntityManager::with_capacity(config.entity_capacity),
            transforms: TransformComponent::with_config(config),
            colliders: ComponentStore::with_capacity(config.component_capacity),
            velocities: ComponentStore::with_capacity(config.component_capacity),
        }
    }

    /// Register `entity` and return its new handle.
    pub fn spawn(&mut self, entity: &Rc<E>) -> Result<EntityHandle> {
        self.entities.register(entity)
    }

    /// Remove every component of `handle`, then unregister it.
    ///
    /// Children of a despawned entity stay alive as roots. Returns whether the
    /// handle was registered.
    pub fn despawn(&mut self, handle: EntityHandle) -> Result<bool> {
        self.transforms.remove(handle)?;
        self.colliders.remove(handle);
        self.velocities.remove(handle);
        Ok(self.entities.unregister(handle))
    }

    /// Despawn `handle` and everything below it in the transform hierarchy.
    ///
    /// Deepest entities go first, so no child is re-rooted on the way.
    /// Returns how many registered entities were despawned.
    pub fn despawn_recursive(&mut self, handle: EntityHandle) -> Result<usize> {
        let mut doomed = vec![handle];
        let mut next = 0;
        while next < doomed.len() {
            let children = self.transforms.children(doomed[next])?;
            doomed.extend(children);
            next += 1;
        }

        let mut despawned = 0;
        for entity in doomed.into_iter().rev() {
            if self.despawn(entity)? {
                despawned += 1;
            }
        }
        Ok(despawned)
    }

    /// Move everything with a velocity by `velocity * dt`.
    pub fn step(&mut self, dt: f32) -> Result<usize> {
        integrate_velocities(&self.velocities, &mut self.transforms, dt)
    }

    /// World-space collider of `handle`, if it has one.
    pub fn world_collider(&self, handle: EntityHandle) -> Option<CompositeCollider> {
        world_collider(&self.transforms, &self.colliders, handle)
    }
}

impl<E: Entity> Default for Scene<E> {
    fn default() -> Self {
        Self::new(&CoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::HandleSlot;
    use crate::error::ErrorKind;
    use crate::math::{BoundingBox, Mat4, Vec3};

    #[derive(Debug, Default)]
    struct Actor {
        slot: HandleSlot,
    }

    impl Entity for Actor {
        fn handle_slot(&self) -> &HandleSlot {
            &self.slot
        }
    }

    fn spawn(scene: &mut Scene<Actor>) -> (Rc<Actor>, EntityHandle) {
        let actor = Rc::new(Actor::default());
        let handle = scene.spawn(&actor).unwrap();
        (actor, handle)
    }

    #[test]
    fn despawn_clears_every_store() {
        let mut scene = Scene::default();
        let (actor, handle) = spawn(&mut scene);
        scene
            .transforms
            .set_local_transform(handle, Mat4::from_translation(Vec3::X))
            .unwrap();
        scene
            .colliders
            .create(handle, CompositeCollider::from_rects([BoundingBox::new(0.0, 0.0, 1.0, 1.0)]))
            .unwrap();
        scene.velocities.create(handle, Velocity::new(1.0, 0.0)).unwrap();

        assert!(scene.despawn(handle).unwrap());
        assert!(!scene.transforms.has_instance(handle));
        assert!(!scene.colliders.has(handle));
        assert!(!scene.velocities.has(handle));
        assert!(actor.handle().is_none());
        assert_eq!(scene.entities.lookup(handle).unwrap_err().kind(), ErrorKind::NotFound);

        assert!(!scene.despawn(handle).unwrap());
    }

    #[test]
    fn despawn_keeps_children_as_roots() {
        let mut scene = Scene::default();
        let (_parent_actor, parent) = spawn(&mut scene);
        let (_child_actor, child) = spawn(&mut scene);
        scene
            .transforms
            .set_local_transform(parent, Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)))
            .unwrap();
        scene.transforms.set_parent(child, parent).unwrap();

        scene.despawn(parent).unwrap();
        assert!(scene.entities.exists(child));
        assert_eq!(scene.transforms.parent(child), None);
        assert_eq!(scene.transforms.world_transform(child), Mat4::IDENTITY);
    }

    #[test]
    fn despawn_recursive_takes_the_subtree() {
        let mut scene = Scene::default();
        let (_a, root) = spawn(&mut scene);
        let (_b, arm) = spawn(&mut scene);
        let (_c, hand) = spawn(&mut scene);
        let (_d, bystander) = spawn(&mut scene);
        scene.transforms.set_parent(arm, root).unwrap();
        scene.transforms.set_parent(hand, arm).unwrap();
        scene.transforms.set_parent(bystander, EntityHandle::NONE).unwrap();

        assert_eq!(scene.despawn_recursive(root).unwrap(), 3);
        for handle in [root, arm, hand] {
            assert!(!scene.entities.exists(handle));
            assert!(!scene.transforms.has_instance(handle));
        }
        assert!(scene.entities.exists(bystander));
        assert_eq!(scene.transforms.len(), 1);
    }

    #[test]
    fn step_and_world_collider() {
        let mut scene = Scene::default();
        let (_actor, handle) = spawn(&mut scene);
        scene
            .colliders
            .create(handle, CompositeCollider::from_rects([BoundingBox::new(0.0, 0.0, 1.0, 1.0)]))
            .unwrap();
        scene.velocities.create(handle, Velocity::new(0.0, 10.0)).unwrap();

        assert_eq!(scene.step(0.25).unwrap(), 1);
        let collider = scene.world_collider(handle).unwrap();
        assert_eq!(collider.rects(), &[BoundingBox::new(0.0, 2.5, 1.0, 1.0)]);
    }

    #[test]
    fn depth_limit_comes_from_config() {
        let config = CoreConfig {
            max_depth: 1,
            ..CoreConfig::default()
        };
        let mut scene: Scene<Actor> = Scene::new(&config);
        let (_a, a) = spawn(&mut scene);
        let (_b, b) = spawn(&mut scene);
        let (_c, c) = spawn(&mut scene);
        scene.transforms.set_parent(b, a).unwrap();
        let err = scene.transforms.set_parent(c, b).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(scene.transforms.parent(c).is_none());

        scene
            .transforms
            .set_local_transform(a, Mat4::from_translation(Vec3::X))
            .unwrap();
        assert_eq!(scene.transforms.world_transform(b), Mat4::from_translation(Vec3::X));
    }
}
