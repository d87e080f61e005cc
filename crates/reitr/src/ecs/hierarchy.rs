//! # Entity Hierarchies: Parent/Child Links and Transform Propagation
//!
//! [`TransformComponent`] stores one [`TransformInstance`] per entity and keeps
//! every `world` matrix equal to `parent_world * local`.
//!
//! ## Links
//!
//! Instances refer to each other by [`EntityHandle`], never by reference, so
//! the store is free to move rows around. Each instance links to its parent,
//! its first child and its next sibling. A link that points back at the
//! instance itself means "none":
//!
//! ```text
//!   A.first_child ─► C ─next_sibling─► B ─next_sibling─► B   (end)
//!   B.parent = A, C.parent = A, A.parent = A                 (A is a root)
//! ```
//!
//! New children are spliced in at the head of the chain.
//!
//! ## Propagation
//!
//! Changing a local matrix, or reparenting, recomputes the entity and its whole
//! subtree. Traversal uses an explicit stack and runs in two phases: compute
//! every new world matrix, then commit them. A malformed hierarchy (a link to a
//! handle with no instance, a node reached twice, or nesting deeper than
//! [`CoreConfig::max_depth`]) aborts before anything is written.
//!
//! ## Usage
//!
//! ```ignore
//! let mut transforms = TransformComponent::new();
//! transforms.set_local_transform(ship, Transform::from_xy(10.0, 0.0).matrix())?;
//! transforms.set_parent(turret, ship)?;
//! transforms.multiply_transform(ship, Mat4::from_translation(Vec3::X), Space::World)?;
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::component::ComponentStore;
use super::entity::EntityHandle;
use crate::config::CoreConfig;
use crate::error::{Error, Result};
use crate::math::Mat4;

/// Per-entity transform state and hierarchy links.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformInstance {
    /// Transform relative to the parent.
    pub local: Mat4,
    /// Transform relative to the root, `parent_world * local`.
    pub world: Mat4,
    /// The entity this instance belongs to.
    pub this: EntityHandle,
    pub parent: EntityHandle,
    pub first_child: EntityHandle,
    pub next_sibling: EntityHandle,
}

impl TransformInstance {
    /// A root with no children and identity transforms.
    pub fn new(entity: EntityHandle) -> Self {
        Self {
            local: Mat4::IDENTITY,
            world: Mat4::IDENTITY,
            this: entity,
            parent: entity,
            first_child: entity,
            next_sibling: entity,
        }
    }

    pub fn has_parent(&self) -> bool {
        self.parent != self.this
    }

    pub fn has_children(&self) -> bool {
        self.first_child != self.this
    }
}

/// Frame in which [`TransformComponent::multiply_transform`] applies a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Space {
    /// Post-multiply in the entity's own frame: `local = local * m`.
    Local,
    /// Treat `m` as a world-space delta: `local = inverse(parent_world) * m * local`.
    World,
}

impl TryFrom<u32> for Space {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self> {
        match raw {
            0 => Ok(Space::Local),
            1 => Ok(Space::World),
            other => Err(Error::InvalidSpace(other)),
        }
    }
}

impl FromStr for Space {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "self" | "local" => Ok(Space::Local),
            "world" => Ok(Space::World),
            _ => Err(Error::UnknownSpace(s.to_owned())),
        }
    }
}

/// Emitted for every entity whose world transform was recomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformUpdateEvent {
    pub entity: EntityHandle,
    pub world: Mat4,
}

/// Identifies a registered observer, for [`TransformComponent::remove_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&TransformUpdateEvent)>;

/// New world matrices for a subtree, in pre-order, and its height.
struct Subtree {
    worlds: Vec<(EntityHandle, Mat4)>,
    height: usize,
}

/// Transform store plus parent/child hierarchy.
///
/// Instances are created on first write. Reads of entities without an
/// instance return the identity matrix.
pub struct TransformComponent {
    store: ComponentStore<TransformInstance>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
    max_depth: usize,
    #[cfg(feature = "diagnostics")]
    propagations: u64,
}

impl TransformComponent {
    pub fn new() -> Self {
        Self::with_config(&CoreConfig::default())
    }

    pub fn with_config(config: &CoreConfig) -> Self {
        Self {
            store: ComponentStore::with_capacity(config.component_capacity),
            observers: Vec::new(),
            next_observer: 0,
            max_depth: config.max_depth,
            #[cfg(feature = "diagnostics")]
            propagations: 0,
        }
    }

    // ── Observers ────────────────────────────────────────────────────

    /// Register a callback for [`TransformUpdateEvent`]s.
    ///
    /// Callbacks run synchronously at the end of each mutating call, once per
    /// recomputed entity, ancestors first.
    pub fn add_observer(&mut self, observer: impl FnMut(&TransformUpdateEvent) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(other, _)| *other != id);
        self.observers.len() != before
    }

    fn notify(&mut self, events: &[TransformUpdateEvent]) {
        for event in events {
            for (_, observer) in &mut self.observers {
                observer(event);
            }
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// World transform of `entity`, or identity if it has no instance.
    pub fn world_transform(&self, entity: EntityHandle) -> Mat4 {
        self.store
            .try_get(entity)
            .map_or(Mat4::IDENTITY, |instance| instance.world)
    }

    /// Local transform of `entity`, or identity if it has no instance.
    pub fn local_transform(&self, entity: EntityHandle) -> Mat4 {
        self.store
            .try_get(entity)
            .map_or(Mat4::IDENTITY, |instance| instance.local)
    }

    pub fn instance(&self, entity: EntityHandle) -> Option<&TransformInstance> {
        self.store.try_get(entity)
    }

    pub fn has_instance(&self, entity: EntityHandle) -> bool {
        self.store.has(entity)
    }

    pub fn parent(&self, entity: EntityHandle) -> Option<EntityHandle> {
        self.store
            .try_get(entity)
            .filter(|instance| instance.has_parent())
            .map(|instance| instance.parent)
    }

    /// Children of `entity`, in chain order (most recently attached first).
    pub fn children(&self, entity: EntityHandle) -> Result<Vec<EntityHandle>> {
        if !self.store.has(entity) {
            return Ok(Vec::new());
        }
        self.chain(entity)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Number of propagations committed so far.
    #[cfg(feature = "diagnostics")]
    pub fn propagation_count(&self) -> u64 {
        self.propagations
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Attach `child` under `parent` and recompute the child's subtree.
    ///
    /// `child` is removed from its previous parent's chain first. Passing
    /// [`EntityHandle::NONE`] as `parent` turns `child` into a root.
    ///
    /// The child's subtree is recomputed and checked against
    /// [`CoreConfig::max_depth`] before any link changes, so a failed call
    /// leaves the hierarchy as it was.
    pub fn set_parent(&mut self, child: EntityHandle, parent: EntityHandle) -> Result<()> {
        if child.is_none() {
            return Err(Error::SentinelHandle);
        }

        let (parent_world, child_depth) = if parent.is_none() {
            (Mat4::IDENTITY, 0)
        } else {
            let parent_depth = self.depth_below(child, parent)?;
            (self.world_transform(parent), parent_depth + 1)
        };

        let local = self.local_transform(child);
        let subtree = self.compute_logged(child, local, parent_world)?;
        if child_depth + subtree.height > self.max_depth {
            return Err(Error::NestingTooDeep {
                child,
                parent,
                max_depth: self.max_depth,
            });
        }

        self.ensure_instance(child)?;
        self.detach(child)?;
        if !parent.is_none() {
            self.ensure_instance(parent)?;
            self.attach(child, parent)?;
        }
        self.commit(child, local, subtree.worlds)
    }

    /// Replace the local transform of `entity` and recompute its subtree.
    pub fn set_local_transform(&mut self, entity: EntityHandle, transform: Mat4) -> Result<Mat4> {
        self.ensure_instance(entity)?;
        let parent_world = self.parent_world(entity)?;
        self.update(entity, transform, parent_world)?;
        Ok(transform)
    }

    /// Compose `transform` into the local transform of `entity`.
    ///
    /// See [`Space`] for how the two frames differ. Returns the new local transform.
    pub fn multiply_transform(
        &mut self,
        entity: EntityHandle,
        transform: Mat4,
        space: Space,
    ) -> Result<Mat4> {
        self.ensure_instance(entity)?;
        let parent_world = self.parent_world(entity)?;
        let local = self.store.get(entity)?.local;

        let local = match space {
            Space::Local => local * transform,
            Space::World => {
                let determinant = parent_world.determinant();
                if determinant == 0.0 || !determinant.is_finite() {
                    return Err(Error::SingularParent(entity));
                }
                parent_world.inverse() * transform * local
            }
        };

        self.update(entity, local, parent_world)?;
        Ok(local)
    }

    /// Recompute every root and its subtree.
    pub fn propagate_all(&mut self) -> Result<()> {
        let roots: Vec<_> = self
            .store
            .iter()
            .filter(|(_, instance)| !instance.has_parent())
            .map(|(handle, instance)| (handle, instance.local))
            .collect();

        for (root, local) in roots {
            self.update(root, local, Mat4::IDENTITY)?;
        }
        Ok(())
    }

    /// Remove the instance of `entity`.
    ///
    /// The entity is unlinked from its parent, and its children become roots
    /// whose world transforms are recomputed from their local transforms.
    pub fn remove(&mut self, entity: EntityHandle) -> Result<Option<TransformInstance>> {
        if !self.store.has(entity) {
            return Ok(None);
        }
        self.detach(entity)?;

        let children = self.chain(entity)?;
        for &child in &children {
            let instance = self.store.get_mut(child)?;
            instance.parent = child;
            instance.next_sibling = child;
        }
        let removed = self.store.remove(entity);

        for child in children {
            let local = self.store.get(child)?.local;
            self.update(child, local, Mat4::IDENTITY)?;
        }
        Ok(removed)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn ensure_instance(&mut self, entity: EntityHandle) -> Result<()> {
        self.store
            .get_or_insert_with(entity, || TransformInstance::new(entity))
            .map(|_| ())
    }

    fn parent_world(&self, entity: EntityHandle) -> Result<Mat4> {
        let instance = self.store.get(entity)?;
        if !instance.has_parent() {
            return Ok(Mat4::IDENTITY);
        }
        self.store
            .get(instance.parent)
            .map(|parent| parent.world)
            .map_err(|_| Error::DanglingLink {
                from: entity,
                to: instance.parent,
            })
    }

    /// Number of ancestors above `parent`.
    ///
    /// Fails if `parent` is `child` or sits somewhere below it.
    fn depth_below(&self, child: EntityHandle, parent: EntityHandle) -> Result<usize> {
        if child == parent {
            return Err(Error::ParentCycle { child, parent });
        }

        let mut current = parent;
        let mut steps = 0;
        while let Some(instance) = self.store.try_get(current) {
            if !instance.has_parent() {
                break;
            }
            if instance.parent == child {
                return Err(Error::ParentCycle { child, parent });
            }
            if !self.store.has(instance.parent) {
                return Err(Error::DanglingLink {
                    from: current,
                    to: instance.parent,
                });
            }
            steps += 1;
            if steps > self.store.len() {
                return Err(Error::HierarchyCycle {
                    root: parent,
                    entity: current,
                });
            }
            current = instance.parent;
        }
        Ok(steps)
    }

    /// Walk the sibling chain starting at `parent.first_child`.
    ///
    /// The chain ends at a child whose `next_sibling` is itself, or when it
    /// comes back around to the first child.
    fn chain(&self, parent: EntityHandle) -> Result<Vec<EntityHandle>> {
        let instance = self.store.get(parent)?;
        if !instance.has_children() {
            return Ok(Vec::new());
        }

        let first = instance.first_child;
        let mut from = parent;
        let mut current = first;
        let mut seen = HashSet::new();
        let mut children = Vec::new();
        loop {
            let child = self.store.get(current).map_err(|_| Error::DanglingLink {
                from,
                to: current,
            })?;
            if !seen.insert(current) {
                return Err(Error::HierarchyCycle {
                    root: parent,
                    entity: current,
                });
            }
            children.push(current);

            if child.next_sibling == current || child.next_sibling == first {
                return Ok(children);
            }
            from = current;
            current = child.next_sibling;
        }
    }

    /// Unlink `child` from its parent's chain, leaving it a root.
    fn detach(&mut self, child: EntityHandle) -> Result<()> {
        let instance = *self.store.get(child)?;
        if !instance.has_parent() {
            return Ok(());
        }

        let old_parent = instance.parent;
        let next = (instance.next_sibling != child).then_some(instance.next_sibling);
        let parent_instance = *self.store.get(old_parent).map_err(|_| Error::DanglingLink {
            from: child,
            to: old_parent,
        })?;

        if parent_instance.first_child == child {
            self.store.get_mut(old_parent)?.first_child = next.unwrap_or(old_parent);
        } else {
            let siblings = self.chain(old_parent)?;
            match siblings.iter().position(|&s| s == child) {
                Some(i) if i > 0 => {
                    let prev = siblings[i - 1];
                    self.store.get_mut(prev)?.next_sibling = next.unwrap_or(prev);
                }
                _ => log::warn!("{child} names {old_parent} as parent but is not in its child list"),
            }
        }

        let instance = self.store.get_mut(child)?;
        instance.parent = child;
        instance.next_sibling = child;
        Ok(())
    }

    /// Splice a detached `child` in at the head of `parent`'s chain.
    fn attach(&mut self, child: EntityHandle, parent: EntityHandle) -> Result<()> {
        let parent_instance = self.store.get_mut(parent)?;
        let next = if parent_instance.has_children() {
            parent_instance.first_child
        } else {
            child
        };
        parent_instance.first_child = child;

        let instance = self.store.get_mut(child)?;
        instance.parent = parent;
        instance.next_sibling = next;
        Ok(())
    }

    /// Set `root`'s local transform, recompute its subtree and notify.
    fn update(&mut self, root: EntityHandle, local: Mat4, parent_world: Mat4) -> Result<()> {
        let subtree = self.compute_logged(root, local, parent_world)?;
        self.commit(root, local, subtree.worlds)
    }

    fn compute_logged(&self, root: EntityHandle, local: Mat4, parent_world: Mat4) -> Result<Subtree> {
        self.compute_subtree(root, local, parent_world)
            .inspect_err(|err| log::error!("transform propagation from {root} aborted: {err}"))
    }

    /// Write a computed subtree back and notify observers.
    fn commit(&mut self, root: EntityHandle, local: Mat4, worlds: Vec<(EntityHandle, Mat4)>) -> Result<()> {
        self.store.get_mut(root)?.local = local;
        for &(entity, world) in &worlds {
            self.store.get_mut(entity)?.world = world;
        }
        log::trace!("propagated {} transforms from {root}", worlds.len());

        #[cfg(feature = "diagnostics")]
        {
            self.propagations += 1;
        }

        let events: Vec<_> = worlds
            .into_iter()
            .map(|(entity, world)| TransformUpdateEvent { entity, world })
            .collect();
        self.notify(&events);
        Ok(())
    }

    /// Pre-order traversal of `root`'s subtree, returning every new world
    /// matrix without writing any of them.
    ///
    /// `root` may not have an instance yet, in which case it is a lone leaf.
    fn compute_subtree(&self, root: EntityHandle, root_local: Mat4, parent_world: Mat4) -> Result<Subtree> {
        let mut worlds = Vec::new();
        let mut height = 0;
        let mut visited = HashSet::new();
        let mut stack = vec![(root, parent_world, 0usize)];

        while let Some((entity, parent_world, depth)) = stack.pop() {
            if depth > self.max_depth {
                return Err(Error::DepthExceeded {
                    root,
                    depth: self.max_depth,
                });
            }
            if !visited.insert(entity) {
                return Err(Error::HierarchyCycle { root, entity });
            }

            let local = if entity == root {
                root_local
            } else {
                self.store.get(entity)?.local
            };
            let world = parent_world * local;
            worlds.push((entity, world));
            height = height.max(depth);

            // Reverse so the first child is popped first.
            for child in self.children(entity)?.into_iter().rev() {
                stack.push((child, world, depth + 1));
            }
        }
        Ok(Subtree { worlds, height })
    }
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransformComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformComponent")
            .field("instances", &self.store.len())
            .field("observers", &self.observers.len())
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::error::ErrorKind;
    use crate::math::{Transform, Vec3};

    fn h(raw: u32) -> EntityHandle {
        EntityHandle::from_raw(raw)
    }

    fn translate(x: f32, y: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(x, y, 0.0))
    }

    fn translation_of(m: Mat4) -> Vec3 {
        m.col(3).truncate()
    }

    #[test]
    fn fresh_instance_links_to_itself() {
        let instance = TransformInstance::new(h(4));
        assert_eq!(instance.parent, h(4));
        assert_eq!(instance.first_child, h(4));
        assert_eq!(instance.next_sibling, h(4));
        assert!(!instance.has_parent());
        assert!(!instance.has_children());
    }

    #[test]
    fn reads_without_instance_are_identity() {
        let transforms = TransformComponent::new();
        assert_eq!(transforms.world_transform(h(9)), Mat4::IDENTITY);
        assert_eq!(transforms.local_transform(h(9)), Mat4::IDENTITY);
        assert!(transforms.parent(h(9)).is_none());
        assert!(transforms.children(h(9)).unwrap().is_empty());
    }

    #[test]
    fn root_world_equals_local() {
        let mut transforms = TransformComponent::new();
        let m = Transform::from_xy(3.0, 4.0).with_scale(2.0).matrix();
        assert_eq!(transforms.set_local_transform(h(1), m).unwrap(), m);
        assert_eq!(transforms.world_transform(h(1)), m);
    }

    #[test]
    fn child_inherits_parent_transform() {
        let (a, b) = (h(1), h(2));
        let mut transforms = TransformComponent::new();
        transforms.set_local_transform(a, translate(10.0, 0.0)).unwrap();
        transforms.set_local_transform(b, translate(0.0, 5.0)).unwrap();
        transforms.set_parent(b, a).unwrap();

        assert_eq!(transforms.world_transform(b), translate(10.0, 5.0));
        assert_eq!(transforms.parent(b), Some(a));
        assert_eq!(transforms.children(a).unwrap(), vec![b]);
    }

    #[test]
    fn reparent_under_scaled_parent() {
        let (a, b, c) = (h(1), h(2), h(3));
        let mut transforms = TransformComponent::new();
        transforms.set_local_transform(a, translate(10.0, 0.0)).unwrap();
        transforms.set_local_transform(b, translate(0.0, 5.0)).unwrap();
        transforms.set_parent(b, a).unwrap();
        transforms
            .set_local_transform(c, Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0)))
            .unwrap();

        transforms.set_parent(b, c).unwrap();

        let world = transforms.world_transform(b);
        assert_eq!(translation_of(world), Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(world, transforms.world_transform(c) * transforms.local_transform(b));
        assert!(transforms.children(a).unwrap().is_empty());
        assert_eq!(transforms.children(c).unwrap(), vec![b]);
    }

    #[test]
    fn children_are_spliced_at_the_head() {
        let parent = h(1);
        let mut transforms = TransformComponent::new();
        for raw in 2..=4 {
            transforms.set_parent(h(raw), parent).unwrap();
        }
        assert_eq!(transforms.children(parent).unwrap(), vec![h(4), h(3), h(2)]);
    }

    #[test]
    fn detaching_a_middle_child_keeps_the_chain() {
        let parent = h(1);
        let mut transforms = TransformComponent::new();
        for raw in 2..=4 {
            transforms.set_parent(h(raw), parent).unwrap();
        }

        transforms.set_parent(h(3), EntityHandle::NONE).unwrap();
        assert_eq!(transforms.children(parent).unwrap(), vec![h(4), h(2)]);
        assert!(transforms.parent(h(3)).is_none());

        transforms.set_parent(h(2), EntityHandle::NONE).unwrap();
        assert_eq!(transforms.children(parent).unwrap(), vec![h(4)]);
    }

    #[test]
    fn moving_an_ancestor_updates_descendants_only() {
        let (root, left, right, leaf) = (h(1), h(2), h(3), h(4));
        let mut transforms = TransformComponent::new();
        transforms.set_parent(left, root).unwrap();
        transforms.set_parent(right, root).unwrap();
        transforms.set_parent(leaf, left).unwrap();
        transforms.set_local_transform(right, translate(0.0, 1.0)).unwrap();
        transforms.set_local_transform(leaf, translate(1.0, 0.0)).unwrap();

        let right_before = transforms.world_transform(right);
        transforms.set_local_transform(left, translate(5.0, 5.0)).unwrap();

        assert_eq!(transforms.world_transform(leaf), translate(6.0, 5.0));
        assert_eq!(transforms.world_transform(right), right_before);

        transforms.set_local_transform(root, translate(100.0, 0.0)).unwrap();
        assert_eq!(transforms.world_transform(leaf), translate(106.0, 5.0));
        assert_eq!(transforms.world_transform(right), translate(100.0, 1.0));
    }

    #[test]
    fn deep_hierarchy_propagation() {
        let mut transforms = TransformComponent::new();
        for raw in 1..=3 {
            transforms
                .set_local_transform(h(raw), translate(raw as f32, 0.0))
                .unwrap();
        }
        transforms.set_parent(h(2), h(1)).unwrap();
        transforms.set_parent(h(3), h(2)).unwrap();

        assert_eq!(translation_of(transforms.world_transform(h(3))).x, 6.0); // 1 + 2 + 3
    }

    #[test]
    fn multiply_in_local_space_post_multiplies() {
        let e = h(1);
        let mut transforms = TransformComponent::new();
        let scale = Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0));
        transforms.set_local_transform(e, scale).unwrap();

        let local = transforms
            .multiply_transform(e, translate(1.0, 0.0), Space::Local)
            .unwrap();
        assert_eq!(local, scale * translate(1.0, 0.0));
        assert_eq!(translation_of(transforms.world_transform(e)).x, 2.0);
    }

    #[test]
    fn multiply_in_world_space_matches_manual_conversion() {
        let (parent, child) = (h(1), h(2));
        let mut transforms = TransformComponent::new();
        transforms
            .set_local_transform(parent, Transform::from_xy(4.0, 0.0).with_scale(2.0).matrix())
            .unwrap();
        transforms.set_local_transform(child, translate(1.0, 1.0)).unwrap();
        transforms.set_parent(child, parent).unwrap();

        let parent_world = transforms.world_transform(parent);
        let old_local = transforms.local_transform(child);
        let delta = translate(3.0, 0.0);

        transforms.multiply_transform(child, delta, Space::World).unwrap();

        let expected_local = parent_world.inverse() * delta * old_local;
        let mut reference = TransformComponent::new();
        reference
            .set_local_transform(parent, Transform::from_xy(4.0, 0.0).with_scale(2.0).matrix())
            .unwrap();
        reference.set_local_transform(child, expected_local).unwrap();
        reference.set_parent(child, parent).unwrap();

        assert!(
            transforms
                .world_transform(child)
                .abs_diff_eq(reference.world_transform(child), 1e-5)
        );
    }

    #[test]
    fn space_decoding_rejects_unknown_values() {
        assert_eq!(Space::try_from(0u32).unwrap(), Space::Local);
        assert_eq!(Space::try_from(1u32).unwrap(), Space::World);
        assert_eq!(Space::try_from(2u32).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!("SELF".parse::<Space>().unwrap(), Space::Local);
        assert_eq!("world".parse::<Space>().unwrap(), Space::World);
        assert_eq!(
            "parent".parse::<Space>().unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn parenting_into_own_subtree_is_rejected() {
        let (a, b, c) = (h(1), h(2), h(3));
        let mut transforms = TransformComponent::new();
        transforms.set_parent(b, a).unwrap();
        transforms.set_parent(c, b).unwrap();

        let err = transforms.set_parent(a, c).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(transforms.parent(a).is_none());
        assert_eq!(transforms.children(c).unwrap(), Vec::<EntityHandle>::new());

        assert!(transforms.set_parent(a, a).is_err());
    }

    #[test]
    fn observers_see_ancestors_before_descendants() {
        let (root, mid, leaf) = (h(1), h(2), h(3));
        let mut transforms = TransformComponent::new();
        transforms.set_parent(mid, root).unwrap();
        transforms.set_parent(leaf, mid).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        transforms.add_observer(move |event| sink.borrow_mut().push(event.entity));

        transforms.set_local_transform(root, translate(1.0, 0.0)).unwrap();
        assert_eq!(*seen.borrow(), vec![root, mid, leaf]);

        seen.borrow_mut().clear();
        transforms.set_local_transform(leaf, translate(0.0, 1.0)).unwrap();
        assert_eq!(*seen.borrow(), vec![leaf]);
    }

    #[test]
    fn observer_events_carry_new_world() {
        let (parent, child) = (h(1), h(2));
        let mut transforms = TransformComponent::new();
        transforms.set_parent(child, parent).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = transforms.add_observer(move |event| sink.borrow_mut().push(*event));

        transforms.set_local_transform(parent, translate(2.0, 0.0)).unwrap();
        assert_eq!(seen.borrow()[1].world, transforms.world_transform(child));

        assert!(transforms.remove_observer(id));
        assert!(!transforms.remove_observer(id));
        transforms.set_local_transform(parent, translate(3.0, 0.0)).unwrap();
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn dangling_link_aborts_without_writing() {
        let (root, child) = (h(1), h(2));
        let mut transforms = TransformComponent::new();
        transforms.set_parent(child, root).unwrap();
        transforms.store.get_mut(child).unwrap().first_child = h(99);

        let before = transforms.world_transform(root);
        let err = transforms
            .set_local_transform(root, translate(5.0, 0.0))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::StructuralInconsistency);
        assert!(matches!(err, Error::DanglingLink { from, to } if from == child && to == h(99)));
        assert_eq!(transforms.world_transform(root), before);
        assert_eq!(transforms.local_transform(root), Mat4::IDENTITY);
    }

    #[test]
    fn cycle_through_first_child_is_detected() {
        let (root, child) = (h(1), h(2));
        let mut transforms = TransformComponent::new();
        transforms.set_parent(child, root).unwrap();
        transforms.store.get_mut(child).unwrap().first_child = root;

        let err = transforms
            .set_local_transform(root, translate(1.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, Error::HierarchyCycle { .. }));
        assert_eq!(transforms.world_transform(child), Mat4::IDENTITY);
    }

    fn shallow() -> TransformComponent {
        TransformComponent::with_config(&CoreConfig {
            max_depth: 2,
            ..CoreConfig::default()
        })
    }

    #[test]
    fn nesting_beyond_config_is_rejected() {
        let mut transforms = shallow();
        transforms.set_parent(h(2), h(1)).unwrap();
        transforms.set_parent(h(3), h(2)).unwrap();

        let err = transforms.set_parent(h(4), h(3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(matches!(err, Error::NestingTooDeep { max_depth: 2, .. }));
        assert!(transforms.parent(h(4)).is_none());
        assert!(transforms.children(h(3)).unwrap().is_empty());

        // The tree that was accepted can still be moved from its root.
        transforms.set_local_transform(h(1), translate(1.0, 0.0)).unwrap();
        assert_eq!(translation_of(transforms.world_transform(h(3))), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn too_deep_subtree_leaves_links_and_worlds_alone() {
        let mut transforms = shallow();
        transforms.set_local_transform(h(10), translate(1.0, 0.0)).unwrap();
        transforms.set_parent(h(11), h(10)).unwrap();
        transforms.set_parent(h(12), h(11)).unwrap();
        transforms.set_local_transform(h(20), translate(5.0, 0.0)).unwrap();
        let before = transforms.world_transform(h(12));

        let err = transforms.set_parent(h(10), h(20)).unwrap_err();
        assert!(matches!(err, Error::NestingTooDeep { child, parent, .. } if child == h(10) && parent == h(20)));
        assert!(transforms.parent(h(10)).is_none());
        assert!(transforms.children(h(20)).unwrap().is_empty());
        assert_eq!(transforms.children(h(10)).unwrap(), vec![h(11)]);
        assert_eq!(transforms.world_transform(h(10)), translate(1.0, 0.0));
        assert_eq!(transforms.world_transform(h(12)), before);
    }

    #[test]
    fn malformed_subtree_is_not_reparented() {
        let (old_parent, child, new_parent) = (h(1), h(2), h(3));
        let mut transforms = TransformComponent::new();
        transforms.set_parent(child, old_parent).unwrap();
        transforms.set_local_transform(new_parent, translate(5.0, 0.0)).unwrap();
        transforms.store.get_mut(child).unwrap().first_child = h(99);

        let err = transforms.set_parent(child, new_parent).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralInconsistency);
        assert_eq!(transforms.parent(child), Some(old_parent));
        assert_eq!(transforms.children(old_parent).unwrap(), vec![child]);
        assert!(!transforms.instance(new_parent).unwrap().has_children());
        assert_eq!(transforms.world_transform(child), Mat4::IDENTITY);
    }

    #[test]
    fn corrupted_links_past_max_depth_abort_propagation() {
        let mut transforms = shallow();
        transforms.set_parent(h(2), h(1)).unwrap();
        transforms.set_parent(h(3), h(2)).unwrap();
        transforms.set_local_transform(h(4), translate(1.0, 0.0)).unwrap();
        transforms.store.get_mut(h(3)).unwrap().first_child = h(4);
        transforms.store.get_mut(h(4)).unwrap().parent = h(3);

        let err = transforms
            .set_local_transform(h(1), translate(1.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, Error::DepthExceeded { depth: 2, .. }));
        assert_eq!(transforms.world_transform(h(1)), Mat4::IDENTITY);
    }

    #[test]
    fn world_multiply_under_singular_parent_is_rejected() {
        let (parent, child) = (h(1), h(2));
        let mut transforms = TransformComponent::new();
        transforms
            .set_local_transform(parent, Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0)))
            .unwrap();
        transforms.set_local_transform(child, translate(1.0, 2.0)).unwrap();
        transforms.set_parent(child, parent).unwrap();
        let before = transforms.world_transform(child);

        let err = transforms
            .multiply_transform(child, translate(3.0, 0.0), Space::World)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(matches!(err, Error::SingularParent(entity) if entity == child));
        assert_eq!(transforms.local_transform(child), translate(1.0, 2.0));
        assert_eq!(transforms.world_transform(child), before);
        assert!(!transforms.world_transform(child).is_nan());

        // Local space needs no inverse.
        transforms
            .multiply_transform(child, translate(3.0, 0.0), Space::Local)
            .unwrap();
    }

    #[test]
    fn removing_a_parent_reroots_its_children() {
        let (root, mid, leaf) = (h(1), h(2), h(3));
        let mut transforms = TransformComponent::new();
        transforms.set_local_transform(root, translate(10.0, 0.0)).unwrap();
        transforms.set_local_transform(leaf, translate(1.0, 0.0)).unwrap();
        transforms.set_parent(mid, root).unwrap();
        transforms.set_parent(leaf, mid).unwrap();

        let removed = transforms.remove(mid).unwrap().unwrap();
        assert_eq!(removed.this, mid);
        assert!(!transforms.has_instance(mid));
        assert!(transforms.children(root).unwrap().is_empty());
        assert!(transforms.parent(leaf).is_none());
        assert_eq!(transforms.world_transform(leaf), translate(1.0, 0.0));
        assert!(transforms.remove(mid).unwrap().is_none());
    }

    #[test]
    fn propagate_all_refreshes_every_root() {
        let mut transforms = TransformComponent::new();
        transforms.set_parent(h(2), h(1)).unwrap();
        transforms.set_local_transform(h(3), translate(1.0, 1.0)).unwrap();
        transforms.store.get_mut(h(2)).unwrap().world = Mat4::ZERO;

        transforms.propagate_all().unwrap();
        assert_eq!(transforms.world_transform(h(2)), Mat4::IDENTITY);
        assert_eq!(transforms.world_transform(h(3)), translate(1.0, 1.0));
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn aborted_propagations_are_not_counted() {
        let mut transforms = TransformComponent::new();
        transforms.set_parent(h(2), h(1)).unwrap();
        transforms.set_local_transform(h(1), translate(1.0, 0.0)).unwrap();
        assert_eq!(transforms.propagation_count(), 2);

        transforms.store.get_mut(h(2)).unwrap().first_child = h(99);
        assert!(transforms.set_local_transform(h(1), translate(2.0, 0.0)).is_err());
        assert_eq!(transforms.propagation_count(), 2);
    }

    #[test]
    fn sentinel_child_is_rejected() {
        let mut transforms = TransformComponent::new();
        let err = transforms.set_parent(EntityHandle::NONE, h(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(transforms.is_empty());
    }
}
