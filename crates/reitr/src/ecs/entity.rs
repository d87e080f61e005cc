//! # Entity: Handles and Registration
//!
//! An [`EntityHandle`] is just a number. Components are keyed by it, and the
//! [`EntityManager`] maps it back to the game object that owns it.
//!
//! ## Design: Monotonic Handles
//!
//! Handles come from a counter that starts at 1 and never goes backwards, so a
//! handle is never handed out twice. A stale handle kept around after its
//! entity was unregistered simply stops resolving:
//!
//! ```text
//! register(a)   -> 1
//! register(b)   -> 2
//! unregister(1)
//! register(c)   -> 3      ← not 1
//! exists(1)     -> false
//! ```
//!
//! `0` is reserved as [`EntityHandle::NONE`]: the value an entity carries while
//! it is not registered.
//!
//! ## Ownership
//!
//! The manager never owns entities. Game objects live wherever the caller keeps
//! them (usually behind an `Rc`), and the manager holds a `Weak` so that lookups
//! fail cleanly once an object is dropped.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Opaque identifier for a registered entity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityHandle(u32);

impl EntityHandle {
    /// The "no entity" sentinel.
    pub const NONE: Self = Self(0);

    /// Wrap a raw value, e.g. one passed back from a script.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "EntityHandle(NONE)")
        } else {
            write!(f, "EntityHandle({})", self.0)
        }
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The handle an entity carries for itself.
///
/// Starts out as [`EntityHandle::NONE`]. Only the [`EntityManager`] writes to it.
#[derive(Debug, Default)]
pub struct HandleSlot(Cell<EntityHandle>);

impl HandleSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> EntityHandle {
        self.0.get()
    }

    fn set(&self, handle: EntityHandle) {
        self.0.set(handle);
    }
}

/// A game object that can be registered with an [`EntityManager`].
pub trait Entity {
    /// Storage for this object's own handle.
    fn handle_slot(&self) -> &HandleSlot;

    /// The handle this object is registered under, or [`EntityHandle::NONE`].
    fn handle(&self) -> EntityHandle {
        self.handle_slot().get()
    }
}

/// Allocates handles and maps them back to their entities.
///
/// ## Memory Layout
///
/// ```text
/// entries:     {1: Weak<E>, 3: Weak<E>}   ← registered, not yet unregistered
/// next_handle: 4                          ← next handle to hand out
/// ```
pub struct EntityManager<E: Entity> {
    entries: HashMap<EntityHandle, Weak<E>>,
    next_handle: u32,
}

impl<E: Entity> EntityManager<E> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a manager with room for `capacity` entities before rehashing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            next_handle: 1,
        }
    }

    /// Assign the next handle to `entity` and record it.
    ///
    /// Fails with [`Error::DoubleRegistration`] if the entity already carries a
    /// handle, and with [`Error::HandlesExhausted`] once `u32::MAX - 1`
    /// handles have been handed out. Nothing is changed in either case.
    pub fn register(&mut self, entity: &Rc<E>) -> Result<EntityHandle> {
        let current = entity.handle();
        if !current.is_none() {
            return Err(Error::DoubleRegistration(current));
        }

        let handle = EntityHandle(self.next_handle);
        self.next_handle = self
            .next_handle
            .checked_add(1)
            .ok_or(Error::HandlesExhausted)?;
        self.entries.insert(handle, Rc::downgrade(entity));
        entity.handle_slot().set(handle);
        log::debug!("registered entity {handle}");
        Ok(handle)
    }

    /// Resolve a handle to its entity.
    ///
    /// Fails with [`Error::NotFound`] if the handle was never registered, has
    /// been unregistered, or its entity has been dropped.
    pub fn lookup(&self, handle: EntityHandle) -> Result<Rc<E>> {
        self.entries
            .get(&handle)
            .and_then(Weak::upgrade)
            .ok_or(Error::NotFound(handle))
    }

    /// Check whether `handle` still resolves to a live entity.
    pub fn exists(&self, handle: EntityHandle) -> bool {
        self.entries
            .get(&handle)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Forget `handle` and reset the entity's stored handle to the sentinel.
    ///
    /// Returns `false` if the handle was not registered.
    pub fn unregister(&mut self, handle: EntityHandle) -> bool {
        let Some(weak) = self.entries.remove(&handle) else {
            return false;
        };
        if let Some(entity) = weak.upgrade() {
            entity.handle_slot().set(EntityHandle::NONE);
        }
        log::debug!("unregistered entity {handle}");
        true
    }

    /// Drop mappings whose entity was dropped without being unregistered.
    /// Returns how many were removed.
    pub fn prune_dropped(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, weak| weak.strong_count() > 0);
        let pruned = before - self.entries.len();
        if pruned > 0 {
            log::debug!("pruned {pruned} dropped entities");
        }
        pruned
    }

    /// Snapshot of every registered handle, ascending.
    pub fn handles(&self) -> Vec<EntityHandle> {
        let mut handles: Vec<_> = self.entries.keys().copied().collect();
        handles.sort_unstable();
        handles
    }

    /// Number of registered handles (including any whose entity was dropped).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of handles ever handed out.
    #[cfg(any(feature = "diagnostics", test))]
    pub fn total_allocated(&self) -> u32 {
        self.next_handle - 1
    }
}

impl<E: Entity> Default for EntityManager<E> {
    fn default() -> Self {
        Self::new()
    }
}
