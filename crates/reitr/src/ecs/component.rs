//! # Component: Typed Sparse-to-Dense Storage
//!
//! A [`ComponentStore<T>`] maps entity handles to payloads of one component
//! kind. Each kind gets its own store, looked up by static type; nothing here
//! inspects component types at runtime.
//!
//! ## Layout
//!
//! ```text
//! sparse:  {7: 0, 2: 1, 9: 2}     ← handle → dense row
//! dense:   [T(7), T(2), T(9)]     ← packed payloads, iteration order
//! owners:  [7, 2, 9]              ← handle owning each row
//! ```
//!
//! Removal swap-removes the row and patches the moved entry's `sparse` slot,
//! so every operation stays O(1) and the dense array never has holes.

use std::collections::HashMap;

use super::entity::EntityHandle;
use crate::error::{Error, Result};

/// Storage for one component kind, keyed by [`EntityHandle`].
#[derive(Debug, Clone)]
pub struct ComponentStore<T> {
    sparse: HashMap<EntityHandle, usize>,
    dense: Vec<T>,
    owners: Vec<EntityHandle>,
}

impl<T> ComponentStore<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparse: HashMap::with_capacity(capacity),
            dense: Vec::with_capacity(capacity),
            owners: Vec::with_capacity(capacity),
        }
    }

    /// Reserve room for `additional` more entries.
    pub fn reserve(&mut self, additional: usize) {
        self.sparse.reserve(additional);
        self.dense.reserve(additional);
        self.owners.reserve(additional);
    }

    /// Insert `value` for `handle`, replacing any existing payload.
    pub fn create(&mut self, handle: EntityHandle, value: T) -> Result<&mut T> {
        if handle.is_none() {
            return Err(Error::SentinelHandle);
        }
        let row = match self.sparse.get(&handle) {
            Some(&row) => {
                self.dense[row] = value;
                row
            }
            None => self.push(handle, value),
        };
        Ok(&mut self.dense[row])
    }

    /// Fetch the payload for `handle`, inserting `make()` first if absent.
    pub fn get_or_insert_with(
        &mut self,
        handle: EntityHandle,
        make: impl FnOnce() -> T,
    ) -> Result<&mut T> {
        if handle.is_none() {
            return Err(Error::SentinelHandle);
        }
        let row = match self.sparse.get(&handle) {
            Some(&row) => row,
            None => self.push(handle, make()),
        };
        Ok(&mut self.dense[row])
    }

    fn push(&mut self, handle: EntityHandle, value: T) -> usize {
        let row = self.dense.len();
        self.dense.push(value);
        self.owners.push(handle);
        self.sparse.insert(handle, row);
        row
    }

    pub fn has(&self, handle: EntityHandle) -> bool {
        self.sparse.contains_key(&handle)
    }

    /// Get the payload for `handle`, failing with [`Error::NotFound`] if absent.
    pub fn get(&self, handle: EntityHandle) -> Result<&T> {
        self.try_get(handle).ok_or(Error::NotFound(handle))
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, handle: EntityHandle) -> Result<&mut T> {
        self.try_get_mut(handle).ok_or(Error::NotFound(handle))
    }

    pub fn try_get(&self, handle: EntityHandle) -> Option<&T> {
        self.sparse.get(&handle).map(|&row| &self.dense[row])
    }

    pub fn try_get_mut(&mut self, handle: EntityHandle) -> Option<&mut T> {
        let row = *self.sparse.get(&handle)?;
        Some(&mut self.dense[row])
    }

    /// Remove and return the payload for `handle`.
    pub fn remove(&mut self, handle: EntityHandle) -> Option<T> {
        let row = self.sparse.remove(&handle)?;
        let value = self.dense.swap_remove(row);
        self.owners.swap_remove(row);

        // The last row (if any) moved into `row`.
        if let Some(&moved) = self.owners.get(row) {
            self.sparse.insert(moved, row);
        }
        Some(value)
    }

    /// Iterate over `(handle, &payload)` in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &T)> {
        self.owners.iter().copied().zip(self.dense.iter())
    }

    /// Iterate over `(handle, &mut payload)` in storage order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityHandle, &mut T)> {
        self.owners.iter().copied().zip(self.dense.iter_mut())
    }

    /// Snapshot of every handle with a payload.
    ///
    /// Iterate over the snapshot when the loop body needs to add or remove
    /// entries; handles removed along the way just fail their lookup.
    pub fn handles(&self) -> Vec<EntityHandle> {
        self.owners.clone()
    }

    /// Keep only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(EntityHandle, &mut T) -> bool) {
        let mut row = 0;
        while row < self.dense.len() {
            if keep(self.owners[row], &mut self.dense[row]) {
                row += 1;
            } else {
                // Swap-remove pulls an unvisited row into `row`; revisit it.
                let handle = self.owners[row];
                self.remove(handle);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    pub fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.owners.clear();
    }
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
