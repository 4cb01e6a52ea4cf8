//! Tombstoning element storage.
//!
//! Each element kind of a mesh lives in its own [`Arena`]. Inserting appends a
//! slot and returns its handle; removing leaves a tombstone behind. Slots are
//! never reused, so the slot index doubles as the element's monotonically
//! assigned id and a handle to a removed element can always be recognised.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use super::index::ElementId;

/// Storage for one kind of mesh element.
#[derive(Debug, Clone)]
pub struct Arena<K: ElementId, T> {
    slots: Vec<Option<T>>,
    live: usize,
    _key: PhantomData<K>,
}

impl<K: ElementId, T> Default for Arena<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ElementId, T> Arena<K, T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            _key: PhantomData,
        }
    }

    /// Create an empty arena with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            live: 0,
            _key: PhantomData,
        }
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    /// True if no element is live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// The id the next inserted element will receive.
    #[inline]
    pub fn next_id(&self) -> K {
        K::from_index(self.slots.len())
    }

    /// Insert an element and return its handle.
    pub fn insert(&mut self, value: T) -> K {
        let id = self.next_id();
        self.slots.push(Some(value));
        self.live += 1;
        id
    }

    /// Remove an element, leaving a tombstone.
    pub fn remove(&mut self, id: K) -> Option<T> {
        let removed = self.slots.get_mut(id.to_index()).and_then(Option::take);
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    /// True if `id` refers to a live element.
    #[inline]
    pub fn contains(&self, id: K) -> bool {
        self.get(id).is_some()
    }

    /// Get an element, or `None` for a stale or out of range handle.
    #[inline]
    pub fn get(&self, id: K) -> Option<&T> {
        self.slots.get(id.to_index()).and_then(Option::as_ref)
    }

    /// Get a mutable element, or `None` for a stale or out of range handle.
    #[inline]
    pub fn get_mut(&mut self, id: K) -> Option<&mut T> {
        self.slots.get_mut(id.to_index()).and_then(Option::as_mut)
    }

    /// Drop every element and restart ids from zero.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.live = 0;
    }

    /// Iterate over live handles in id order.
    pub fn ids(&self) -> impl Iterator<Item = K> + '_ {
        self.iter().map(|(id, _)| id)
    }

    /// Iterate over live elements in id order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|value| (K::from_index(i), value)))
    }

    /// Iterate mutably over live elements in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|value| (K::from_index(i), value)))
    }

    /// Iterate over live elements only.
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().filter_map(Option::as_ref)
    }
}

impl<K: ElementId, T> Index<K> for Arena<K, T> {
    type Output = T;

    fn index(&self, id: K) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("stale or out of range handle {:?}", id),
        }
    }
}

impl<K: ElementId, T> IndexMut<K> for Arena<K, T> {
    fn index_mut(&mut self, id: K) -> &mut T {
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("stale or out of range handle {:?}", id),
        }
    }
}
