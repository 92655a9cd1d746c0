//! Slot storage with stable integer handles.
//!
//! Ships and asteroids are addressed by their index in an arena. When an
//! entity dies its slot is emptied, never removed, so every other index
//! stays valid across rounds and across the wire protocol.

use serde::{Deserialize, Serialize};

/// Ordered storage of optional slots.
///
/// Serializes as a plain sequence where empty slots are `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arena<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> Arena<T> {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next inserted value will receive.
    #[must_use]
    pub fn next_index(&self) -> usize {
        self.slots.len()
    }

    /// Append a value and return its index.
    pub fn insert(&mut self, value: T) -> usize {
        let index = self.slots.len();
        self.slots.push(Some(value));
        index
    }

    /// Empty a slot, returning what was in it.
    ///
    /// The slot keeps its position; later inserts never reuse it.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Get the value at `index` if the slot exists and is occupied.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Mutable access to an occupied slot.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Whether the slot at `index` is occupied.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Total number of slots, including emptied ones.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Whether no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Iterate occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (i, v)))
    }

    /// Iterate occupied slots mutably in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|v| (i, v)))
    }

    /// Indices of occupied slots, in order.
    ///
    /// Collecting first lets callers mutate the arena while walking it.
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        self.iter().map(|(i, _)| i).collect()
    }

    /// Raw slot view, empty slots included.
    #[must_use]
    pub fn slots(&self) -> &[Option<T>] {
        &self.slots
    }
}
