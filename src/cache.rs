//! Look-aside cache of finished height fields, keyed by terrain fingerprint.

use std::collections::VecDeque;

use crate::heightfield::HeightField;

/// Least-recently-used cache owned by a pipeline instance.
#[derive(Clone, Debug)]
pub struct HeightFieldCache {
    capacity: usize,
    /// Most recently used at the back
    entries: VecDeque<(u64, HeightField)>,
    hits: u64,
    misses: u64,
}

impl HeightFieldCache {
    /// A capacity of 0 is bumped to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Clone out the entry for `key`, marking it most recently used.
    pub fn get(&mut self, key: u64) -> Option<HeightField> {
        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(pos) => {
                self.hits += 1;
                let entry = self.entries.remove(pos)?;
                let field = entry.1.clone();
                self.entries.push_back(entry);
                Some(field)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a field, evicting the least recently used entry when full.
    pub fn insert(&mut self, key: u64, field: HeightField) {
        if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
            self.entries.remove(pos);
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, field));
    }

    pub fn contains(&self, key: u64) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for HeightFieldCache {
    fn default() -> Self {
        Self::new(4)
    }
}
