//! Generic memoization primitive
//!
//! Every cache tier in the engine is a `MemoCache`: a map from content
//! fingerprint to result. Explicit removal is the only eviction; nothing
//! expires on its own. Callers insert only successful results, so a failed
//! computation is never frozen.

use crate::fingerprint::Fingerprint;
use std::collections::HashMap;

/// Content-keyed memoization store
#[derive(Debug)]
pub struct MemoCache<V> {
    entries: HashMap<Fingerprint, V>,
}

impl<V> MemoCache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &Fingerprint) -> Option<&V> {
        self.entries.get(key)
    }

    /// Store a result, returning the previous entry if one existed
    pub fn insert(&mut self, key: Fingerprint, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    /// Explicitly drop one entry
    pub fn remove(&mut self, key: &Fingerprint) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
