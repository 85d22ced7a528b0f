//! Per-object elevation and distance cache.
//!
//! DESIGN
//! ======
//! Entries are keyed by the object being edited, or by the reserved
//! `CacheKey::Drawing` while a shape is being collected. An entry is opened
//! when its object becomes selected (or drawing starts) and closed when it is
//! deselected (or drawing ends). The cache belongs to one engine instance.
//!
//! Elevations arrive asynchronously from the host. While a vertex is being
//! dragged its index is locked: it is marked stale and any sample pushed for
//! it is dropped, so labels never jump to data for the old position.

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::annotation::ObjectId;
use crate::error::SampleError;

/// Which cache entry a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKey {
    /// The shape currently being drawn.
    Drawing,
    /// A selected annotation.
    Object(ObjectId),
}

/// State of one cached sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Fresh(f64),
    /// Waiting for a sample for a new position.
    Stale,
}

/// What happened to a pushed sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    Stored,
    /// Dropped because the index is under an active drag.
    Discarded,
    /// The lookup failed; the index is left unset.
    Failed,
    /// No entry is open for the key.
    NotOpen,
}

#[derive(Debug, Default)]
struct Entry {
    elevations: BTreeMap<usize, Sample>,
    distances: Vec<f64>,
}

#[derive(Debug, Default)]
pub struct SampleCache {
    entries: HashMap<CacheKey, Entry>,
    locked: Option<(CacheKey, usize)>,
}

impl SampleCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an empty entry for `key`, replacing any previous one.
    pub fn open(&mut self, key: CacheKey) {
        self.entries.insert(key, Entry::default());
    }

    /// Drop the entry for `key`.
    pub fn close(&mut self, key: CacheKey) {
        self.entries.remove(&key);
        if self.locked.is_some_and(|(k, _)| k == key) {
            self.locked = None;
        }
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.locked = None;
    }

    #[must_use]
    pub fn is_open(&self, key: CacheKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Mark `index` as waiting for a new sample.
    pub fn mark_stale(&mut self, key: CacheKey, index: usize) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.elevations.insert(index, Sample::Stale);
        }
    }

    /// Lock `index` for the duration of a drag.
    pub fn lock(&mut self, key: CacheKey, index: usize) {
        self.mark_stale(key, index);
        self.locked = Some((key, index));
    }

    pub fn unlock(&mut self) {
        self.locked = None;
    }

    #[must_use]
    pub fn locked(&self) -> Option<(CacheKey, usize)> {
        self.locked
    }

    /// Record a sample result pushed by the host.
    pub fn apply(&mut self, key: CacheKey, index: usize, result: Result<f64, SampleError>) -> SampleOutcome {
        if self.locked == Some((key, index)) {
            tracing::debug!(?key, index, "sample for vertex under drag discarded");
            return SampleOutcome::Discarded;
        }
        let Some(entry) = self.entries.get_mut(&key) else {
            return SampleOutcome::NotOpen;
        };
        match result {
            Ok(value) => {
                entry.elevations.insert(index, Sample::Fresh(value));
                SampleOutcome::Stored
            }
            Err(e) => {
                tracing::warn!(?key, index, error = %e, "elevation sample failed");
                entry.elevations.remove(&index);
                SampleOutcome::Failed
            }
        }
    }

    /// Fresh elevation at `index`, if any.
    #[must_use]
    pub fn elevation(&self, key: CacheKey, index: usize) -> Option<f64> {
        match self.sample(key, index) {
            Some(Sample::Fresh(v)) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn sample(&self, key: CacheKey, index: usize) -> Option<Sample> {
        self.entries.get(&key)?.elevations.get(&index).copied()
    }

    /// Shift samples at or after `at` up by one to make room for an inserted vertex.
    pub fn insert_index(&mut self, key: CacheKey, at: usize) {
        let Some(entry) = self.entries.get_mut(&key) else {
            return;
        };
        let shifted: BTreeMap<usize, Sample> = std::mem::take(&mut entry.elevations)
            .into_iter()
            .map(|(i, s)| if i >= at { (i + 1, s) } else { (i, s) })
            .collect();
        entry.elevations = shifted;
    }

    pub fn set_distances(&mut self, key: CacheKey, distances: Vec<f64>) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.distances = distances;
        }
    }

    /// Per-segment distances for `key`; empty when not open.
    #[must_use]
    pub fn distances(&self, key: CacheKey) -> &[f64] {
        self.entries.get(&key).map_or(&[], |e| e.distances.as_slice())
    }
}
