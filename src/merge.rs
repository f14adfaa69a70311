//! Candidate merging.
//!
//! Every lookup key returns its own slice of the catalog and the slices
//! overlap heavily. Merging collapses them into one set keyed by entry id,
//! keeping the first copy seen and remembering arrival order.

use std::collections::{HashMap, HashSet};

use crate::catalog::{CatalogEntry, EntryId};

/// Deduplicated candidates in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    entries: Vec<CatalogEntry>,
    positions: HashMap<EntryId, usize>,
}

impl CandidateSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry` unless an entry with the same id is already present.
    ///
    /// Returns true if the entry was new.
    pub fn insert(&mut self, entry: CatalogEntry) -> bool {
        if self.positions.contains_key(&entry.id) {
            return false;
        }
        self.positions.insert(entry.id.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Adds every entry of one lookup result.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = CatalogEntry>) {
        for entry in entries {
            self.insert(entry);
        }
    }

    /// Returns the position at which `id` was first seen.
    #[must_use]
    pub fn position(&self, id: &EntryId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Number of distinct candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no candidate was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Candidates in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Drops excluded entries, keeping the relative order of the rest.
    pub fn retain_not_excluded(&mut self, excluded: &HashSet<EntryId>) {
        if excluded.is_empty() {
            return;
        }
        self.entries.retain(|e| !excluded.contains(&e.id));
        self.reindex();
    }

    /// Keeps only the first `max` candidates.
    pub fn truncate(&mut self, max: usize) {
        if self.entries.len() > max {
            self.entries.truncate(max);
            self.reindex();
        }
    }

    fn reindex(&mut self) {
        self.positions = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
    }
}

/// Merges per-key results, in key order, into one candidate set.
#[must_use]
pub fn merge_results(results: impl IntoIterator<Item = Vec<CatalogEntry>>) -> CandidateSet {
    let mut set = CandidateSet::new();
    for batch in results {
        set.extend(batch);
    }
    set
}
