//! In-memory catalog backend.
//!
//! Thread-safe reference implementation of [`CatalogStore`] with one sorted
//! index per field, so prefix-range lookups are true range scans.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::catalog::{CatalogEntry, EntryId, Field};
use crate::error::CatalogResult;
use crate::normalize::upper;
use crate::storage::traits::{prefix_upper_bound, CatalogStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

type FieldIndex = BTreeMap<String, BTreeSet<EntryId>>;

#[derive(Debug, Default)]
struct CatalogState {
    by_id: HashMap<EntryId, CatalogEntry>,
    by_name: FieldIndex,
    by_code: FieldIndex,
}

impl CatalogState {
    fn index(&self, field: Field) -> &FieldIndex {
        match field {
            Field::Name => &self.by_name,
            Field::Code => &self.by_code,
        }
    }

    fn index_entry(&mut self, entry: &CatalogEntry) {
        self.by_name
            .entry(entry.product_name.clone())
            .or_default()
            .insert(entry.id.clone());
        self.by_code
            .entry(entry.product_code.clone())
            .or_default()
            .insert(entry.id.clone());
    }

    fn unindex_entry(&mut self, entry: &CatalogEntry) {
        for (index, key) in [
            (&mut self.by_name, &entry.product_name),
            (&mut self.by_code, &entry.product_code),
        ] {
            if let Some(set) = index.get_mut(key) {
                set.remove(&entry.id);
                if set.is_empty() {
                    index.remove(key);
                }
            }
        }
    }

    fn entries_for<'a>(&self, ids: impl Iterator<Item = &'a EntryId>) -> Vec<CatalogEntry> {
        ids.filter_map(|id| self.by_id.get(id).cloned()).collect()
    }
}

fn canonicalize(mut entry: CatalogEntry) -> CatalogResult<CatalogEntry> {
    entry.product_name = upper(&entry.product_name);
    entry.product_code = upper(&entry.product_code);
    entry.validate()?;
    Ok(entry)
}

/// Thread-safe in-memory catalog.
///
/// Name and code are upper-cased and trimmed on write. Results come back in
/// index order (field value, then entry id).
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalogStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from entries, rejecting duplicate ids.
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> CatalogResult<Self> {
        let store = Self::new();
        for entry in entries {
            store.insert(entry)?;
        }
        Ok(store)
    }

    /// Builds a store from a JSON array of entries.
    pub fn load_json(json: &str) -> CatalogResult<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        Self::from_entries(entries)
    }

    /// Builds a store from a file holding a JSON array of entries.
    pub fn load_json_file(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            StorageError::BackendError(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::load_json(&json)
    }

    /// Inserts a new entry. Fails if the id already exists.
    pub fn insert(&self, entry: CatalogEntry) -> CatalogResult<()> {
        let entry = canonicalize(entry)?;
        let mut state = self.state.write().map_err(|_| lock_err("catalog.insert"))?;
        if state.by_id.contains_key(&entry.id) {
            return Err(StorageError::DuplicateKey(entry.id.to_string()).into());
        }
        state.index_entry(&entry);
        state.by_id.insert(entry.id.clone(), entry);
        Ok(())
    }

    /// Inserts or replaces an entry, reindexing changed fields.
    ///
    /// Returns the previous version if there was one.
    pub fn upsert(&self, entry: CatalogEntry) -> CatalogResult<Option<CatalogEntry>> {
        let entry = canonicalize(entry)?;
        let mut state = self.state.write().map_err(|_| lock_err("catalog.upsert"))?;
        let prev = state.by_id.remove(&entry.id);
        if let Some(prev) = prev.as_ref() {
            state.unindex_entry(prev);
        }
        state.index_entry(&entry);
        state.by_id.insert(entry.id.clone(), entry);
        Ok(prev)
    }

    /// Removes an entry by id.
    pub fn remove(&self, id: &EntryId) -> CatalogResult<CatalogEntry> {
        let mut state = self.state.write().map_err(|_| lock_err("catalog.remove"))?;
        let prev = state
            .by_id
            .remove(id)
            .ok_or_else(|| StorageError::EntryNotFound(id.clone()))?;
        state.unindex_entry(&prev);
        Ok(prev)
    }

    /// Get an entry by id.
    pub fn get(&self, id: &EntryId) -> Result<Option<CatalogEntry>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("catalog.get"))?;
        Ok(state.by_id.get(id).cloned())
    }

    /// Number of stored entries.
    pub fn len(&self) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("catalog.len"))?;
        Ok(state.by_id.len())
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn equality_query(
        &self,
        field: Field,
        value: &str,
    ) -> Result<Vec<CatalogEntry>, StorageError> {
        let key = upper(value);
        let state = self.state.read().map_err(|_| lock_err("catalog.equality_query"))?;
        let Some(ids) = state.index(field).get(&key) else {
            return Ok(Vec::new());
        };
        Ok(state.entries_for(ids.iter()))
    }

    async fn prefix_range_query(
        &self,
        field: Field,
        prefix: &str,
    ) -> Result<Vec<CatalogEntry>, StorageError> {
        let start = upper(prefix);
        if start.is_empty() {
            return Ok(Vec::new());
        }
        let end = prefix_upper_bound(&start);
        let state = self.state.read().map_err(|_| lock_err("catalog.prefix_range_query"))?;
        let ids = state
            .index(field)
            .range(start..end)
            .flat_map(|(_, ids)| ids.iter());
        Ok(state.entries_for(ids))
    }
}
