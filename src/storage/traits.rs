//! Abstract store adapter contract.
//!
//! The catalog lives in an external document store. The resolver only needs
//! two read-only primitives over a sorted index per field:
//! - equality lookups
//! - prefix-range lookups (`[prefix, prefix + PREFIX_SENTINEL)`)
//!
//! Both must be independent and free of side effects, since the resolver
//! issues every planned lookup concurrently.

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::{CatalogEntry, EntryId, Field};
use crate::plan::{LookupKey, QueryKind};

/// Upper sentinel appended to a prefix to bound a lexicographic range scan.
///
/// A private-use code point that sorts after every character catalog text
/// realistically contains.
pub const PREFIX_SENTINEL: char = '\u{f8ff}';

/// Exclusive upper bound of the range covering every value that starts with `prefix`.
///
/// ```
/// use catalog_resolve::storage::prefix_upper_bound;
///
/// assert_eq!(prefix_upper_bound("GMC"), "GMC\u{f8ff}");
/// ```
#[must_use]
pub fn prefix_upper_bound(prefix: &str) -> String {
    let mut bound = String::with_capacity(prefix.len() + PREFIX_SENTINEL.len_utf8());
    bound.push_str(prefix);
    bound.push(PREFIX_SENTINEL);
    bound
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entry not found.
    #[error("Catalog entry not found: {0}")]
    EntryNotFound(EntryId),

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Connection failed.
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl StorageError {
    /// Returns true for failures a retry may clear (network, connection).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionError(_))
    }
}

/// Read-only access to the persisted catalog.
///
/// Implementations should handle concurrent calls safely; the resolver never
/// serializes them.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All entries whose `field` value equals `value`.
    async fn equality_query(
        &self,
        field: Field,
        value: &str,
    ) -> Result<Vec<CatalogEntry>, StorageError>;

    /// All entries whose `field` value starts with `prefix`.
    async fn prefix_range_query(
        &self,
        field: Field,
        prefix: &str,
    ) -> Result<Vec<CatalogEntry>, StorageError>;

    /// Runs one planned lookup key.
    async fn execute(&self, key: &LookupKey) -> Result<Vec<CatalogEntry>, StorageError> {
        match key.kind {
            QueryKind::Equality => self.equality_query(key.field, &key.value).await,
            QueryKind::PrefixRange => self.prefix_range_query(key.field, &key.value).await,
        }
    }
}

#[async_trait]
impl<S: CatalogStore + ?Sized> CatalogStore for std::sync::Arc<S> {
    async fn equality_query(
        &self,
        field: Field,
        value: &str,
    ) -> Result<Vec<CatalogEntry>, StorageError> {
        (**self).equality_query(field, value).await
    }

    async fn prefix_range_query(
        &self,
        field: Field,
        prefix: &str,
    ) -> Result<Vec<CatalogEntry>, StorageError> {
        (**self).prefix_range_query(field, prefix).await
    }
}
