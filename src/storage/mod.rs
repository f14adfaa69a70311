//! Store adapter contract and the in-memory reference backend.
//!
//! The trait defines what the resolver needs from the external document store.
//! The in-memory backend serves tests, demos, and embedded use.

mod memory;
mod traits;

pub use memory::InMemoryCatalogStore;
pub use traits::{prefix_upper_bound, CatalogStore, StorageError, PREFIX_SENTINEL};
