//! # catalog-resolve - Product Identity Resolution
//!
//! Maps the free-text product name and product code a user typed while
//! editing an order row onto the single best-matching entry of a product
//! catalog, and returns that entry's material specifications.
//!
//! Typed codes rarely match stored codes verbatim: leading zeros come and go
//! (`4-4` vs `04-04`), a trailing variant letter is appended or dropped
//! (`04-04N`, `04-04R`), and the product name or an abbreviation of it is
//! sometimes folded into the code (`GMC-04-04N`). Resolution therefore runs
//! as a pipeline:
//!
//! - **Plan**: derive a bounded set of equality and prefix-range lookup keys
//!   from the query ([`plan`])
//! - **Fetch**: run every key concurrently against a [`CatalogStore`],
//!   absorbing per-key failures
//! - **Merge**: deduplicate candidates by entry id ([`merge`])
//! - **Score and gate**: rank candidates by name and code evidence and reject
//!   code-only coincidences ([`scoring`])
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use catalog_resolve::{InMemoryCatalogStore, Resolver};
//!
//! let store = InMemoryCatalogStore::load_json_file("catalog.json")?;
//! let resolver = Resolver::new(Arc::new(store));
//!
//! match resolver.resolve("GMC", "4-4N").await {
//!     Some(materials) if materials.is_empty() => { /* matched, no size info yet */ }
//!     Some(materials) => { /* fill in the row */ }
//!     None => { /* no match; leave the row alone */ }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Domain types
pub mod catalog;
pub mod config;
pub mod error;
pub mod normalize;

// Resolution pipeline
pub mod merge;
pub mod plan;
pub mod resolver;
pub mod scoring;
pub mod sequence;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use catalog::{CatalogEntry, EntryId, Field, MaterialSpec, MaterialType, Size};
pub use config::{ResolverConfig, TieBreak};
pub use error::{CatalogError, CatalogResult, ValidationError};
pub use merge::CandidateSet;
pub use plan::{KeyRule, LookupKey, QueryKind, ResolutionQuery};
pub use resolver::{Resolution, Resolver};
pub use scoring::{CodeMatch, GateReason, MatchScore, NameTier};
pub use sequence::{RequestTracker, Ticket};
pub use storage::{CatalogStore, InMemoryCatalogStore, StorageError};
