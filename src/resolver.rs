//! Product identity resolution.
//!
//! `plan -> concurrent lookups -> merge -> score -> gate -> pick best`.
//! The resolver holds no per-call state, so one instance can serve any number
//! of concurrent resolutions. Nothing is cached between calls.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, trace, warn, Instrument};

use crate::catalog::{CatalogEntry, EntryId, MaterialSpec};
use crate::config::ResolverConfig;
use crate::error::ValidationError;
use crate::merge::merge_results;
use crate::normalize::upper;
use crate::plan::{plan_with_rules, KeyRule, LookupKey, ResolutionQuery, DEFAULT_RULES};
use crate::scoring::{score_candidate, select_best, Candidate, MatchScore, ScoringQuery};
use crate::storage::CatalogStore;

/// The winning entry of a resolution and how it was reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    /// The selected catalog entry.
    pub entry: CatalogEntry,
    /// How it scored.
    pub score: MatchScore,
    /// Distinct candidates scored.
    pub candidates: usize,
    /// Lookup keys issued to the store.
    pub lookups: usize,
}

impl Resolution {
    /// Materials of the winning entry. Empty means "no size info yet".
    #[must_use]
    pub fn materials(&self) -> &[MaterialSpec] {
        &self.entry.materials
    }
}

/// Resolves free-text product name and code fragments to a catalog entry.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use catalog_resolve::{CatalogEntry, InMemoryCatalogStore, MaterialSpec, MaterialType, Resolver};
///
/// # futures::executor::block_on(async {
/// let store = InMemoryCatalogStore::new();
/// store
///     .insert(
///         CatalogEntry::new("GMC", "GMC-06-06R")
///             .with_material(MaterialSpec::parse(MaterialType::Hexa, "6").unwrap()),
///     )
///     .unwrap();
///
/// let resolver = Resolver::new(Arc::new(store));
/// let materials = resolver.resolve("gmc", "6-6N").await.unwrap();
/// assert_eq!(materials[0].size.to_string(), "6.00");
/// # });
/// ```
pub struct Resolver<S: ?Sized> {
    store: Arc<S>,
    config: ResolverConfig,
    rules: &'static [KeyRule],
}

impl<S: ?Sized> Clone for Resolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            rules: self.rules,
        }
    }
}

impl<S: ?Sized> std::fmt::Debug for Resolver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("rules", &self.rules.len())
            .finish_non_exhaustive()
    }
}

impl<S: CatalogStore + ?Sized> Resolver<S> {
    /// Creates a resolver with the default configuration and rule table.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: ResolverConfig::default(),
            rules: DEFAULT_RULES,
        }
    }

    /// Creates a resolver with a validated configuration.
    pub fn with_config(store: Arc<S>, config: ResolverConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            rules: DEFAULT_RULES,
        })
    }

    /// Replaces the planning rule table.
    #[must_use]
    pub fn with_rules(mut self, rules: &'static [KeyRule]) -> Self {
        self.rules = rules;
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves `product_name` / `product_code` to the best entry's materials.
    ///
    /// `None` means no match. `Some(vec![])` means the entry matched but has
    /// no recorded materials.
    pub async fn resolve(&self, product_name: &str, product_code: &str) -> Option<Vec<MaterialSpec>> {
        self.resolve_excluding(product_name, product_code, &HashSet::new())
            .await
    }

    /// Like [`Resolver::resolve`], skipping entries the caller has dismissed.
    pub async fn resolve_excluding(
        &self,
        product_name: &str,
        product_code: &str,
        excluded: &HashSet<EntryId>,
    ) -> Option<Vec<MaterialSpec>> {
        let query = ResolutionQuery::new(product_name, product_code);
        self.resolve_match(&query, excluded)
            .await
            .map(|resolution| resolution.entry.materials)
    }

    /// Resolves `query` and returns the winning entry with its score.
    pub async fn resolve_match(
        &self,
        query: &ResolutionQuery,
        excluded: &HashSet<EntryId>,
    ) -> Option<Resolution> {
        let span = info_span!(
            "catalog_resolve.resolve",
            product_name = %upper(&query.product_name),
            product_code = %upper(&query.product_code),
        );
        self.resolve_inner(query, excluded).instrument(span).await
    }

    async fn resolve_inner(
        &self,
        query: &ResolutionQuery,
        excluded: &HashSet<EntryId>,
    ) -> Option<Resolution> {
        let start = Instant::now();
        if query.is_empty() {
            debug!("empty_query");
            return None;
        }

        let keys = plan_with_rules(query, &self.config, self.rules);
        if keys.is_empty() {
            debug!("no_plausible_keys");
            return None;
        }
        debug!(lookups = keys.len(), "planned");

        let mut candidates = merge_results(self.fetch_all(&keys).await);
        candidates.retain_not_excluded(excluded);
        if let Some(max) = self.config.max_candidates {
            candidates.truncate(max);
        }
        debug!(candidates = candidates.len(), "merged");

        let scoring = ScoringQuery::new(query);
        let scored: Vec<Candidate<'_>> = candidates
            .iter()
            .enumerate()
            .map(|(position, entry)| Candidate {
                entry,
                position,
                score: score_candidate(&scoring, entry, &self.config),
            })
            .collect();

        for candidate in scored.iter().filter(|c| !c.score.is_eligible()) {
            trace!(
                entry_id = %candidate.entry.id,
                total = candidate.score.total,
                code_matched = candidate.score.code.is_match(),
                "rejected"
            );
        }

        let elapsed_micros = start.elapsed().as_micros();
        let Some(best) = select_best(&scored, self.config.tie_break) else {
            debug!(candidates = scored.len(), elapsed_micros, "no_match");
            return None;
        };

        debug!(
            entry_id = %best.entry.id,
            total = best.score.total,
            gate = ?best.score.gate,
            elapsed_micros,
            "resolved"
        );

        Some(Resolution {
            entry: best.entry.clone(),
            score: best.score,
            candidates: scored.len(),
            lookups: keys.len(),
        })
    }

    /// Runs every key concurrently and waits for all of them.
    ///
    /// A failed key yields no entries; it never cancels the others.
    async fn fetch_all(&self, keys: &[LookupKey]) -> Vec<Vec<CatalogEntry>> {
        let lookups = keys.iter().map(|key| async move {
            match self.store.execute(key).await {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(
                        field = %key.field,
                        kind = %key.kind,
                        value = %key.value,
                        error = %err,
                        "lookup_failure"
                    );
                    Vec::new()
                }
            }
        });
        join_all(lookups).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::catalog::{Field, MaterialType};
    use crate::config::TieBreak;
    use crate::normalize::pad_single_digits;
    use crate::plan::QueryKind;
    use crate::storage::InMemoryCatalogStore;

    fn hexa(size: &str) -> MaterialSpec {
        MaterialSpec::parse(MaterialType::Hexa, size).unwrap()
    }

    fn resolver(entries: Vec<CatalogEntry>) -> Resolver<InMemoryCatalogStore> {
        Resolver::new(Arc::new(InMemoryCatalogStore::from_entries(entries).unwrap()))
    }

    #[tokio::test]
    async fn resolves_exact_name_and_code() {
        let r = resolver(vec![
            CatalogEntry::with_id("a", "GMC", "GMC-04-04N").with_material(hexa("4")),
            CatalogEntry::with_id("b", "GMC", "GMC-06-06R").with_material(hexa("6")),
        ]);
        assert_eq!(r.resolve("GMC", "GMC-06-06R").await, Some(vec![hexa("6")]));
        assert_eq!(r.resolve("gmc", "4-4").await, Some(vec![hexa("4")]));
    }

    #[tokio::test]
    async fn empty_materials_are_a_match() {
        let r = resolver(vec![CatalogEntry::with_id("a", "GMC", "GMC-08-08")]);
        assert_eq!(r.resolve("GMC", "8-8").await, Some(Vec::new()));
        assert_eq!(r.resolve("GMC", "9-9").await, None);
    }

    #[tokio::test]
    async fn resolve_match_reports_score() {
        let r = resolver(vec![CatalogEntry::with_id("a", "GMC", "GMC-06-06R")]);
        let res = r
            .resolve_match(&ResolutionQuery::new("GMC", "6-6N"), &HashSet::new())
            .await
            .unwrap();
        assert_eq!(res.entry.id.as_str(), "a");
        assert_eq!(res.score.total, 250);
        assert_eq!(res.candidates, 1);
        assert!(res.lookups > 1);
        assert!(res.materials().is_empty());
    }

    #[tokio::test]
    async fn better_name_wins_over_weaker_one() {
        let r = resolver(vec![
            CatalogEntry::with_id("a", "GMC ELBOW", "GMC-4-4").with_material(hexa("1")),
            CatalogEntry::with_id("b", "GMC", "GMC-4-4").with_material(hexa("2")),
        ]);
        assert_eq!(r.resolve("GMC", "4-4").await, Some(vec![hexa("2")]));
    }

    const CODE_THEN_PADDED: &[KeyRule] = &[
        KeyRule {
            label: "code",
            field: Field::Code,
            kind: QueryKind::Equality,
            derive: |q, _| Some(q.code.clone()),
        },
        KeyRule {
            label: "padded",
            field: Field::Code,
            kind: QueryKind::Equality,
            derive: |q, _| Some(pad_single_digits(&q.code)),
        },
    ];

    #[tokio::test]
    async fn tie_break_is_configurable() {
        let store = Arc::new(
            InMemoryCatalogStore::from_entries(vec![
                CatalogEntry::with_id("b", "GMC", "4-4").with_material(hexa("2")),
                CatalogEntry::with_id("a", "GMC", "04-04").with_material(hexa("1")),
            ])
            .unwrap(),
        );

        let lowest = Resolver::new(Arc::clone(&store)).with_rules(CODE_THEN_PADDED);
        assert_eq!(lowest.resolve("GMC", "4-4").await, Some(vec![hexa("1")]));

        // "4-4" is looked up before "04-04", so "b" is seen first.
        let cfg = ResolverConfig {
            tie_break: TieBreak::FirstSeen,
            ..ResolverConfig::default()
        };
        let first_seen = Resolver::with_config(store, cfg)
            .unwrap()
            .with_rules(CODE_THEN_PADDED);
        assert_eq!(first_seen.resolve("GMC", "4-4").await, Some(vec![hexa("2")]));
    }

    #[tokio::test]
    async fn code_only_query_needs_name_evidence() {
        let r = resolver(vec![CatalogEntry::with_id("a", "GMC", "04-04")]);
        assert_eq!(r.resolve("", "4-4").await, None);
        assert_eq!(r.resolve("GMC", "").await, None);
    }

    #[tokio::test]
    async fn excluded_entries_are_skipped() {
        let r = resolver(vec![
            CatalogEntry::with_id("a", "GMC", "GMC-4-4").with_material(hexa("1")),
            CatalogEntry::with_id("b", "GMC", "GMC-04-04").with_material(hexa("2")),
        ]);
        let excluded = HashSet::from([EntryId::new("a")]);
        assert_eq!(
            r.resolve_excluding("GMC", "4-4", &excluded).await,
            Some(vec![hexa("2")])
        );

        let excluded = HashSet::from([EntryId::new("a"), EntryId::new("b")]);
        assert_eq!(r.resolve_excluding("GMC", "4-4", &excluded).await, None);
    }

    #[tokio::test]
    async fn max_candidates_caps_scoring() {
        let cfg = ResolverConfig {
            max_candidates: Some(1),
            ..ResolverConfig::default()
        };
        let store = InMemoryCatalogStore::from_entries(vec![
            CatalogEntry::with_id("a", "GMC", "GMC-9-9"),
            CatalogEntry::with_id("b", "GMC", "GMC-4-4"),
        ])
        .unwrap();
        let r = Resolver::with_config(Arc::new(store), cfg).unwrap();
        // The name lookup returns "a" first; "b" is cut before scoring.
        assert_eq!(r.resolve("GMC", "4-4").await, None);
    }

    #[test]
    fn with_config_validates() {
        let cfg = ResolverConfig {
            min_code_len: 0,
            ..ResolverConfig::default()
        };
        let store = Arc::new(InMemoryCatalogStore::new());
        assert!(Resolver::with_config(store, cfg).is_err());
    }

    #[tokio::test]
    async fn works_behind_a_trait_object() {
        let store: Arc<dyn CatalogStore> = Arc::new(
            InMemoryCatalogStore::from_entries(vec![
                CatalogEntry::with_id("a", "GMC", "GMC-4-4").with_material(hexa("4")),
            ])
            .unwrap(),
        );
        let r: Resolver<dyn CatalogStore> = Resolver::new(store);
        assert_eq!(r.resolve("GMC", "4-4").await, Some(vec![hexa("4")]));
    }
}
