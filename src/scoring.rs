//! Candidate scoring and the acceptance gate.
//!
//! Each candidate earns a name tier, an exact-after-normalization code match,
//! and a bonus when both agree. A code match alone is not enough: the gate
//! also demands some correlation between the query and the stored name,
//! because normalized codes like `4-4` are shared by unrelated products.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;
use crate::config::{ResolverConfig, TieBreak};
use crate::normalize::{compact, core_code, strip_exact_name, strip_name_prefix_any, upper, words};
use crate::plan::ResolutionQuery;

/// Points awarded for a code match.
pub const CODE_POINTS: u32 = 100;

/// Bonus when both name and code match.
pub const AGREEMENT_BONUS: u32 = 50;

/// How closely the stored name relates to the query name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameTier {
    /// No relation.
    None,
    /// A word of one is equal to, or a prefix of, a word of the other.
    Word,
    /// One contains the other.
    Substring,
    /// The query extends the stored name.
    QueryExtendsStored,
    /// The stored name extends the query.
    StoredExtendsQuery,
    /// Identical.
    Exact,
}

impl NameTier {
    /// Score contribution of this tier.
    #[must_use]
    pub const fn points(self) -> u32 {
        match self {
            Self::Exact => 100,
            Self::StoredExtendsQuery => 80,
            Self::QueryExtendsStored => 70,
            Self::Substring => 50,
            Self::Word => 30,
            Self::None => 0,
        }
    }

    /// Returns true for any tier above [`NameTier::None`].
    #[must_use]
    pub const fn is_match(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Code comparison outcome. Codes either agree after normalization or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeMatch {
    /// Core codes are equal.
    Exact,
    /// Codes differ, or either side is empty.
    None,
}

impl CodeMatch {
    /// Returns true for [`CodeMatch::Exact`].
    #[must_use]
    pub const fn is_match(self) -> bool {
        matches!(self, Self::Exact)
    }
}

/// The first gate clause that admitted a code-matched candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateReason {
    /// The names matched on some tier.
    NameMatched,
    /// The stored code contains the query name.
    StoredCodeHasQueryName,
    /// The stored name contains the query code.
    StoredNameHasQueryCode,
    /// The names overlap once separators are removed.
    CompactNameOverlap,
    /// The query code starts with the query name.
    QueryCodeCarriesName,
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NameMatched => "name_matched",
            Self::StoredCodeHasQueryName => "stored_code_has_query_name",
            Self::StoredNameHasQueryCode => "stored_name_has_query_code",
            Self::CompactNameOverlap => "compact_name_overlap",
            Self::QueryCodeCarriesName => "query_code_carries_name",
        };
        f.write_str(s)
    }
}

/// Full scoring result for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    /// Name relation.
    pub name: NameTier,
    /// Code comparison.
    pub code: CodeMatch,
    /// Name points, plus code points and agreement bonus when applicable.
    pub total: u32,
    /// Why the candidate passed the gate; `None` means rejected.
    pub gate: Option<GateReason>,
}

impl MatchScore {
    /// Returns true if the candidate may be selected.
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        self.gate.is_some()
    }
}

/// Query forms reused across every candidate of one resolution.
#[derive(Debug, Clone)]
pub struct ScoringQuery {
    name: String,
    code: String,
    name_compact: String,
    code_carries_name: bool,
}

impl ScoringQuery {
    /// Normalizes `query` once for scoring.
    #[must_use]
    pub fn new(query: &ResolutionQuery) -> Self {
        let name = upper(&query.product_name);
        let code = upper(&query.product_code);
        let name_compact = compact(&name);
        let code_carries_name = strip_exact_name(&code, &name).is_some();
        Self {
            name,
            code,
            name_compact,
            code_carries_name,
        }
    }
}

/// Grades how the stored name relates to the query name.
#[must_use]
pub fn name_tier(stored: &str, query: &str, config: &ResolverConfig) -> NameTier {
    if stored.is_empty() || query.is_empty() {
        return NameTier::None;
    }
    if stored == query {
        NameTier::Exact
    } else if stored.starts_with(query) {
        NameTier::StoredExtendsQuery
    } else if query.starts_with(stored) {
        NameTier::QueryExtendsStored
    } else if stored.contains(query) || query.contains(stored) {
        NameTier::Substring
    } else if words_related(stored, query, config.min_word_prefix_len) {
        NameTier::Word
    } else {
        NameTier::None
    }
}

fn words_related(stored: &str, query: &str, min_prefix_len: usize) -> bool {
    words(query).any(|q| {
        words(stored).any(|s| {
            if q == s {
                return true;
            }
            let shorter = q.chars().count().min(s.chars().count());
            shorter >= min_prefix_len && (q.starts_with(s) || s.starts_with(q))
        })
    })
}

/// Compares codes after stripping embedded name segments and normalizing.
///
/// Both codes try the stored name first, then the query name, then the
/// generic abbreviation split.
#[must_use]
pub fn code_match(query_code: &str, stored: &CatalogEntry, query_name: &str) -> CodeMatch {
    let names = [stored.product_name.as_str(), query_name];
    let query_core = core_code(strip_name_prefix_any(query_code, &names));
    if query_core.is_empty() {
        return CodeMatch::None;
    }
    let stored_core = core_code(strip_name_prefix_any(&stored.product_code, &names));
    if query_core == stored_core {
        CodeMatch::Exact
    } else {
        CodeMatch::None
    }
}

fn gate(
    query: &ScoringQuery,
    entry: &CatalogEntry,
    name: NameTier,
    config: &ResolverConfig,
) -> Option<GateReason> {
    let min = config.min_correlation_len;
    let long_enough = |s: &str| s.chars().count() >= min;

    if name.is_match() {
        return Some(GateReason::NameMatched);
    }
    if long_enough(&query.name) && entry.product_code.contains(query.name.as_str()) {
        return Some(GateReason::StoredCodeHasQueryName);
    }
    if long_enough(&query.code) && entry.product_name.contains(query.code.as_str()) {
        return Some(GateReason::StoredNameHasQueryCode);
    }

    let stored_compact = compact(&entry.product_name);
    let (shorter, longer) = if stored_compact.len() <= query.name_compact.len() {
        (stored_compact.as_str(), query.name_compact.as_str())
    } else {
        (query.name_compact.as_str(), stored_compact.as_str())
    };
    if long_enough(shorter) && longer.contains(shorter) {
        return Some(GateReason::CompactNameOverlap);
    }

    query
        .code_carries_name
        .then_some(GateReason::QueryCodeCarriesName)
}

/// Scores one candidate against the query.
#[must_use]
pub fn score_candidate(
    query: &ScoringQuery,
    entry: &CatalogEntry,
    config: &ResolverConfig,
) -> MatchScore {
    let name = name_tier(&entry.product_name, &query.name, config);
    let code = code_match(&query.code, entry, &query.name);

    let mut total = name.points();
    if code.is_match() {
        total += CODE_POINTS;
        if name.is_match() {
            total += AGREEMENT_BONUS;
        }
    }

    let gate = if code.is_match() {
        gate(query, entry, name, config)
    } else {
        None
    };

    MatchScore {
        name,
        code,
        total,
        gate,
    }
}

/// A merged candidate with its score.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub entry: &'a CatalogEntry,
    /// First-seen position in the merged set.
    pub position: usize,
    pub score: MatchScore,
}

/// Picks the highest-scoring eligible candidate.
///
/// Equal totals are settled by `tie_break`.
#[must_use]
pub fn select_best<'c, 'a>(
    candidates: &'c [Candidate<'a>],
    tie_break: TieBreak,
) -> Option<&'c Candidate<'a>> {
    candidates
        .iter()
        .filter(|c| c.score.is_eligible())
        .min_by(|a, b| {
            b.score.total.cmp(&a.score.total).then_with(|| match tie_break {
                TieBreak::LowestId => a.entry.id.cmp(&b.entry.id),
                TieBreak::FirstSeen => a.position.cmp(&b.position),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ResolverConfig {
        ResolverConfig::default()
    }

    fn score(name: &str, code: &str, entry: &CatalogEntry) -> MatchScore {
        let q = ScoringQuery::new(&ResolutionQuery::new(name, code));
        score_candidate(&q, entry, &cfg())
    }

    #[test]
    fn test_name_tiers() {
        let c = cfg();
        assert_eq!(name_tier("GMC", "GMC", &c), NameTier::Exact);
        assert_eq!(name_tier("GMC ELBOW", "GMC", &c), NameTier::StoredExtendsQuery);
        assert_eq!(name_tier("GMC", "GMC ELBOW", &c), NameTier::QueryExtendsStored);
        assert_eq!(name_tier("MALE GMC", "GMC", &c), NameTier::Substring);
        assert_eq!(name_tier("MALE CONNECTOR", "CONN ADAPTER", &c), NameTier::Word);
        assert_eq!(name_tier("MALE CONNECTOR", "GMC", &c), NameTier::None);
        assert_eq!(name_tier("MALE CONNECTOR", "", &c), NameTier::None);
        assert_eq!(name_tier("", "GMC", &c), NameTier::None);
    }

    #[test]
    fn test_single_letter_words_need_exact_equality() {
        let c = cfg();
        assert_eq!(name_tier("TEE A", "ELBOW ANGLE", &c), NameTier::None);
        assert_eq!(name_tier("TEE A", "ELBOW A", &c), NameTier::Word);
    }

    #[test]
    fn test_tier_points_and_order() {
        assert_eq!(NameTier::Exact.points(), 100);
        assert_eq!(NameTier::StoredExtendsQuery.points(), 80);
        assert_eq!(NameTier::QueryExtendsStored.points(), 70);
        assert_eq!(NameTier::Substring.points(), 50);
        assert_eq!(NameTier::Word.points(), 30);
        assert_eq!(NameTier::None.points(), 0);
        assert!(NameTier::Exact > NameTier::Word);
    }

    #[test]
    fn test_code_match_normalizes_padding_and_suffix() {
        let stored = CatalogEntry::with_id("e", "GMC", "GMC-04-04N");
        assert_eq!(code_match("4-4N", &stored, "GMC"), CodeMatch::Exact);
        assert_eq!(code_match("04-04R", &stored, "GMC"), CodeMatch::Exact);
        assert_eq!(code_match("GMC-4-4", &stored, "GMC"), CodeMatch::Exact);
        assert_eq!(code_match("4-6N", &stored, "GMC"), CodeMatch::None);
        assert_eq!(code_match("", &stored, "GMC"), CodeMatch::None);
    }

    #[test]
    fn test_code_match_strips_query_name_from_query_code() {
        let stored = CatalogEntry::with_id("e", "MALE CONNECTOR", "4-4N");
        assert_eq!(code_match("GMC-4-4N", &stored, "GMC"), CodeMatch::Exact);
        // Generic abbreviation heuristic without a matching name.
        assert_eq!(code_match("MC-4-4N", &stored, ""), CodeMatch::Exact);
    }

    #[test]
    fn test_total_score() {
        let stored = CatalogEntry::with_id("e", "GMC", "GMC-06-06R");
        let s = score("gmc", "6-6n", &stored);
        assert_eq!(s.name, NameTier::Exact);
        assert_eq!(s.code, CodeMatch::Exact);
        assert_eq!(s.total, 250);
        assert_eq!(s.gate, Some(GateReason::NameMatched));

        let s = score("gmc", "8-8n", &stored);
        assert_eq!(s.total, 100);
        assert!(!s.is_eligible());
    }

    #[test]
    fn test_gate_rejects_unrelated_name() {
        let stored = CatalogEntry::with_id("e", "UNRELATED-PRODUCT", "4-4");
        let s = score("GMC", "4-4", &stored);
        assert_eq!(s.code, CodeMatch::Exact);
        assert_eq!(s.total, 100);
        assert!(!s.is_eligible());
    }

    #[test]
    fn test_gate_clauses() {
        let stored = CatalogEntry::with_id("e", "ELBOW", "GMC-4-4");
        assert_eq!(
            score("GMC", "4-4", &stored).gate,
            Some(GateReason::StoredCodeHasQueryName)
        );

        let stored = CatalogEntry::with_id("e", "ADAPTER 12-12", "12-12");
        assert_eq!(
            score("NIPPLE", "12-12", &stored).gate,
            Some(GateReason::StoredNameHasQueryCode)
        );

        let stored = CatalogEntry::with_id("e", "O-RING", "4-4");
        assert_eq!(
            score("ORING", "4-4", &stored).gate,
            Some(GateReason::CompactNameOverlap)
        );

        let stored = CatalogEntry::with_id("e", "MALE CONNECTOR", "4-4N");
        assert_eq!(
            score("GMC", "GMC-4-4N", &stored).gate,
            Some(GateReason::QueryCodeCarriesName)
        );
    }

    #[test]
    fn test_short_query_name_does_not_open_gate() {
        let stored = CatalogEntry::with_id("e", "UNION", "AB-4-4");
        let s = score("AB", "4-4", &stored);
        assert!(s.code.is_match());
        assert!(!s.is_eligible());
    }

    fn candidates<'a>(entries: &'a [CatalogEntry], totals: &[u32]) -> Vec<Candidate<'a>> {
        entries
            .iter()
            .zip(totals)
            .enumerate()
            .map(|(position, (entry, &total))| Candidate {
                entry,
                position,
                score: MatchScore {
                    name: NameTier::Exact,
                    code: CodeMatch::Exact,
                    total,
                    gate: Some(GateReason::NameMatched),
                },
            })
            .collect()
    }

    #[test]
    fn test_select_best_by_total() {
        let entries = vec![
            CatalogEntry::with_id("a", "X", "1-1"),
            CatalogEntry::with_id("b", "X", "1-1"),
        ];
        let cands = candidates(&entries, &[180, 250]);
        let best = select_best(&cands, TieBreak::LowestId).unwrap();
        assert_eq!(best.entry.id.as_str(), "b");
    }

    #[test]
    fn test_select_best_tie_breaks() {
        let entries = vec![
            CatalogEntry::with_id("z", "X", "1-1"),
            CatalogEntry::with_id("a", "X", "1-1"),
        ];
        let cands = candidates(&entries, &[250, 250]);
        assert_eq!(select_best(&cands, TieBreak::LowestId).unwrap().entry.id.as_str(), "a");
        assert_eq!(select_best(&cands, TieBreak::FirstSeen).unwrap().entry.id.as_str(), "z");
    }

    #[test]
    fn test_select_best_skips_ineligible() {
        let entries = vec![CatalogEntry::with_id("a", "X", "1-1")];
        let mut cands = candidates(&entries, &[300]);
        cands[0].score.gate = None;
        assert!(select_best(&cands, TieBreak::LowestId).is_none());
    }
}
