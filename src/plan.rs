//! Candidate key planning.
//!
//! The catalog has no single canonical key, so a query is expanded into many
//! narrow lookups. Each lookup comes from one row of a rule table; new catalog
//! quirks are handled by adding rows, not by touching the scorer.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Field;
use crate::config::ResolverConfig;
use crate::normalize::{
    core_code, has_suffix_letter, pad_single_digits, strip_leading_zeros, strip_name_prefix,
    strip_suffix_letter, upper,
};

/// Raw user input for one resolution call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionQuery {
    pub product_name: String,
    pub product_code: String,
}

impl ResolutionQuery {
    /// Creates a query from raw name and code fragments.
    #[must_use]
    pub fn new(product_name: impl Into<String>, product_code: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            product_code: product_code.into(),
        }
    }

    /// Returns true if both fragments are blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.product_name.trim().is_empty() && self.product_code.trim().is_empty()
    }
}

/// How the store should match a lookup value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Exact value match.
    Equality,
    /// Starts-with match over a sorted index.
    PrefixRange,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equality => write!(f, "eq"),
            Self::PrefixRange => write!(f, "prefix"),
        }
    }
}

/// One concrete query issued to the store during a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupKey {
    pub field: Field,
    pub kind: QueryKind,
    pub value: String,
}

impl LookupKey {
    /// Equality lookup on `field`.
    #[must_use]
    pub fn equality(field: Field, value: impl Into<String>) -> Self {
        Self {
            field,
            kind: QueryKind::Equality,
            value: value.into(),
        }
    }

    /// Prefix-range lookup on `field`.
    #[must_use]
    pub fn prefix(field: Field, value: impl Into<String>) -> Self {
        Self {
            field,
            kind: QueryKind::PrefixRange,
            value: value.into(),
        }
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.field, self.kind, self.value)
    }
}

/// Normalized views of a query shared by every rule.
#[derive(Debug, Clone)]
pub struct QueryForms {
    /// Upper-cased, trimmed name.
    pub name: String,
    /// Upper-cased, trimmed code.
    pub code: String,
    /// Code with a leading name or abbreviation segment removed.
    pub code_body: String,
    /// Whether the code looks like a code fragment at all.
    pub code_plausible: bool,
}

impl QueryForms {
    /// Derives the normalized forms of `query`.
    #[must_use]
    pub fn new(query: &ResolutionQuery, config: &ResolverConfig) -> Self {
        let name = upper(&query.product_name);
        let code = upper(&query.product_code);
        let code_body = strip_name_prefix(&code, &name).to_string();
        let code_plausible = code.chars().count() >= config.min_code_len
            && code.chars().any(|c| c.is_ascii_digit() || c == '-');
        Self {
            name,
            code,
            code_body,
            code_plausible,
        }
    }

    fn name_len(&self) -> usize {
        self.name.chars().count()
    }

    fn has_name(&self) -> bool {
        !self.name.is_empty()
    }

    fn body_differs(&self) -> bool {
        self.code_plausible && self.code_body != self.code
    }
}

/// One row of the planning table.
#[derive(Clone, Copy)]
pub struct KeyRule {
    /// Short label used in logs.
    pub label: &'static str,
    pub field: Field,
    pub kind: QueryKind,
    /// Produces the lookup value, or `None` when the rule does not apply.
    pub derive: fn(&QueryForms, &ResolverConfig) -> Option<String>,
}

impl fmt::Debug for KeyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRule")
            .field("label", &self.label)
            .field("field", &self.field)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

const fn rule(
    label: &'static str,
    field: Field,
    kind: QueryKind,
    derive: fn(&QueryForms, &ResolverConfig) -> Option<String>,
) -> KeyRule {
    KeyRule {
        label,
        field,
        kind,
        derive,
    }
}

fn when(cond: bool, value: impl FnOnce() -> String) -> Option<String> {
    cond.then(value)
}

/// Default planning table, in issue order.
pub const DEFAULT_RULES: &[KeyRule] = &[
    // Name
    rule("name_exact", Field::Name, QueryKind::Equality, |q, cfg| {
        when(q.name_len() >= cfg.min_name_key_len, || q.name.clone())
    }),
    rule("name_prefix", Field::Name, QueryKind::PrefixRange, |q, cfg| {
        when(q.name_len() >= cfg.min_name_key_len, || q.name.clone())
    }),
    rule("name_initial", Field::Name, QueryKind::PrefixRange, |q, cfg| {
        if q.name_len() < cfg.min_broad_prefix_len {
            return None;
        }
        q.name.chars().next().map(String::from)
    }),
    // Code as typed
    rule("code_exact", Field::Code, QueryKind::Equality, |q, _| {
        when(q.code_plausible, || q.code.clone())
    }),
    rule("code_core", Field::Code, QueryKind::Equality, |q, _| {
        when(q.code_plausible, || core_code(&q.code))
    }),
    rule("code_padded", Field::Code, QueryKind::Equality, |q, _| {
        when(q.code_plausible, || pad_single_digits(&q.code))
    }),
    rule("code_unsuffixed", Field::Code, QueryKind::Equality, |q, _| {
        when(q.code_plausible && has_suffix_letter(&q.code), || {
            strip_suffix_letter(&q.code).to_string()
        })
    }),
    rule("code_unsuffixed_unpadded", Field::Code, QueryKind::Equality, |q, _| {
        when(q.code_plausible && has_suffix_letter(&q.code), || {
            strip_leading_zeros(strip_suffix_letter(&q.code))
        })
    }),
    rule("code_unsuffixed_padded", Field::Code, QueryKind::Equality, |q, _| {
        when(q.code_plausible && has_suffix_letter(&q.code), || {
            pad_single_digits(strip_suffix_letter(&q.code))
        })
    }),
    rule("code_stem_prefix", Field::Code, QueryKind::PrefixRange, |q, _| {
        when(q.code_plausible, || strip_suffix_letter(&q.code).to_string())
    }),
    rule("code_stem_tail", Field::Code, QueryKind::PrefixRange, |q, _| {
        when(q.code_plausible, || format!("-{}", strip_suffix_letter(&q.code)))
    }),
    // Code with the name or abbreviation segment removed
    rule("body_exact", Field::Code, QueryKind::Equality, |q, _| {
        when(q.body_differs(), || q.code_body.clone())
    }),
    rule("body_core", Field::Code, QueryKind::Equality, |q, _| {
        when(q.body_differs(), || core_code(&q.code_body))
    }),
    rule("body_padded", Field::Code, QueryKind::Equality, |q, _| {
        when(q.body_differs(), || pad_single_digits(&q.code_body))
    }),
    rule("body_unsuffixed_padded", Field::Code, QueryKind::Equality, |q, _| {
        when(q.body_differs(), || {
            pad_single_digits(strip_suffix_letter(&q.code_body))
        })
    }),
    // Compound "<NAME>-<CODE>" identifiers
    rule("compound_exact", Field::Code, QueryKind::Equality, |q, _| {
        when(q.has_name() && q.code_plausible, || {
            format!("{}-{}", q.name, q.code_body)
        })
    }),
    rule("compound_padded", Field::Code, QueryKind::Equality, |q, _| {
        when(q.has_name() && q.code_plausible, || {
            format!("{}-{}", q.name, pad_single_digits(&q.code_body))
        })
    }),
    rule("compound_core", Field::Code, QueryKind::Equality, |q, _| {
        when(q.has_name() && q.code_plausible, || {
            format!("{}-{}", q.name, core_code(&q.code_body))
        })
    }),
    rule("compound_unsuffixed", Field::Code, QueryKind::Equality, |q, _| {
        when(q.has_name() && q.code_plausible && has_suffix_letter(&q.code_body), || {
            format!("{}-{}", q.name, strip_suffix_letter(&q.code_body))
        })
    }),
    rule("compound_unsuffixed_padded", Field::Code, QueryKind::Equality, |q, _| {
        when(q.has_name() && q.code_plausible && has_suffix_letter(&q.code_body), || {
            format!("{}-{}", q.name, pad_single_digits(strip_suffix_letter(&q.code_body)))
        })
    }),
];

/// Plans lookup keys for `query` using [`DEFAULT_RULES`].
///
/// The result is ordered by rule and free of duplicates. A blank query plans
/// nothing.
///
/// ```
/// use catalog_resolve::plan::{plan, LookupKey, ResolutionQuery};
/// use catalog_resolve::{Field, ResolverConfig};
///
/// let keys = plan(&ResolutionQuery::new("gmc", "4-4n"), &ResolverConfig::default());
/// assert_eq!(keys[0], LookupKey::equality(Field::Name, "GMC"));
/// assert!(keys.contains(&LookupKey::equality(Field::Code, "04-04N")));
/// ```
#[must_use]
pub fn plan(query: &ResolutionQuery, config: &ResolverConfig) -> Vec<LookupKey> {
    plan_with_rules(query, config, DEFAULT_RULES)
}

/// Plans lookup keys for `query` using a caller-supplied rule table.
#[must_use]
pub fn plan_with_rules(
    query: &ResolutionQuery,
    config: &ResolverConfig,
    rules: &[KeyRule],
) -> Vec<LookupKey> {
    if query.is_empty() {
        return Vec::new();
    }

    let forms = QueryForms::new(query, config);
    let mut seen: HashSet<LookupKey> = HashSet::new();
    let mut keys = Vec::new();

    for rule in rules {
        let Some(value) = (rule.derive)(&forms, config) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let key = LookupKey {
            field: rule.field,
            kind: rule.kind,
            value,
        };
        if seen.insert(key.clone()) {
            keys.push(key);
        }
    }

    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_for(name: &str, code: &str) -> Vec<LookupKey> {
        plan(&ResolutionQuery::new(name, code), &ResolverConfig::default())
    }

    #[test]
    fn test_empty_query_plans_nothing() {
        assert!(keys_for("", "").is_empty());
        assert!(keys_for("   ", "\t").is_empty());
    }

    #[test]
    fn test_name_rules() {
        let keys = keys_for("gmc", "");
        assert_eq!(
            keys,
            vec![
                LookupKey::equality(Field::Name, "GMC"),
                LookupKey::prefix(Field::Name, "GMC"),
                LookupKey::prefix(Field::Name, "G"),
            ]
        );

        // Two letters only earn the broad net.
        let keys = keys_for("gm", "");
        assert_eq!(keys, vec![LookupKey::prefix(Field::Name, "G")]);

        assert!(keys_for("g", "").is_empty());
    }

    #[test]
    fn test_implausible_code_is_ignored() {
        assert!(keys_for("", "AB").is_empty());
        assert!(keys_for("", "ABC").is_empty());
        assert!(!keys_for("", "A-B").is_empty());
        assert!(!keys_for("", "123").is_empty());
    }

    #[test]
    fn test_code_variants() {
        let keys = keys_for("", "4-4n");
        assert!(keys.contains(&LookupKey::equality(Field::Code, "4-4N")));
        assert!(keys.contains(&LookupKey::equality(Field::Code, "4-4")));
        assert!(keys.contains(&LookupKey::equality(Field::Code, "04-04N")));
        assert!(keys.contains(&LookupKey::equality(Field::Code, "04-04")));
        assert!(keys.contains(&LookupKey::prefix(Field::Code, "4-4")));
        assert!(keys.contains(&LookupKey::prefix(Field::Code, "-4-4")));
        assert!(keys.iter().all(|k| k.field == Field::Code));
    }

    #[test]
    fn test_padded_code_variants() {
        let keys = keys_for("", "04-04R");
        assert!(keys.contains(&LookupKey::equality(Field::Code, "04-04R")));
        assert!(keys.contains(&LookupKey::equality(Field::Code, "04-04")));
        assert!(keys.contains(&LookupKey::equality(Field::Code, "4-4")));
    }

    #[test]
    fn test_body_and_compound_keys() {
        let keys = keys_for("GMC", "GMC-4-4N");
        assert!(keys.contains(&LookupKey::equality(Field::Code, "4-4N")));
        assert!(keys.contains(&LookupKey::equality(Field::Code, "4-4")));
        assert!(keys.contains(&LookupKey::equality(Field::Code, "04-04")));
        assert!(keys.contains(&LookupKey::equality(Field::Code, "GMC-04-04N")));
        assert!(keys.contains(&LookupKey::equality(Field::Code, "GMC-04-04")));
        // Compound keys use the stripped body, so the name is not doubled.
        assert!(!keys.iter().any(|k| k.value.starts_with("GMC-GMC")));
    }

    #[test]
    fn test_compound_needs_name() {
        let keys = keys_for("", "6-6N");
        assert!(!keys.iter().any(|k| k.value.contains("--")));
        let keys = keys_for("GMC", "6-6N");
        assert!(keys.contains(&LookupKey::equality(Field::Code, "GMC-6-6N")));
        assert!(keys.contains(&LookupKey::equality(Field::Code, "GMC-06-06")));
    }

    #[test]
    fn test_keys_are_unique() {
        let keys = keys_for("GMC", "GMC-04-04N");
        let unique: HashSet<&LookupKey> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn test_custom_rule_table() {
        const ONLY_CORE: &[KeyRule] = &[rule("core", Field::Code, QueryKind::Equality, |q, _| {
            Some(core_code(&q.code))
        })];
        let keys = plan_with_rules(
            &ResolutionQuery::new("x", "06-06r"),
            &ResolverConfig::default(),
            ONLY_CORE,
        );
        assert_eq!(keys, vec![LookupKey::equality(Field::Code, "6-6")]);
    }
}
