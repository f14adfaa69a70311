//! Resolver configuration.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// How to choose between eligible candidates with the same total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Lexicographically smallest entry id wins. Independent of store ordering.
    #[default]
    LowestId,
    /// First candidate seen across the planned keys wins.
    FirstSeen,
}

/// Tunable thresholds for planning and scoring.
///
/// Defaults reproduce the documented heuristics; every field can be omitted
/// from a JSON document.
///
/// # Examples
///
/// ```
/// use catalog_resolve::{ResolverConfig, TieBreak};
///
/// let cfg = ResolverConfig::from_json_str(r#"{ "tie_break": "first_seen" }"#).unwrap();
/// assert_eq!(cfg.tie_break, TieBreak::FirstSeen);
/// assert_eq!(cfg.min_code_len, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum query name length for the name equality and full-prefix keys.
    pub min_name_key_len: usize,
    /// Minimum query name length for the first-letter prefix key.
    pub min_broad_prefix_len: usize,
    /// Minimum query code length before any code key is planned.
    pub min_code_len: usize,
    /// Shorter word length required for a word-prefix name match.
    pub min_word_prefix_len: usize,
    /// Minimum length for the substring clauses of the acceptance gate.
    pub min_correlation_len: usize,
    /// Tie-break between equally scored candidates.
    pub tie_break: TieBreak,
    /// Upper bound on merged candidates that get scored.
    pub max_candidates: Option<usize>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_name_key_len: 3,
            min_broad_prefix_len: 2,
            min_code_len: 3,
            min_word_prefix_len: 2,
            min_correlation_len: 3,
            tie_break: TieBreak::LowestId,
            max_candidates: None,
        }
    }
}

impl ResolverConfig {
    /// Parses a JSON document and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, ValidationError> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| ValidationError::InvalidConfig {
            reason: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects thresholds that would make the planner flood the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let at_least_one = [
            ("min_name_key_len", self.min_name_key_len),
            ("min_broad_prefix_len", self.min_broad_prefix_len),
            ("min_code_len", self.min_code_len),
            ("min_word_prefix_len", self.min_word_prefix_len),
            ("min_correlation_len", self.min_correlation_len),
        ];
        for (field, actual) in at_least_one {
            if actual < 1 {
                return Err(ValidationError::ConfigOutOfRange {
                    field: field.to_string(),
                    min: 1,
                    actual,
                });
            }
        }

        if let Some(max) = self.max_candidates {
            if max == 0 {
                return Err(ValidationError::ConfigOutOfRange {
                    field: "max_candidates".to_string(),
                    min: 1,
                    actual: 0,
                });
            }
        }
        Ok(())
    }
}
