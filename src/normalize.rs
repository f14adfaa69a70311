//! Normalization of product names and codes.
//!
//! All functions here are pure and total. Name-aware helpers expect their
//! inputs to already be in [`upper`] form.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Trailing letters that mark a cosmetic variant (plating, finish) of a code.
pub const SUFFIX_LETTERS: [char; 3] = ['N', 'R', 'G'];

fn digit_runs() -> &'static Regex {
    static DIGIT_RUNS: OnceLock<Regex> = OnceLock::new();
    DIGIT_RUNS.get_or_init(|| Regex::new("[0-9]+").expect("digit-run pattern is valid"))
}

/// Upper-cases and trims surrounding whitespace.
#[must_use]
pub fn upper(s: &str) -> String {
    s.trim().to_uppercase()
}

/// Removes leading zeros from every run of digits, keeping at least one digit.
///
/// ```
/// use catalog_resolve::normalize::strip_leading_zeros;
///
/// assert_eq!(strip_leading_zeros("GMC-04-04N"), "GMC-4-4N");
/// assert_eq!(strip_leading_zeros("0-00"), "0-0");
/// ```
#[must_use]
pub fn strip_leading_zeros(s: &str) -> String {
    digit_runs()
        .replace_all(s, |caps: &Captures<'_>| {
            let run = &caps[0];
            let trimmed = run.trim_start_matches('0');
            if trimmed.is_empty() {
                "0".to_string()
            } else {
                trimmed.to_string()
            }
        })
        .into_owned()
}

/// Pads every single-digit run back to two digits (`"4-4N"` becomes `"04-04N"`).
#[must_use]
pub fn pad_single_digits(s: &str) -> String {
    digit_runs()
        .replace_all(s, |caps: &Captures<'_>| {
            let run = &caps[0];
            if run.len() == 1 {
                format!("0{run}")
            } else {
                run.to_string()
            }
        })
        .into_owned()
}

/// Returns true if `s` ends in a variant suffix letter that directly follows a digit.
#[must_use]
pub fn has_suffix_letter(s: &str) -> bool {
    let mut chars = s.chars().rev();
    match (chars.next(), chars.next()) {
        (Some(last), Some(prev)) => SUFFIX_LETTERS.contains(&last) && prev.is_ascii_digit(),
        _ => false,
    }
}

/// Drops a trailing variant suffix letter.
///
/// The letter is only treated as a suffix when it directly follows a digit,
/// so `"4-4N"` becomes `"4-4"` while `"4-4NN"` and `"CHAIN"` are left alone.
#[must_use]
pub fn strip_suffix_letter(s: &str) -> &str {
    if has_suffix_letter(s) {
        // Suffix letters are ASCII, one byte wide.
        &s[..s.len() - 1]
    } else {
        s
    }
}

/// Canonical comparison form of a product code.
///
/// Idempotent and case-insensitive.
///
/// ```
/// use catalog_resolve::normalize::core_code;
///
/// assert_eq!(core_code("gmc-06-06r"), "GMC-6-6");
/// assert_eq!(core_code("s45123"), core_code("S45123"));
/// ```
#[must_use]
pub fn core_code(s: &str) -> String {
    let stripped = strip_leading_zeros(&upper(s));
    strip_suffix_letter(&stripped).to_string()
}

/// Removes `name` from the front of `code` when it is followed by a boundary.
///
/// A boundary is a `-` (which is dropped too), whitespace, or any non-letter.
/// Returns `None` when `code` does not start with `name` or nothing would
/// remain after stripping.
#[must_use]
pub fn strip_exact_name<'a>(code: &'a str, name: &str) -> Option<&'a str> {
    if name.is_empty() {
        return None;
    }
    let rest = code.strip_prefix(name)?;
    let rest = match rest.chars().next() {
        Some('-') => &rest[1..],
        Some(c) if c.is_alphabetic() => return None,
        Some(_) => rest,
        None => return None,
    };
    let rest = rest.trim_start();
    (!rest.is_empty()).then_some(rest)
}

/// Removes an embedded name abbreviation of the form `<ABBREV>-<DIGIT...>`.
///
/// The first `-` segment must be letters only and at least two long, and the
/// remainder must start with a digit.
///
/// ```
/// use catalog_resolve::normalize::strip_abbreviation;
///
/// assert_eq!(strip_abbreviation("GMC-4-4N"), Some("4-4N"));
/// assert_eq!(strip_abbreviation("4-4N"), None);
/// assert_eq!(strip_abbreviation("G-4"), None);
/// ```
#[must_use]
pub fn strip_abbreviation(code: &str) -> Option<&str> {
    let (head, rest) = code.split_once('-')?;
    let is_abbrev = head.chars().count() >= 2 && head.chars().all(|c| c.is_ascii_alphabetic());
    let body_starts_numeric = rest.chars().next().is_some_and(|c| c.is_ascii_digit());
    (is_abbrev && body_starts_numeric).then_some(rest)
}

/// Strips a leading name-like segment from `code`: first `name` itself, then a
/// generic alphabetic abbreviation. Returns `code` unchanged if neither applies.
#[must_use]
pub fn strip_name_prefix<'a>(code: &'a str, name: &str) -> &'a str {
    strip_name_prefix_any(code, &[name])
}

/// Like [`strip_name_prefix`] but tries each candidate name in order before
/// falling back to the abbreviation heuristic.
#[must_use]
pub fn strip_name_prefix_any<'a>(code: &'a str, names: &[&str]) -> &'a str {
    names
        .iter()
        .find_map(|name| strip_exact_name(code, name))
        .or_else(|| strip_abbreviation(code))
        .unwrap_or(code)
}

/// Splits on whitespace, `-` and `_`, dropping empty pieces.
pub fn words(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|w| !w.is_empty())
}

/// Removes whitespace, `-` and `_`.
#[must_use]
pub fn compact(s: &str) -> String {
    words(s).collect()
}
