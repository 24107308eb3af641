//! Alias normalization, grammar validation, and transpose-tolerant equality.
//!
//! Grounded on `referral.cpp`'s `NormalizeAlias`/`TransposeEqual`/
//! `AliasesEqual`/`CheckReferralAlias(Safe)` from the original chain: a
//! legacy grammar (`[A-Za-z0-9_-]{3,20}`, case-insensitive) active before
//! `safer_alias_blockheight`, and a "safe" grammar afterward that excludes
//! `0`/`1` to reduce homoglyph risk and additionally tolerates adjacent
//! transpositions when comparing two aliases for equality.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::AliasError;

pub const MAX_ALIAS_LENGTH: usize = 20;
pub const SAFER_MAX_ALIAS_LENGTH: usize = 18;

fn blacklist() -> &'static [&'static str] {
    &["merit", "meritlabs"]
}

fn legacy_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)^([a-z0-9_-]){{3,{MAX_ALIAS_LENGTH}}}$")).expect("valid regex")
    })
}

fn safer_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^[a-z2-9]([a-z2-9_-]){{1,{SAFER_MAX_ALIAS_LENGTH}}}[a-z2-9]$"))
            .expect("valid regex")
    })
}

/// Trim whitespace, drop a leading `@`, and lowercase. Matches
/// `referral.cpp::NormalizeAlias` exactly, including its no-op on an
/// already-empty alias.
pub fn normalize(alias: &str) -> String {
    let trimmed = alias.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let without_at = trimmed.strip_prefix('@').unwrap_or(trimmed);
    without_at.to_lowercase()
}

/// Two same-length strings are "transpose equal" if every adjacent pair of
/// positions is allowed to have swapped a single character, evaluated with
/// a sliding two-character window. This is the original chain's exact
/// `TransposeEqual` algorithm: it is not a general edit-distance check, and
/// it is famously non-transitive (`a~b` and `b~c` do not imply `a~c`).
pub fn transpose_equal(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    debug_assert!(a.len() > 1);
    debug_assert_eq!(a.len(), b.len());

    if a[0] != b[0] && a[1] != b[1] && a[0] != b[1] && a[1] != b[0] {
        return false;
    }

    for c in 2..a.len() {
        if a[c] != b[c] && a[c - 1] != b[c] && a[c] != b[c - 1] {
            return false;
        }
    }

    true
}

/// Compares two aliases for equality. Under the legacy grammar this is
/// exact string equality; under the safe grammar both sides are first
/// normalized, then compared exactly, then (if same length) via
/// [`transpose_equal`].
pub fn aliases_equal(a: &str, b: &str, safe: bool) -> bool {
    if !safe {
        return a == b;
    }

    let a = normalize(a);
    let b = normalize(b);

    if a.len() != b.len() {
        return false;
    }
    if a == b {
        return true;
    }
    if a.len() <= 1 {
        return false;
    }
    transpose_equal(&a, &b)
}

fn is_blacklisted(normalized: &str) -> bool {
    blacklist().contains(&normalized)
}

/// Validate under the safe grammar (active at/after `safer_alias_blockheight`).
/// An empty alias is always valid (aliases are optional).
pub fn check_alias_safe(alias: &str) -> Result<(), AliasError> {
    if alias.is_empty() {
        return Ok(());
    }
    let normalized = normalize(alias);
    if normalized.is_empty() {
        return Err(AliasError::Empty);
    }
    if !safer_regex().is_match(&normalized) {
        return Err(AliasError::Grammar(normalized));
    }
    if is_blacklisted(&normalized) {
        return Err(AliasError::Blacklisted);
    }
    Ok(())
}

/// Validate under the legacy grammar (active before `safer_alias_blockheight`).
pub fn check_alias_legacy(alias: &str) -> Result<(), AliasError> {
    if alias.is_empty() {
        return Ok(());
    }
    if alias.len() > MAX_ALIAS_LENGTH {
        return Err(AliasError::TooLong { max: MAX_ALIAS_LENGTH });
    }
    if !legacy_regex().is_match(alias) {
        return Err(AliasError::Grammar(alias.to_string()));
    }
    let normalized = normalize(alias);
    if is_blacklisted(&normalized) {
        return Err(AliasError::Blacklisted);
    }
    Ok(())
}

/// Validate an alias at a given block height against the configured
/// activation height for the safe grammar.
pub fn check_alias(alias: &str, height: u32, safer_alias_blockheight: u32) -> Result<(), AliasError> {
    if height >= safer_alias_blockheight {
        check_alias_safe(alias)
    } else {
        check_alias_legacy(alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_strips_at_and_lowercases() {
        assert_eq!(normalize("  @Alice  "), "alice");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("@"), "");
    }

    #[test]
    fn transpose_equal_detects_adjacent_swap() {
        assert!(transpose_equal("alice", "ailce"));
        assert!(!transpose_equal("alice", "alicf"));
    }

    #[test]
    fn transpose_equal_is_not_transitive() {
        // a ~ b, b ~ c, but a !~ c: the classic non-transitivity example.
        let a = "babcc";
        let b = "ebdcd";
        let c = "deddb";
        assert!(transpose_equal(a, b));
        assert!(transpose_equal(b, c));
        assert!(!transpose_equal(a, c));
    }

    #[test]
    fn safe_grammar_rejects_0_and_1() {
        assert!(check_alias_safe("abc2def").is_ok());
        assert!(check_alias_safe("abc0def").is_err());
        assert!(check_alias_safe("abc1def").is_err());
    }

    #[test]
    fn blacklist_is_enforced_in_both_grammars() {
        assert!(matches!(
            check_alias_legacy("merit"),
            Err(AliasError::Blacklisted)
        ));
        assert!(matches!(
            check_alias_safe("meritlabs"),
            Err(AliasError::Blacklisted)
        ));
    }

    #[test]
    fn empty_alias_always_valid() {
        assert!(check_alias_legacy("").is_ok());
        assert!(check_alias_safe("").is_ok());
    }

    #[test]
    fn height_gated_dispatch_switches_grammar() {
        // '1' is legal pre-activation but illegal once the safe grammar kicks in.
        assert!(check_alias("abc1def", 99, 100).is_ok());
        assert!(check_alias("abc1def", 100, 100).is_err());
    }
}
