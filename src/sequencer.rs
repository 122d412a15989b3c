//! # Tag Sequencing
//!
//! Computes the next release tag from the previous one.
//!
//! - No previous tag: seed `v-<branch>-0.0.1`.
//! - Previous tag ends in ASCII digits: increment the whole trailing digit run,
//!   keeping everything before it (`v1.9` becomes `v1.10`). Zero padding is
//!   not preserved (`v-007` becomes `v-8`).
//! - Otherwise: append `.1`.
//!
//! [`next_free_tag`] wraps this in a bounded collision-avoidance loop that
//! keeps incrementing the *candidate* while the predicate reports it taken.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::error::{Error, Result};

fn trailing_number() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(.*?)([0-9]+)$").expect("static tag pattern"))
}

/// The first tag of a new sequence on `branch`.
pub fn seed_tag(branch: &str) -> String {
    format!("v-{}-0.0.1", branch)
}

/// Returns the tag following `previous` on `branch`.
pub fn next_tag(previous: &str, branch: &str) -> Result<String> {
    if previous.is_empty() {
        return Ok(seed_tag(branch));
    }

    if let Some(caps) = trailing_number().captures(previous) {
        let prefix = &caps[1];
        let digits = &caps[2];
        let number: u64 = digits.parse().map_err(|e: std::num::ParseIntError| {
            Error::TagParse {
                tag: previous.to_string(),
                message: e.to_string(),
            }
        })?;
        let next = number.checked_add(1).ok_or_else(|| Error::TagParse {
            tag: previous.to_string(),
            message: "trailing number overflows".to_string(),
        })?;
        return Ok(format!("{}{}", prefix, next));
    }

    Ok(format!("{}.1", previous))
}

/// Returns the first tag after `previous` for which `is_taken` is false.
///
/// Each retry increments the rejected candidate, never the original input.
/// Gives up with [`Error::TagSpaceExhausted`] once `max_attempts` candidates
/// have been rejected.
pub fn next_free_tag<F>(
    previous: &str,
    branch: &str,
    max_attempts: usize,
    mut is_taken: F,
) -> Result<String>
where
    F: FnMut(&str) -> bool,
{
    let start = next_tag(previous, branch)?;
    let mut candidate = start.clone();
    let mut rejected = 0;

    while is_taken(&candidate) {
        rejected += 1;
        if rejected >= max_attempts {
            return Err(Error::TagSpaceExhausted {
                start,
                attempts: rejected,
            });
        }
        debug!("tag {} already exists, incrementing further", candidate);
        candidate = next_tag(&candidate, branch)?;
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_seed_when_no_previous_tag() {
        assert_eq!(next_tag("", "rel").unwrap(), "v-rel-0.0.1");
    }

    #[test]
    fn test_increments_trailing_number() {
        assert_eq!(next_tag("v-rel-5", "ignored").unwrap(), "v-rel-6");
        assert_eq!(next_tag("v-release-3", "release").unwrap(), "v-release-4");
        assert_eq!(next_tag("v-rel-0.0.1", "rel").unwrap(), "v-rel-0.0.2");
    }

    #[test]
    fn test_increments_whole_trailing_digit_run() {
        assert_eq!(next_tag("v1.9", "x").unwrap(), "v1.10");
        assert_eq!(next_tag("build99", "x").unwrap(), "build100");
    }

    #[test]
    fn test_zero_padding_is_not_preserved() {
        assert_eq!(next_tag("v-007", "x").unwrap(), "v-8");
    }

    #[test]
    fn test_appends_suffix_without_trailing_digits() {
        assert_eq!(next_tag("release", "x").unwrap(), "release.1");
        assert_eq!(next_tag("v2-final", "x").unwrap(), "v2-final.1");
    }

    #[test]
    fn test_non_ascii_digits_are_not_a_trailing_number() {
        assert_eq!(next_tag("v-٣", "x").unwrap(), "v-٣.1");
        assert_eq!(next_tag("rel５", "x").unwrap(), "rel５.1");
        assert_eq!(next_tag("v-٣2", "x").unwrap(), "v-٣3");
    }

    #[test]
    fn test_overflowing_number_is_an_error() {
        let result = next_tag("v99999999999999999999999", "x");
        assert!(matches!(result, Err(Error::TagParse { .. })));
    }

    #[test]
    fn test_free_tag_skips_taken_candidates() {
        let mut seen = Vec::new();
        let tag = next_free_tag("v-rel-1", "rel", 10, |candidate| {
            seen.push(candidate.to_string());
            seen.len() <= 2
        })
        .unwrap();

        assert_eq!(tag, "v-rel-4");
        assert_eq!(seen, vec!["v-rel-2", "v-rel-3", "v-rel-4"]);
    }

    #[test]
    fn test_free_tag_increments_candidate_not_original() {
        // "release" -> "release.1" -> "release.2", never "release.1.1"
        let tag = next_free_tag("release", "x", 10, |c| c == "release.1").unwrap();
        assert_eq!(tag, "release.2");
    }

    #[test]
    fn test_free_tag_is_bounded() {
        let result = next_free_tag("v-rel-1", "rel", 5, |_| true);
        match result {
            Err(Error::TagSpaceExhausted { start, attempts }) => {
                assert_eq!(start, "v-rel-2");
                assert_eq!(attempts, 5);
            }
            other => panic!("expected TagSpaceExhausted, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_trailing_number_increments_by_one(prefix in "[a-z.-]{0,8}", n in 0u64..1_000_000) {
            let tag = format!("{}{}", prefix, n);
            prop_assert_eq!(next_tag(&tag, "b").unwrap(), format!("{}{}", prefix, n + 1));
        }

        #[test]
        fn prop_next_tag_differs_from_previous(previous in "[a-zA-Z0-9.-]{1,16}") {
            let next = next_tag(&previous, "b").unwrap();
            prop_assert_ne!(next, previous);
        }
    }
}
