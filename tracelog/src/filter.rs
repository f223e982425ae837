//! The session category filter language.
//!
//! A filter is a comma-separated list of patterns; `-` prefixes an
//! exclusion. Patterns support `*` (any run of characters) and `?` (one
//! character). `*` deliberately does not reach `disabled-by-default-`
//! categories; those must be named by a pattern that itself starts with
//! the prefix.
//!
//! Examples: `"*"`, `"gpu,cc"`, `"*,-ipc"`,
//! `"disabled-by-default-v8.gc"`, `"*,-disabled-by-default-*,-v8"`.

use crate::category::DISABLED_BY_DEFAULT_PREFIX;
use crate::error::TraceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    included: Vec<String>,
    excluded: Vec<String>,
}

impl CategoryFilter {
    pub fn parse(spec: &str) -> Result<Self, TraceError> {
        let mut included = Vec::new();
        let mut excluded = Vec::new();
        for raw in spec.split(',') {
            let term = raw.trim();
            if term.is_empty() {
                continue;
            }
            if let Some(pattern) = term.strip_prefix('-') {
                if pattern.is_empty() || pattern.starts_with('-') {
                    return Err(TraceError::InvalidFilter(spec.to_string()));
                }
                excluded.push(pattern.to_string());
            } else {
                included.push(term.to_string());
            }
        }
        Ok(CategoryFilter { included, excluded })
    }

    /// Applies the filter to a category group string.
    ///
    /// Any token matching an exclusion turns the whole group off; a
    /// group like `"v8,gpu"` is disabled by `-v8` no matter what else
    /// would allow it. Otherwise one included token is enough. An empty
    /// include list means everything except opt-in categories.
    pub fn is_group_enabled(&self, group: &str) -> bool {
        for token in group.split(',') {
            if self.excluded.iter().any(|p| match_pattern(p, token)) {
                return false;
            }
        }
        if self.included.is_empty() {
            return group
                .split(',')
                .any(|t| !t.starts_with(DISABLED_BY_DEFAULT_PREFIX));
        }
        for token in group.split(',') {
            let opt_in = token.starts_with(DISABLED_BY_DEFAULT_PREFIX);
            for pattern in &self.included {
                if opt_in && !pattern.starts_with(DISABLED_BY_DEFAULT_PREFIX) {
                    continue;
                }
                if match_pattern(pattern, token) {
                    return true;
                }
            }
        }
        false
    }
}

/// Glob match with `*` and `?`, ASCII-byte-wise as category names are.
fn match_pattern(pattern: &str, text: &str) -> bool {
    match_bytes(pattern.as_bytes(), text.as_bytes())
}

fn match_bytes(pattern: &[u8], text: &[u8]) -> bool {
    match (pattern.first(), text.first()) {
        (None, None) => true,
        (Some(b'*'), _) => {
            match_bytes(&pattern[1..], text)
                || (!text.is_empty() && match_bytes(pattern, &text[1..]))
        }
        (Some(b'?'), Some(_)) => match_bytes(&pattern[1..], &text[1..]),
        (Some(&p), Some(&t)) if p == t => match_bytes(&pattern[1..], &text[1..]),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("*", "gpu", true)]
    #[case("*", "disabled-by-default-v8.gc", false)]
    #[case("gpu", "gpu", true)]
    #[case("gpu", "cc", false)]
    #[case("g?u", "gpu", true)]
    #[case("g?u", "gnu", true)]
    #[case("g?u", "glue", false)]
    #[case("cc*", "cc.debug", true)]
    #[case("disabled-by-default-v8.gc", "disabled-by-default-v8.gc", true)]
    #[case("disabled-by-default-*", "disabled-by-default-v8.gc", true)]
    fn include_matching(#[case] filter: &str, #[case] group: &str, #[case] enabled: bool) {
        let filter = CategoryFilter::parse(filter).unwrap();
        assert_eq!(filter.is_group_enabled(group), enabled);
    }

    #[rstest]
    #[case("*,-v8", "v8", false)]
    #[case("*,-v8", "v8,gpu", false)]
    #[case("*,-v8", "gpu", true)]
    #[case("*,-disabled-by-default-*,-v8", "disabled-by-default-cc.debug", false)]
    #[case("*,-disabled-by-default-*,-v8", "cc", true)]
    #[case("-ipc", "ipc", false)]
    #[case("-ipc", "gpu", true)]
    fn exclusions_win_over_inclusions(#[case] filter: &str, #[case] group: &str, #[case] enabled: bool) {
        let filter = CategoryFilter::parse(filter).unwrap();
        assert_eq!(filter.is_group_enabled(group), enabled);
    }

    #[rstest]
    fn empty_filter_enables_everything_but_opt_in() {
        let filter = CategoryFilter::parse("").unwrap();
        assert!(filter.is_group_enabled("gpu"));
        assert!(!filter.is_group_enabled("disabled-by-default-v8.gc"));
    }

    #[rstest]
    fn comma_group_enabled_through_any_token() {
        let filter = CategoryFilter::parse("gpu").unwrap();
        assert!(filter.is_group_enabled("v8,gpu"));
        assert!(!filter.is_group_enabled("v8,cc"));
    }

    #[rstest]
    #[case("-")]
    #[case("gpu,-")]
    #[case("--v8")]
    fn bad_grammar_is_rejected(#[case] spec: &str) {
        assert!(matches!(
            CategoryFilter::parse(spec),
            Err(TraceError::InvalidFilter(_))
        ));
    }

    #[rstest]
    fn stray_commas_are_tolerated() {
        let filter = CategoryFilter::parse(",gpu,,cc,").unwrap();
        assert!(filter.is_group_enabled("gpu"));
        assert!(filter.is_group_enabled("cc"));
        assert!(!filter.is_group_enabled("net"));
    }

    #[rstest]
    fn equality_detects_identical_specs() {
        let a = CategoryFilter::parse("gpu,-v8").unwrap();
        let b = CategoryFilter::parse("gpu,-v8").unwrap();
        let c = CategoryFilter::parse("gpu").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
