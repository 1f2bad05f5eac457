//! Text normalization policies applied before fixed-width encoding.
//!
//! A policy is a pure function from raw caller text to normalized text. The
//! fixed-width encoding and the derivation never look at the raw text, so a
//! new locale or script only needs a new policy.

/// Separator written between the parts of a multi-part value.
pub const PART_SEPARATOR: char = '\u{0}';

/// Character treated as a list separator by [`LatinListPolicy`].
const LIST_SEPARATOR: char = ',';

/// Turns raw caller text into the code points that get encoded.
pub trait NormalizationPolicy {
    /// Normalize a single raw text value.
    fn normalize(&self, raw: &str) -> String;
}

impl<F> NormalizationPolicy for F
where
    F: Fn(&str) -> String,
{
    fn normalize(&self, raw: &str) -> String {
        self(raw)
    }
}

/// Default policy for space-delimited, Latin-range input.
///
/// Commas become spaces, then every run of one or more spaces becomes a single
/// [`PART_SEPARATOR`]. `"John  Apple"` and `"John,Apple"` both normalize to
/// `"John\0Apple"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatinListPolicy;

impl NormalizationPolicy for LatinListPolicy {
    fn normalize(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut in_run = false;
        for ch in raw.chars() {
            if ch == ' ' || ch == LIST_SEPARATOR {
                if !in_run {
                    out.push(PART_SEPARATOR);
                }
                in_run = true;
            } else {
                out.push(ch);
                in_run = false;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_space_becomes_separator() {
        assert_eq!(LatinListPolicy.normalize("John Apple"), "John\0Apple");
    }

    #[test]
    fn space_runs_fold_to_one_separator() {
        assert_eq!(LatinListPolicy.normalize("John     Apple"), "John\0Apple");
    }

    #[test]
    fn commas_fold_with_adjacent_spaces() {
        assert_eq!(LatinListPolicy.normalize("Apple, John"), "Apple\0John");
        assert_eq!(LatinListPolicy.normalize("a,,b"), "a\0b");
    }

    #[test]
    fn leading_and_trailing_runs_are_kept_as_separators() {
        assert_eq!(LatinListPolicy.normalize("  Smith "), "\0Smith\0");
    }

    #[test]
    fn other_whitespace_is_untouched() {
        assert_eq!(LatinListPolicy.normalize("a\tb"), "a\tb");
    }

    #[test]
    fn closures_are_policies() {
        let upper = |raw: &str| raw.to_uppercase();
        assert_eq!(upper.normalize("smith"), "SMITH");
    }
}
