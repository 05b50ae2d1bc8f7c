//! Self-citation detection.
//!
//! Papers restate their own citation in headers, footers and reference
//! lists; those lines must not be mistaken for content or for citations of
//! other works. Similarity is a character-level longest-common-subsequence
//! ratio over whitespace-normalized strings, so punctuation and formatting
//! differences between two renderings of the same citation score high
//! while genuinely different works score low.

/// Default similarity threshold above which a candidate counts as the
/// document's own citation.
pub const DEFAULT_SELF_CITATION_THRESHOLD: f64 = 0.8;

/// True iff `candidate` reads as the same work as `own_citation`.
///
/// The comparison is strict: a ratio exactly at the threshold is not a
/// match.
pub fn is_own_citation(candidate: &str, own_citation: &str, threshold: f64) -> bool {
    similarity_ratio(candidate, own_citation) > threshold
}

/// Character-level sequence similarity in [0, 1].
///
/// `2 * LCS(a, b) / (|a| + |b|)` over whitespace-normalized inputs. Two
/// empty strings are identical by convention.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = normalize_whitespace(a).chars().collect();
    let b: Vec<char> = normalize_whitespace(b).chars().collect();

    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let lcs = lcs_length(&a, &b);
    (2 * lcs) as f64 / (a.len() + b.len()) as f64
}

/// Collapse runs of whitespace to single spaces and trim the ends.
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Longest common subsequence length, two-row dynamic programming.
fn lcs_length(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_citation_with_different_formatting_matches() {
        assert!(is_own_citation(
            "Smith, J. (2020). Title. Journal.",
            "Smith, J 2020 Title Journal",
            DEFAULT_SELF_CITATION_THRESHOLD,
        ));
    }

    #[test]
    fn unrelated_citations_do_not_match() {
        assert!(!is_own_citation(
            "Smith, J. (2020). Shorelines on Mars. Icarus.",
            "García, M., & Lee, K. (1998). Deep learning for protein folding. Nature.",
            DEFAULT_SELF_CITATION_THRESHOLD,
        ));
    }

    #[test]
    fn identical_strings_score_one() {
        let citation = "Doe, J. (2019). A paper.";
        assert!((similarity_ratio(citation, citation) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn whitespace_runs_are_normalized() {
        let ratio = similarity_ratio("Doe,  J.\n(2019).   A paper.", "Doe, J. (2019). A paper.");
        assert!((ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_inputs() {
        assert!((similarity_ratio("", "") - 1.0).abs() < f64::EPSILON);
        assert!(similarity_ratio("Doe (2019)", "") < f64::EPSILON);
    }

    #[test]
    fn threshold_is_strict() {
        // "ab" vs "ab" gives exactly 1.0; a threshold of 1.0 must reject.
        assert!(!is_own_citation("ab", "ab", 1.0));
    }

    #[test]
    fn lcs_basic() {
        let a: Vec<char> = "abcde".chars().collect();
        let b: Vec<char> = "ace".chars().collect();
        assert_eq!(lcs_length(&a, &b), 3);
    }
}
