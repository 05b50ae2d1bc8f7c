//! Text segmentation and non-prose noise filtering.
//!
//! Splits a content window into sentence- or paragraph-sized units, then
//! drops figure/table captions and bare bibliographic lines. The boundary
//! heuristics will over/under-split around abbreviations; that is an
//! accepted tradeoff over a full sentence-boundary model.

use once_cell::sync::Lazy;
use regex::Regex;

/// Segmentation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentMode {
    /// Split on `.`/`!`/`?` followed by whitespace and an uppercase letter
    /// or digit.
    #[default]
    Sentence,
    /// Split on a period followed by optional blanks and a newline. Suits
    /// PDF-extracted text where paragraphs are not blank-line-delimited.
    Paragraph,
}

/// Sentence boundary: terminator, whitespace, then the first character of
/// the next sentence. The regex crate has no lookarounds, so the next
/// sentence's first character is part of the match and the split points
/// are computed from the match span.
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+[A-Z0-9]").expect("static regex"));

/// Paragraph boundary: sentence-final period at a line break.
static PARAGRAPH_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.[ \t]*\n").expect("static regex"));

/// Figure/table caption label: "Figure 1.", "Tabla 2.", "Fig. 3." etc.
static CAPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:Figure|Figura|Table|Tabla|Fig)\s*\.?\s*\d+\s*\.").expect("static regex")
});

/// A line that is nothing but a bibliography entry: optional leading
/// "N.", arbitrary text (newlines allowed), a parenthesized four-digit
/// year, optional trailing period.
static BARE_CITATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*(?:\d+\.\s*)?.+\(\d{4}\)\.?\s*$").expect("static regex"));

/// Split `text` into raw units according to `mode`. Units keep their
/// terminating punctuation; no trimming or filtering happens here.
pub fn split_units(text: &str, mode: SegmentMode) -> Vec<&str> {
    match mode {
        SegmentMode::Sentence => split_at_boundaries(text, &SENTENCE_BOUNDARY, 1),
        SegmentMode::Paragraph => split_at_boundaries(text, &PARAGRAPH_BOUNDARY, 0),
    }
}

/// Split `text` at each boundary match. The unit on the left ends one
/// byte into the match (keeping the terminator); the next unit starts
/// `tail` bytes before the match end (`tail` = 1 keeps the sentence's
/// first character, 0 starts after the newline). All boundary characters
/// involved are ASCII, so the byte arithmetic is safe.
fn split_at_boundaries<'a>(text: &'a str, boundary: &Regex, tail: usize) -> Vec<&'a str> {
    let mut units = Vec::new();
    let mut start = 0;

    for m in boundary.find_iter(text) {
        units.push(&text[start..m.start() + 1]);
        start = m.end() - tail;
    }
    units.push(&text[start..]);

    units
}

/// True if the unit is a figure or table caption.
pub fn is_caption(unit: &str) -> bool {
    CAPTION.is_match(unit.trim_start())
}

/// True if the whole unit reads as a bibliography entry.
pub fn is_bare_citation(unit: &str) -> bool {
    BARE_CITATION.is_match(unit)
}

/// Split, trim and filter: only non-empty units that are neither captions
/// nor bare bibliography lines survive, in input order.
pub fn extract_units(text: &str, mode: SegmentMode) -> Vec<String> {
    split_units(text, mode)
        .into_iter()
        .map(str::trim)
        .filter(|unit| !unit.is_empty())
        .filter(|unit| !is_caption(unit))
        .filter(|unit| !is_bare_citation(unit))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_split_on_terminator_and_uppercase() {
        let units = split_units(
            "First sentence. Second one! Third? 4th starts with a digit.",
            SegmentMode::Sentence,
        );
        assert_eq!(
            units,
            vec![
                "First sentence.",
                "Second one!",
                "Third?",
                "4th starts with a digit.",
            ]
        );
    }

    #[test]
    fn sentence_split_ignores_lowercase_continuation() {
        let units = split_units("See fig. 3 for details. Next part.", SegmentMode::Sentence);
        // "fig. 3" has a digit after the period, so the heuristic splits
        // there; "details. Next" splits as well. Accepted over-splitting.
        assert_eq!(units.len(), 3);
    }

    #[test]
    fn paragraph_split_on_period_newline() {
        let units = split_units(
            "First paragraph spans\nlines and ends.\nSecond paragraph.",
            SegmentMode::Paragraph,
        );
        assert_eq!(
            units,
            vec!["First paragraph spans\nlines and ends.", "Second paragraph."]
        );
    }

    #[test]
    fn paragraph_split_allows_trailing_blanks_before_newline() {
        let units = split_units("Ends here.  \nNext.", SegmentMode::Paragraph);
        assert_eq!(units, vec!["Ends here.", "Next."]);
    }

    #[test]
    fn caption_patterns() {
        assert!(is_caption("Figure 1. A plot."));
        assert!(is_caption("Table 2. Results."));
        assert!(is_caption("Fig. 3. Close-up."));
        assert!(is_caption("Figura 4. Un mapa."));
        assert!(is_caption("  Tabla 10. Datos."));

        assert!(!is_caption("The figure shows a trend."));
        assert!(!is_caption("Figures 1-3 are relevant."));
    }

    #[test]
    fn bare_citation_patterns() {
        assert!(is_bare_citation("1. Smith, J. Some Paper (2019)."));
        assert!(is_bare_citation("Smith, J. Some Paper (2019)"));
        assert!(is_bare_citation(
            "12. Long, A., Author, B.\nSpanning two lines (2003)."
        ));

        assert!(!is_bare_citation("Smith found that results improved."));
        // A parenthesized year mid-prose does not make the unit a
        // bibliography line unless the year closes the unit.
        assert!(!is_bare_citation(
            "As shown previously (Smith, 2019), the effect holds."
        ));
    }

    #[test]
    fn extract_units_filters_captions_and_keeps_order() {
        let units = extract_units(
            "Figure 1. A plot.\nThe results show X.",
            SegmentMode::Paragraph,
        );
        assert_eq!(units, vec!["The results show X."]);
    }

    #[test]
    fn extract_units_drops_empty_pieces() {
        let units = extract_units("   \n  ", SegmentMode::Sentence);
        assert!(units.is_empty());
    }

    #[test]
    fn extract_units_drops_bibliography_lines() {
        let text = "Real prose goes here.\n3. Doe, J. Another Work (2001).";
        let units = extract_units(text, SegmentMode::Paragraph);
        assert_eq!(units, vec!["Real prose goes here."]);
    }
}
