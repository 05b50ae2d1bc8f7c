//! Content-window extraction.
//!
//! Papers carry title-page boilerplate before the abstract and a reference
//! list after the body; neither is useful prose. The window runs from the
//! first section-start keyword to the first reference-section keyword, and
//! the caller is told when the references were reached so it can stop
//! scanning the document's remaining pages.

use once_cell::sync::Lazy;
use regex::Regex;

/// Keywords that open the content of interest.
static START_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new("(?i)abstract|resumen|introduction|introducción").unwrap());

/// Keywords that open the reference section.
static END_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new("(?i)references|bibliography|referencias|bibliografía").unwrap());

/// The extracted window plus whether the reference section was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentWindow<'a> {
    pub text: &'a str,
    /// True once a reference-section keyword was seen; the caller should
    /// not scan this document's remaining pages for content.
    pub reached_references: bool,
}

/// Locate the content window of one page's cleaned text.
///
/// - start and end keyword found: text between them, references reached;
/// - only start: text from the start keyword to the end of input;
/// - only end: text before the keyword (a bibliography-continuation page),
///   references reached;
/// - neither: the whole input.
///
/// Keywords are matched case-insensitively on the input itself, so the
/// offsets are valid regardless of characters whose case folding changes
/// their byte length.
pub fn content_window(text: &str) -> ContentWindow<'_> {
    let begin = START_KEYWORDS.find(text).map(|m| m.start()).unwrap_or(0);

    // The end keyword only counts at or after the start keyword.
    match END_KEYWORDS.find_at(text, begin) {
        Some(end) => ContentWindow {
            text: &text[begin..end.start()],
            reached_references: true,
        },
        None => ContentWindow {
            text: &text[begin..],
            reached_references: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_between_abstract_and_references() {
        let text = "Title page junk\nAbstract\nReal content\nReferences\n[1] ...";
        let window = content_window(text);

        assert_eq!(window.text, "Abstract\nReal content\n");
        assert!(window.reached_references);
    }

    #[test]
    fn start_only_runs_to_end_of_input() {
        let text = "Junk\nIntroduction\nBody continues here";
        let window = content_window(text);

        assert_eq!(window.text, "Introduction\nBody continues here");
        assert!(!window.reached_references);
    }

    #[test]
    fn no_keywords_returns_whole_input() {
        let text = "Mid-document page with plain prose.";
        let window = content_window(text);

        assert_eq!(window.text, text);
        assert!(!window.reached_references);
    }

    #[test]
    fn end_only_truncates_and_signals_stop() {
        let text = "Trailing prose.\nBibliography\n[2] Doe 2019";
        let window = content_window(text);

        assert_eq!(window.text, "Trailing prose.\n");
        assert!(window.reached_references);
    }

    #[test]
    fn keywords_match_case_insensitively() {
        let text = "ABSTRACT here\nmore\nREFERENCES\nlist";
        let window = content_window(text);

        assert_eq!(window.text, "ABSTRACT here\nmore\n");
        assert!(window.reached_references);
    }

    #[test]
    fn earliest_start_keyword_wins() {
        let text = "Introduction first\nAbstract later\nReferences\nend";
        let window = content_window(text);

        assert!(window.text.starts_with("Introduction first"));
    }

    #[test]
    fn spanish_keywords_recognized() {
        let text = "Portada\nResumen\nContenido real\nReferencias\n[1]";
        let window = content_window(text);

        assert_eq!(window.text, "Resumen\nContenido real\n");
        assert!(window.reached_references);
    }

    #[test]
    fn length_changing_casefolds_before_keyword_keep_offsets_valid() {
        // 'ẞ' (U+1E9E) lowercases to the shorter 'ß'; text containing it
        // before a keyword must not shift or break the window slice.
        let text = "\u{1E9E}\u{1E9E}\u{00E9} Abstract\nReal content\nReferences";
        let window = content_window(text);

        assert_eq!(window.text, "Abstract\nReal content\n");
        assert!(window.reached_references);
    }

    #[test]
    fn kelvin_sign_in_prose_keeps_offsets_valid() {
        // U+212A (KELVIN SIGN) lowercases to plain 'k'.
        let text = "Measured at 300\u{212A} ambient\nIntroduction\nBody\nReferences";
        let window = content_window(text);

        assert_eq!(window.text, "Introduction\nBody\n");
        assert!(window.reached_references);
    }
}
