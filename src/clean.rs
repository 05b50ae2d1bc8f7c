//! Repeated header/footer removal.
//!
//! PDF extraction leaves running headers and footers (journal name, page
//! header, copyright line) on every page. The profile finds the most
//! frequent first and last line across a document's pages; cleaning a page
//! strips at most one leading and one trailing line matching that majority.

use std::collections::HashMap;

/// Majority first/last line across all pages of one document.
#[derive(Debug, Clone, Default)]
pub struct PageProfile {
    header: Option<String>,
    footer: Option<String>,
}

impl PageProfile {
    /// Build a profile from the full ordered page set of one document.
    ///
    /// Only non-empty first/last lines participate in the majority vote.
    pub fn from_pages(pages: &[String]) -> Self {
        let header = most_frequent(pages.iter().filter_map(|p| first_line(p)));
        let footer = most_frequent(pages.iter().filter_map(|p| last_line(p)));
        Self { header, footer }
    }

    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    pub fn footer(&self) -> Option<&str> {
        self.footer.as_deref()
    }
}

/// Remove the majority header and footer lines from one page.
///
/// A removal that would leave the page without any content is skipped, so
/// a single-line page whose sole line matches both header and footer
/// survives intact.
pub fn clean_page(page: &str, profile: &PageProfile) -> String {
    let mut lines: Vec<&str> = page.lines().collect();

    if let Some(header) = profile.header() {
        if lines.len() > 1 && lines.first().map(|l| l.trim()) == Some(header) {
            lines.remove(0);
        }
    }

    if let Some(footer) = profile.footer() {
        if lines.len() > 1 && lines.last().map(|l| l.trim()) == Some(footer) {
            lines.pop();
        }
    }

    lines.join("\n")
}

fn first_line(page: &str) -> Option<&str> {
    page.lines().map(str::trim).find(|l| !l.is_empty())
}

fn last_line(page: &str) -> Option<&str> {
    page.lines().map(str::trim).rev().find(|l| !l.is_empty())
}

/// Mode of an iterator of lines. Ties resolve to the lexically smaller
/// line so the profile is deterministic across runs.
fn most_frequent<'a>(lines: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in lines {
        *counts.entry(line).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .max_by(|(a_line, a_count), (b_line, b_count)| {
            a_count.cmp(b_count).then(b_line.cmp(a_line))
        })
        .map(|(line, _)| line.to_string())
}
