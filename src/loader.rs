//! Document loading seam.
//!
//! The pipeline only needs an ordered sequence of page texts; how they are
//! produced is behind the `DocumentLoader` trait so tests can feed pages
//! directly.

use std::path::Path;

/// Errors raised while turning a file into page texts.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("Failed to open document: {0}")]
    Open(String),

    #[error("Failed to extract text from page {page}: {reason}")]
    PageText { page: u32, reason: String },

    #[error("Document has no pages")]
    NoPages,
}

/// Turns a file into the ordered texts of its pages.
///
/// Implementations fail loudly on unreadable or corrupt files; the caller
/// decides whether that aborts the run or only the document.
pub trait DocumentLoader {
    fn load_pages(&self, path: &Path) -> Result<Vec<String>, LoaderError>;
}

/// PDF loader backed by lopdf's per-page text extraction.
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn load_pages(&self, path: &Path) -> Result<Vec<String>, LoaderError> {
        let doc = lopdf::Document::load(path).map_err(|e| LoaderError::Open(e.to_string()))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(LoaderError::NoPages);
        }

        let mut pages = Vec::with_capacity(page_numbers.len());
        for page in page_numbers {
            let text = doc.extract_text(&[page]).map_err(|e| LoaderError::PageText {
                page,
                reason: e.to_string(),
            })?;
            pages.push(text);
        }

        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unreadable_file_fails_loudly() {
        let loader = PdfLoader;
        let result = loader.load_pages(Path::new("/nonexistent/paper.pdf"));
        assert!(matches!(result, Err(LoaderError::Open(_))));
    }

    #[test]
    fn corrupt_file_fails_loudly() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not a pdf").unwrap();

        let loader = PdfLoader;
        let result = loader.load_pages(file.path());
        assert!(matches!(result, Err(LoaderError::Open(_))));
    }
}
