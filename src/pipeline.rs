//! Ingestion orchestration.
//!
//! Walks a directory tree, turns each PDF into segment records via
//! clean → window → segment → attach, and reports per-document failures
//! without aborting the run. Results go into a caller-supplied
//! accumulator; the pipeline itself holds no run state.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::citation::is_own_citation;
use crate::clean::{clean_page, PageProfile};
use crate::extractor::{ExtractorError, MetadataExtractor};
use crate::loader::{DocumentLoader, LoaderError};
use crate::records::{DocumentMetadata, SegmentRecord};
use crate::section::content_window;
use crate::segment::{extract_units, SegmentMode};

/// Recognized document extension. Anything else is counted, not opened.
const DOCUMENT_EXTENSION: &str = "pdf";

/// Characters of the first page handed to the metadata extractor.
const METADATA_SNIPPET_CHARS: usize = 1000;

/// Failure that aborts one document, never the run.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Document load failed: {0}")]
    Load(#[from] LoaderError),

    #[error("Metadata extraction failed: {0}")]
    Metadata(#[from] ExtractorError),
}

/// What happened during one directory run.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Documents fully processed.
    pub processed: Vec<PathBuf>,
    /// Documents aborted, with the failure that aborted them.
    pub skipped: Vec<(PathBuf, DocumentError)>,
    /// Files with an unrecognized extension, tracked but not opened.
    pub other_files: usize,
    /// Segment records appended to the accumulator.
    pub records_emitted: usize,
}

/// Deterministic segmentation pipeline over a directory of papers.
pub struct Pipeline<'a> {
    loader: &'a dyn DocumentLoader,
    extractor: &'a dyn MetadataExtractor,
    mode: SegmentMode,
    self_citation_threshold: f64,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        loader: &'a dyn DocumentLoader,
        extractor: &'a dyn MetadataExtractor,
        mode: SegmentMode,
        self_citation_threshold: f64,
    ) -> Self {
        Self {
            loader,
            extractor,
            mode,
            self_citation_threshold,
        }
    }

    /// Process every recognized document under `dir`, appending emitted
    /// records to `records`.
    ///
    /// A failing document is logged, recorded in the report and skipped;
    /// records from documents processed before it are retained.
    pub fn run(
        &self,
        dir: &Path,
        records: &mut Vec<SegmentRecord>,
    ) -> std::io::Result<IngestReport> {
        let mut documents = Vec::new();
        let mut report = IngestReport::default();

        collect_files(dir, &mut documents, &mut report.other_files)?;
        documents.sort();

        for path in documents {
            match self.process_document(&path, records) {
                Ok(emitted) => {
                    log::info!("Processed {} ({} records)", path.display(), emitted);
                    report.records_emitted += emitted;
                    report.processed.push(path);
                }
                Err(err) => {
                    log::warn!("Skipping {}: {}", path.display(), err);
                    report.skipped.push((path, err));
                }
            }
        }

        Ok(report)
    }

    /// Run the per-document pipeline, returning the number of records
    /// emitted for this document.
    fn process_document(
        &self,
        path: &Path,
        records: &mut Vec<SegmentRecord>,
    ) -> Result<usize, DocumentError> {
        let pages = self.loader.load_pages(path)?;

        let snippet = first_chars(pages.first().map(String::as_str).unwrap_or(""), METADATA_SNIPPET_CHARS);
        let metadata = self.extractor.extract(snippet)?;

        let profile = PageProfile::from_pages(&pages);

        let mut phrase_number = 0u32;
        let mut emitted = 0usize;

        for page in &pages {
            let cleaned = clean_page(page, &profile);
            let window = content_window(&cleaned);

            for unit in extract_units(window.text, self.mode) {
                if self.reads_as_own_citation(&unit, &metadata) {
                    continue;
                }

                phrase_number += 1;
                records.push(SegmentRecord::attach(&unit, &metadata, phrase_number));
                emitted += 1;
            }

            if window.reached_references {
                // Remaining pages are bibliography; stop this document only.
                break;
            }
        }

        Ok(emitted)
    }

    /// Units restating the paper's own citation are noise, not content.
    fn reads_as_own_citation(&self, unit: &str, metadata: &DocumentMetadata) -> bool {
        metadata
            .citation
            .as_deref()
            .map(|own| is_own_citation(unit, own, self.self_citation_threshold))
            .unwrap_or(false)
    }
}

/// Recursively gather recognized documents under `dir`, counting the rest.
fn collect_files(
    dir: &Path,
    documents: &mut Vec<PathBuf>,
    other_files: &mut usize,
) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, documents, other_files)?;
        } else if has_document_extension(&path) {
            documents.push(path);
        } else {
            *other_files += 1;
        }
    }
    Ok(())
}

fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
        .unwrap_or(false)
}

/// Prefix of `text` of at most `n` characters, on a char boundary.
fn first_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Write records as a plain-text dump: a `Sentence:` line, a `Metadata:`
/// line, then a blank separator. A debugging/export affordance, not a
/// machine-parseable format.
pub fn export_records(records: &[SegmentRecord], out: &mut impl Write) -> std::io::Result<()> {
    for record in records {
        let metadata = serde_json::to_string(&record.metadata)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        writeln!(out, "Sentence: {}", record.sentence)?;
        writeln!(out, "Metadata: {}", metadata)?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Loader serving canned page sets keyed by file name.
    struct StubLoader {
        documents: HashMap<String, Vec<String>>,
    }

    impl DocumentLoader for StubLoader {
        fn load_pages(&self, path: &Path) -> Result<Vec<String>, LoaderError> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            self.documents
                .get(&name)
                .cloned()
                .ok_or_else(|| LoaderError::Open(format!("no such document: {}", name)))
        }
    }

    /// Extractor returning fixed metadata, or failing on demand.
    struct StubExtractor {
        metadata: DocumentMetadata,
        fail: bool,
    }

    impl MetadataExtractor for StubExtractor {
        fn extract(&self, _first_page: &str) -> Result<DocumentMetadata, ExtractorError> {
            if self.fail {
                Err(ExtractorError::EmptyReply)
            } else {
                Ok(self.metadata.clone())
            }
        }
    }

    fn doc_metadata() -> DocumentMetadata {
        DocumentMetadata {
            title: Some("Shorelines on Mars".to_string()),
            authors: vec!["Smith, J.".to_string()],
            year: Some("2020".to_string()),
            citation: Some("Smith, J. (2020). Shorelines on Mars. Icarus.".to_string()),
        }
    }

    fn write_placeholder(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"placeholder").unwrap();
        path
    }

    #[test]
    fn processes_document_and_numbers_phrases_across_pages() {
        let dir = tempfile::tempdir().unwrap();
        write_placeholder(dir.path(), "paper.pdf");

        let loader = StubLoader {
            documents: HashMap::from([(
                "paper.pdf".to_string(),
                vec![
                    "Journal Header\nAbstract\nWater flowed on Mars.\nJournal Footer".to_string(),
                    "Journal Header\nThe shorelines imply oceans.\nJournal Footer".to_string(),
                ],
            )]),
        };
        let extractor = StubExtractor {
            metadata: doc_metadata(),
            fail: false,
        };

        let pipeline = Pipeline::new(&loader, &extractor, SegmentMode::Sentence, 0.8);
        let mut records = Vec::new();
        let report = pipeline.run(dir.path(), &mut records).unwrap();

        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.records_emitted, 2);

        assert_eq!(records[0].sentence, "Abstract\nWater flowed on Mars.");
        assert_eq!(records[0].metadata.phrase_number, 1);
        assert_eq!(records[1].sentence, "The shorelines imply oceans.");
        // Numbering continues across pages within one document.
        assert_eq!(records[1].metadata.phrase_number, 2);
        assert_eq!(records[1].metadata.title.as_deref(), Some("Shorelines on Mars"));
    }

    #[test]
    fn stops_page_loop_at_references() {
        let dir = tempfile::tempdir().unwrap();
        write_placeholder(dir.path(), "paper.pdf");

        let loader = StubLoader {
            documents: HashMap::from([(
                "paper.pdf".to_string(),
                vec![
                    "Header\nAbstract\nReal content here.\nReferences\nIgnored tail".to_string(),
                    "Header\nPure bibliography page that should never be read.".to_string(),
                ],
            )]),
        };
        let extractor = StubExtractor {
            metadata: doc_metadata(),
            fail: false,
        };

        let pipeline = Pipeline::new(&loader, &extractor, SegmentMode::Sentence, 0.8);
        let mut records = Vec::new();
        pipeline.run(dir.path(), &mut records).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sentence, "Abstract\nReal content here.");
    }

    #[test]
    fn metadata_failure_skips_document_not_run() {
        let dir = tempfile::tempdir().unwrap();
        write_placeholder(dir.path(), "bad.pdf");

        let loader = StubLoader {
            documents: HashMap::from([(
                "bad.pdf".to_string(),
                vec!["Abstract\nSome content.".to_string()],
            )]),
        };
        let extractor = StubExtractor {
            metadata: doc_metadata(),
            fail: true,
        };

        let pipeline = Pipeline::new(&loader, &extractor, SegmentMode::Sentence, 0.8);
        let mut records = Vec::new();
        let report = pipeline.run(dir.path(), &mut records).unwrap();

        assert!(records.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0].1, DocumentError::Metadata(_)));
    }

    #[test]
    fn load_failure_skips_document_and_keeps_earlier_results() {
        let dir = tempfile::tempdir().unwrap();
        write_placeholder(dir.path(), "a_good.pdf");
        write_placeholder(dir.path(), "b_missing.pdf");

        // Only the first document is known to the loader.
        let loader = StubLoader {
            documents: HashMap::from([(
                "a_good.pdf".to_string(),
                vec!["Abstract\nGood content survives.".to_string()],
            )]),
        };
        let extractor = StubExtractor {
            metadata: doc_metadata(),
            fail: false,
        };

        let pipeline = Pipeline::new(&loader, &extractor, SegmentMode::Sentence, 0.8);
        let mut records = Vec::new();
        let report = pipeline.run(dir.path(), &mut records).unwrap();

        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0].1, DocumentError::Load(_)));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn non_pdf_files_are_counted_not_opened() {
        let dir = tempfile::tempdir().unwrap();
        write_placeholder(dir.path(), "notes.txt");
        write_placeholder(dir.path(), "data.csv");

        let loader = StubLoader {
            documents: HashMap::new(),
        };
        let extractor = StubExtractor {
            metadata: doc_metadata(),
            fail: false,
        };

        let pipeline = Pipeline::new(&loader, &extractor, SegmentMode::Sentence, 0.8);
        let mut records = Vec::new();
        let report = pipeline.run(dir.path(), &mut records).unwrap();

        assert_eq!(report.other_files, 2);
        assert!(report.processed.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn own_citation_units_are_dropped_and_consume_no_number() {
        let dir = tempfile::tempdir().unwrap();
        write_placeholder(dir.path(), "paper.pdf");

        let loader = StubLoader {
            documents: HashMap::from([(
                "paper.pdf".to_string(),
                vec![
                    "Abstract\nSmith, J (2020) Shorelines on Mars Icarus.\nActual findings follow here."
                        .to_string(),
                ],
            )]),
        };
        let extractor = StubExtractor {
            metadata: doc_metadata(),
            fail: false,
        };

        let pipeline = Pipeline::new(&loader, &extractor, SegmentMode::Paragraph, 0.8);
        let mut records = Vec::new();
        pipeline.run(dir.path(), &mut records).unwrap();

        assert_eq!(records.len(), 1);
        assert!(records[0].sentence.contains("Actual findings"));
        assert_eq!(records[0].metadata.phrase_number, 1);
    }

    #[test]
    fn export_format_matches_sentence_metadata_blocks() {
        let records = vec![
            SegmentRecord::attach("First unit.", &doc_metadata(), 1),
            SegmentRecord::attach("Second unit.", &doc_metadata(), 2),
        ];

        let mut out = Vec::new();
        export_records(&records, &mut out).unwrap();
        let dump = String::from_utf8(out).unwrap();

        let blocks: Vec<&str> = dump.trim_end().split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("Sentence: First unit.\nMetadata: {"));
        assert!(blocks[0].contains("\"phrase_number\":1"));
        assert!(blocks[1].starts_with("Sentence: Second unit."));
    }
}
