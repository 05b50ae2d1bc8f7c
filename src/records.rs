//! Record types shared across the ingestion pipeline and the vector store.
//!
//! `DocumentMetadata` is produced once per document by the metadata
//! extractor; every segment of that document carries a copy of it plus its
//! own `phrase_number`.

use serde::{Deserialize, Serialize};

/// Document-level metadata extracted from a paper's first page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    /// Authors in the order they appear on the paper.
    pub authors: Vec<String>,
    pub year: Option<String>,
    /// The paper's own citation in APA format.
    pub citation: Option<String>,
}

/// Per-segment metadata: the document metadata plus the segment's position.
///
/// Field order is the canonical serialization order used for content
/// addressing, so reordering fields changes every stored id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub year: Option<String>,
    pub citation: Option<String>,
    /// 1-based emission order within one document's processing run.
    /// Dropped units do not consume a number.
    pub phrase_number: u32,
}

/// One retained text unit paired with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub sentence: String,
    pub metadata: SegmentMetadata,
}

impl SegmentRecord {
    /// Pair a text unit with its document's metadata and position.
    ///
    /// This is the only place the `SegmentMetadata` shape is assembled;
    /// it does no filtering, the unit is stored as given.
    pub fn attach(unit: &str, doc: &DocumentMetadata, phrase_number: u32) -> Self {
        Self {
            sentence: unit.to_string(),
            metadata: SegmentMetadata {
                title: doc.title.clone(),
                authors: doc.authors.clone(),
                year: doc.year.clone(),
                citation: doc.citation.clone(),
                phrase_number,
            },
        }
    }
}
