//! In-memory vector index keyed by content-derived ids.
//!
//! Each entry carries the stored text and metadata alongside its
//! embedding, since queries must return them. Insertion is
//! insert-if-absent: the id is the dedup key, so an existing id means the
//! exact (text, metadata) pair is already indexed.

use std::collections::HashMap;

use crate::records::SegmentMetadata;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Cannot store or search with zero-norm vector")]
    ZeroNormVector,
}

/// A stored vector with its source text and metadata.
#[derive(Debug, Clone)]
pub struct VectorEntry {
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: SegmentMetadata,
}

/// Similarity hit, highest score first in search results.
#[derive(Debug, Clone)]
pub struct Hit<'a> {
    pub id: &'a str,
    pub score: f32,
    pub entry: &'a VectorEntry,
}

/// In-memory index over content-addressed entries.
pub struct VectorIndex {
    entries: HashMap<String, VectorEntry>,
    dimensions: usize,
}

impl VectorIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            entries: HashMap::new(),
            dimensions,
        }
    }

    pub fn with_capacity(dimensions: usize, capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            dimensions,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&VectorEntry> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VectorEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert an entry if its id is absent.
    ///
    /// Returns false (and leaves the existing entry untouched) when the id
    /// is already present. Dimension and zero-norm violations are errors.
    pub fn insert_new(&mut self, id: String, entry: VectorEntry) -> Result<bool, IndexError> {
        if entry.embedding.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: entry.embedding.len(),
            });
        }
        if l2_norm(&entry.embedding) < f32::EPSILON {
            return Err(IndexError::ZeroNormVector);
        }

        if self.entries.contains_key(&id) {
            return Ok(false);
        }
        self.entries.insert(id, entry);
        Ok(true)
    }

    /// Top-k entries by cosine similarity, highest first.
    ///
    /// An empty index yields an empty result, not an error. Ties resolve
    /// by id so result order is deterministic.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit<'_>>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }

        let query_norm = l2_norm(query);
        if query_norm < f32::EPSILON {
            return Err(IndexError::ZeroNormVector);
        }

        let mut hits: Vec<Hit<'_>> = self
            .entries
            .iter()
            .map(|(id, entry)| Hit {
                id: id.as_str(),
                score: cosine_similarity(query, &entry.embedding, query_norm),
                entry,
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(b.id))
        });
        hits.truncate(k);

        Ok(hits)
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine_similarity(query: &[f32], target: &[f32], query_norm: f32) -> f32 {
    let target_norm = l2_norm(target);
    if target_norm < f32::EPSILON {
        return 0.0;
    }

    let dot: f32 = query.iter().zip(target.iter()).map(|(a, b)| a * b).sum();
    dot / (query_norm * target_norm)
}
