//! The content-addressed store: deterministic ids, idempotent upsert,
//! similarity query, and named persistence.

use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::records::SegmentMetadata;
use crate::store::embeddings::{EmbedError, TextEmbedder};
use crate::store::index::{IndexError, VectorEntry, VectorIndex};
use crate::store::persist::{IndexPersistence, PersistError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Cannot store empty text")]
    EmptyText,

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbedError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistError),
}

/// Outcome of an upsert. A duplicate id is success, not an error: the
/// pair was already indexed and `inserted` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upsert {
    pub id: String,
    pub inserted: bool,
}

/// One query result with the stored payload.
#[derive(Debug, Clone, serde::Serialize)]
pub struct QueryHit {
    pub id: String,
    pub score: f32,
    pub sentence: String,
    pub metadata: SegmentMetadata,
}

/// Deduplicated vector store addressed by content.
///
/// An entry's id is a deterministic hash of its trimmed text and the
/// canonical JSON serialization of its metadata, so re-ingesting the same
/// pair always lands on the same id and the second insert is a no-op.
pub struct ContentAddressedStore<E> {
    embedder: E,
    index: VectorIndex,
    persistence: IndexPersistence,
}

impl<E: TextEmbedder> ContentAddressedStore<E> {
    /// Open the named index under the databases root, loading it when a
    /// saved copy exists and starting fresh otherwise.
    pub fn open(embedder: E, databases_root: PathBuf, name: &str) -> Result<Self, StoreError> {
        let persistence = IndexPersistence::new(databases_root);

        let index = if persistence.exists(name) {
            let index = persistence.load(name, &embedder.identity(), embedder.dimensions())?;
            log::info!("Loaded index '{}' with {} entries", name, index.len());
            index
        } else {
            log::info!("No saved index '{}', starting fresh", name);
            VectorIndex::new(embedder.dimensions())
        };

        Ok(Self {
            embedder,
            index,
            persistence,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Insert a (text, metadata) pair, embedding it unless its id is
    /// already present.
    ///
    /// Empty or whitespace-only text is rejected with a typed error. A
    /// duplicate id skips the embedder entirely and reports
    /// `inserted: false`. Embedding failure propagates and leaves the
    /// index unchanged.
    pub fn upsert(
        &mut self,
        text: &str,
        metadata: &SegmentMetadata,
    ) -> Result<Upsert, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::EmptyText);
        }

        let id = vector_id(text, metadata);
        if self.index.contains(&id) {
            log::debug!("Entry {} already indexed, skipping", &id[..12]);
            return Ok(Upsert {
                id,
                inserted: false,
            });
        }

        let embedding = self.embedder.embed(text)?;
        let inserted = self.index.insert_new(
            id.clone(),
            VectorEntry {
                embedding,
                text: text.to_string(),
                metadata: metadata.clone(),
            },
        )?;

        Ok(Upsert { id, inserted })
    }

    /// Top-k entries most similar to `text`. An empty index returns an
    /// empty list, not an error.
    pub fn query(&self, text: &str, k: usize) -> Result<Vec<QueryHit>, StoreError> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(text)?;
        let hits = self.index.search(&query_embedding, k)?;

        Ok(hits
            .into_iter()
            .map(|hit| QueryHit {
                id: hit.id.to_string(),
                score: hit.score,
                sentence: hit.entry.text.clone(),
                metadata: hit.entry.metadata.clone(),
            })
            .collect())
    }

    /// Persist the index under `name`.
    pub fn save(&self, name: &str) -> Result<(), StoreError> {
        self.persistence
            .save(name, &self.index, &self.embedder.identity())?;
        log::info!("Saved index '{}' with {} entries", name, self.index.len());
        Ok(())
    }
}

/// Deterministic id for a (text, metadata) pair: SHA256 over the trimmed
/// text and the canonical JSON of the metadata, hex-encoded.
pub fn vector_id(text: &str, metadata: &SegmentMetadata) -> String {
    let canonical_metadata =
        serde_json::to_string(metadata).expect("segment metadata serializes infallibly");

    let mut hasher = Sha256::new();
    hasher.update(text.trim().as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical_metadata.as_bytes());

    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
