//! Content-addressed vector store.
//!
//! Segment records are embedded and stored under an id derived from their
//! content, which makes re-ingestion idempotent. Layout:
//!
//! - `embeddings`: `TextEmbedder` trait and the fastembed-backed model
//! - `index`: in-memory vector index with cosine top-k search
//! - `persist`: binary file I/O under the databases root
//! - `content`: the high-level `ContentAddressedStore`

pub mod embeddings;
mod content;
mod index;
mod persist;

pub use content::{ContentAddressedStore, QueryHit, StoreError, Upsert};
pub use embeddings::{EmbedError, FastembedEmbedder, TextEmbedder};
pub use index::{IndexError, VectorEntry, VectorIndex};
pub use persist::{IndexPersistence, PersistError};

/// Default embedding model name.
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Default number of query results.
pub const DEFAULT_TOP_K: usize = 5;
