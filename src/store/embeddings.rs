//! Embedding seam and the fastembed-backed implementation.
//!
//! The store only needs text-to-vector plus a stable identity for the
//! model, so both live behind `TextEmbedder` and tests can substitute a
//! deterministic stub.

use std::path::PathBuf;
use std::sync::Mutex;

use fastembed::{InitOptions, TextEmbedding};

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("Model initialization failed: {0}")]
    InitFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Invalid model name: {0}")]
    InvalidModel(String),
}

/// Maps text to a fixed-length vector.
///
/// Repeated calls on identical text must be stable enough for similarity
/// search; bit-identical output is not required. `identity()` names the
/// model so persistence can refuse an index built by a different one.
pub trait TextEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
    fn dimensions(&self) -> usize;
    fn identity(&self) -> [u8; 32];
}

/// Local embedding model via fastembed. Downloads model files into a
/// cache directory on first use.
///
/// Wrapped in a Mutex because fastembed's `embed()` takes `&mut self`.
pub struct FastembedEmbedder {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

impl FastembedEmbedder {
    pub fn new(model_name: &str, cache_dir: PathBuf) -> Result<Self, EmbedError> {
        let model_enum = parse_model_name(model_name)?;

        let models_dir = cache_dir.join("models");
        std::fs::create_dir_all(&models_dir).map_err(|e| {
            EmbedError::InitFailed(format!("Failed to create models directory: {}", e))
        })?;

        let options = InitOptions::new(model_enum)
            .with_cache_dir(models_dir)
            .with_show_download_progress(true);

        let mut model = TextEmbedding::try_new(options)
            .map_err(|e| EmbedError::InitFailed(e.to_string()))?;

        let dimensions = probe_dimensions(&mut model)?;

        Ok(Self {
            model: Mutex::new(model),
            model_name: model_name.to_string(),
            dimensions,
        })
    }

    pub fn name(&self) -> &str {
        &self.model_name
    }
}

impl TextEmbedder for FastembedEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut model = self
            .model
            .lock()
            .map_err(|e| EmbedError::EmbeddingFailed(format!("Model lock poisoned: {}", e)))?;

        let embeddings = model
            .embed(vec![text], None)
            .map_err(|e| EmbedError::EmbeddingFailed(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::EmbeddingFailed("No embedding returned".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn identity(&self) -> [u8; 32] {
        model_identity(&self.model_name)
    }
}

/// SHA256 of a model name, the persistence header's model check.
pub fn model_identity(model_name: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(model_name.as_bytes());
    hasher.finalize().into()
}

fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel, EmbedError> {
    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "all-minilm-l6-v2-q" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2Q),
        "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        "bge-large-en-v1.5" => Ok(fastembed::EmbeddingModel::BGELargeENV15),
        _ => Err(EmbedError::InvalidModel(format!(
            "Unknown model: {}. Supported: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5",
            name
        ))),
    }
}

/// Embed a probe string once to learn the output dimensions.
fn probe_dimensions(model: &mut TextEmbedding) -> Result<usize, EmbedError> {
    let probe = model
        .embed(vec!["probe"], None)
        .map_err(|e| EmbedError::InitFailed(format!("Failed to probe dimensions: {}", e)))?;

    probe
        .first()
        .map(|v| v.len())
        .ok_or_else(|| EmbedError::InitFailed("Model returned no embedding".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_model_name_rejected() {
        let dir = std::env::temp_dir().join("papers-embed-invalid");
        let result = FastembedEmbedder::new("nonexistent-model", dir);
        assert!(matches!(result, Err(EmbedError::InvalidModel(_))));
    }

    #[test]
    fn model_identity_is_deterministic() {
        assert_eq!(model_identity("all-MiniLM-L6-v2"), model_identity("all-MiniLM-L6-v2"));
        assert_ne!(model_identity("all-MiniLM-L6-v2"), model_identity("bge-base-en-v1.5"));
    }

    #[test]
    #[ignore = "requires model download"]
    fn embeds_to_model_dimensions() {
        let dir = std::env::temp_dir().join("papers-embed-test");
        let embedder = FastembedEmbedder::new("all-MiniLM-L6-v2", dir.clone()).unwrap();

        let vector = embedder.embed("Evidence of shorelines on Mars").unwrap();
        assert_eq!(vector.len(), embedder.dimensions());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
