use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::citation::DEFAULT_SELF_CITATION_THRESHOLD;
use crate::segment::SegmentMode;
use crate::store;

const CONFIG_FILE: &str = "config.yaml";
const PROMPTS_FILE: &str = "prompts.yaml";
const DATABASES_DIR: &str = "databases";

/// Default chat-completion model for metadata extraction.
const DEFAULT_EXTRACTOR_MODEL: &str = "gpt-4-turbo";
/// Environment variable holding the extractor API key.
const DEFAULT_API_KEY_ENV: &str = "PAPERS_API_KEY";

/// Embedding model configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name for embeddings (e.g., "all-MiniLM-L6-v2")
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: store::DEFAULT_MODEL.to_string(),
        }
    }
}

fn default_embedding_model() -> String {
    store::DEFAULT_MODEL.to_string()
}

/// Metadata-extractor endpoint configuration. The API key itself never
/// lives in the file, only the name of the environment variable to read.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Base URL of an OpenAI-compatible API, without the
    /// `/chat/completions` suffix.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_extractor_model")]
    pub model: String,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: DEFAULT_EXTRACTOR_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

fn default_extractor_model() -> String {
    DEFAULT_EXTRACTOR_MODEL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub segment_mode: SegmentMode,

    #[serde(default = "default_self_citation_threshold")]
    pub self_citation_threshold: f64,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub extractor: ExtractorConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

fn default_self_citation_threshold() -> f64 {
    DEFAULT_SELF_CITATION_THRESHOLD
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segment_mode: SegmentMode::default(),
            self_citation_threshold: DEFAULT_SELF_CITATION_THRESHOLD,
            embedding: EmbeddingConfig::default(),
            extractor: ExtractorConfig::default(),
            base_path: PathBuf::new(),
        }
    }
}

impl Config {
    /// Load from the default base path: `$PAPERS_BASE_PATH` or
    /// `~/.local/share/papers`.
    pub fn load() -> Self {
        let base_path = match std::env::var("PAPERS_BASE_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => homedir::my_home()
                .ok()
                .flatten()
                .map(|home| home.join(".local").join("share").join("papers"))
                .expect("cannot resolve home directory; set PAPERS_BASE_PATH"),
        };

        Self::load_with(&base_path)
    }

    /// Load from `base_path`, creating a default config file on first use.
    pub fn load_with(base_path: &Path) -> Self {
        std::fs::create_dir_all(base_path).expect("cannot create base directory");

        let config_path = base_path.join(CONFIG_FILE);
        if !config_path.exists() {
            let defaults =
                serde_yml::to_string(&Self::default()).expect("default config serializes");
            std::fs::write(&config_path, defaults).expect("cannot write default config");
        }

        let raw = std::fs::read_to_string(&config_path).expect("cannot read config file");
        let mut config: Self = serde_yml::from_str(&raw).expect("config is malformed");

        config.base_path = base_path.to_path_buf();
        config.validate();

        config
    }

    fn validate(&self) {
        if !(0.0..=1.0).contains(&self.self_citation_threshold) {
            panic!(
                "self_citation_threshold must be between 0.0 and 1.0, got {}",
                self.self_citation_threshold
            );
        }

        if self.embedding.model.trim().is_empty() {
            panic!("embedding.model must not be empty");
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Root directory holding named indexes.
    pub fn databases_root(&self) -> PathBuf {
        self.base_path.join(DATABASES_DIR)
    }

    /// Location of the prompt-template store.
    pub fn prompts_path(&self) -> PathBuf {
        self.base_path.join(PROMPTS_FILE)
    }

    /// The extractor API key, read from the configured environment
    /// variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.extractor.api_key_env).ok()
    }
}
