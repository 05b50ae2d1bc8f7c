//! Keyed prompt-template storage.
//!
//! Prompts live in one YAML file as `category -> [ { template } ]` lists,
//! addressed by category name and index. Every mutation persists
//! immediately. Prompt content changes do not change any pipeline
//! contract; the metadata extractor just renders whatever is stored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Category holding the metadata-extraction prompt at index 0.
pub const METADATA_CATEGORY: &str = "document_metadata";

#[derive(Debug, thiserror::Error)]
pub enum PromptStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed prompt file: {0}")]
    Malformed(String),

    #[error("No prompt at index {index} in category '{category}'")]
    NotFound { category: String, index: usize },
}

/// One stored prompt template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptEntry {
    pub template: String,
}

/// YAML-backed prompt store.
pub struct PromptStore {
    path: PathBuf,
    prompts: BTreeMap<String, Vec<PromptEntry>>,
}

impl PromptStore {
    /// Load the store from `path`. A missing file yields a store with an
    /// empty metadata category; the file is only created on first write.
    pub fn load(path: &Path) -> Result<Self, PromptStoreError> {
        let prompts = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            serde_yml::from_str(&raw).map_err(|e| PromptStoreError::Malformed(e.to_string()))?
        } else {
            let mut prompts = BTreeMap::new();
            prompts.insert(METADATA_CATEGORY.to_string(), Vec::new());
            prompts
        };

        Ok(Self {
            path: path.to_path_buf(),
            prompts,
        })
    }

    /// All templates in a category; unknown categories list as empty.
    pub fn list(&self, category: &str) -> &[PromptEntry] {
        self.prompts.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A specific template by category and index.
    pub fn get(&self, category: &str, index: usize) -> Result<&str, PromptStoreError> {
        self.prompts
            .get(category)
            .and_then(|entries| entries.get(index))
            .map(|entry| entry.template.as_str())
            .ok_or_else(|| PromptStoreError::NotFound {
                category: category.to_string(),
                index,
            })
    }

    /// Append a template to a category, creating the category if needed.
    pub fn add(&mut self, category: &str, template: &str) -> Result<(), PromptStoreError> {
        self.prompts
            .entry(category.to_string())
            .or_default()
            .push(PromptEntry {
                template: template.to_string(),
            });
        self.save()
    }

    /// Replace the template at an index.
    pub fn edit(
        &mut self,
        category: &str,
        index: usize,
        template: &str,
    ) -> Result<(), PromptStoreError> {
        let entry = self
            .prompts
            .get_mut(category)
            .and_then(|entries| entries.get_mut(index))
            .ok_or_else(|| PromptStoreError::NotFound {
                category: category.to_string(),
                index,
            })?;

        entry.template = template.to_string();
        self.save()
    }

    /// Remove the template at an index.
    pub fn delete(&mut self, category: &str, index: usize) -> Result<(), PromptStoreError> {
        let entries = self
            .prompts
            .get_mut(category)
            .filter(|entries| index < entries.len())
            .ok_or_else(|| PromptStoreError::NotFound {
                category: category.to_string(),
                index,
            })?;

        entries.remove(index);
        self.save()
    }

    fn save(&self) -> Result<(), PromptStoreError> {
        let raw = serde_yml::to_string(&self.prompts)
            .map_err(|e| PromptStoreError::Malformed(e.to_string()))?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}
