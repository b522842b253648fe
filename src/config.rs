// SPDX-License-Identifier: MIT

//! Runtime configuration
//!
//! Loaded from an optional YAML file, then overridden by environment
//! variables. Credentials stay in the environment and are read by the HTTP
//! clients themselves.

use crate::adk::error::{RagError, Result};
use crate::ingest::processor::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::rag::reasoning::AgentStrategy;
use crate::vector_store::embeddings::DEFAULT_EMBEDDING_MODEL;
use crate::vector_store::store::DEFAULT_TOP_K;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub model: ModelSettings,
    pub embedding: EmbeddingSettings,
    pub ingest: IngestSettings,
    pub retrieval: RetrievalSettings,
    pub knowledge: KnowledgeSettings,
    pub agent: AgentSettings,
    pub checkpoint: CheckpointSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub name: String,
    pub temperature: Option<f32>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: "gpt-4o-mini".to_string(),
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// General-knowledge tool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeSettings {
    pub top_k_results: usize,
    pub lang: String,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            top_k_results: 3,
            lang: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub strategy: AgentStrategy,
    pub max_iterations: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            strategy: AgentStrategy::default(),
            max_iterations: 10,
        }
    }
}

/// `dir: None` keeps checkpoints in memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointSettings {
    pub dir: Option<PathBuf>,
}

impl RagConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Defaults, then `path` (if given), then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                log::debug!("Loading config from {}", path.display());
                Self::from_yaml(&fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment-style lookups
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(name) = lookup("MODEL_NAME") {
            self.model.name = name;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(strategy) = lookup("AGENT_STRATEGY") {
            self.agent.strategy = strategy.parse().map_err(RagError::config)?;
        }
        if let Some(dir) = lookup("RAG_CHECKPOINT_DIR") {
            self.checkpoint.dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.ingest.chunk_size == 0 {
            return Err(RagError::config("ingest.chunk_size must be greater than 0"));
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(RagError::config(format!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(RagError::config("retrieval.top_k must be greater than 0"));
        }
        if self.knowledge.top_k_results == 0 {
            return Err(RagError::config("knowledge.top_k_results must be greater than 0"));
        }
        if self.agent.max_iterations == 0 {
            return Err(RagError::config("agent.max_iterations must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.model.name, "gpt-4o-mini");
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.ingest.chunk_size, 500);
        assert_eq!(config.ingest.chunk_overlap, 50);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.knowledge.top_k_results, 3);
        assert_eq!(config.knowledge.lang, "en");
        assert_eq!(config.agent.strategy, AgentStrategy::ToolCalling);
        assert_eq!(config.agent.max_iterations, 10);
        assert_eq!(config.checkpoint.dir, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
model:
  temperature: 0.2
ingest:
  chunk_size: 800
agent:
  strategy: react
checkpoint:
  dir: /tmp/ragweave
"#;
        let config = RagConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.model.name, "gpt-4o-mini");
        assert_eq!(config.model.temperature, Some(0.2));
        assert_eq!(config.ingest.chunk_size, 800);
        assert_eq!(config.ingest.chunk_overlap, 50);
        assert_eq!(config.agent.strategy, AgentStrategy::React);
        assert_eq!(config.checkpoint.dir, Some(PathBuf::from("/tmp/ragweave")));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MODEL_NAME", "gpt-4.1"),
            ("EMBEDDING_MODEL", ""),
            ("AGENT_STRATEGY", "react"),
            ("RAG_CHECKPOINT_DIR", "/var/lib/rag"),
        ]
        .into_iter()
        .collect();

        let mut config = RagConfig::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.model.name, "gpt-4.1");
        // Blank values are ignored
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.agent.strategy, AgentStrategy::React);
        assert_eq!(config.checkpoint.dir, Some(PathBuf::from("/var/lib/rag")));
    }

    #[test]
    fn test_bad_strategy_env_is_config_error() {
        let mut config = RagConfig::default();
        let err = config
            .apply_env(|k| (k == "AGENT_STRATEGY").then(|| "plan".to_string()))
            .unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RagConfig::default();
        config.ingest.chunk_overlap = 500;
        assert!(matches!(config.validate(), Err(RagError::Config(_))));

        let mut config = RagConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = RagConfig::default();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rag.yaml");
        fs::write(&path, "retrieval:\n  top_k: 6\n").unwrap();

        let config = RagConfig::load(Some(&path)).unwrap();
        assert_eq!(config.retrieval.top_k, 6);
    }
}
