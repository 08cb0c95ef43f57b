//! Configuration management for scout
//!
//! Loads configuration with priority:
//! 1. config.toml (or specified config file)
//! 2. Environment variables (fallback)
//! 3. Defaults

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Scout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Model/LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// API key (can reference env var with ${VAR_NAME})
    pub api_key: Option<String>,

    /// Model name used for generation and tokenizer-profile selection
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Base URL (optional, for OpenAI-compatible endpoints)
    pub base_url: Option<String>,

    /// Context window size in tokens, used for the pruning budget
    #[serde(default = "default_context_window_size")]
    pub context_window_size: usize,
}

/// Retrieval pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// top_k for the table-descriptions retrieval stage
    #[serde(default = "default_table_retrieval_size")]
    pub table_retrieval_size: usize,

    /// top_k for the schema-fragments retrieval stage
    #[serde(default = "default_table_column_retrieval_size")]
    pub table_column_retrieval_size: usize,

    /// Force the column-pruning path even when the schema fits
    #[serde(default)]
    pub enable_column_pruning: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: default_model_name(),
            embedding_model: default_embedding_model(),
            base_url: None,
            context_window_size: default_context_window_size(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            table_retrieval_size: default_table_retrieval_size(),
            table_column_retrieval_size: default_table_column_retrieval_size(),
            enable_column_pruning: false,
        }
    }
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl ScoutConfig {
    /// Load configuration with the following priority:
    /// 1. Specified config file (if provided)
    /// 2. config.toml in current directory or parents
    /// 3. Environment variables (fallback)
    /// 4. Defaults
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            Self::find_config_file()?
        };

        tracing::debug!("Loading configuration from: {:?}", config_path);

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let mut config: ScoutConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        config.resolve_env_vars();

        Ok(config)
    }

    /// Find config.toml by searching current directory and parents
    fn find_config_file() -> Result<PathBuf> {
        let mut current = env::current_dir()?;

        loop {
            let config_path = current.join("config.toml");
            if config_path.exists() {
                return Ok(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        Err(anyhow!(
            "config.toml not found. Create one with: cp config.toml.example config.toml"
        ))
    }

    /// Resolve ${VAR_NAME} references to environment variables
    fn resolve_env_vars(&mut self) {
        if let Some(ref key) = self.model.api_key {
            if let Some(resolved) = Self::resolve_env_var(key) {
                self.model.api_key = Some(resolved);
            } else if key.is_empty() || key == "${OPENAI_API_KEY}" {
                self.model.api_key = env::var("OPENAI_API_KEY").ok();
            }
        } else {
            // No api_key in config, try environment variable as fallback
            self.model.api_key = env::var("OPENAI_API_KEY").ok();
        }

        if let Some(ref url) = self.model.base_url {
            if let Some(resolved) = Self::resolve_env_var(url) {
                self.model.base_url = Some(resolved);
            }
        }
    }

    /// Resolve a single ${VAR_NAME} reference, if `value` is one
    fn resolve_env_var(value: &str) -> Option<String> {
        let name = value.strip_prefix("${")?.strip_suffix('}')?;
        env::var(name).ok()
    }
}

fn default_model_name() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-large".to_string()
}

fn default_context_window_size() -> usize {
    100_000
}

fn default_table_retrieval_size() -> usize {
    10
}

fn default_table_column_retrieval_size() -> usize {
    100
}
