use crate::error::RetrievalError;
use crate::model::DEFAULT_EMBEDDING_DIM;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Relative location of the project config file.
pub const CONFIG_RELATIVE_PATH: &str = ".relir/config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelirConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file. `:memory:` opens a private in-memory store.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Per-query deadline in milliseconds; `0` disables it.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    /// Register `sqlite-vec` so dense distance runs inside SQLite.
    #[serde(default = "default_true")]
    pub vector_extension: bool,
}

impl StoreConfig {
    #[must_use]
    pub const fn query_timeout(&self) -> Option<Duration> {
        if self.query_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.query_timeout_ms))
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            query_timeout_ms: default_query_timeout_ms(),
            vector_extension: default_true(),
        }
    }
}

/// Defaults for reciprocal rank fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f64,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_weight")]
    pub weight_sparse: f64,
    #[serde(default = "default_weight")]
    pub weight_dense: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            rrf_k: default_rrf_k(),
            top_n: default_top_n(),
            weight_sparse: default_weight(),
            weight_dense: default_weight(),
        }
    }
}

/// Connection details for the embedding service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dim")]
    pub dim: usize,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_embedding_model(),
            dim: default_embedding_dim(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

/// Load configuration from an explicit file.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read. A file that is
/// not valid TOML for [`RelirConfig`] yields [`RetrievalError::ConfigParse`].
pub fn load_config(path: &Path) -> Result<RelirConfig> {
    if !path.exists() {
        return Ok(RelirConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<RelirConfig>(&content).map_err(|err| {
        RetrievalError::ConfigParse {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    })?;
    Ok(config)
}

/// Load `.relir/config.toml` under `project_root`, falling back to defaults.
///
/// # Errors
///
/// Same as [`load_config`].
pub fn load_project_config(project_root: &Path) -> Result<RelirConfig> {
    load_config(&project_root.join(CONFIG_RELATIVE_PATH))
}

const fn default_true() -> bool {
    true
}

fn default_store_path() -> PathBuf {
    PathBuf::from("relir.db")
}

const fn default_query_timeout_ms() -> u64 {
    30_000
}

const fn default_rrf_k() -> f64 {
    60.0
}

const fn default_top_n() -> usize {
    5
}

const fn default_weight() -> f64 {
    1.0
}

fn default_api_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

const fn default_embedding_dim() -> usize {
    DEFAULT_EMBEDDING_DIM
}

const fn default_embedding_timeout_secs() -> u64 {
    30
}
