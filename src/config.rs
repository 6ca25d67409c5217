use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MetamemConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub recall: RecallConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// `"sqlite"` (persistent) or `"memory"` (process-local, lost on exit).
    pub backend: String,
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `"local"` (ONNX all-MiniLM-L6-v2) or `"hash"` (feature hashing, no model files).
    pub provider: String,
    /// Must be `all-MiniLM-L6-v2` for the local provider; the hash provider ignores it.
    pub model: String,
    pub cache_dir: String,
    /// Vector length every record in the store must have.
    pub dimensions: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RecallConfig {
    pub default_k: usize,
    /// Maximum cosine distance a candidate may have and still be recalled.
    pub similarity_gate: f64,
    pub overfetch_factor: usize,
    pub block_terms: Vec<String>,
    pub snippet_chars: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IngestConfig {
    pub chunk_chars: usize,
    pub batch_size: usize,
    pub role: String,
}

impl Default for MetamemConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            recall: RecallConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            log_level: "info".into(),
            host: "127.0.0.1".into(),
            port: 7437,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_metamem_dir()
            .join("memory.db")
            .to_string_lossy()
            .into_owned();
        Self {
            backend: "sqlite".into(),
            db_path,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_metamem_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
            dimensions: 384,
        }
    }
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            default_k: 6,
            similarity_gate: 0.35,
            overfetch_factor: 6,
            block_terms: Vec::new(),
            snippet_chars: 1200,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_chars: 2000,
            batch_size: 64,
            role: "user".into(),
        }
    }
}

/// Returns `~/.metamem/`, or `./.metamem/` when no home directory is known.
pub fn default_metamem_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".metamem")
}

/// Returns the default config file path: `~/.metamem/config.toml`
pub fn default_config_path() -> PathBuf {
    default_metamem_dir().join("config.toml")
}

impl MetamemConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MetamemConfig::default()
        };

        config.apply_env_overrides();
        config.recall.block_terms = normalize_terms(&config.recall.block_terms);
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Unparseable numeric values are ignored with a warning and the
    /// configured value is kept.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("METAMEM_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("METAMEM_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("METAMEM_EMBEDDING_PROVIDER") {
            self.embedding.provider = val;
        }
        if let Ok(val) = std::env::var("METAMEM_TOP_K") {
            match val.parse() {
                Ok(k) => self.recall.default_k = k,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid METAMEM_TOP_K"),
            }
        }
        if let Ok(val) = std::env::var("METAMEM_MIN_SIM") {
            match val.parse() {
                Ok(gate) => self.recall.similarity_gate = gate,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid METAMEM_MIN_SIM"),
            }
        }
        if let Ok(val) = std::env::var("METAMEM_BLOCK_TERMS") {
            self.recall.block_terms = val.split(',').map(str::to_string).collect();
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

/// Trim, lowercase, and drop blank block terms.
pub fn normalize_terms(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
