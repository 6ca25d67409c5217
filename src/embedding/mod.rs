//! Text-to-vector embedding providers.
//!
//! Provides the [`EmbeddingProvider`] trait, a local ONNX implementation of
//! all-MiniLM-L6-v2, and a dependency-free feature-hashing provider. The
//! provider is created via [`create_provider`] from configuration.
//!
//! Providers are external collaborators: the memory store checks the length
//! of every vector it receives rather than trusting [`EmbeddingProvider::dimensions`].

pub mod hash;
pub mod local;

use anyhow::Result;

/// Trait for embedding text into vectors.
///
/// All methods are synchronous — callers in async contexts should use
/// `tokio::task::spawn_blocking`. Embedding empty text is legal but
/// meaningless; the store filters empty text before calling.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of text strings. Implementations may override for batched inference.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Number of dimensions this provider claims to produce.
    fn dimensions(&self) -> usize;

    /// Identifier recorded in the database alongside the vectors.
    fn model_name(&self) -> &str;
}

/// Create an embedding provider from config.
///
/// `"local"` loads ONNX Runtime + all-MiniLM-L6-v2 and fails if the model
/// files are missing (run `metamem model download` first) or if
/// `embedding.model` names any other model. `"hash"` needs no files.
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "local" => {
            let provider = local::LocalEmbeddingProvider::new(config)?;
            Ok(Box::new(provider))
        }
        "hash" => Ok(Box::new(hash::HashEmbeddingProvider::new(config.dimensions))),
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local, hash"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingConfig;

    #[test]
    fn creates_hash_provider_without_model_files() {
        let config = EmbeddingConfig {
            provider: "hash".into(),
            dimensions: 32,
            ..EmbeddingConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.dimensions(), 32);
        assert_eq!(provider.embed("hello world").unwrap().len(), 32);
    }

    #[test]
    fn rejects_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "openai".into(),
            ..EmbeddingConfig::default()
        };
        let err = create_provider(&config).err().unwrap();
        assert!(err.to_string().contains("unknown embedding provider"));
    }

    #[test]
    fn rejects_unsupported_local_model() {
        let config = EmbeddingConfig {
            provider: "local".into(),
            model: "bge-small-en-v1.5".into(),
            cache_dir: "/nonexistent/metamem-models".into(),
            ..EmbeddingConfig::default()
        };
        let err = create_provider(&config).err().unwrap();
        assert!(err.to_string().contains("not supported"), "got: {err}");
    }

    #[test]
    fn hash_provider_ignores_model_label() {
        let config = EmbeddingConfig {
            provider: "hash".into(),
            model: "bge-small-en-v1.5".into(),
            dimensions: 16,
            ..EmbeddingConfig::default()
        };
        assert_eq!(create_provider(&config).unwrap().model_name(), hash::MODEL_NAME);
    }
}
