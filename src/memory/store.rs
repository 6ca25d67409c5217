//! The memory store: `remember` and `recall`.
//!
//! [`MemoryStore`] owns a [`MemoryBackend`] and an [`EmbeddingProvider`] and
//! applies the storage and recall policy between them:
//!
//! - write path: clean → reject empty / model-error / noise → embed →
//!   dimension check → atomic insert
//! - read path: clean → embed → dimension check → session-scoped
//!   nearest-neighbour over-fetch → similarity gate, noise and block-term
//!   filters → stable re-sort → truncate to `k`

use std::sync::Arc;

use crate::config::{normalize_terms, MetamemConfig};
use crate::db;
use crate::embedding::{self, EmbeddingProvider};
use crate::memory::backend::{InMemoryBackend, MemoryBackend, SqliteBackend};
use crate::memory::clean::clean_text;
use crate::memory::error::MemoryError;
use crate::memory::noise::{is_blocked, NoiseClassifier, ScaffoldingFilter};
use crate::memory::types::{NewRecord, Recalled, Role, SessionSummary};

/// Prefixes the orchestration layers write in place of a reply when a model call failed.
pub const MODEL_ERROR_SENTINELS: &[&str] = &["(model error)", "[model error]"];

/// Recall and storage policy, read once from [`MetamemConfig`].
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Vector length every record must have.
    pub dimensions: usize,
    pub default_k: usize,
    /// Maximum cosine distance a recalled candidate may have.
    pub similarity_gate: f64,
    /// Candidates fetched per requested result, leaving room for filtering.
    pub overfetch_factor: usize,
    /// Normalized terms excluded from every recall.
    pub block_terms: Vec<String>,
}

impl StoreSettings {
    pub fn from_config(config: &MetamemConfig) -> Self {
        Self {
            dimensions: config.embedding.dimensions,
            default_k: config.recall.default_k,
            similarity_gate: config.recall.similarity_gate,
            overfetch_factor: config.recall.overfetch_factor.max(1),
            block_terms: normalize_terms(&config.recall.block_terms),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::from_config(&MetamemConfig::default())
    }
}

/// Why `remember` declined to store a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Empty,
    ModelError,
    Noise,
}

impl Rejection {
    fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty after cleaning",
            Self::ModelError => "model error sentinel",
            Self::Noise => "scaffolding noise",
        }
    }
}

pub struct MemoryStore {
    backend: Box<dyn MemoryBackend>,
    embedder: Arc<dyn EmbeddingProvider>,
    noise: Box<dyn NoiseClassifier>,
    settings: StoreSettings,
}

impl MemoryStore {
    /// Assemble a store. Fails if the backend was opened for a different
    /// dimensionality than `settings.dimensions`.
    pub fn new(
        backend: Box<dyn MemoryBackend>,
        embedder: Arc<dyn EmbeddingProvider>,
        settings: StoreSettings,
    ) -> Result<Self, MemoryError> {
        if backend.dimensions() != settings.dimensions {
            return Err(MemoryError::EmbeddingDimension {
                expected: settings.dimensions,
                actual: backend.dimensions(),
            });
        }
        if embedder.dimensions() != settings.dimensions {
            tracing::warn!(
                provider = embedder.model_name(),
                provider_dims = embedder.dimensions(),
                store_dims = settings.dimensions,
                "embedding provider reports a different dimensionality; vectors will be rejected"
            );
        }
        Ok(Self {
            backend,
            embedder,
            noise: Box::new(ScaffoldingFilter),
            settings,
        })
    }

    /// Open the backend named by `config.storage.backend` with the given provider.
    pub fn open(
        config: &MetamemConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> anyhow::Result<Self> {
        let settings = StoreSettings::from_config(config);
        let backend: Box<dyn MemoryBackend> = match config.storage.backend.as_str() {
            "sqlite" => {
                let conn = db::open_database(config.resolved_db_path())?;
                match db::meta::get_embedding_model(&conn)? {
                    None => db::meta::set_embedding_model(&conn, embedder.model_name())?,
                    Some(stored) if stored != embedder.model_name() => tracing::warn!(
                        stored = %stored,
                        configured = embedder.model_name(),
                        "embedding model changed; distances to older records are not comparable"
                    ),
                    Some(_) => {}
                }
                Box::new(SqliteBackend::new(conn, settings.dimensions)?)
            }
            "memory" => Box::new(InMemoryBackend::new(settings.dimensions)),
            other => anyhow::bail!("unknown storage backend: {other}. Supported: sqlite, memory"),
        };
        Ok(Self::new(backend, embedder, settings)?)
    }

    /// Open the configured backend with the configured embedding provider.
    pub fn from_config(config: &MetamemConfig) -> anyhow::Result<Self> {
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::from(embedding::create_provider(&config.embedding)?);
        Self::open(config, embedder)
    }

    /// Replace the noise classifier used on both the write and read paths.
    pub fn with_noise_classifier(mut self, classifier: impl NoiseClassifier + 'static) -> Self {
        self.noise = Box::new(classifier);
        self
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Model identifier of the embedding provider.
    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn is_noise(&self, text: &str) -> bool {
        self.noise.is_noise(text)
    }

    /// The classifier applied on both paths, for re-filtering recalled text.
    pub fn noise_classifier(&self) -> &dyn NoiseClassifier {
        self.noise.as_ref()
    }

    /// Clean `text` and store it under `session_id`.
    ///
    /// Returns `Ok(None)` without writing when the cleaned text is empty,
    /// starts with one of [`MODEL_ERROR_SENTINELS`], or is classified as noise.
    pub fn remember(
        &mut self,
        session_id: &str,
        role: Role,
        text: &str,
    ) -> Result<Option<i64>, MemoryError> {
        let ids = self.remember_batch(session_id, role, &[text])?;
        Ok(ids.into_iter().next().flatten())
    }

    /// Apply the `remember` policy to every text, then embed and insert the
    /// accepted ones in a single transaction.
    ///
    /// Every vector is dimension-checked before anything is written, so a bad
    /// vector anywhere in the batch leaves the store untouched. The result is
    /// aligned with `texts`: `None` for rejected entries.
    pub fn remember_batch(
        &mut self,
        session_id: &str,
        role: Role,
        texts: &[&str],
    ) -> Result<Vec<Option<i64>>, MemoryError> {
        validate_session(session_id)?;

        let mut accepted: Vec<(usize, String)> = Vec::with_capacity(texts.len());
        for (idx, raw) in texts.iter().enumerate() {
            let text = clean_text(raw);
            match self.rejection(&text) {
                Some(reason) => {
                    tracing::debug!(session_id, reason = reason.as_str(), "not remembering text");
                }
                None => accepted.push((idx, text)),
            }
        }

        let mut result = vec![None; texts.len()];
        if accepted.is_empty() {
            return Ok(result);
        }

        let to_embed: Vec<&str> = accepted.iter().map(|(_, t)| t.as_str()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&to_embed)
            .map_err(MemoryError::Embedding)?;
        if embeddings.len() != accepted.len() {
            return Err(MemoryError::Embedding(anyhow::anyhow!(
                "provider returned {} vectors for {} texts",
                embeddings.len(),
                accepted.len()
            )));
        }
        for embedding in &embeddings {
            self.check_dimensions(embedding)?;
        }

        let rows: Vec<NewRecord> = accepted
            .iter()
            .zip(embeddings)
            .map(|((_, text), embedding)| NewRecord {
                session_id: session_id.to_string(),
                role: role.clone(),
                text: text.clone(),
                embedding,
            })
            .collect();
        let ids = self.backend.insert_batch(&rows)?;

        for ((idx, _), id) in accepted.iter().zip(&ids) {
            result[*idx] = Some(*id);
        }
        tracing::debug!(session_id, role = %role, stored = ids.len(), "remembered");
        Ok(result)
    }

    /// Recall up to `k` memories of `session_id` relevant to `query`, nearest first.
    ///
    /// `block_terms` excludes, case-insensitively, any memory containing one
    /// of the terms, in addition to the configured default terms. An empty
    /// result is a normal outcome; storage failures are errors.
    pub fn recall(
        &self,
        session_id: &str,
        query: &str,
        k: usize,
        block_terms: &[String],
    ) -> Result<Vec<Recalled>, MemoryError> {
        validate_session(session_id)?;

        let query = clean_text(query);
        let query_embedding = self
            .embedder
            .embed(&query)
            .map_err(MemoryError::Embedding)?;
        self.check_dimensions(&query_embedding)?;

        let mut blocked = normalize_terms(block_terms);
        blocked.extend(self.settings.block_terms.iter().cloned());

        let limit = k.saturating_mul(self.settings.overfetch_factor);
        let candidates = self.backend.nearest(session_id, &query_embedding, limit)?;
        let fetched = candidates.len();

        let mut kept: Vec<Recalled> = candidates
            .into_iter()
            .filter_map(|c| {
                let distance = c.distance?;
                if distance > self.settings.similarity_gate {
                    return None;
                }
                if c.text.is_empty() || self.noise.is_noise(&c.text) {
                    return None;
                }
                if is_blocked(&c.text, &blocked) {
                    return None;
                }
                Some(Recalled {
                    role: c.role,
                    text: c.text,
                    distance,
                })
            })
            .collect();

        kept.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        kept.truncate(k);

        tracing::debug!(session_id, fetched, kept = kept.len(), k, "recalled");
        Ok(kept)
    }

    /// [`recall`](Self::recall) with the configured default `k` and no extra block terms.
    pub fn recall_default(
        &self,
        session_id: &str,
        query: &str,
    ) -> Result<Vec<Recalled>, MemoryError> {
        self.recall(session_id, query, self.settings.default_k, &[])
    }

    /// Number of stored records, optionally restricted to one session.
    pub fn record_count(&self, session_id: Option<&str>) -> Result<u64, MemoryError> {
        self.backend.count(session_id)
    }

    pub fn sessions(&self) -> Result<Vec<SessionSummary>, MemoryError> {
        self.backend.sessions()
    }

    fn rejection(&self, cleaned: &str) -> Option<Rejection> {
        if cleaned.is_empty() {
            Some(Rejection::Empty)
        } else if MODEL_ERROR_SENTINELS.iter().any(|p| cleaned.starts_with(p)) {
            Some(Rejection::ModelError)
        } else if self.noise.is_noise(cleaned) {
            Some(Rejection::Noise)
        } else {
            None
        }
    }

    fn check_dimensions(&self, embedding: &[f32]) -> Result<(), MemoryError> {
        if embedding.len() != self.settings.dimensions {
            return Err(MemoryError::EmbeddingDimension {
                expected: self.settings.dimensions,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

fn validate_session(session_id: &str) -> Result<(), MemoryError> {
    if session_id.trim().is_empty() {
        return Err(MemoryError::EmptySession);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::hash::HashEmbeddingProvider;

    fn settings(dimensions: usize) -> StoreSettings {
        StoreSettings {
            dimensions,
            ..StoreSettings::default()
        }
    }

    fn hash_store() -> MemoryStore {
        MemoryStore::new(
            Box::new(InMemoryBackend::new(64)),
            Arc::new(HashEmbeddingProvider::new(64)),
            settings(64),
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_session() {
        let mut store = hash_store();
        assert!(matches!(
            store.remember("", Role::User, "hello"),
            Err(MemoryError::EmptySession)
        ));
        assert!(matches!(
            store.recall("  ", "hello", 3, &[]),
            Err(MemoryError::EmptySession)
        ));
    }

    #[test]
    fn rejects_model_error_replies() {
        let mut store = hash_store();
        for reply in [
            "(model error) connection refused",
            "[model error] TimeoutError: read timed out",
            "\x1b[31m[model error]\x1b[0m backend crashed",
        ] {
            assert_eq!(store.remember("s1", Role::Assistant, reply).unwrap(), None);
        }
        assert_eq!(store.record_count(None).unwrap(), 0);
        // only a leading sentinel marks a failed reply
        assert!(store
            .remember("s1", Role::User, "why did I get a [model error] earlier?")
            .unwrap()
            .is_some());
    }

    #[test]
    fn stores_cleaned_text() {
        let mut store = hash_store();
        let id = store
            .remember("s1", Role::User, "\x1b[32m  tomatoes need sun \r\n")
            .unwrap();
        assert!(id.is_some());
        let hits = store.recall("s1", "tomatoes sun", 1, &[]).unwrap();
        assert_eq!(hits[0].text, "tomatoes need sun");
    }

    #[test]
    fn batch_alignment_marks_rejections() {
        let mut store = hash_store();
        let ids = store
            .remember_batch(
                "s1",
                Role::User,
                &["first fact", "", "CREATOR: plan", "second fact"],
            )
            .unwrap();
        assert!(ids[0].is_some());
        assert_eq!(ids[1], None);
        assert_eq!(ids[2], None);
        assert!(ids[3] > ids[0]);
    }

    #[test]
    fn mismatched_backend_is_rejected() {
        let err = MemoryStore::new(
            Box::new(InMemoryBackend::new(32)),
            Arc::new(HashEmbeddingProvider::new(64)),
            settings(64),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            MemoryError::EmbeddingDimension {
                expected: 64,
                actual: 32
            }
        ));
    }

    #[test]
    fn custom_noise_classifier_applies_to_both_paths() {
        let mut store = hash_store().with_noise_classifier(|t: &str| t.contains("draft"));
        assert_eq!(store.remember("s1", Role::User, "draft plan").unwrap(), None);
        assert!(store.remember("s1", Role::User, "CREATOR: kept now").unwrap().is_some());
        assert!(store.is_noise("another draft"));
    }

    #[test]
    fn zero_k_returns_nothing() {
        let mut store = hash_store();
        store.remember("s1", Role::User, "apples").unwrap();
        assert!(store.recall("s1", "apples", 0, &[]).unwrap().is_empty());
    }
}
