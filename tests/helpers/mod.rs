#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use metamem::db;
use metamem::embedding::hash::HashEmbeddingProvider;
use metamem::embedding::EmbeddingProvider;
use metamem::memory::backend::{InMemoryBackend, SqliteBackend};
use metamem::memory::store::{MemoryStore, StoreSettings};

/// Store settings for `dimensions` with the given similarity gate.
pub fn settings(dimensions: usize, similarity_gate: f64) -> StoreSettings {
    StoreSettings {
        dimensions,
        similarity_gate,
        ..StoreSettings::default()
    }
}

/// A store over a fresh in-memory SQLite database.
pub fn sqlite_store(embedder: Arc<dyn EmbeddingProvider>, settings: StoreSettings) -> MemoryStore {
    let conn = db::open_memory_database().unwrap();
    let backend = SqliteBackend::new(conn, settings.dimensions).unwrap();
    MemoryStore::new(Box::new(backend), embedder, settings).unwrap()
}

/// A store over the process-local backend.
pub fn memory_store(embedder: Arc<dyn EmbeddingProvider>, settings: StoreSettings) -> MemoryStore {
    let backend = InMemoryBackend::new(settings.dimensions);
    MemoryStore::new(Box::new(backend), embedder, settings).unwrap()
}

/// One store per backend, labelled for assertion messages.
pub fn both_backends(
    embedder: Arc<dyn EmbeddingProvider>,
    settings: StoreSettings,
) -> Vec<(&'static str, MemoryStore)> {
    vec![
        ("sqlite", sqlite_store(Arc::clone(&embedder), settings.clone())),
        ("memory", memory_store(embedder, settings)),
    ]
}

pub fn hash_embedder(dimensions: usize) -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashEmbeddingProvider::new(dimensions))
}

/// Unit vector whose cosine distance to `e0` is `distance` (0.0..=1.0).
pub fn vector_at_distance(distance: f32, dimensions: usize) -> Vec<f32> {
    let cos = 1.0 - distance;
    let mut v = vec![0.0f32; dimensions];
    v[0] = cos;
    v[1] = (1.0 - cos * cos).sqrt();
    v
}

/// Embedder with a fixed vector per (cleaned) text. Unknown text is an error.
pub struct TableEmbedder {
    dimensions: usize,
    table: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            table: HashMap::new(),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.table.insert(text.to_string(), vector);
        self
    }

    /// Map `text` to a vector at `distance` from the query direction `e0`.
    pub fn at(self, text: &str, distance: f32) -> Self {
        let v = vector_at_distance(distance, self.dimensions);
        self.with(text, v)
    }
}

impl EmbeddingProvider for TableEmbedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.table
            .get(text)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no vector for {text:?}"))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "table"
    }
}

/// Embedder that always returns `dimensions + 1` values.
pub struct WrongDimEmbedder {
    pub dimensions: usize,
}

impl EmbeddingProvider for WrongDimEmbedder {
    fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(vec![0.5; self.dimensions + 1])
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "wrong-dim"
    }
}
