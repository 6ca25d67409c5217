//! Error taxonomy for the memory store.
//!
//! Callers must be able to tell "nothing relevant was recalled" (`Ok` with an
//! empty list) apart from "the store could not answer" (`Err`), so every
//! backend failure surfaces as [`MemoryError::StorageUnavailable`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    /// The embedder produced a vector whose length differs from the store's.
    #[error("embedding has {actual} dimensions, store expects {expected}")]
    EmbeddingDimension { expected: usize, actual: usize },

    /// The persistence backend could not complete a read or write.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] rusqlite::Error),

    #[error("session id must not be empty")]
    EmptySession,

    /// The embedding provider itself failed.
    #[error("embedding failed: {0:#}")]
    Embedding(anyhow::Error),
}

impl MemoryError {
    /// `true` for failures of the persistence backend.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_error_names_both_lengths() {
        let err = MemoryError::EmbeddingDimension {
            expected: 384,
            actual: 768,
        };
        let msg = err.to_string();
        assert!(msg.contains("768"));
        assert!(msg.contains("384"));
        assert!(!err.is_storage());
    }

    #[test]
    fn rusqlite_errors_convert_to_storage_unavailable() {
        let err: MemoryError = rusqlite::Error::InvalidQuery.into();
        assert!(err.is_storage());
        assert!(err.to_string().starts_with("storage unavailable"));
    }
}
