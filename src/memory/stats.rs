use serde::Serialize;
use std::path::Path;

use crate::memory::error::MemoryError;
use crate::memory::store::MemoryStore;
use crate::memory::types::SessionSummary;

/// Response from memory_stats.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_records: u64,
    pub session_count: u64,
    pub sessions: Vec<SessionSummary>,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub db_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_record: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_record: Option<String>,
}

/// Compute store statistics.
///
/// If `session_id` is provided, counts and the time range cover that session only.
/// `db_path` is used for file size calculation; pass None for in-memory stores.
pub fn memory_stats(
    store: &MemoryStore,
    session_id: Option<&str>,
    db_path: Option<&Path>,
) -> Result<StatsResponse, MemoryError> {
    let sessions: Vec<SessionSummary> = store
        .sessions()?
        .into_iter()
        .filter(|s| session_id.is_none_or(|id| s.session_id == id))
        .collect();
    let total_records = store.record_count(session_id)?;

    // RFC 3339 timestamps in UTC compare correctly as strings.
    let oldest_record = sessions.iter().map(|s| s.first_at.clone()).min();
    let newest_record = sessions.iter().map(|s| s.last_at.clone()).max();

    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(StatsResponse {
        total_records,
        session_count: sessions.len() as u64,
        sessions,
        embedding_model: store.embedding_model().to_string(),
        embedding_dim: store.settings().dimensions,
        db_size_bytes,
        oldest_record,
        newest_record,
    })
}
