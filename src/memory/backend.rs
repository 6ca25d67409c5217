//! Storage backends for memory records.
//!
//! [`MemoryBackend`] is the seam between the store's policy (cleaning, noise,
//! gates) and persistence. Both implementations return candidates in the same
//! order: ascending cosine distance, undefined distances last, ties broken by
//! ascending id.

use rusqlite::{params, Connection};

use crate::db;
use crate::memory::error::MemoryError;
use crate::memory::types::{Candidate, MemoryRecord, NewRecord, Role, SessionSummary};
use crate::memory::vector;

/// Append-only persistence with session-scoped nearest-neighbour search.
pub trait MemoryBackend: Send {
    /// Vector length this backend was opened for.
    fn dimensions(&self) -> usize;

    /// Insert all rows atomically: either every row is written or none is.
    /// Returns the assigned ids in input order.
    fn insert_batch(&mut self, rows: &[NewRecord]) -> Result<Vec<i64>, MemoryError>;

    /// Up to `limit` records of `session_id`, nearest to `embedding` first.
    fn nearest(
        &self,
        session_id: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<Candidate>, MemoryError>;

    /// Number of records, optionally restricted to one session.
    fn count(&self, session_id: Option<&str>) -> Result<u64, MemoryError>;

    /// Per-session summaries ordered by session id.
    fn sessions(&self) -> Result<Vec<SessionSummary>, MemoryError>;
}

// ── SQLite ────────────────────────────────────────────────────────────────────

/// SQLite + sqlite-vec backend. Distances come from `vec_distance_cosine`
/// over the session's rows (exact scan narrowed by the session index).
pub struct SqliteBackend {
    conn: Connection,
    dimensions: usize,
}

impl SqliteBackend {
    /// Wrap an initialized connection, binding (or verifying) `dimensions`.
    pub fn new(conn: Connection, dimensions: usize) -> Result<Self, MemoryError> {
        db::meta::bind_embedding_dim(&conn, dimensions)?;
        Ok(Self { conn, dimensions })
    }
}

impl MemoryBackend for SqliteBackend {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn insert_batch(&mut self, rows: &[NewRecord]) -> Result<Vec<i64>, MemoryError> {
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(rows.len());
        {
            let now = chrono::Utc::now().to_rfc3339();
            let mut stmt = tx.prepare(
                "INSERT INTO memories (session_id, role, text, embedding, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.session_id,
                    row.role.as_str(),
                    row.text,
                    vector::to_bytes(&row.embedding),
                    now,
                ])?;
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit()?;
        Ok(ids)
    }

    fn nearest(
        &self,
        session_id: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<Candidate>, MemoryError> {
        let query_bytes = vector::to_bytes(embedding);
        let mut stmt = self.conn.prepare(
            "SELECT id, role, text, vec_distance_cosine(embedding, ?1) AS distance \
             FROM memories WHERE session_id = ?2 \
             ORDER BY distance IS NULL, distance, id LIMIT ?3",
        )?;
        let candidates = stmt
            .query_map(params![query_bytes, session_id, limit as i64], |row| {
                let role: String = row.get(1)?;
                Ok(Candidate {
                    id: row.get(0)?,
                    role: role.parse().unwrap_or(Role::Other(role)),
                    text: row.get(2)?,
                    distance: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(candidates)
    }

    fn count(&self, session_id: Option<&str>) -> Result<u64, MemoryError> {
        let count: i64 = match session_id {
            Some(session) => self.conn.query_row(
                "SELECT COUNT(*) FROM memories WHERE session_id = ?1",
                [session],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }

    fn sessions(&self) -> Result<Vec<SessionSummary>, MemoryError> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, COUNT(*), MIN(created_at), MAX(created_at) \
             FROM memories GROUP BY session_id ORDER BY session_id",
        )?;
        let sessions = stmt
            .query_map([], |row| {
                Ok(SessionSummary {
                    session_id: row.get(0)?,
                    records: row.get::<_, i64>(1)? as u64,
                    first_at: row.get(2)?,
                    last_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }
}

// ── In-memory ─────────────────────────────────────────────────────────────────

/// Process-local backend with an exact scan. Nothing survives the process.
#[derive(Debug)]
pub struct InMemoryBackend {
    records: Vec<MemoryRecord>,
    next_id: i64,
    dimensions: usize,
}

impl InMemoryBackend {
    pub fn new(dimensions: usize) -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
            dimensions,
        }
    }
}

impl MemoryBackend for InMemoryBackend {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn insert_batch(&mut self, rows: &[NewRecord]) -> Result<Vec<i64>, MemoryError> {
        let now = chrono::Utc::now().to_rfc3339();
        let ids: Vec<i64> = (0..rows.len() as i64).map(|i| self.next_id + i).collect();
        self.next_id += rows.len() as i64;
        self.records
            .extend(rows.iter().zip(&ids).map(|(row, id)| MemoryRecord {
                id: *id,
                session_id: row.session_id.clone(),
                role: row.role.clone(),
                text: row.text.clone(),
                embedding: row.embedding.clone(),
                created_at: now.clone(),
            }));
        Ok(ids)
    }

    fn nearest(
        &self,
        session_id: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<Candidate>, MemoryError> {
        let mut candidates: Vec<Candidate> = self
            .records
            .iter()
            .filter(|r| r.session_id == session_id)
            .map(|r| Candidate {
                id: r.id,
                role: r.role.clone(),
                text: r.text.clone(),
                distance: vector::cosine_distance(&r.embedding, embedding),
            })
            .collect();
        // Records are already in id order and the sort is stable.
        candidates.sort_by(|a, b| match (a.distance, b.distance) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        candidates.truncate(limit);
        Ok(candidates)
    }

    fn count(&self, session_id: Option<&str>) -> Result<u64, MemoryError> {
        Ok(self
            .records
            .iter()
            .filter(|r| session_id.is_none_or(|s| r.session_id == s))
            .count() as u64)
    }

    fn sessions(&self) -> Result<Vec<SessionSummary>, MemoryError> {
        let mut by_session: std::collections::BTreeMap<&str, SessionSummary> =
            std::collections::BTreeMap::new();
        for r in &self.records {
            by_session
                .entry(r.session_id.as_str())
                .and_modify(|s| {
                    s.records += 1;
                    s.last_at = r.created_at.clone();
                })
                .or_insert_with(|| SessionSummary {
                    session_id: r.session_id.clone(),
                    records: 1,
                    first_at: r.created_at.clone(),
                    last_at: r.created_at.clone(),
                });
        }
        Ok(by_session.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_backend(dim: usize) -> SqliteBackend {
        let conn = db::open_memory_database().unwrap();
        SqliteBackend::new(conn, dim).unwrap()
    }

    fn row(session: &str, text: &str, embedding: Vec<f32>) -> NewRecord {
        NewRecord {
            session_id: session.to_string(),
            role: Role::User,
            text: text.to_string(),
            embedding,
        }
    }

    fn exercise_ordering(backend: &mut dyn MemoryBackend) {
        let ids = backend
            .insert_batch(&[
                row("s1", "far", vec![0.0, 1.0, 0.0]),
                row("s1", "near", vec![1.0, 0.1, 0.0]),
                row("s1", "tie-first", vec![0.0, 0.0, 1.0]),
                row("s1", "tie-second", vec![0.0, 0.0, 2.0]),
                row("s2", "other session", vec![1.0, 0.0, 0.0]),
                row("s1", "zero", vec![0.0, 0.0, 0.0]),
            ])
            .unwrap();
        assert_eq!(ids.len(), 6);
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids must increase");

        let found = backend.nearest("s1", &[1.0, 0.0, 0.0], 10).unwrap();
        let texts: Vec<&str> = found.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["near", "far", "tie-first", "tie-second", "zero"]);
        assert!(found[0].distance.unwrap() < 0.01);
        assert!(found[4].distance.is_none());

        let limited = backend.nearest("s1", &[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(limited.len(), 2);

        assert_eq!(backend.count(None).unwrap(), 6);
        assert_eq!(backend.count(Some("s2")).unwrap(), 1);
        let sessions = backend.sessions().unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, "s1");
        assert_eq!(sessions[0].records, 5);
    }

    #[test]
    fn sqlite_orders_by_distance_then_id() {
        exercise_ordering(&mut sqlite_backend(3));
    }

    #[test]
    fn in_memory_orders_by_distance_then_id() {
        exercise_ordering(&mut InMemoryBackend::new(3));
    }

    #[test]
    fn sqlite_roles_round_trip() {
        let mut backend = sqlite_backend(2);
        backend
            .insert_batch(&[NewRecord {
                session_id: "s".into(),
                role: Role::Other("mediator".into()),
                text: "hi".into(),
                embedding: vec![1.0, 0.0],
            }])
            .unwrap();
        let found = backend.nearest("s", &[1.0, 0.0], 1).unwrap();
        assert_eq!(found[0].role, Role::Other("mediator".into()));
    }

    #[test]
    fn sqlite_rejects_rebinding_dimensions() {
        let conn = db::open_memory_database().unwrap();
        db::meta::bind_embedding_dim(&conn, 384).unwrap();
        let err = SqliteBackend::new(conn, 768).err().unwrap();
        assert!(matches!(err, MemoryError::EmbeddingDimension { .. }));
    }

    #[test]
    fn failed_batch_writes_nothing() {
        let mut backend = sqlite_backend(2);
        let result = backend.insert_batch(&[
            row("s1", "fine", vec![1.0, 0.0]),
            row("s1", "", vec![1.0, 0.0]), // violates CHECK(text <> '')
        ]);
        assert!(matches!(result, Err(MemoryError::StorageUnavailable(_))));
        assert_eq!(backend.count(None).unwrap(), 0);
    }
}
