//! Store-level metadata kept in `schema_meta`.
//!
//! The embedding dimensionality is bound to a database the first time it is
//! opened; every later open must agree, so a store never mixes vector lengths.

use rusqlite::{Connection, OptionalExtension};

use crate::memory::error::MemoryError;

fn get_meta(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = ?1",
        [key],
        |row| row.get::<_, String>(0),
    )
    .optional()
}

fn set_meta(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_meta (key, value) VALUES (?1, ?2)",
        [key, value],
    )?;
    Ok(())
}

/// Get the schema version recorded in the database (0 if missing).
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    Ok(get_meta(conn, "schema_version")?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0))
}

/// Get the stored embedding model identifier, if any.
pub fn get_embedding_model(conn: &Connection) -> rusqlite::Result<Option<String>> {
    get_meta(conn, "embedding_model")
}

/// Set the stored embedding model identifier.
pub fn set_embedding_model(conn: &Connection, model: &str) -> rusqlite::Result<()> {
    set_meta(conn, "embedding_model", model)
}

/// Get the embedding dimensionality bound to this database, if any.
pub fn get_embedding_dim(conn: &Connection) -> rusqlite::Result<Option<usize>> {
    Ok(get_meta(conn, "embedding_dim")?.and_then(|v| v.parse().ok()))
}

/// Bind `dim` to the database, or verify it matches the bound value.
pub fn bind_embedding_dim(conn: &Connection, dim: usize) -> Result<(), MemoryError> {
    match get_embedding_dim(conn)? {
        Some(stored) if stored != dim => Err(MemoryError::EmbeddingDimension {
            expected: stored,
            actual: dim,
        }),
        Some(_) => Ok(()),
        None => {
            set_meta(conn, "embedding_dim", &dim.to_string())?;
            tracing::info!(dim, "bound embedding dimensionality to database");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        crate::db::schema::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn fresh_db_has_schema_version_1() {
        let conn = test_db();
        assert_eq!(get_schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn set_and_get_embedding_model() {
        let conn = test_db();
        assert!(get_embedding_model(&conn).unwrap().is_none());

        set_embedding_model(&conn, "all-MiniLM-L6-v2").unwrap();
        set_embedding_model(&conn, "new-model-v3").unwrap();
        assert_eq!(
            get_embedding_model(&conn).unwrap(),
            Some("new-model-v3".to_string())
        );
    }

    #[test]
    fn embedding_dim_binds_once() {
        let conn = test_db();
        assert_eq!(get_embedding_dim(&conn).unwrap(), None);

        bind_embedding_dim(&conn, 384).unwrap();
        bind_embedding_dim(&conn, 384).unwrap();
        assert_eq!(get_embedding_dim(&conn).unwrap(), Some(384));

        let err = bind_embedding_dim(&conn, 768).unwrap_err();
        assert!(matches!(
            err,
            MemoryError::EmbeddingDimension {
                expected: 384,
                actual: 768
            }
        ));
    }
}
