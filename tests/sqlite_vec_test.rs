use metamem::db;
use metamem::memory::vector::to_bytes;

fn distance(conn: &rusqlite::Connection, a: &[f32], b: &[f32]) -> f64 {
    conn.query_row(
        "SELECT vec_distance_cosine(?1, ?2)",
        rusqlite::params![to_bytes(a), to_bytes(b)],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn sqlite_vec_is_loaded() {
    let conn = db::open_memory_database().unwrap();
    let version: String = conn
        .query_row("SELECT vec_version()", [], |r| r.get(0))
        .unwrap();
    assert!(!version.is_empty(), "sqlite-vec version should be non-empty");
}

#[test]
fn cosine_distance_over_stored_blobs() {
    let conn = db::open_memory_database().unwrap();
    let e0 = [1.0f32, 0.0, 0.0];
    let e1 = [0.0f32, 1.0, 0.0];
    let neg = [-1.0f32, 0.0, 0.0];
    let scaled = [3.0f32, 0.0, 0.0];

    assert!(distance(&conn, &e0, &e0).abs() < 1e-6);
    assert!(distance(&conn, &e0, &scaled).abs() < 1e-6);
    assert!((distance(&conn, &e0, &e1) - 1.0).abs() < 1e-6);
    assert!((distance(&conn, &e0, &neg) - 2.0).abs() < 1e-6);
}
