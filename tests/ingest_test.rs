mod helpers;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use helpers::{
    both_backends, hash_embedder, memory_store, settings, sqlite_store, TableEmbedder,
    WrongDimEmbedder,
};
use metamem::config::IngestConfig;
use metamem::ingest::{ingest_paths, IngestOptions, IngestReport};
use tempfile::TempDir;

fn write(path: &Path, contents: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// runs/alpha/log1.txt   scaffolding + two real paragraphs
/// runs/beta/log2.txt    one line with terminal junk
/// runs/empty.txt        nothing after cleaning
/// runs/notes.md         not a log
fn sample_runs() -> TempDir {
    let dir = TempDir::new().unwrap();
    let runs = dir.path().join("runs");
    write(
        &runs.join("alpha/log1.txt"),
        b"=== Turn 1 ===\nCREATOR: draft the plan\n\n\x1b[32mThe greenhouse needs more light.\x1b[0m\r\n\r\nWe will add LED panels.\n",
    );
    write(&runs.join("beta/log2.txt"), "\u{280b} Flight leaves Friday at noon.\x07".as_bytes());
    write(&runs.join("empty.txt"), b"\x00\x1b[0m\x00");
    write(&runs.join("notes.md"), b"not ingested");
    dir
}

fn options() -> IngestOptions {
    IngestOptions::from_config(&IngestConfig::default()).unwrap()
}

#[test]
fn ingests_logs_into_sessions_named_after_directories() {
    let dir = sample_runs();
    let mut store = sqlite_store(hash_embedder(64), settings(64, 2.0));

    let report = ingest_paths(&mut store, &[dir.path().join("runs")], &options());
    assert_eq!(
        report,
        IngestReport {
            files: 3,
            chunks: 2,
            stored: 2,
            skipped: 1,
            partial: 0,
        }
    );

    assert_eq!(store.record_count(Some("alpha")).unwrap(), 1);
    assert_eq!(store.record_count(Some("beta")).unwrap(), 1);

    let alpha = store.recall("alpha", "greenhouse light", 5, &[]).unwrap();
    assert_eq!(alpha.len(), 1);
    assert_eq!(
        alpha[0].text,
        "The greenhouse needs more light.\n\nWe will add LED panels."
    );

    let beta = store.recall("beta", "flight", 5, &[]).unwrap();
    assert_eq!(beta[0].text, "Flight leaves Friday at noon.");
}

#[test]
fn session_override_collects_everything_in_one_session() {
    let dir = sample_runs();
    let mut store = memory_store(hash_embedder(64), settings(64, 2.0));
    let mut opts = options();
    opts.session_override = Some("imported".into());

    let report = ingest_paths(&mut store, &[dir.path().to_path_buf()], &opts);
    assert_eq!(report.stored, 2);
    assert_eq!(store.record_count(Some("imported")).unwrap(), 2);
    assert_eq!(store.sessions().unwrap().len(), 1);
}

#[test]
fn long_files_are_split_into_batched_chunks() {
    let dir = TempDir::new().unwrap();
    let paragraphs: Vec<String> = (0..10).map(|i| format!("paragraph number {i:02}")).collect();
    write(&dir.path().join("long/log.txt"), paragraphs.join("\n\n").as_bytes());

    let mut store = memory_store(hash_embedder(64), settings(64, 2.0));
    let mut opts = options();
    // "paragraph number 00" is 19 chars; two fit with the separator (40)
    opts.chunk_chars = 40;
    opts.batch_size = 2;

    let report = ingest_paths(&mut store, &[dir.path().to_path_buf()], &opts);
    assert_eq!(report.chunks, 5);
    assert_eq!(report.stored, 5);
    assert_eq!(store.record_count(Some("long")).unwrap(), 5);
}

#[test]
fn failing_files_are_skipped_not_fatal() {
    let dir = sample_runs();
    let mut store = memory_store(Arc::new(WrongDimEmbedder { dimensions: 16 }), settings(16, 0.35));

    let report = ingest_paths(&mut store, &[dir.path().to_path_buf()], &options());
    assert_eq!(report.files, 3);
    assert_eq!(report.stored, 0);
    assert_eq!(report.skipped, 3);
    assert_eq!(store.record_count(None).unwrap(), 0);
}

#[test]
fn file_failing_after_a_committed_batch_is_reported_as_partial() {
    let dir = TempDir::new().unwrap();
    write(
        &dir.path().join("run/log.txt"),
        b"The first chunk embeds fine.\n\nThe second chunk has no vector.",
    );
    let embedder = Arc::new(TableEmbedder::new(8).at("The first chunk embeds fine.", 0.0));

    for (name, mut store) in both_backends(embedder, settings(8, 0.35)) {
        let mut opts = options();
        // 28 + 2 + 31 chars do not fit in one chunk
        opts.chunk_chars = 40;
        opts.batch_size = 1;

        let report = ingest_paths(&mut store, &[dir.path().to_path_buf()], &opts);
        assert_eq!(
            report,
            IngestReport {
                files: 1,
                chunks: 2,
                stored: 1,
                skipped: 0,
                partial: 1,
            },
            "{name}"
        );
        assert_eq!(store.record_count(Some("run")).unwrap(), 1, "{name}");
    }
}

#[test]
fn missing_paths_yield_an_empty_report() {
    let dir = TempDir::new().unwrap();
    let mut store = memory_store(hash_embedder(64), settings(64, 0.35));
    let report = ingest_paths(&mut store, &[dir.path().join("nope")], &options());
    assert_eq!(report, IngestReport::default());
}
