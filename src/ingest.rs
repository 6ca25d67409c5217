//! Bulk ingestion of plain-text run logs.
//!
//! Each `.txt` file is read lossily, cleaned, split into paragraphs, stripped
//! of scaffolding paragraphs, and packed into chunks of at most
//! `chunk_chars` characters. A file's chunks are stored under the session
//! named after its parent directory (or `root`) through
//! [`MemoryStore::remember_batch`], `batch_size` chunks per transaction.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

use crate::config::IngestConfig;
use crate::memory::clean::clean_text;
use crate::memory::store::MemoryStore;
use crate::memory::types::Role;

static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

/// Session used for files without a named parent directory.
pub const ROOT_SESSION: &str = "root";

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub chunk_chars: usize,
    pub batch_size: usize,
    pub role: Role,
    /// Store every file under this session instead of its parent directory name.
    pub session_override: Option<String>,
}

impl IngestOptions {
    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        let role = config
            .role
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid ingest role {:?}: {e}", config.role))?;
        Ok(Self {
            chunk_chars: config.chunk_chars.max(1),
            batch_size: config.batch_size.max(1),
            role,
            session_override: None,
        })
    }
}

/// Outcome of an ingestion run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// `.txt` files found.
    pub files: usize,
    /// Chunks produced from readable, non-empty files.
    pub chunks: usize,
    /// Chunks actually written.
    pub stored: usize,
    /// Files that were empty, all noise, or failed before anything was stored.
    pub skipped: usize,
    /// Files whose earlier batches were stored before a later batch failed.
    pub partial: usize,
}

/// Ingest every `.txt` file under `paths` (files or directories, recursively).
///
/// A file that cannot be read or stored is logged and counted as skipped,
/// or as partial when some of its batches were already committed. The run
/// continues with the next file.
pub fn ingest_paths(
    store: &mut MemoryStore,
    paths: &[PathBuf],
    options: &IngestOptions,
) -> IngestReport {
    let files = collect_text_files(paths);
    let mut report = IngestReport {
        files: files.len(),
        ..IngestReport::default()
    };

    for file in &files {
        let stored_before = report.stored;
        match ingest_file(store, file, options, &mut report) {
            Ok(true) => {}
            Ok(false) => report.skipped += 1,
            Err(e) if report.stored > stored_before => {
                tracing::warn!(
                    file = %file.display(),
                    stored = report.stored - stored_before,
                    error = %e,
                    "file partially stored"
                );
                report.partial += 1;
            }
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "skipping file");
                report.skipped += 1;
            }
        }
    }

    tracing::info!(
        files = report.files,
        chunks = report.chunks,
        stored = report.stored,
        skipped = report.skipped,
        partial = report.partial,
        "ingest complete"
    );
    report
}

/// Returns `Ok(false)` when the file had nothing worth storing.
fn ingest_file(
    store: &mut MemoryStore,
    path: &Path,
    options: &IngestOptions,
    report: &mut IngestReport,
) -> Result<bool> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let text = clean_text(&String::from_utf8_lossy(&bytes));
    if text.is_empty() {
        tracing::info!(file = %path.display(), "empty after cleaning");
        return Ok(false);
    }

    let chunks = chunk_text(&text, options.chunk_chars, |p| store.is_noise(p));
    if chunks.is_empty() {
        tracing::info!(file = %path.display(), "only scaffolding, nothing to store");
        return Ok(false);
    }
    report.chunks += chunks.len();

    let session = options
        .session_override
        .clone()
        .unwrap_or_else(|| session_for(path));

    for batch in chunks.chunks(options.batch_size.max(1)) {
        let texts: Vec<&str> = batch.iter().map(String::as_str).collect();
        let ids = store
            .remember_batch(&session, options.role.clone(), &texts)
            .with_context(|| format!("failed to store {}", path.display()))?;
        report.stored += ids.iter().flatten().count();
    }

    tracing::debug!(file = %path.display(), session_id = %session, chunks = chunks.len(), "ingested");
    Ok(true)
}

/// All `.txt` files under `paths`, sorted and de-duplicated.
pub fn collect_text_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = paths
        .iter()
        .flat_map(|root| WalkDir::new(root).follow_links(true))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "cannot walk path");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
        })
        .collect();
    files.sort();
    files.dedup();
    files
}

/// Session name for a log file: its parent directory's name, or [`ROOT_SESSION`].
pub fn session_for(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| ROOT_SESSION.to_string())
}

/// Split `text` into paragraphs, drop noise and blank ones, and pack the rest
/// into chunks of at most `max_chars` characters.
///
/// Paragraphs are joined with a blank line. A paragraph longer than
/// `max_chars` is cut on character boundaries into pieces of its own.
pub fn chunk_text(text: &str, max_chars: usize, is_noise: impl Fn(&str) -> bool) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for paragraph in PARAGRAPH_BREAK.split(text) {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() || is_noise(paragraph) {
            continue;
        }
        let len = paragraph.chars().count();

        if len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = paragraph.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|piece| piece.iter().collect::<String>()));
            continue;
        }

        // +2 for the blank line separating paragraphs
        if !current.is_empty() && current_len + 2 + len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push_str("\n\n");
            current_len += 2;
        }
        current.push_str(paragraph);
        current_len += len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
