use anyhow::Result;
use std::path::PathBuf;

use metamem::config::MetamemConfig;
use metamem::ingest::{ingest_paths, IngestOptions};
use metamem::memory::MemoryStore;

/// Ingest `.txt` logs from files and directories.
pub fn ingest(config: &MetamemConfig, paths: &[PathBuf], session: Option<String>) -> Result<()> {
    let mut options = IngestOptions::from_config(&config.ingest)?;
    options.session_override = session;

    let mut store = MemoryStore::from_config(config)?;
    let report = ingest_paths(&mut store, paths, &options);

    anyhow::ensure!(report.files > 0, "no .txt files found under the given paths");

    println!("Ingest Report");
    println!("{}", "=".repeat(40));
    println!("  Files:               {}", report.files);
    println!("  Chunks:              {}", report.chunks);
    println!("  Stored:              {}", report.stored);
    println!("  Skipped files:       {}", report.skipped);
    if report.partial > 0 {
        println!("  Partially stored:    {}", report.partial);
    }

    Ok(())
}
