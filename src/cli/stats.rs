use anyhow::Result;

use metamem::config::MetamemConfig;
use metamem::memory::MemoryStore;

/// Display memory statistics in the terminal.
pub fn stats(config: &MetamemConfig, session_id: Option<&str>) -> Result<()> {
    let store = MemoryStore::from_config(config)?;
    let db_path = (config.storage.backend == "sqlite").then(|| config.resolved_db_path());

    let response =
        metamem::memory::stats::memory_stats(&store, session_id, db_path.as_deref())?;

    println!("Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total records:       {}", response.total_records);
    println!("  Sessions:            {}", response.session_count);
    println!(
        "  Embedding:           {} ({} dims)",
        response.embedding_model, response.embedding_dim
    );
    println!();

    if !response.sessions.is_empty() {
        println!("By Session:");
        for s in &response.sessions {
            println!("  {:<24} {:>6}  {} .. {}", s.session_id, s.records, s.first_at, s.last_at);
        }
        println!();
    }

    println!("Database size:         {} bytes", response.db_size_bytes);

    if let Some(ref oldest) = response.oldest_record {
        println!("Oldest record:         {oldest}");
    }
    if let Some(ref newest) = response.newest_record {
        println!("Newest record:         {newest}");
    }

    Ok(())
}
