//! CLI `doctor` command — run database diagnostics and print a health report.

use anyhow::{Context, Result};

use metamem::config::MetamemConfig;
use metamem::db;
use metamem::embedding::hash;

/// Model identifier the configured provider records, without loading it.
fn configured_model(config: &MetamemConfig) -> &str {
    match config.embedding.provider.as_str() {
        "hash" => hash::MODEL_NAME,
        _ => &config.embedding.model,
    }
}

/// Run database diagnostics and print a health report.
pub fn doctor(config: &MetamemConfig) -> Result<()> {
    if config.storage.backend != "sqlite" {
        println!("Storage backend is {:?}; nothing persisted to check.", config.storage.backend);
        return Ok(());
    }

    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `metamem serve` or `metamem remember` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path)
        .map(|m| m.len())
        .unwrap_or(0);

    let conn = db::open_database(&db_path)
        .context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn)
        .context("failed to run health check")?;

    println!("metamem Health Report");
    println!("=====================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("sqlite-vec:        {}", report.sqlite_vec_version);
    println!();

    let model = configured_model(config);
    println!("Embedding model:");
    println!("  Stored:          {}", report.embedding_model.as_deref().unwrap_or("(not set)"));
    println!("  Configured:      {model}");
    if let Some(ref stored) = report.embedding_model {
        if stored != model {
            println!("  WARNING: model mismatch! Distances to older records are not comparable.");
        } else {
            println!("  Status:          OK (match)");
        }
    }
    println!();

    println!("Embedding dimensions:");
    match report.embedding_dim {
        Some(dim) => println!("  Stored:          {dim}"),
        None => println!("  Stored:          (not set)"),
    }
    println!("  Configured:      {}", config.embedding.dimensions);
    if report
        .embedding_dim
        .is_some_and(|dim| dim != config.embedding.dimensions)
    {
        println!("  ERROR: dimension mismatch! This database cannot be opened with the current config.");
    }
    println!();

    println!("Row counts:");
    println!("  Records:         {}", report.memory_count);
    println!("  Sessions:        {}", report.session_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db {}", db_path.display());
        println!("  2. Or move the file aside and re-run `metamem ingest` on the original logs.");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_configured_model_follows_provider() {
        let mut config = MetamemConfig::default();
        assert_eq!(configured_model(&config), "all-MiniLM-L6-v2");
        config.embedding.provider = "hash".into();
        assert_eq!(configured_model(&config), "fnv1a-hash");
    }
}
