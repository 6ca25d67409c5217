use anyhow::Result;

use metamem::config::{normalize_terms, MetamemConfig};
use metamem::memory::context::{extract_block_terms, format_context};
use metamem::memory::MemoryStore;

/// Options for `metamem recall`.
pub struct RecallArgs<'a> {
    pub session_id: &'a str,
    pub query: &'a str,
    pub k: Option<usize>,
    pub block_terms: &'a [String],
    pub derive_block_terms: bool,
    /// Print the formatted prompt context instead of a result list.
    pub context: bool,
}

/// Run a recall from the terminal.
pub fn recall(config: &MetamemConfig, args: &RecallArgs<'_>) -> Result<()> {
    let store = MemoryStore::from_config(config)?;

    let k = args.k.unwrap_or(config.recall.default_k);
    let mut block_terms = normalize_terms(args.block_terms);
    if args.derive_block_terms {
        block_terms.extend(extract_block_terms(args.query));
    }

    let results = store.recall(args.session_id, args.query, k, &block_terms)?;

    if args.context {
        println!(
            "{}",
            format_context(
                &results,
                &block_terms,
                store.noise_classifier(),
                config.recall.snippet_chars,
            )
        );
        return Ok(());
    }

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} result(s)\n", results.len());
    for (i, result) in results.iter().enumerate() {
        let preview: String = result.text.chars().take(120).collect();
        let ellipsis = if result.text.chars().count() > 120 { "..." } else { "" };
        println!(
            "  {}. [{}] (distance: {:.4})",
            i + 1,
            result.role,
            result.distance
        );
        println!("     {preview}{ellipsis}");
        println!();
    }

    Ok(())
}
