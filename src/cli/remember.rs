use anyhow::Result;

use metamem::config::MetamemConfig;
use metamem::memory::types::Role;
use metamem::memory::MemoryStore;

/// Store one utterance from the terminal.
pub fn remember(config: &MetamemConfig, session_id: &str, role: Role, text: &str) -> Result<()> {
    let mut store = MemoryStore::from_config(config)?;

    match store.remember(session_id, role, text)? {
        Some(id) => println!("Stored as #{id} in session {session_id}"),
        None => println!("Not stored (empty, model error, or scaffolding)"),
    }
    Ok(())
}
