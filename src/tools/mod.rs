pub mod memory_stats;
pub mod recall;
pub mod remember;

use memory_stats::MemoryStatsParams;
use recall::RecallParams;
use remember::RememberParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use std::sync::{Arc, Mutex, MutexGuard};

use metamem::config::{normalize_terms, MetamemConfig};
use metamem::memory::context::{extract_block_terms, format_context};
use metamem::memory::types::Role;
use metamem::memory::MemoryStore;

/// The metamem MCP tool handler. Holds the shared store and config and
/// exposes the tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct MetamemTools {
    tool_router: ToolRouter<Self>,
    store: Arc<Mutex<MemoryStore>>,
    config: Arc<MetamemConfig>,
}

fn lock(store: &Mutex<MemoryStore>) -> anyhow::Result<MutexGuard<'_, MemoryStore>> {
    store
        .lock()
        .map_err(|e| anyhow::anyhow!("store lock poisoned: {e}"))
}

#[tool_router]
impl MetamemTools {
    pub fn new(store: Arc<Mutex<MemoryStore>>, config: Arc<MetamemConfig>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            store,
            config,
        }
    }

    /// Store one utterance of a session.
    #[tool(description = "Remember an utterance of a session. Returns the new record id, or null when the text was empty, a model error, or orchestration scaffolding.")]
    async fn remember(
        &self,
        Parameters(params): Parameters<RememberParams>,
    ) -> Result<String, String> {
        let role: Role = params.role.as_deref().unwrap_or("user").parse()?;

        tracing::info!(
            session_id = %params.session_id,
            role = %role,
            text_len = params.text.len(),
            "remember called"
        );

        // Embedding and SQLite are both blocking → spawn_blocking
        let store = Arc::clone(&self.store);
        let id = tokio::task::spawn_blocking(move || {
            let mut store = lock(&store)?;
            store
                .remember(&params.session_id, role, &params.text)
                .map_err(anyhow::Error::from)
        })
        .await
        .map_err(|e| format!("store task failed: {e}"))?
        .map_err(|e| format!("remember failed: {e}"))?;

        Ok(serde_json::json!({ "id": id, "stored": id.is_some() }).to_string())
    }

    /// Recall relevant memories of a session.
    #[tool(description = "Recall the memories of a session most relevant to a query, nearest first. Also returns them formatted as prompt context.")]
    async fn recall(
        &self,
        Parameters(params): Parameters<RecallParams>,
    ) -> Result<String, String> {
        let k = params.k.unwrap_or(self.config.recall.default_k);
        let mut block_terms = normalize_terms(&params.block_terms.unwrap_or_default());
        if params.derive_block_terms.unwrap_or(false) {
            block_terms.extend(extract_block_terms(&params.query));
        }
        let snippet_chars = self.config.recall.snippet_chars;

        tracing::info!(
            session_id = %params.session_id,
            k,
            block_terms = block_terms.len(),
            "recall called"
        );

        let store = Arc::clone(&self.store);
        let (results, context) = tokio::task::spawn_blocking(move || {
            let store = lock(&store)?;
            let results = store.recall(&params.session_id, &params.query, k, &block_terms)?;
            let context = format_context(
                &results,
                &block_terms,
                store.noise_classifier(),
                snippet_chars,
            );
            anyhow::Ok((results, context))
        })
        .await
        .map_err(|e| format!("store task failed: {e}"))?
        .map_err(|e| format!("recall failed: {e}"))?;

        tracing::info!(kept = results.len(), "recall complete");

        Ok(serde_json::json!({
            "results": results,
            "total": results.len(),
            "context": context,
        })
        .to_string())
    }

    /// Get statistics about the memory store.
    #[tool(description = "Get memory store statistics: record counts per session, time range, embedding model, storage size.")]
    async fn memory_stats(
        &self,
        Parameters(params): Parameters<MemoryStatsParams>,
    ) -> Result<String, String> {
        let db_path =
            (self.config.storage.backend == "sqlite").then(|| self.config.resolved_db_path());

        let store = Arc::clone(&self.store);
        let response = tokio::task::spawn_blocking(move || {
            let store = lock(&store)?;
            metamem::memory::stats::memory_stats(
                &store,
                params.session_id.as_deref(),
                db_path.as_deref(),
            )
            .map_err(anyhow::Error::from)
        })
        .await
        .map_err(|e| format!("store task failed: {e}"))?
        .map_err(|e| format!("stats failed: {e}"))?;

        serde_json::to_string(&response).map_err(|e| format!("serialization failed: {e}"))
    }
}

#[tool_handler]
impl ServerHandler for MetamemTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "metamem is a session-scoped conversational memory. Use remember to store \
                 each utterance of a run, recall before answering to fetch relevant \
                 earlier utterances, and memory_stats to inspect the store."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
