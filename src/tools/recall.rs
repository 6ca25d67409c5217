//! MCP `recall` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `recall` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecallParams {
    #[schemars(description = "Session to search. Memories of other sessions are never returned.")]
    pub session_id: String,

    #[schemars(description = "Natural language query, usually the latest user message")]
    pub query: String,

    /// Maximum number of results. Defaults to the configured `recall.default_k`.
    #[schemars(description = "Maximum number of results to return. Defaults to 6.")]
    pub k: Option<usize>,

    #[schemars(
        description = "Case-insensitive terms; memories containing any of them are excluded"
    )]
    pub block_terms: Option<Vec<String>>,

    #[schemars(
        description = "If true, also block topics the query asks to avoid (e.g. 'nothing about politics')"
    )]
    pub derive_block_terms: Option<bool>,
}
