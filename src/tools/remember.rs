//! MCP `remember` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RememberParams {
    #[schemars(description = "Conversation/run the utterance belongs to. Must not be empty.")]
    pub session_id: String,

    #[schemars(description = "Speaker: 'user', 'assistant', or any other label. Defaults to 'user'.")]
    pub role: Option<String>,

    #[schemars(
        description = "Raw utterance text. Terminal artifacts are stripped; empty, model-error and scaffolding text is not stored."
    )]
    pub text: String,
}
