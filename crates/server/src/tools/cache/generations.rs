//! cache_generations tool implementation.

use offgrid_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::tools::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationInfo {
    pub name: String,
    /// Number of stored snapshots.
    pub entries: usize,
    /// False for generations the next sweep would delete.
    pub known: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGenerationsOutput {
    pub generations: Vec<GenerationInfo>,
}

pub async fn generations(state: &AppState) -> Result<CacheGenerationsOutput, Error> {
    let mut generations = Vec::new();
    for name in state.store.generation_names().await? {
        let entries = state.store.keys(&name).await?.len();
        let known = state.names().is_known(&name);
        generations.push(GenerationInfo { name, entries, known });
    }
    Ok(CacheGenerationsOutput { generations })
}

/// Implementation of the cache_generations tool.
pub async fn generations_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let output = generations(state).await?;
    json_result(&output)
}
