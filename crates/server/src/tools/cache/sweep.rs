//! cache_sweep tool implementation.
//!
//! Runs the activation sweep on demand, deleting generations left behind
//! by other cache versions.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::tools::json_result;

/// Output from the cache_sweep tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheSweepOutput {
    /// Names of the deleted generations.
    pub deleted: Vec<String>,
}

/// Implementation of the cache_sweep tool.
pub async fn sweep_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let deleted = state.manager.activate().await?;
    json_result(&CacheSweepOutput { deleted })
}
