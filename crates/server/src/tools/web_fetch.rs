//! web_fetch tool implementation.
//!
//! Sends a request through the caching engine and reports which strategy
//! answered it and where the response came from.

use std::collections::BTreeMap;

use offgrid_client::{StrategyLabel, canonicalize};
use offgrid_core::{Error, Request};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::tools::json_result;

/// Input parameters for web_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WebFetchParams {
    /// The URL to fetch.
    pub url: String,

    /// HTTP method (default: GET). Only GET responses are ever cached.
    #[serde(default = "default_method")]
    pub method: String,

    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Strategy override: "cache-first", "network-first" or
    /// "stale-while-revalidate". Unrecognized values use the default.
    #[serde(default)]
    pub strategy: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for web_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WebFetchOutput {
    /// Canonical URL that was requested.
    pub url: String,
    /// Strategy that handled the request.
    pub strategy: String,
    /// HTTP status (503 when offline).
    pub status: u16,
    /// "network", "cache" or "offline".
    pub source: String,
    /// Content-Type header.
    pub content_type: Option<String>,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Response body, lossily decoded as UTF-8.
    pub body: String,
}

/// Run a request through the dispatcher.
pub async fn fetch(state: &AppState, params: WebFetchParams) -> Result<WebFetchOutput, Error> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()));
    }

    let url = canonicalize(&params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let request = params
        .headers
        .iter()
        .fold(Request::new(&params.method, url), |request, (name, value)| request.with_header(name, value.as_str()));

    let strategy = match params.strategy.as_deref() {
        Some(label) => StrategyLabel::parse_or_default(label),
        None => state.dispatcher.classify(request.url.as_str()),
    };

    let response = state.dispatcher.handle_with(&request, strategy).await;

    Ok(WebFetchOutput {
        url: request.url.to_string(),
        strategy: strategy.to_string(),
        status: response.status,
        source: response.source.as_str().to_string(),
        content_type: response.content_type().map(str::to_string),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        headers: response.headers,
    })
}

/// Implementation of the web_fetch tool.
pub async fn fetch_impl(state: &AppState, params: WebFetchParams) -> Result<CallToolResult, McpError> {
    let output = fetch(state, params).await?;
    json_result(&output)
}
