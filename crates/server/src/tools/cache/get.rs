//! cache_get tool implementation.
//!
//! Retrieves the snapshot stored for a URL in one generation.

use std::collections::BTreeMap;

use offgrid_client::canonicalize;
use offgrid_core::{Error, Request};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// The URL whose snapshot to retrieve.
    pub url: String,

    /// Generation to look in (default: the dynamic generation).
    #[serde(default)]
    pub generation: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub generation: String,
    pub key: String,
    pub url: String,
    pub status: u16,
    pub stored_at: String,
    pub headers: BTreeMap<String, String>,
    /// Stored body, lossily decoded as UTF-8.
    pub body: String,
}

pub async fn get(state: &AppState, params: CacheGetParams) -> Result<CacheGetOutput, Error> {
    let url = canonicalize(&params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let request = Request::get(url);
    let generation = params
        .generation
        .unwrap_or_else(|| state.names().dynamic_name.clone());

    let snapshot = state
        .store
        .lookup(&generation, &request)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{} in {generation}", request.url)))?;

    Ok(CacheGetOutput {
        generation,
        key: snapshot.key.to_string(),
        url: snapshot.url.clone(),
        status: snapshot.status,
        stored_at: snapshot.stored_at.clone(),
        headers: snapshot.headers()?,
        body: String::from_utf8_lossy(&snapshot.body).into_owned(),
    })
}

/// Implementation of the cache_get tool.
pub async fn get_impl(state: &AppState, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let output = get(state, params).await?;
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::memory_state;
    use offgrid_core::{Generation, Headers, Response};

    #[tokio::test]
    async fn test_get_missing() {
        let state = memory_state().await;
        let params = CacheGetParams { url: "https://example.com/nothing".into(), generation: None };

        let result = get(&state, params).await;
        assert!(matches!(result, Err(Error::CacheMiss(_))));
    }

    #[tokio::test]
    async fn test_get_found_in_static_generation() {
        let state = memory_state().await;
        let static_name = state.names().static_name.clone();
        let generation = Generation::open(state.store.clone(), &static_name).await.unwrap();
        let request = Request::parse("https://example.com/index.html").unwrap();
        generation.put(&request, &Response::new(200, Headers::new(), "<html>")).await.unwrap();

        let params = CacheGetParams { url: "example.com/index.html".into(), generation: Some(static_name.clone()) };
        let output = get(&state, params).await.unwrap();

        assert_eq!(output.generation, static_name);
        assert_eq!(output.url, "https://example.com/index.html");
        assert_eq!(output.status, 200);
        assert_eq!(output.body, "<html>");
        assert_eq!(output.key.len(), 64);
    }

    #[tokio::test]
    async fn test_get_impl_missing_is_error() {
        let state = memory_state().await;
        let params = CacheGetParams { url: "https://example.com/".into(), generation: None };
        assert!(get_impl(&state, params).await.is_err());
    }
}
