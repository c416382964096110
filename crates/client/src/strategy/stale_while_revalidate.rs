//! Stale-while-revalidate: serve immediately, refresh in the background.
//!
//! A refresh task is always spawned. On a hit the stored snapshot is returned
//! right away and the task is left detached; its 2xx result is stored for the
//! next caller and its failure is dropped. On a miss the caller waits for the
//! task instead.
//!
//! A miss whose refresh fails resolves to `None`. This executor does not turn
//! that into the offline response; the dispatcher decides.

use std::sync::Arc;

use offgrid_core::{Generation, Request, Response};

use crate::fetch::Fetcher;

pub async fn run(fetcher: Arc<dyn Fetcher>, request: &Request, generation: &Generation) -> Option<Response> {
    let cached = super::cached(generation, request).await;

    let refresh = tokio::spawn(refresh(fetcher, request.clone(), generation.clone()));

    if let Some(stale) = cached {
        tracing::debug!(url = %request.url, "serving cached snapshot, refreshing in background");
        return Some(stale);
    }

    match refresh.await {
        Ok(fresh) => fresh,
        Err(e) => {
            tracing::warn!(url = %request.url, error = %e, "refresh task aborted");
            None
        }
    }
}

async fn refresh(fetcher: Arc<dyn Fetcher>, request: Request, generation: Generation) -> Option<Response> {
    match fetcher.fetch(&request).await {
        Ok(response) => {
            super::store_if_success(&generation, &request, &response).await;
            Some(response)
        }
        Err(e) => {
            tracing::debug!(url = %request.url, error = %e, "background refresh failed");
            None
        }
    }
}
