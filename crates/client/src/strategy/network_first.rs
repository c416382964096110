//! Network-first: freshness over hit latency.
//!
//! Exactly one network attempt per call. A 2xx answer is stored and
//! returned. When the network fails, the stored snapshot is served, or the
//! offline response if there is none.

use offgrid_core::{Generation, Request, Response};

use crate::fetch::Fetcher;

pub async fn run(fetcher: &dyn Fetcher, request: &Request, generation: &Generation) -> Response {
    match fetcher.fetch(request).await {
        Ok(response) => {
            super::store_if_success(generation, request, &response).await;
            response
        }
        Err(e) => {
            tracing::info!(url = %request.url, error = %e, "network-first fetch failed; falling back to cache");
            super::cached(generation, request).await.unwrap_or_else(Response::offline)
        }
    }
}
