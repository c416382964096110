//! Cache-first: serve a stored snapshot whenever one exists.
//!
//! The network is never consulted on a hit. On a miss the response is
//! fetched, a 2xx copy is stored, and only then returned. A network failure
//! on a miss yields the offline response.

use offgrid_core::{Generation, Request, Response};

use crate::fetch::Fetcher;

pub async fn run(fetcher: &dyn Fetcher, request: &Request, generation: &Generation) -> Response {
    if let Some(hit) = super::cached(generation, request).await {
        tracing::debug!(url = %request.url, "cache-first hit");
        return hit;
    }

    match fetcher.fetch(request).await {
        Ok(response) => {
            super::store_if_success(generation, request, &response).await;
            response
        }
        Err(e) => {
            tracing::info!(url = %request.url, error = %e, "cache-first miss and network failed; serving offline");
            Response::offline()
        }
    }
}
