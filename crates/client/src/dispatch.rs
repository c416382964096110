//! Request dispatcher: the single entry point for intercepted requests.
//!
//! `handle` always produces a response. This is the only place a failure
//! that reaches the top of the engine becomes the offline response.

use std::sync::Arc;

use offgrid_core::{CacheStore, Generation, GenerationNames, Request, Response};

use crate::fetch::{Fetcher, is_interceptable};
use crate::strategy::{PatternTable, StrategyLabel, cache_first, network_first, stale_while_revalidate};

/// Routes each request to the executor its URL classifies into, against
/// the dynamic generation.
pub struct Dispatcher {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    table: PatternTable,
    dynamic_name: String,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>, table: PatternTable, names: &GenerationNames,
    ) -> Self {
        Self { store, fetcher, table, dynamic_name: names.dynamic_name.clone() }
    }

    /// Strategy the dispatcher would use for `url`.
    pub fn classify(&self, url: &str) -> StrategyLabel {
        self.table.classify(url)
    }

    /// Whether `request` goes through the cache at all.
    pub fn intercepts(&self, request: &Request) -> bool {
        is_interceptable(&request.url)
    }

    /// Answer `request` using its classified strategy.
    pub async fn handle(&self, request: &Request) -> Response {
        let strategy = self.classify(request.url.as_str());
        self.handle_with(request, strategy).await
    }

    /// Answer `request` with an explicit strategy.
    pub async fn handle_with(&self, request: &Request, strategy: StrategyLabel) -> Response {
        if !self.intercepts(request) {
            return self.pass_through(request).await;
        }

        let generation = match Generation::open(self.store.clone(), &self.dynamic_name).await {
            Ok(generation) => generation,
            Err(e) => {
                tracing::error!(generation = %self.dynamic_name, error = %e, "failed to open dynamic generation");
                return Response::offline();
            }
        };

        tracing::debug!(url = %request.url, %strategy, "dispatching");

        match strategy {
            StrategyLabel::CacheFirst => cache_first::run(self.fetcher.as_ref(), request, &generation).await,
            StrategyLabel::NetworkFirst => network_first::run(self.fetcher.as_ref(), request, &generation).await,
            StrategyLabel::StaleWhileRevalidate => {
                stale_while_revalidate::run(self.fetcher.clone(), request, &generation)
                    .await
                    .unwrap_or_else(|| {
                        tracing::warn!(url = %request.url, "no cached snapshot and refresh failed; serving offline");
                        Response::offline()
                    })
            }
        }
    }

    /// Requests outside the interception scope go straight to the network.
    async fn pass_through(&self, request: &Request) -> Response {
        match self.fetcher.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "pass-through fetch failed");
                Response::offline()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::DEFAULT_STRATEGY;
    use crate::testing::{DYNAMIC, MockFetcher, memory_store, request, text_response};
    use offgrid_core::ResponseSource;
    use offgrid_core::config::StrategyPatterns;

    fn names() -> GenerationNames {
        GenerationNames::new("offgrid", "v1.0.0")
    }

    fn dispatcher(store: Arc<dyn CacheStore>, fetcher: Arc<MockFetcher>) -> Dispatcher {
        let table = PatternTable::new(&StrategyPatterns::default()).unwrap();
        Dispatcher::new(store, fetcher, table, &names())
    }

    #[test]
    fn test_names_match_test_generation() {
        assert_eq!(names().dynamic_name, DYNAMIC);
    }

    #[tokio::test]
    async fn test_cache_first_route_uses_dynamic_generation() {
        let store = memory_store().await;
        let url = "https://example.com/app.css";
        let fetcher = MockFetcher::new().respond(url, 200, "body{}").shared();
        let dispatcher = dispatcher(store.clone(), fetcher.clone());

        let first = dispatcher.handle(&request(url)).await;
        let second = dispatcher.handle(&request(url)).await;

        assert_eq!(first.source, ResponseSource::Network);
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(fetcher.calls(), 1);
        assert!(store.lookup(DYNAMIC, &request(url)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_network_first_route_falls_back() {
        let store = memory_store().await;
        let url = "https://example.com/contact";
        let generation = Generation::open(store.clone(), DYNAMIC).await.unwrap();
        generation.put(&request(url), &text_response(200, "form")).await.unwrap();
        let fetcher = MockFetcher::new().fail(url).shared();

        let response = dispatcher(store, fetcher).handle(&request(url)).await;

        assert_eq!(response.body, "form");
    }

    #[tokio::test]
    async fn test_default_route_offline_when_nothing_available() {
        let store = memory_store().await;
        let url = "https://example.com/about";
        let fetcher = MockFetcher::new().fail(url).shared();
        let dispatcher = dispatcher(store, fetcher);

        assert_eq!(dispatcher.classify(url), DEFAULT_STRATEGY);
        let response = dispatcher.handle(&request(url)).await;

        assert_eq!(response.status, 503);
        assert_eq!(response.body, "Offline");
    }

    #[tokio::test]
    async fn test_unknown_label_routes_like_default() {
        let store = memory_store().await;
        let url = "https://example.com/api/feed";
        let fetcher = MockFetcher::new().respond(url, 200, "[]").shared();
        let dispatcher = dispatcher(store, fetcher.clone());

        let strategy = StrategyLabel::parse_or_default("cache-only");
        let response = dispatcher.handle_with(&request(url), strategy).await;

        assert_eq!(strategy, StrategyLabel::StaleWhileRevalidate);
        assert_eq!(response.body, "[]");
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_explicit_strategy_overrides_classification() {
        let store = memory_store().await;
        let url = "https://example.com/app.js";
        let generation = Generation::open(store.clone(), DYNAMIC).await.unwrap();
        generation.put(&request(url), &text_response(200, "old")).await.unwrap();
        let fetcher = MockFetcher::new().respond(url, 200, "new").shared();

        let response = dispatcher(store, fetcher).handle_with(&request(url), StrategyLabel::NetworkFirst).await;

        assert_eq!(response.body, "new");
    }

    #[tokio::test]
    async fn test_non_http_scheme_bypasses_cache() {
        let store = memory_store().await;
        let url = "chrome-extension://abcdef/script.js";
        let fetcher = MockFetcher::new().respond(url, 200, "ext").shared();
        let dispatcher = dispatcher(store.clone(), fetcher);

        let req = request(url);
        assert!(!dispatcher.intercepts(&req));
        let response = dispatcher.handle(&req).await;

        assert_eq!(response.body, "ext");
        assert!(store.generation_names().await.unwrap().is_empty());
    }
}
