//! Scripted fetcher and store helpers for unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use offgrid_core::{CacheDb, CacheStore, Error, Generation, Headers, Request, Response};

use crate::fetch::Fetcher;

pub(crate) const DYNAMIC: &str = "offgrid-dynamic-v1.0.0";

#[derive(Clone)]
enum Route {
    Respond { status: u16, body: String },
    Fail,
}

/// Fetcher answering from a fixed URL → outcome table and counting calls.
/// Unknown URLs fail like an unreachable host.
#[derive(Default)]
pub(crate) struct MockFetcher {
    routes: HashMap<String, Route>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes.insert(url.to_string(), Route::Respond { status, body: body.to_string() });
        self
    }

    pub(crate) fn fail(mut self, url: &str) -> Self {
        self.routes.insert(url.to_string(), Route::Fail);
        self
    }

    /// Delay every answer, to observe callers that must not wait.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.routes.get(request.url.as_str()) {
            Some(Route::Respond { status, body }) => Ok(text_response(*status, body)),
            Some(Route::Fail) | None => Err(Error::Network(format!("connection refused: {}", request.url))),
        }
    }
}

pub(crate) fn text_response(status: u16, body: &str) -> Response {
    let mut headers = Headers::new();
    headers.insert("content-type".into(), "text/plain".into());
    Response::new(status, headers, body.to_string())
}

pub(crate) fn request(url: &str) -> Request {
    Request::parse(url).unwrap()
}

pub(crate) async fn memory_store() -> Arc<dyn CacheStore> {
    Arc::new(CacheDb::open_in_memory().await.unwrap())
}

pub(crate) async fn dynamic_generation() -> Generation {
    Generation::open(memory_store().await, DYNAMIC).await.unwrap()
}

/// Poll `generation` until `request` resolves to `body`.
pub(crate) async fn wait_for_body(generation: &Generation, request: &Request, body: &str) -> bool {
    for _ in 0..100 {
        if let Ok(Some(snapshot)) = generation.lookup(request).await
            && snapshot.body == body.as_bytes()
        {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
