//! Named cache generations and the store abstraction they sit on.
//!
//! A generation is an independent request → snapshot namespace. The engine
//! never touches the store directly; it opens a [`Generation`] handle and
//! works through that, so every component receives its store explicitly.

use std::sync::Arc;

use async_trait::async_trait;

use super::hash::RequestKey;
use super::snapshots::Snapshot;
use crate::Error;
use crate::config::AppConfig;
use crate::message::{Request, Response};

/// Operations the engine needs from a cache backend.
///
/// Single-key `put` and `lookup` are atomic. `put_all` is all-or-nothing.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the generation if it does not exist yet. Idempotent.
    async fn open_generation(&self, name: &str) -> Result<(), Error>;

    /// Find the snapshot stored for `request`, honoring `Vary`.
    async fn lookup(&self, generation: &str, request: &Request) -> Result<Option<Snapshot>, Error>;

    /// Store `response` under `request`, replacing any previous snapshot.
    async fn put(&self, generation: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Store every pair in one transaction.
    async fn put_all(&self, generation: &str, entries: &[(Request, Response)]) -> Result<(), Error>;

    /// Names of every existing generation.
    async fn generation_names(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation and its entries. Returns false if it did not exist.
    async fn delete_generation(&self, name: &str) -> Result<bool, Error>;

    /// Keys stored in a generation.
    async fn keys(&self, generation: &str) -> Result<Vec<RequestKey>, Error>;
}

/// Handle to one opened generation.
#[derive(Clone)]
pub struct Generation {
    store: Arc<dyn CacheStore>,
    name: String,
}

impl Generation {
    /// Open (creating if needed) the generation called `name`.
    pub async fn open(store: Arc<dyn CacheStore>, name: &str) -> Result<Self, Error> {
        store.open_generation(name).await?;
        Ok(Self { store, name: name.to_string() })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn lookup(&self, request: &Request) -> Result<Option<Snapshot>, Error> {
        self.store.lookup(&self.name, request).await
    }

    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        self.store.put(&self.name, request, response).await
    }

    pub async fn put_all(&self, entries: &[(Request, Response)]) -> Result<(), Error> {
        self.store.put_all(&self.name, entries).await
    }

    pub async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        self.store.keys(&self.name).await
    }
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generation").field("name", &self.name).finish()
    }
}

/// The set of generation names in active use for one cache version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationNames {
    /// Install-time pinned assets
    pub static_name: String,
    /// Entries learned at runtime
    pub dynamic_name: String,
    /// Version-wide name, kept so it is never swept
    pub umbrella_name: String,
}

impl GenerationNames {
    pub fn new(prefix: &str, version: &str) -> Self {
        Self {
            static_name: format!("{prefix}-static-{version}"),
            dynamic_name: format!("{prefix}-dynamic-{version}"),
            umbrella_name: format!("{prefix}-{version}"),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.cache_prefix, &config.cache_version)
    }

    /// True if `name` belongs to the current version set.
    pub fn is_known(&self, name: &str) -> bool {
        name == self.static_name || name == self.dynamic_name || name == self.umbrella_name
    }
}
