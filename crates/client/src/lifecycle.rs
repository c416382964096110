//! Generation lifecycle: provisioning and activation.
//!
//! Both steps run once at startup and must finish before any request is
//! served. Provisioning pins assets into the static generation; activation
//! deletes every generation that is not part of the current version.

use std::sync::Arc;

use futures_util::future::try_join_all;
use url::Url;

use offgrid_core::{CacheStore, Error, Generation, GenerationNames, Request, Response};

use crate::fetch::Fetcher;

/// Owns the versioned generation set.
pub struct GenerationManager {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    names: GenerationNames,
}

impl GenerationManager {
    pub fn new(store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>, names: GenerationNames) -> Self {
        Self { store, fetcher, names }
    }

    pub fn names(&self) -> &GenerationNames {
        &self.names
    }

    /// Fetch every pinned asset and store them all in the static generation.
    ///
    /// All-or-nothing: a transport failure or a non-2xx status for any asset
    /// fails the step and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `Error::Provisioning` naming the first asset that failed, or a
    /// store error if the batch write fails.
    pub async fn provision(&self, assets: &[Url]) -> Result<Generation, Error> {
        let generation = Generation::open(self.store.clone(), &self.names.static_name).await?;

        let entries = try_join_all(assets.iter().cloned().map(|url| self.fetch_pinned(url))).await?;
        generation.put_all(&entries).await?;

        tracing::info!(generation = generation.name(), assets = entries.len(), "provisioned static generation");
        Ok(generation)
    }

    async fn fetch_pinned(&self, url: Url) -> Result<(Request, Response), Error> {
        let request = Request::get(url);
        let response = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| Error::Provisioning { url: request.url.to_string(), reason: e.to_string() })?;

        if !response.is_success() {
            return Err(Error::Provisioning {
                url: request.url.to_string(),
                reason: format!("status {}", response.status),
            });
        }

        Ok((request, response))
    }

    /// Delete every generation outside the current version set.
    ///
    /// Returns the deleted names.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();

        for name in self.store.generation_names().await? {
            if self.names.is_known(&name) {
                continue;
            }
            if self.store.delete_generation(&name).await? {
                tracing::info!(generation = %name, "deleted stale generation");
                deleted.push(name);
            }
        }

        Ok(deleted)
    }
}
