//! Shared server state: one store, one fetcher, wired into the engine.

use std::sync::Arc;

use offgrid_client::{Dispatcher, FetchClient, FetchConfig, Fetcher, GenerationManager, PatternTable};
use offgrid_core::{AppConfig, CacheStore, Error, GenerationNames};

pub struct AppState {
    pub store: Arc<dyn CacheStore>,
    pub dispatcher: Dispatcher,
    pub manager: GenerationManager,
}

impl AppState {
    /// Build the engine around `store` using a reqwest fetcher.
    pub fn new(config: &AppConfig, store: Arc<dyn CacheStore>) -> Result<Self, Error> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(FetchClient::new(FetchConfig::from(config))?);
        Self::with_fetcher(config, store, fetcher)
    }

    pub fn with_fetcher(config: &AppConfig, store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>) -> Result<Self, Error> {
        let names = GenerationNames::from_config(config);
        let table = PatternTable::new(&config.strategies)?;
        let dispatcher = Dispatcher::new(store.clone(), fetcher.clone(), table, &names);
        let manager = GenerationManager::new(store.clone(), fetcher, names);
        Ok(Self { store, dispatcher, manager })
    }

    pub fn names(&self) -> &GenerationNames {
        self.manager.names()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use offgrid_core::CacheDb;

    pub(crate) async fn memory_state() -> AppState {
        let store: Arc<dyn CacheStore> = Arc::new(CacheDb::open_in_memory().await.unwrap());
        AppState::new(&AppConfig::default(), store).unwrap()
    }
}
