// src/services/providers.rs

//! Latest-identifier providers and the registry that maps sources to them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ComicSource, Config, Identifier};
use crate::services::extractors::extract;
use crate::services::{Fetcher, TtlCache};

/// Anything that can tell us the current latest strip of one source.
#[async_trait]
pub trait LatestProvider: Send + Sync {
    fn source(&self) -> ComicSource;

    /// `Ok(None)` means the page did not contain what we look for.
    async fn latest(&self) -> Result<Option<Identifier>>;
}

/// Fetches a source's front page and applies its extraction rule,
/// reusing a cached answer while it is fresh.
pub struct ComicProvider {
    source: ComicSource,
    url: String,
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<TtlCache<Identifier>>,
    ttl: Duration,
}

impl ComicProvider {
    pub fn new(
        source: ComicSource,
        url: impl Into<String>,
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<TtlCache<Identifier>>,
        ttl: Duration,
    ) -> Self {
        Self {
            source,
            url: url.into(),
            fetcher,
            cache,
            ttl,
        }
    }
}

#[async_trait]
impl LatestProvider for ComicProvider {
    fn source(&self) -> ComicSource {
        self.source
    }

    async fn latest(&self) -> Result<Option<Identifier>> {
        let key = self.source.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            log::debug!("{}: cache hit", self.source);
            return Ok(Some(cached));
        }

        let page = self.fetcher.fetch(&self.url).await?;
        match extract(self.source, &page) {
            Some(identifier) => {
                self.cache.set(key, identifier.clone(), self.ttl);
                Ok(Some(identifier))
            }
            None => {
                log::debug!(
                    "{}: nothing found at {} (requested {}, status {})",
                    self.source,
                    page.final_url,
                    page.url,
                    page.status
                );
                Ok(None)
            }
        }
    }
}

/// Maps each registered source to its provider.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ComicSource, Arc<dyn LatestProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build providers for every enabled source in `config`.
    pub fn from_config(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<TtlCache<Identifier>>,
    ) -> Self {
        let ttl = Duration::from_secs(config.cache.ttl_secs);
        let mut registry = Self::new();
        for source in config.sources.enabled() {
            registry.register(Arc::new(ComicProvider::new(
                source,
                &config.sources.get(source).url,
                Arc::clone(&fetcher),
                Arc::clone(&cache),
                ttl,
            )));
        }
        registry
    }

    /// Register a provider, replacing any previous one for its source.
    pub fn register(&mut self, provider: Arc<dyn LatestProvider>) {
        self.providers.insert(provider.source(), provider);
    }

    pub fn get(&self, source: ComicSource) -> Option<&Arc<dyn LatestProvider>> {
        self.providers.get(&source)
    }

    /// Registered sources in pass order.
    pub fn sources(&self) -> Vec<ComicSource> {
        ComicSource::ALL
            .into_iter()
            .filter(|s| self.providers.contains_key(s))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
