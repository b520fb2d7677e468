//! Source name to adapter factory mapping
//!
//! The registry is an explicit value owned by whoever builds the
//! orchestrator; tests register stub adapters the same way the binary
//! registers the built-in ones.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Config;
use crate::crawler::sources::{JobKoreaCrawler, JobPlanetCrawler, LinkedInCrawler, WantedCrawler};
use crate::crawler::JobCrawler;
use crate::models::JobSource;
use crate::utils::error::CrawlerError;

/// Builds a fresh adapter instance, one per crawl
pub type CrawlerFactory =
    Arc<dyn Fn() -> Result<Box<dyn JobCrawler>, CrawlerError> + Send + Sync>;

/// Registered adapter factories keyed by source
#[derive(Clone, Default)]
pub struct CrawlerRegistry {
    factories: BTreeMap<JobSource, CrawlerFactory>,
}

impl CrawlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the four built-in adapters configured from `config`
    pub fn with_defaults(config: &Config) -> Self {
        let mut registry = Self::new();

        let cfg = config.clone();
        registry.register(JobSource::Wanted, move || {
            Ok(Box::new(WantedCrawler::new(&cfg)?) as Box<dyn JobCrawler>)
        });
        let cfg = config.clone();
        registry.register(JobSource::JobKorea, move || {
            Ok(Box::new(JobKoreaCrawler::new(&cfg)?) as Box<dyn JobCrawler>)
        });
        let cfg = config.clone();
        registry.register(JobSource::JobPlanet, move || {
            Ok(Box::new(JobPlanetCrawler::new(&cfg)?) as Box<dyn JobCrawler>)
        });
        let cfg = config.clone();
        registry.register(JobSource::LinkedIn, move || {
            Ok(Box::new(LinkedInCrawler::new(&cfg)?) as Box<dyn JobCrawler>)
        });

        registry
    }

    /// Register (or replace) the factory for a source
    pub fn register<F>(&mut self, source: JobSource, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn JobCrawler>, CrawlerError> + Send + Sync + 'static,
    {
        self.factories.insert(source, Arc::new(factory));
        self
    }

    /// Build a new adapter instance for `source`
    ///
    /// # Errors
    ///
    /// `CrawlerError::UnknownSource` when nothing is registered for it, or
    /// whatever the factory itself returns
    pub fn build(&self, source: JobSource) -> Result<Box<dyn JobCrawler>, CrawlerError> {
        let factory = self
            .factories
            .get(&source)
            .ok_or_else(|| CrawlerError::UnknownSource(source.to_string()))?;
        factory()
    }

    /// Whether a factory is registered for `source`
    pub fn contains(&self, source: JobSource) -> bool {
        self.factories.contains_key(&source)
    }

    /// Registered sources in `JobSource` order
    pub fn sources(&self) -> Vec<JobSource> {
        self.factories.keys().copied().collect()
    }
}

impl std::fmt::Debug for CrawlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlerRegistry")
            .field("sources", &self.sources())
            .finish()
    }
}
