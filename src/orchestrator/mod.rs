//! Crawl orchestration across sources
//!
//! [`CrawlManager`] fans a query out to every requested source, bounds how
//! many sources crawl at once, isolates each source's failure into its own
//! [`CrawlOutcome`] and hands the successful postings to the aggregator.
//!
//! Each source runs in its own spawned task. If the caller drops a `search`
//! future, the tasks already spawned keep running to completion and their
//! outcomes are discarded; no fetch is torn down mid-retry.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::aggregator::{merge, SortKey};
use crate::config::Config;
use crate::crawler::{crawl, CrawlBudget, CrawlerRegistry};
use crate::error::{CrawlerError, Error, FetchError, Result};
use crate::models::{CrawlOutcome, JobPosting, JobSource, SearchFilter, SearchQuery, SearchResults};

/// Hard cap on pages requested per source
pub const MAX_PAGES_PER_SOURCE: u32 = 5;

/// Runs source adapters and aggregates their outcomes
///
/// Cloning is cheap; clones share the registry and the concurrency cap.
#[derive(Debug, Clone)]
pub struct CrawlManager {
    config: Arc<Config>,
    registry: Arc<CrawlerRegistry>,
    semaphore: Arc<Semaphore>,
}

impl CrawlManager {
    /// Create a manager over an explicit registry
    pub fn new(config: Config, registry: CrawlerRegistry) -> Self {
        let permits = config.crawler.max_concurrent_sources.max(1);
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            semaphore: Arc::new(Semaphore::new(permits)),
        }
    }

    /// Create a manager with the built-in adapters
    pub fn with_defaults(config: Config) -> Self {
        let registry = CrawlerRegistry::with_defaults(&config);
        Self::new(config, registry)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &CrawlerRegistry {
        &self.registry
    }

    fn source_timeout(&self) -> Duration {
        self.config.source_timeout()
    }

    /// Crawl one source and capture the result as an outcome
    ///
    /// Never fails: construction errors, crawl errors and the per-source
    /// deadline all become a failed outcome.
    pub async fn run_one(
        &self,
        source: JobSource,
        filter: &SearchFilter,
        budget: CrawlBudget,
    ) -> CrawlOutcome {
        let start = Instant::now();
        let deadline = self.source_timeout();

        tracing::info!(source = %source, keyword = %filter.keyword, max_pages = budget.max_pages, "Starting source crawl");

        let result = tokio::time::timeout(deadline, self.crawl_source(source, filter, budget)).await;

        let elapsed = start.elapsed().as_secs_f64();
        match result {
            Ok(Ok(postings)) => {
                tracing::info!(source = %source, count = postings.len(), duration_secs = elapsed, "Source crawl completed");
                CrawlOutcome::success(source, postings, elapsed)
            }
            Ok(Err(e)) => {
                tracing::error!(source = %source, error = %e, "Source crawl failed");
                CrawlOutcome::failure(source, e.to_string(), elapsed)
            }
            Err(_) => {
                let reason = format!("timed out after {}s", deadline.as_secs());
                tracing::error!(source = %source, timeout_secs = deadline.as_secs(), "Source crawl timed out");
                CrawlOutcome::failure(source, reason, elapsed)
            }
        }
    }

    /// Build a fresh adapter and paginate through it
    ///
    /// The adapter and its HTTP session are dropped when this returns, on
    /// every path.
    async fn crawl_source(
        &self,
        source: JobSource,
        filter: &SearchFilter,
        budget: CrawlBudget,
    ) -> std::result::Result<Vec<JobPosting>, CrawlerError> {
        let crawler = self.registry.build(source)?;
        crawl(crawler.as_ref(), filter, budget).await
    }

    /// Crawl several sources
    ///
    /// In parallel mode every source gets its own task, bounded by
    /// `max_concurrent_sources`; one source failing or panicking never
    /// affects the others. Unregistered sources are skipped.
    pub async fn run_all(
        &self,
        sources: &[JobSource],
        filter: &SearchFilter,
        budget: CrawlBudget,
        parallel: bool,
    ) -> BTreeMap<JobSource, CrawlOutcome> {
        let mut outcomes = BTreeMap::new();
        let runnable: Vec<JobSource> = sources
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|source| {
                let known = self.registry.contains(*source);
                if !known {
                    tracing::warn!(source = %source, "No crawler registered, skipping");
                }
                known
            })
            .collect();

        if !parallel {
            for source in runnable {
                let outcome = self.run_one(source, filter, budget).await;
                outcomes.insert(source, outcome);
            }
            return outcomes;
        }

        let start = Instant::now();
        let mut handles = Vec::with_capacity(runnable.len());

        for source in runnable {
            let manager = self.clone();
            let filter = filter.clone();
            let handle = tokio::spawn(async move {
                let _permit = match manager.semaphore.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return CrawlOutcome::failure(source, "crawler shut down", 0.0);
                    }
                };
                manager.run_one(source, &filter, budget).await
            });
            handles.push((source, handle));
        }

        let (sources, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let joined = join_all(handles).await;

        for (source, joined) in sources.into_iter().zip(joined) {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(source = %source, error = %e, "Source task aborted");
                    let reason = if e.is_panic() {
                        "crawler panicked".to_string()
                    } else {
                        format!("crawler task failed: {e}")
                    };
                    CrawlOutcome::failure(source, reason, start.elapsed().as_secs_f64())
                }
            };
            outcomes.insert(source, outcome);
        }

        outcomes
    }

    /// Parse requested source names
    ///
    /// Unknown names are dropped with a warning; an empty request means every
    /// registered source.
    pub fn resolve_sources(&self, names: &[String]) -> Vec<JobSource> {
        if names.iter().all(|n| n.trim().is_empty()) {
            return self.registry.sources();
        }

        let mut resolved = BTreeSet::new();
        for name in names.iter().filter(|n| !n.trim().is_empty()) {
            match name.parse::<JobSource>() {
                Ok(source) => {
                    resolved.insert(source);
                }
                Err(e) => tracing::warn!(name = %name, error = %e, "Ignoring unknown source"),
            }
        }
        resolved.into_iter().collect()
    }

    /// Pages to request from each source for a query
    ///
    /// Spreads `max_results` across the sources, always at least one page and
    /// never more than [`MAX_PAGES_PER_SOURCE`].
    pub fn page_budget(&self, query: &SearchQuery, source_count: usize) -> u32 {
        if let Some(pages) = query.max_pages_per_source {
            return pages.clamp(1, MAX_PAGES_PER_SOURCE);
        }

        let limit = self.config.crawler.limit_per_page.max(1) as usize;
        let per_source = query.max_results / source_count.max(1);
        let pages = (limit.max(per_source) / limit + 1).max(1);
        pages.min(MAX_PAGES_PER_SOURCE as usize) as u32
    }

    /// Search every requested source and return merged, deduplicated results
    /// sorted by crawl time
    ///
    /// # Errors
    ///
    /// Only invalid input fails; source failures are reported per source in
    /// [`SearchResults::summaries`].
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        self.search_sorted(query, SortKey::CrawledAt).await
    }

    /// [`search`](Self::search) with an explicit ordering
    pub async fn search_sorted(
        &self,
        query: &SearchQuery,
        sort_key: SortKey,
    ) -> Result<SearchResults> {
        validate_query(query)?;

        let start = Instant::now();
        let filter = query.filter();
        let sources = self.resolve_sources(&query.sources);
        let budget = CrawlBudget::new(
            self.page_budget(query, sources.len()),
            self.config.crawler.limit_per_page,
        );

        tracing::info!(
            keyword = %filter.keyword,
            sources = ?sources,
            max_pages = budget.max_pages,
            max_results = query.max_results,
            "Starting search"
        );

        let outcomes = self.run_all(&sources, &filter, budget, true).await;

        let mut postings = merge(outcomes.values(), true, sort_key);
        postings.truncate(query.max_results);

        let results = SearchResults {
            keyword: filter.keyword,
            postings,
            summaries: outcomes.values().map(CrawlOutcome::summary).collect(),
            duration_seconds: start.elapsed().as_secs_f64(),
        };

        tracing::info!(
            total = results.postings.len(),
            succeeded = results.successful_sources(),
            failed = results.failed_sources(),
            duration_secs = results.duration_seconds,
            "Search completed"
        );

        Ok(results)
    }

    /// Look up the detail page of one posting
    ///
    /// # Errors
    ///
    /// `InvalidQuery` for a blank id, `Crawler` when the source has no
    /// adapter, `Fetch(Timeout)` when the source deadline passes
    pub async fn fetch_detail(
        &self,
        source: JobSource,
        source_id: &str,
    ) -> Result<Option<JobPosting>> {
        let source_id = source_id.trim();
        if source_id.is_empty() {
            return Err(Error::invalid_query("source id must not be empty"));
        }

        let crawler = self.registry.build(source)?;
        match tokio::time::timeout(self.source_timeout(), crawler.fetch_detail(source_id)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(FetchError::Timeout.into()),
        }
    }
}

/// Reject queries before any network activity
pub fn validate_query(query: &SearchQuery) -> Result<()> {
    if query.keyword.trim().is_empty() {
        return Err(Error::invalid_query("keyword must not be empty"));
    }
    if !(1..=SearchQuery::MAX_RESULTS_LIMIT).contains(&query.max_results) {
        return Err(Error::invalid_query(format!(
            "max_results must be between 1 and {}, got {}",
            SearchQuery::MAX_RESULTS_LIMIT,
            query.max_results
        )));
    }
    Ok(())
}
