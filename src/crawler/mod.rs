//! Source adapters and shared pagination
//!
//! Every listing site is wrapped in a [`JobCrawler`] that knows how to fetch
//! one result page and one detail page. Pagination is shared: [`crawl`] asks
//! an adapter for consecutive pages until a page comes back empty or the
//! budget runs out.

pub mod fetcher;
pub mod headers;
pub mod registry;
pub mod sources;

use async_trait::async_trait;

use crate::models::{JobPosting, JobSource, SearchFilter};
use crate::utils::error::CrawlerError;

pub use fetcher::{FetchClient, FetchedPage};
pub use registry::{CrawlerFactory, CrawlerRegistry};

/// Uniform contract implemented by each listing source
#[async_trait]
pub trait JobCrawler: Send + Sync {
    /// Source this adapter crawls
    fn source(&self) -> JobSource;

    /// Fetch exactly one page of search results (1-based)
    ///
    /// Returns an empty vector when the source has no more results. Failures
    /// confined to the page (unreachable, unparseable) also yield an empty
    /// vector; `Err` means the adapter as a whole cannot crawl.
    async fn search_page(
        &self,
        filter: &SearchFilter,
        page: u32,
        limit: u32,
    ) -> Result<Vec<JobPosting>, CrawlerError>;

    /// Fetch the detail page of one posting
    ///
    /// `Ok(None)` when the posting is missing, unreachable or unparseable.
    async fn fetch_detail(&self, source_id: &str) -> Result<Option<JobPosting>, CrawlerError>;
}

/// Page budget for one source crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlBudget {
    /// Maximum number of pages to request
    pub max_pages: u32,

    /// Requested items per page
    pub limit_per_page: u32,
}

impl CrawlBudget {
    pub fn new(max_pages: u32, limit_per_page: u32) -> Self {
        Self {
            max_pages,
            limit_per_page,
        }
    }
}

impl Default for CrawlBudget {
    fn default() -> Self {
        Self::new(3, 20)
    }
}

/// Crawl consecutive pages of one source
///
/// Pages are requested strictly in order, one at a time, and the first empty
/// page ends the crawl. Postings keep page order.
pub async fn crawl<C>(
    crawler: &C,
    filter: &SearchFilter,
    budget: CrawlBudget,
) -> Result<Vec<JobPosting>, CrawlerError>
where
    C: JobCrawler + ?Sized,
{
    let source = crawler.source();
    let mut postings = Vec::new();

    for page in 1..=budget.max_pages {
        let batch = crawler
            .search_page(filter, page, budget.limit_per_page)
            .await?;

        if batch.is_empty() {
            tracing::debug!(source = %source, page, "Empty page, stopping");
            break;
        }

        tracing::info!(
            source = %source,
            page,
            count = batch.len(),
            total = postings.len() + batch.len(),
            "Crawled page"
        );
        postings.extend(batch);
    }

    Ok(postings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Adapter serving a fixed number of postings per page
    struct PagedCrawler {
        pages: Vec<usize>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl JobCrawler for PagedCrawler {
        fn source(&self) -> JobSource {
            JobSource::JobKorea
        }

        async fn search_page(
            &self,
            _filter: &SearchFilter,
            page: u32,
            _limit: u32,
        ) -> Result<Vec<JobPosting>, CrawlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let count = self.pages.get(page as usize - 1).copied().unwrap_or(0);
            Ok((0..count)
                .map(|i| {
                    let id = format!("{page}-{i}");
                    JobPosting::new(JobSource::JobKorea, id.clone(), id, "Acme", "https://x")
                })
                .collect())
        }

        async fn fetch_detail(&self, _id: &str) -> Result<Option<JobPosting>, CrawlerError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_crawl_stops_at_first_empty_page() {
        let crawler = PagedCrawler {
            pages: vec![3, 0, 5],
            calls: AtomicU32::new(0),
        };
        let postings = crawl(&crawler, &SearchFilter::new("rust"), CrawlBudget::new(5, 20))
            .await
            .unwrap();

        assert_eq!(postings.len(), 3);
        assert_eq!(crawler.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_crawl_respects_page_budget_and_order() {
        let crawler = PagedCrawler {
            pages: vec![2, 2, 2, 2],
            calls: AtomicU32::new(0),
        };
        let postings = crawl(&crawler, &SearchFilter::new("rust"), CrawlBudget::new(3, 20))
            .await
            .unwrap();

        assert_eq!(crawler.calls.load(Ordering::SeqCst), 3);
        let ids: Vec<_> = postings.iter().map(|p| p.source_id.as_str()).collect();
        assert_eq!(ids, vec!["1-0", "1-1", "2-0", "2-1", "3-0", "3-1"]);
    }

    #[tokio::test]
    async fn test_crawl_through_trait_object() {
        let crawler: Box<dyn JobCrawler> = Box::new(PagedCrawler {
            pages: vec![1],
            calls: AtomicU32::new(0),
        });
        let postings = crawl(crawler.as_ref(), &SearchFilter::new("rust"), CrawlBudget::default())
            .await
            .unwrap();
        assert_eq!(postings.len(), 1);
    }
}
