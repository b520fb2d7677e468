//! Built-in listing source adapters
//!
//! - [`WantedCrawler`] - JSON API
//! - [`JobKoreaCrawler`] - HTML search results
//! - [`JobPlanetCrawler`] - HTML search results
//! - [`LinkedInCrawler`] - public guest job search fragments
//!
//! Each adapter splits into an async shell that fetches bodies through its own
//! [`FetchClient`] and synchronous `parse_*` functions that turn a body into
//! postings. Page-level failures are logged here and degrade to "no data".

pub mod jobkorea;
pub mod jobplanet;
pub mod linkedin;
pub mod wanted;

pub use jobkorea::JobKoreaCrawler;
pub use jobplanet::JobPlanetCrawler;
pub use linkedin::LinkedInCrawler;
pub use wanted::WantedCrawler;

use url::Url;

use crate::crawler::fetcher::FetchClient;
use crate::models::JobSource;
use crate::utils::error::CrawlerError;

/// Fetch a body, turning every failure into `None` after logging it
pub(crate) async fn fetch_body(
    fetcher: &FetchClient,
    source: JobSource,
    target: &str,
    query: &[(&str, String)],
) -> Option<String> {
    match fetcher.fetch_text(target, query).await {
        Ok(Some(body)) => Some(body),
        Ok(None) => {
            tracing::warn!(source = %source, path = target, "No response after retries");
            None
        }
        Err(e) => {
            tracing::error!(source = %source, path = target, error = %e, "Fetch failed");
            None
        }
    }
}

/// Base URL of the configured site, required by every adapter
pub(crate) fn site_url(fetcher: &FetchClient, source: JobSource) -> Result<Url, CrawlerError> {
    fetcher.base_url().cloned().ok_or_else(|| CrawlerError::Config {
        job_source: source,
        reason: "missing base_url".to_string(),
    })
}

/// Keep at most `limit` postings of a parsed page
pub(crate) fn truncate_page<T>(mut items: Vec<T>, limit: u32) -> Vec<T> {
    items.truncate(limit as usize);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_page() {
        assert_eq!(truncate_page(vec![1, 2, 3], 2), vec![1, 2]);
        assert_eq!(truncate_page(vec![1], 20), vec![1]);
    }
}
