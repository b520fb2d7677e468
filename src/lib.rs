//! jobpulse - Multi-source job posting crawler
//!
//! Crawls Korean job listing sites concurrently and merges their postings into
//! one normalized, deduplicated result set.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Source adapter contract, pagination and the rate-limited fetch client
//! - [`parser`] - HTML selector chains and field extraction
//! - [`orchestrator`] - Concurrent multi-source crawls with failure isolation
//! - [`aggregator`] - Merging, deduplication and sorting
//! - [`runs`] - In-memory background runs
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use jobpulse::config::Config;
//! use jobpulse::models::SearchQuery;
//! use jobpulse::orchestrator::CrawlManager;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let manager = CrawlManager::with_defaults(config);
//!     let results = manager.search(&SearchQuery::new("백엔드")).await?;
//!     println!("{} postings", results.postings.len());
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod runs;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::aggregator::{merge, SortKey};
    pub use crate::config::Config;
    pub use crate::crawler::{crawl, CrawlBudget, CrawlerRegistry, JobCrawler};
    pub use crate::error::{Error, ErrorCategory, JobPulseErrorTrait, Result};
    pub use crate::models::{
        CrawlOutcome, JobPosting, JobSource, SearchFilter, SearchQuery, SearchResults,
    };
    pub use crate::orchestrator::CrawlManager;
    pub use crate::runs::{RunRegistry, RunStatus};
}

// Direct re-exports for convenience
pub use models::{CrawlOutcome, JobPosting, JobSource, SearchQuery};
