//! Common test utilities

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use jobpulse::config::Config;
use jobpulse::crawler::{CrawlerRegistry, JobCrawler};
use jobpulse::error::CrawlerError;
use jobpulse::models::{JobPosting, JobSource, SearchFilter};

/// Configuration pointing every source at `base_url` with near-zero pacing
pub fn fast_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.crawler.request_timeout_secs = 5;
    config.crawler.source_timeout_secs = 10;
    config.crawler.rate_limited_backoff_ms = 1;
    config.crawler.server_error_backoff_ms = 1;

    for source in JobSource::all() {
        let entry = config.sources.get_mut(source);
        entry.base_url = base_url.to_string();
        entry.min_interval_ms = 1;
        entry.max_attempts = 3;
    }

    config
}

/// Create a test posting with the required fields
pub fn posting(source: JobSource, id: &str, title: &str, company: &str) -> JobPosting {
    JobPosting::new(
        source,
        id,
        title,
        company,
        format!("https://jobs.example/{}/{id}", source.as_str()),
    )
}

/// `count` distinct postings of one source
pub fn postings(source: JobSource, prefix: &str, count: usize) -> Vec<JobPosting> {
    (0..count)
        .map(|i| {
            posting(
                source,
                &format!("{prefix}{i}"),
                &format!("{prefix} 개발자 {i}"),
                &format!("{prefix} 컴퍼니"),
            )
        })
        .collect()
}

/// Read a file from `tests/fixtures`
pub fn fixture(name: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures", name]
        .iter()
        .collect();
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {e}", path.display()))
}

/// Tracks how many stub crawls run at the same time
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyProbe {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ConcurrencyProbe {
    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Scripted adapter serving canned pages
#[derive(Clone)]
pub struct StubCrawler {
    pub source: JobSource,
    pub pages: Vec<Vec<JobPosting>>,
    pub fail: Option<String>,
    pub panic: bool,
    pub delay: Option<Duration>,
    /// Page 1 waits for this before answering
    pub gate: Option<Arc<Notify>>,
    pub probe: Option<ConcurrencyProbe>,
    pub page_calls: Arc<AtomicUsize>,
}

impl StubCrawler {
    pub fn new(source: JobSource) -> Self {
        Self {
            source,
            pages: Vec::new(),
            fail: None,
            panic: false,
            delay: None,
            gate: None,
            probe: None,
            page_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_page(mut self, page: Vec<JobPosting>) -> Self {
        self.pages.push(page);
        self
    }

    pub fn failing(mut self, reason: &str) -> Self {
        self.fail = Some(reason.to_string());
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_probe(mut self, probe: ConcurrencyProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobCrawler for StubCrawler {
    fn source(&self) -> JobSource {
        self.source
    }

    async fn search_page(
        &self,
        _filter: &SearchFilter,
        page: u32,
        _limit: u32,
    ) -> Result<Vec<JobPosting>, CrawlerError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);

        if page == 1 {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
        }

        if let Some(probe) = &self.probe {
            probe.enter();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(probe) = &self.probe {
            probe.leave();
        }

        if self.panic {
            panic!("stub crawler exploded");
        }
        if let Some(reason) = &self.fail {
            return Err(CrawlerError::Unavailable(self.source, reason.clone()));
        }

        Ok(self
            .pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_detail(&self, source_id: &str) -> Result<Option<JobPosting>, CrawlerError> {
        Ok(self
            .pages
            .iter()
            .flatten()
            .find(|p| p.source_id == source_id)
            .cloned())
    }
}

/// Registry serving the given stubs, one clone per crawl
pub fn registry_with(stubs: Vec<StubCrawler>) -> CrawlerRegistry {
    let mut registry = CrawlerRegistry::new();
    for stub in stubs {
        registry.register(stub.source, move || {
            Ok(Box::new(stub.clone()) as Box<dyn JobCrawler>)
        });
    }
    registry
}
