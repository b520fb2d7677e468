//! Background crawl runs
//!
//! Long multi-page crawls can be started in the background and polled by id.
//! Run state is held in memory only and is lost when the process exits.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::aggregator::{merge, SortKey};
use crate::crawler::CrawlBudget;
use crate::error::Result;
use crate::models::{CrawlOutcome, JobPosting, SearchQuery, SourceSummary};
use crate::orchestrator::{validate_query, CrawlManager, MAX_PAGES_PER_SOURCE};

/// Largest page size accepted by [`RunRegistry::results`]
pub const MAX_PAGE_SIZE: usize = 100;

/// Lifecycle of a background run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the run has stopped changing
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stored state of one run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: Uuid,
    pub query: SearchQuery,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Deduplicated postings found, before truncation to `max_results`
    pub total_jobs: usize,
    /// Postings kept, at most `max_results`
    pub postings: Vec<JobPosting>,
    pub summaries: Vec<SourceSummary>,
    pub error: Option<String>,
}

impl RunRecord {
    fn new(id: Uuid, query: SearchQuery) -> Self {
        Self {
            id,
            query,
            status: RunStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            total_jobs: 0,
            postings: Vec::new(),
            summaries: Vec::new(),
            error: None,
        }
    }

    fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            id: self.id,
            keyword: self.query.keyword.clone(),
            status: self.status,
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            total_jobs: self.total_jobs,
            summaries: self.summaries.clone(),
            error: self.error.clone(),
        }
    }
}

/// Status view of a run, without the postings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub id: Uuid,
    pub keyword: String,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_jobs: usize,
    pub summaries: Vec<SourceSummary>,
    pub error: Option<String>,
}

/// One page of a run's results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPage {
    pub status: RunStatus,
    /// Postings kept by the run
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    /// Empty until the run completes
    pub postings: Vec<JobPosting>,
}

/// In-memory registry of background runs
#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    runs: Arc<RwLock<HashMap<Uuid, RunRecord>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `query` and start crawling it in the background
    ///
    /// Every source is crawled for the maximum number of pages. The returned
    /// id is immediately queryable with status `pending`.
    ///
    /// # Errors
    ///
    /// `Error::InvalidQuery` if the query is rejected; nothing is started
    pub async fn start(&self, manager: CrawlManager, query: SearchQuery) -> Result<Uuid> {
        self.start_sorted(manager, query, SortKey::CrawledAt).await
    }

    /// Like [`RunRegistry::start`], ordering the merged postings by `sort_key`
    pub async fn start_sorted(
        &self,
        manager: CrawlManager,
        query: SearchQuery,
        sort_key: SortKey,
    ) -> Result<Uuid> {
        validate_query(&query)?;

        let id = Uuid::new_v4();
        self.runs
            .write()
            .await
            .insert(id, RunRecord::new(id, query.clone()));

        tracing::info!(
            run_id = %id,
            keyword = %query.keyword,
            sort = ?sort_key,
            "Background run queued"
        );

        let registry = self.clone();
        tokio::spawn(async move {
            registry.execute(id, manager, query, sort_key).await;
        });

        Ok(id)
    }

    async fn execute(
        &self,
        id: Uuid,
        manager: CrawlManager,
        query: SearchQuery,
        sort_key: SortKey,
    ) {
        self.update(id, |record| {
            record.status = RunStatus::Running;
            record.started_at = Some(Utc::now());
        })
        .await;

        // A panic inside the crawl must still leave the run in a final state
        let task = tokio::spawn(async move {
            let filter = query.filter();
            let sources = manager.resolve_sources(&query.sources);
            let budget = CrawlBudget::new(
                MAX_PAGES_PER_SOURCE,
                manager.config().crawler.limit_per_page,
            );
            let outcomes = manager.run_all(&sources, &filter, budget, true).await;
            (outcomes, query.max_results)
        });

        match task.await {
            Ok((outcomes, max_results)) => {
                let mut postings = merge(outcomes.values(), true, sort_key);
                let total_jobs = postings.len();
                postings.truncate(max_results);
                let summaries: Vec<SourceSummary> =
                    outcomes.values().map(CrawlOutcome::summary).collect();

                tracing::info!(run_id = %id, total_jobs, "Background run completed");
                self.update(id, |record| {
                    record.status = RunStatus::Completed;
                    record.completed_at = Some(Utc::now());
                    record.total_jobs = total_jobs;
                    record.postings = postings;
                    record.summaries = summaries;
                })
                .await;
            }
            Err(e) => {
                tracing::error!(run_id = %id, error = %e, "Background run failed");
                self.update(id, |record| {
                    record.status = RunStatus::Failed;
                    record.completed_at = Some(Utc::now());
                    record.error = Some(e.to_string());
                })
                .await;
            }
        }
    }

    async fn update<F>(&self, id: Uuid, apply: F)
    where
        F: FnOnce(&mut RunRecord),
    {
        if let Some(record) = self.runs.write().await.get_mut(&id) {
            apply(record);
        }
    }

    /// Current status of a run, `None` for an unknown id
    pub async fn status(&self, id: Uuid) -> Option<RunSnapshot> {
        self.runs.read().await.get(&id).map(RunRecord::snapshot)
    }

    /// One page (1-based) of a run's postings
    ///
    /// `page` is raised to at least 1 and `page_size` clamped to
    /// `1..=MAX_PAGE_SIZE`. Unfinished or failed runs return an empty page
    /// carrying their status.
    pub async fn results(&self, id: Uuid, page: usize, page_size: usize) -> Option<RunPage> {
        let runs = self.runs.read().await;
        let record = runs.get(&id)?;

        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);

        let postings = if record.status == RunStatus::Completed {
            record
                .postings
                .iter()
                .skip((page - 1) * page_size)
                .take(page_size)
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        Some(RunPage {
            status: record.status,
            total: record.postings.len(),
            page,
            page_size,
            postings,
        })
    }

    /// Ids of every known run
    pub async fn ids(&self) -> Vec<Uuid> {
        self.runs.read().await.keys().copied().collect()
    }
}
