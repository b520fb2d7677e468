// Core data structures for jobpulse

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::utils::error::CrawlerError;

/// Known job listing sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSource {
    Wanted,
    JobKorea,
    JobPlanet,
    LinkedIn,
}

impl JobSource {
    /// Get string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wanted => "wanted",
            Self::JobKorea => "jobkorea",
            Self::JobPlanet => "jobplanet",
            Self::LinkedIn => "linkedin",
        }
    }

    /// Get Korean display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Wanted => "원티드",
            Self::JobKorea => "잡코리아",
            Self::JobPlanet => "잡플래닛",
            Self::LinkedIn => "링크드인",
        }
    }

    /// Get all sources
    pub fn all() -> Vec<Self> {
        vec![Self::Wanted, Self::JobKorea, Self::JobPlanet, Self::LinkedIn]
    }
}

impl std::fmt::Display for JobSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobSource {
    type Err = CrawlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wanted" | "원티드" => Ok(Self::Wanted),
            "jobkorea" | "잡코리아" => Ok(Self::JobKorea),
            "jobplanet" | "잡플래닛" => Ok(Self::JobPlanet),
            "linkedin" | "링크드인" => Ok(Self::LinkedIn),
            other => Err(CrawlerError::UnknownSource(other.to_string())),
        }
    }
}

/// Normalized job posting produced by every source adapter
///
/// Postings are built once while parsing and never mutated afterwards.
/// `(source, source_id)` is unique within one adapter run but not across
/// sources; use [`JobPosting::dedup_key`] to collapse cross-source duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company_name: String,
    pub source: JobSource,
    pub source_url: String,
    pub source_id: String,

    pub location: Option<String>,
    pub salary: Option<String>,
    pub experience_level: Option<String>,
    pub employment_type: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub posted_at: Option<DateTime<Utc>>,
    pub company_logo_url: Option<String>,

    pub crawled_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub raw_data: serde_json::Value,
}

impl JobPosting {
    /// Create a posting with the required fields, stamped with the current time
    pub fn new(
        source: JobSource,
        source_id: impl Into<String>,
        title: impl Into<String>,
        company_name: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            company_name: company_name.into(),
            source,
            source_url: source_url.into(),
            source_id: source_id.into(),
            location: None,
            salary: None,
            experience_level: None,
            employment_type: None,
            category: None,
            skills: Vec::new(),
            description: None,
            requirements: None,
            benefits: None,
            deadline: None,
            posted_at: None,
            company_logo_url: None,
            crawled_at: Utc::now(),
            raw_data: serde_json::Value::Null,
        }
    }

    /// Case-insensitive `(title, company)` key used for cross-source dedup
    pub fn dedup_key(&self) -> (String, String) {
        (self.title.to_lowercase(), self.company_name.to_lowercase())
    }

    pub fn with_location(mut self, value: Option<String>) -> Self {
        self.location = non_empty(value);
        self
    }

    pub fn with_salary(mut self, value: Option<String>) -> Self {
        self.salary = non_empty(value);
        self
    }

    pub fn with_experience_level(mut self, value: Option<String>) -> Self {
        self.experience_level = non_empty(value);
        self
    }

    pub fn with_employment_type(mut self, value: Option<String>) -> Self {
        self.employment_type = non_empty(value);
        self
    }

    pub fn with_category(mut self, value: Option<String>) -> Self {
        self.category = non_empty(value);
        self
    }

    pub fn with_skills(mut self, skills: Vec<String>) -> Self {
        self.skills = skills.into_iter().filter(|s| !s.trim().is_empty()).collect();
        self
    }

    pub fn with_description(mut self, value: Option<String>) -> Self {
        self.description = non_empty(value);
        self
    }

    pub fn with_requirements(mut self, value: Option<String>) -> Self {
        self.requirements = non_empty(value);
        self
    }

    pub fn with_benefits(mut self, value: Option<String>) -> Self {
        self.benefits = non_empty(value);
        self
    }

    pub fn with_deadline(mut self, value: Option<DateTime<Utc>>) -> Self {
        self.deadline = value;
        self
    }

    pub fn with_posted_at(mut self, value: Option<DateTime<Utc>>) -> Self {
        self.posted_at = value;
        self
    }

    pub fn with_company_logo_url(mut self, value: Option<String>) -> Self {
        self.company_logo_url = non_empty(value);
        self
    }

    pub fn with_raw_data(mut self, value: serde_json::Value) -> Self {
        self.raw_data = value;
        self
    }
}

/// Treat blank strings scraped from a source as absent
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Caller-side search filters handed to each adapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub keyword: String,
    pub location: Option<String>,
    pub experience_level: Option<String>,
}

impl SearchFilter {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Default::default()
        }
    }
}

/// Search request accepted by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    /// Source names; empty means every registered source
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub max_pages_per_source: Option<u32>,
}

fn default_max_results() -> usize {
    SearchQuery::DEFAULT_MAX_RESULTS
}

impl SearchQuery {
    pub const DEFAULT_MAX_RESULTS: usize = 50;
    pub const MAX_RESULTS_LIMIT: usize = 200;

    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            location: None,
            experience_level: None,
            sources: Vec::new(),
            max_results: Self::DEFAULT_MAX_RESULTS,
            max_pages_per_source: None,
        }
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_experience_level(mut self, level: impl Into<String>) -> Self {
        self.experience_level = Some(level.into());
        self
    }

    /// Adapter-facing filter for this query
    pub fn filter(&self) -> SearchFilter {
        SearchFilter {
            keyword: self.keyword.trim().to_string(),
            location: self.location.clone(),
            experience_level: self.experience_level.clone(),
        }
    }
}

/// Result of crawling one source during one orchestration call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlOutcome {
    pub source: JobSource,
    pub postings: Vec<JobPosting>,
    pub succeeded: bool,
    pub error: Option<String>,
    pub duration_seconds: f64,
    pub completed_at: DateTime<Utc>,
}

impl CrawlOutcome {
    pub fn success(source: JobSource, postings: Vec<JobPosting>, duration_seconds: f64) -> Self {
        Self {
            source,
            postings,
            succeeded: true,
            error: None,
            duration_seconds,
            completed_at: Utc::now(),
        }
    }

    pub fn failure(source: JobSource, error: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            source,
            postings: Vec::new(),
            succeeded: false,
            error: Some(error.into()),
            duration_seconds,
            completed_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> SourceSummary {
        SourceSummary {
            source: self.source,
            succeeded: self.succeeded,
            job_count: self.postings.len(),
            error: self.error.clone(),
            duration_seconds: self.duration_seconds,
        }
    }
}

/// Per-source diagnostics reported alongside search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub source: JobSource,
    pub succeeded: bool,
    pub job_count: usize,
    pub error: Option<String>,
    pub duration_seconds: f64,
}

/// Aggregated search output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub keyword: String,
    pub postings: Vec<JobPosting>,
    pub summaries: Vec<SourceSummary>,
    pub duration_seconds: f64,
}

impl SearchResults {
    pub fn successful_sources(&self) -> usize {
        self.summaries.iter().filter(|s| s.succeeded).count()
    }

    pub fn failed_sources(&self) -> usize {
        self.summaries.len() - self.successful_sources()
    }
}
