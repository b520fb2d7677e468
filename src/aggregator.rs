//! Merging per-source outcomes into one ordered result list

use std::cmp::Ordering;
use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{CrawlOutcome, JobPosting};

/// Ordering applied after merging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Most recently crawled first
    #[default]
    CrawledAt,
    /// Most recently posted first, postings without a date last
    PostedAt,
    /// Company name ascending
    CompanyName,
    /// Title ascending
    Title,
    /// Keep merge order
    Unsorted,
}

impl SortKey {
    /// Parse a sort key name; unknown names leave the order unchanged
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "crawledAt" | "crawled_at" => Self::CrawledAt,
            "postedAt" | "posted_at" => Self::PostedAt,
            "companyName" | "company_name" | "company" => Self::CompanyName,
            "title" => Self::Title,
            _ => Self::Unsorted,
        }
    }

    fn compare(self, a: &JobPosting, b: &JobPosting) -> Ordering {
        match self {
            Self::CrawledAt => b.crawled_at.cmp(&a.crawled_at),
            Self::PostedAt => match (a.posted_at, b.posted_at) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::CompanyName => a.company_name.cmp(&b.company_name),
            Self::Title => a.title.cmp(&b.title),
            Self::Unsorted => Ordering::Equal,
        }
    }
}

impl FromStr for SortKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Merge the postings of every successful outcome
///
/// Failed outcomes contribute nothing. With `deduplicate`, the first posting
/// seen for each case-insensitive `(title, company)` pair is kept. Sorting is
/// stable, so ties keep their merge order.
pub fn merge<'a, I>(outcomes: I, deduplicate: bool, sort_key: SortKey) -> Vec<JobPosting>
where
    I: IntoIterator<Item = &'a CrawlOutcome>,
{
    let mut seen = HashSet::new();
    let mut merged: Vec<JobPosting> = outcomes
        .into_iter()
        .filter(|outcome| outcome.succeeded)
        .flat_map(|outcome| outcome.postings.iter())
        .filter(|posting| !deduplicate || seen.insert(posting.dedup_key()))
        .cloned()
        .collect();

    if sort_key != SortKey::Unsorted {
        merged.sort_by(|a, b| sort_key.compare(a, b));
    }

    merged
}
