use std::time::Duration;

use anyhow::{Context, Result};

use jobpulse::aggregator::SortKey;
use jobpulse::config::Config;
use jobpulse::error::JobPulseErrorTrait;
use jobpulse::models::{JobPosting, SearchQuery, SearchResults, SourceSummary};
use jobpulse::orchestrator::CrawlManager;
use jobpulse::runs::{RunRegistry, MAX_PAGE_SIZE};
use jobpulse::utils::truncate_text;

use crate::OutputFormat;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Arguments of the `search` command
pub struct SearchArgs {
    pub keyword: String,
    pub location: Option<String>,
    pub experience: Option<String>,
    pub sources: Vec<String>,
    pub max_results: usize,
    pub sort: String,
    pub background: bool,
    pub format: OutputFormat,
}

impl SearchArgs {
    fn query(&self) -> SearchQuery {
        let mut query = SearchQuery::new(self.keyword.clone())
            .with_sources(self.sources.clone())
            .with_max_results(self.max_results);
        query.location = self.location.clone();
        query.experience_level = self.experience.clone();
        query
    }
}

pub async fn search(config: Config, args: SearchArgs) -> Result<()> {
    let manager = CrawlManager::with_defaults(config);
    let query = args.query();
    let sort_key = SortKey::parse(&args.sort);

    let results = if args.background {
        run_in_background(manager, query, sort_key).await?
    } else {
        match manager.search_sorted(&query, sort_key).await {
            Ok(results) => results,
            Err(e) => {
                let category = e.category();
                return Err(anyhow::Error::new(e)
                    .context(format!("Search failed ({})", category.korean_desc())));
            }
        }
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Text => print_results(&results),
    }

    Ok(())
}

/// Start a background run and poll it until it finishes
async fn run_in_background(
    manager: CrawlManager,
    query: SearchQuery,
    sort_key: SortKey,
) -> Result<SearchResults> {
    let registry = RunRegistry::new();
    let keyword = query.keyword.clone();
    let id = registry
        .start_sorted(manager, query, sort_key)
        .await
        .context("Failed to start background run")?;

    println!("Background run {id} started");

    let snapshot = loop {
        tokio::time::sleep(POLL_INTERVAL).await;
        let snapshot = registry
            .status(id)
            .await
            .context("Background run disappeared")?;
        tracing::debug!(run_id = %id, status = %snapshot.status, "Polled background run");
        if snapshot.status.is_finished() {
            break snapshot;
        }
    };

    if let Some(error) = snapshot.error {
        anyhow::bail!("Background run {id} failed: {error}");
    }

    let mut postings = Vec::new();
    let mut page = 1;
    while let Some(batch) = registry.results(id, page, MAX_PAGE_SIZE).await {
        if batch.postings.is_empty() {
            break;
        }
        postings.extend(batch.postings);
        page += 1;
    }

    let duration_seconds = match (snapshot.started_at, snapshot.completed_at) {
        (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / 1000.0,
        _ => 0.0,
    };

    Ok(SearchResults {
        keyword,
        postings,
        summaries: snapshot.summaries,
        duration_seconds,
    })
}

fn print_results(results: &SearchResults) {
    println!(
        "Found {} postings for \"{}\" in {:.2}s",
        results.postings.len(),
        results.keyword,
        results.duration_seconds
    );
    println!("================================");

    for (i, posting) in results.postings.iter().enumerate() {
        print_posting(i + 1, posting);
    }

    println!("\nSources ({} succeeded, {} failed):", results.successful_sources(), results.failed_sources());
    for summary in &results.summaries {
        print_summary(summary);
    }
}

pub(crate) fn print_posting(rank: usize, posting: &JobPosting) {
    println!(
        "\n{rank}. {} - {} [{}]",
        posting.title,
        posting.company_name,
        posting.source.display_name()
    );

    let details: Vec<&str> = [
        posting.location.as_deref(),
        posting.experience_level.as_deref(),
        posting.employment_type.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !details.is_empty() {
        println!("   {}", details.join(" | "));
    }

    if !posting.skills.is_empty() {
        println!("   Skills: {}", truncate_text(&posting.skills.join(", "), 80));
    }
    println!("   URL: {}", posting.source_url);
}

fn print_summary(summary: &SourceSummary) {
    match &summary.error {
        None => println!(
            "  ✓ {:<10} {:>4} postings ({:.1}s)",
            summary.source.as_str(),
            summary.job_count,
            summary.duration_seconds
        ),
        Some(error) => println!(
            "  ✗ {:<10} failed: {} ({:.1}s)",
            summary.source.as_str(),
            error,
            summary.duration_seconds
        ),
    }
}
