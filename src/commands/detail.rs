use anyhow::Result;

use jobpulse::config::Config;
use jobpulse::error::JobPulseErrorTrait;
use jobpulse::models::JobSource;
use jobpulse::orchestrator::CrawlManager;

use super::search::print_posting;
use crate::OutputFormat;

pub async fn detail(config: Config, source: &str, id: &str, format: OutputFormat) -> Result<()> {
    let source: JobSource = source.parse()?;
    let manager = CrawlManager::with_defaults(config);

    let posting = match manager.fetch_detail(source, id).await {
        Ok(posting) => posting,
        Err(e) => {
            let category = e.category();
            tracing::error!(
                category = ?category,
                recoverable = e.is_recoverable(),
                error = %e,
                "Detail lookup failed"
            );
            return Err(anyhow::Error::new(e).context(format!(
                "{} while looking up {source}/{id}",
                category.korean_desc()
            )));
        }
    };

    let Some(posting) = posting else {
        println!("Posting {id} not found on {}", source.display_name());
        return Ok(());
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&posting)?),
        OutputFormat::Text => {
            print_posting(1, &posting);
            for (label, value) in [
                ("Salary", &posting.salary),
                ("Deadline", &posting.deadline.map(|d| d.to_rfc3339())),
                ("Requirements", &posting.requirements),
                ("Benefits", &posting.benefits),
                ("Description", &posting.description),
            ] {
                if let Some(value) = value {
                    println!("\n[{label}]\n{value}");
                }
            }
        }
    }

    Ok(())
}
