use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobpulse::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "jobpulse",
    version,
    about = "Multi-source job posting crawler and aggregator",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Search job postings across sources
    Search {
        /// Search keyword (e.g. "백엔드", "React")
        keyword: String,

        /// Location filter (서울, 경기, 부산, ...)
        #[arg(short, long)]
        location: Option<String>,

        /// Experience filter (신입, 경력, 3년, ...)
        #[arg(short, long)]
        experience: Option<String>,

        /// Comma-separated sources (wanted,jobkorea,jobplanet,linkedin)
        #[arg(short, long, value_delimiter = ',')]
        sources: Vec<String>,

        /// Maximum number of results (1-200)
        #[arg(short = 'n', long, default_value = "50")]
        max_results: usize,

        /// Sort key (crawledAt, postedAt, companyName, title)
        #[arg(long, default_value = "crawledAt")]
        sort: String,

        /// Run as a background crawl (5 pages per source) and poll until done
        #[arg(long, default_value = "false")]
        background: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the detail page of one posting
    Detail {
        /// Source name
        source: String,

        /// Posting id at the source
        id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List available sources
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    // Initialize tracing/logging
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("jobpulse starting");

    match cli.command {
        Commands::Search {
            keyword,
            location,
            experience,
            sources,
            max_results,
            sort,
            background,
            format,
        } => {
            tracing::info!(
                keyword = %keyword,
                sources = ?sources,
                max_results = %max_results,
                background = %background,
                "Starting search command"
            );
            let args = commands::SearchArgs {
                keyword,
                location,
                experience,
                sources,
                max_results,
                sort,
                background,
                format,
            };
            commands::search(config, args).await?;
        }

        Commands::Detail { source, id, format } => {
            tracing::info!(source = %source, id = %id, "Starting detail command");
            commands::detail(config, &source, &id, format).await?;
        }

        Commands::Sources => {
            commands::sources(&config);
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    }
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("jobpulse=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("jobpulse={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
