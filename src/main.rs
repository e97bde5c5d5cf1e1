//! Prospector main entry point
//!
//! This is the command-line interface for the prospector lead-prospecting
//! scheduler.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use prospector::config::load_config_with_hash;
use prospector::handlers::{Lead, LeadExtractor, SearchHit, SearchProvider};
use prospector::jobs::{JobKind, JobPayload, JobStatus};
use prospector::pipeline::Pipeline;
use tracing_subscriber::EnvFilter;

/// Prospector: a polite lead-prospecting job scheduler
///
/// Prospector runs search, crawl, and lead-processing jobs through
/// per-type workers while respecting robots.txt, per-domain politeness
/// delays, and crawl budgets.
#[derive(Parser, Debug)]
#[command(name = "prospector")]
#[command(version = "0.1.0")]
#[command(about = "A polite lead-prospecting job scheduler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would run without running it
    #[arg(long)]
    dry_run: bool,

    /// Submit a search job for this query (with crawl fan-out)
    #[arg(long, value_name = "QUERY")]
    query: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, cli.query.as_deref());
        return Ok(());
    }

    handle_run(config, cli.query).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("prospector=info,warn"),
            1 => EnvFilter::new("prospector=debug,info"),
            2 => EnvFilter::new("prospector=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &prospector::config::Config, query: Option<&str>) {
    println!("=== Prospector Dry Run ===\n");

    println!("Scheduler:");
    println!("  Poll interval: {}ms", config.scheduler.poll_interval_ms);
    println!(
        "  Job timeouts: search {}s, crawl {}s, lead {}s",
        config.scheduler.search_timeout_secs,
        config.scheduler.crawl_timeout_secs,
        config.scheduler.lead_timeout_secs
    );

    println!("\nCrawl Policy:");
    println!("  Politeness delay: {}ms", config.crawl.politeness_delay_ms);
    println!(
        "  Budget per domain: {}",
        config.crawl.crawl_budget_per_domain
    );
    println!("  Max retries: {}", config.crawl.max_retries);
    println!("  Max crawl fan-out: {}", config.crawl.max_crawl_fanout);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {} (priority {})", seed.url, seed.priority);
    }

    println!("\n✓ Configuration is valid");
    match query {
        Some(q) => println!(
            "✓ Would run a search for '{}' plus {} seed crawl jobs",
            q,
            config.seeds.len()
        ),
        None => println!("✓ Would run {} seed crawl jobs", config.seeds.len()),
    }
}

/// Handles the main run: submits seed and query jobs, waits for the cascade
/// to drain, prints a summary
async fn handle_run(
    config: prospector::config::Config,
    query: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let seeds = config.seeds.clone();
    if seeds.is_empty() && query.is_none() {
        tracing::warn!("No seeds configured and no --query given, nothing to do");
        return Ok(());
    }

    let provider = Arc::new(SeedSearchProvider::from_seeds(&seeds));
    let extractor = Arc::new(ContactExtractor);
    let mut pipeline = Pipeline::new(config, provider, extractor)?;
    pipeline.start();

    for seed in &seeds {
        let id = pipeline.submit_job(
            JobPayload::Crawl {
                url: seed.url.clone(),
            },
            seed.priority,
        );
        tracing::info!("Submitted crawl job {} for seed {}", id, seed.url);
    }

    if let Some(query) = query {
        let id = pipeline.submit_job(
            JobPayload::Search {
                query: query.clone(),
                max_results: 10,
                crawl_results: true,
            },
            0,
        );
        tracing::info!("Submitted search job {} for '{}'", id, query);
    }

    // Chained jobs are submitted before their parent finishes, so an idle
    // registry means the whole cascade has drained.
    while !pipeline.is_idle() {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    print_summary(&pipeline);
    pipeline.shutdown().await;
    Ok(())
}

/// Prints the end-of-run registry and crawl summary
fn print_summary(pipeline: &Pipeline) {
    let stats = pipeline.stats();

    println!("\n=== Run Summary ===\n");
    println!("Jobs ({} total):", stats.jobs.total);
    for kind in JobKind::all() {
        if let Some(counts) = stats.jobs.by_kind.get(&kind) {
            println!(
                "  {}: {} completed, {} failed, {} cancelled",
                kind, counts.completed, counts.failed, counts.cancelled
            );
        }
    }

    println!("\nCrawl targets:");
    println!("  Done: {}", stats.crawl.done);
    println!("  Skipped (robots): {}", stats.crawl.skipped_robots);
    println!("  Skipped (budget): {}", stats.crawl.skipped_budget);
    println!("  Failed: {}", stats.crawl.failed);

    let lead_count: u64 = pipeline
        .list_jobs()
        .iter()
        .filter(|job| job.kind() == JobKind::LeadProcessing && job.status == JobStatus::Completed)
        .filter_map(|job| job.result.as_ref())
        .filter_map(|result| result["lead_count"].as_u64())
        .sum();
    println!("\nLeads extracted: {}", lead_count);
}

/// Demo search provider serving the configured seed URLs as hits.
///
/// Stands in for a real search API integration; lets the full
/// search → crawl → lead chain run without external credentials.
struct SeedSearchProvider {
    hits: Vec<SearchHit>,
}

impl SeedSearchProvider {
    fn from_seeds(seeds: &[prospector::config::SeedEntry]) -> Self {
        let hits = seeds
            .iter()
            .map(|seed| SearchHit {
                title: seed.url.clone(),
                url: seed.url.clone(),
                snippet: String::new(),
            })
            .collect();
        Self { hits }
    }
}

#[async_trait]
impl SearchProvider for SeedSearchProvider {
    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<SearchHit>> {
        tracing::debug!("Demo search for '{}' serving configured seeds", query);
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }
}

/// Demo lead extractor scanning page text for email-shaped tokens.
struct ContactExtractor;

#[async_trait]
impl LeadExtractor for ContactExtractor {
    async fn extract(
        &self,
        text: &str,
        _html: &str,
        source_url: &str,
    ) -> anyhow::Result<Vec<Lead>> {
        let mut seen = HashSet::new();
        let mut leads = Vec::new();
        for token in text.split_whitespace() {
            let candidate = token
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '@' && c != '.')
                .trim_end_matches('.');
            if looks_like_email(candidate) && seen.insert(candidate.to_string()) {
                leads.push(Lead {
                    name: None,
                    email: Some(candidate.to_string()),
                    phone: None,
                    source_url: source_url.to_string(),
                });
            }
        }
        Ok(leads)
    }
}

fn looks_like_email(token: &str) -> bool {
    match token.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}
