//! Crawl job handler
//!
//! A crawl job registers its URL with the shared frontier and then works the
//! frontier until that URL settles: every admitted target gets fetched,
//! marked done or failed (feeding the retry machinery), and chained into a
//! lead-processing job on success. Targets left behind by earlier jobs are
//! drained along the way. The job's result reports the terminal status of
//! its own URL.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::json;

use crate::crawl::{fetch_page, CrawlScheduler, CrawlTarget, FetchOutcome};
use crate::jobs::{Job, JobHandler, JobPayload, JobRegistry};
use crate::state::TargetStatus;
use crate::url::parse_target;

/// How long to sleep when the frontier has nothing admissible yet
const FRONTIER_POLL: Duration = Duration::from_millis(100);

/// Title and visible text pulled from a fetched page
#[derive(Debug, Clone)]
struct ParsedPage {
    title: Option<String>,
    text: String,
}

/// Drives the crawl frontier for crawl jobs.
pub struct CrawlHandler {
    registry: Arc<JobRegistry>,
    scheduler: Arc<CrawlScheduler>,
    client: Client,
}

impl CrawlHandler {
    pub fn new(registry: Arc<JobRegistry>, scheduler: Arc<CrawlScheduler>, client: Client) -> Self {
        Self {
            registry,
            scheduler,
            client,
        }
    }

    /// Fetches one admitted target and settles it with the scheduler.
    ///
    /// On success a `lead_processing` job is submitted for the page content
    /// at the crawl job's priority, and a page summary is returned for the
    /// job result. Failures go back through `mark_failed` for retry.
    async fn process_target(&self, job: &Job, target: CrawlTarget) -> Option<serde_json::Value> {
        match fetch_page(&self.client, &target.url).await {
            FetchOutcome::Success {
                final_url,
                status,
                body,
            } => {
                let ParsedPage { title, text } = parse_page(&body);
                self.scheduler.mark_done(&target);

                let lead_job = self.registry.submit(
                    JobPayload::LeadProcessing {
                        text,
                        html: body,
                        source_url: target.key().to_string(),
                    },
                    job.priority,
                );
                tracing::info!(
                    "Submitted lead job {} for crawled page {}",
                    lead_job,
                    target.key()
                );

                Some(json!({
                    "url": target.key(),
                    "final_url": final_url,
                    "http_status": status,
                    "title": title,
                    "lead_job": lead_job.as_str(),
                }))
            }
            FetchOutcome::HttpStatus(code) => {
                tracing::warn!("Fetch of {} returned HTTP {}", target.key(), code);
                self.scheduler.mark_failed(target);
                None
            }
            FetchOutcome::Network(reason) => {
                tracing::warn!("Fetch of {} failed: {}", target.key(), reason);
                self.scheduler.mark_failed(target);
                None
            }
        }
    }

    /// Builds the job result once the job's own URL reached a terminal state.
    ///
    /// Policy skips are successful outcomes with the skip recorded; only a
    /// fetch that exhausted its retries fails the job. `page` is present
    /// when this job performed the fetch itself (not when an earlier job
    /// already settled the URL).
    fn settle(
        &self,
        url: &str,
        status: TargetStatus,
        page: Option<serde_json::Value>,
    ) -> anyhow::Result<serde_json::Value> {
        match status {
            TargetStatus::Failed => {
                anyhow::bail!("crawl of {} failed after retries", url)
            }
            _ => Ok(json!({
                "url": url,
                "status": status.as_str(),
                "page": page,
            })),
        }
    }
}

#[async_trait]
impl JobHandler for CrawlHandler {
    async fn execute(&self, job: Job) -> anyhow::Result<serde_json::Value> {
        let JobPayload::Crawl { url } = &job.payload else {
            anyhow::bail!("crawl handler received a {} payload", job.payload.kind());
        };

        let (own_url, _) = parse_target(url)?;
        let own_key = own_url.as_str().to_string();
        let outcome = self.scheduler.enqueue(url, job.priority)?;
        tracing::debug!("Crawl job {} registered {} ({:?})", job.id, own_key, outcome);

        let mut own_page = None;
        loop {
            match self.scheduler.status_of(&own_key) {
                Some(status) if status.is_terminal() => {
                    return self.settle(&own_key, status, own_page);
                }
                Some(_) => {}
                None => anyhow::bail!("target {} missing from the frontier", own_key),
            }

            match self.scheduler.next_target().await {
                Some(target) => {
                    let is_own = target.key() == own_key;
                    if let Some(page) = self.process_target(&job, target).await {
                        if is_own {
                            own_page = Some(page);
                        }
                    }
                }
                // Politeness windows still closed; poll again shortly
                None => tokio::time::sleep(FRONTIER_POLL).await,
            }
        }
    }
}

/// Extracts the title and whitespace-collapsed text from an HTML document.
fn parse_page(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);
    ParsedPage {
        title: extract_title(&document),
        text: extract_text(&document),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts body text with whitespace collapsed to single spaces
fn extract_text(document: &Html) -> String {
    if let Ok(body_selector) = Selector::parse("body") {
        if let Some(body) = document.select(&body_selector).next() {
            return collapse_whitespace(body.text());
        }
    }
    collapse_whitespace(document.root_element().text())
}

fn collapse_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
