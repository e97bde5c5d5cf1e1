//! Search job handler

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::SearchProvider;
use crate::jobs::{Job, JobHandler, JobPayload, JobRegistry};

/// Runs search jobs through the configured provider.
///
/// With `crawl_results` set on the payload, the handler also submits crawl
/// jobs for the returned hit URLs, capped at the configured fan-out and
/// carrying the search job's own priority.
pub struct SearchHandler {
    provider: Arc<dyn SearchProvider>,
    registry: Arc<JobRegistry>,
    max_crawl_fanout: usize,
}

impl SearchHandler {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        registry: Arc<JobRegistry>,
        max_crawl_fanout: usize,
    ) -> Self {
        Self {
            provider,
            registry,
            max_crawl_fanout,
        }
    }
}

#[async_trait]
impl JobHandler for SearchHandler {
    async fn execute(&self, job: Job) -> anyhow::Result<serde_json::Value> {
        let JobPayload::Search {
            query,
            max_results,
            crawl_results,
        } = &job.payload
        else {
            anyhow::bail!("search handler received a {} payload", job.payload.kind());
        };

        let hits = self.provider.search(query, *max_results).await?;
        tracing::info!("Search '{}' returned {} hits", query, hits.len());

        let mut crawl_jobs = Vec::new();
        if *crawl_results {
            for hit in hits.iter().take(self.max_crawl_fanout) {
                let id = self.registry.submit(
                    JobPayload::Crawl {
                        url: hit.url.clone(),
                    },
                    job.priority,
                );
                crawl_jobs.push(id.as_str().to_string());
            }
            if hits.len() > self.max_crawl_fanout {
                tracing::info!(
                    "Capped crawl fan-out at {} of {} hits for '{}'",
                    self.max_crawl_fanout,
                    hits.len(),
                    query
                );
            }
        }

        Ok(json!({
            "query": query,
            "search_results": hits,
            "crawl_jobs": crawl_jobs,
        }))
    }
}
