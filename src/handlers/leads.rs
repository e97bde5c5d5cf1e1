//! Lead-processing job handler

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::LeadExtractor;
use crate::jobs::{Job, JobHandler, JobPayload};

/// Runs lead-processing jobs through the configured extractor.
pub struct LeadHandler {
    extractor: Arc<dyn LeadExtractor>,
}

impl LeadHandler {
    pub fn new(extractor: Arc<dyn LeadExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl JobHandler for LeadHandler {
    async fn execute(&self, job: Job) -> anyhow::Result<serde_json::Value> {
        let JobPayload::LeadProcessing {
            text,
            html,
            source_url,
        } = &job.payload
        else {
            anyhow::bail!("lead handler received a {} payload", job.payload.kind());
        };

        let leads = self.extractor.extract(text, html, source_url).await?;
        tracing::info!("Extracted {} leads from {}", leads.len(), source_url);

        Ok(json!({
            "source_url": source_url,
            "lead_count": leads.len(),
            "leads": leads,
        }))
    }
}
