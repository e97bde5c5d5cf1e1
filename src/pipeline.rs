//! Pipeline wiring and facade
//!
//! The pipeline is the single context object tying the subsystems together:
//! it owns the job registry, the admission controller, the crawl frontier,
//! the shared HTTP client, and the worker pool, and exposes the submission
//! and inspection API callers use. Collaborator integrations (search
//! provider, lead extractor) are injected at construction.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::Config;
use crate::crawl::{build_http_client, AdmissionController, CrawlScheduler, CrawlStats};
use crate::handlers::{CrawlHandler, LeadExtractor, LeadHandler, SearchHandler, SearchProvider};
use crate::jobs::{
    Job, JobId, JobKind, JobPayload, JobRegistry, RegistryStats, Worker, WorkerConfig, WorkerPool,
};
use crate::{ProspectorError, Result};

/// Combined registry and frontier snapshot
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub jobs: RegistryStats,
    pub crawl: CrawlStats,
}

/// The assembled scheduling and crawling pipeline
pub struct Pipeline {
    config: Arc<Config>,
    registry: Arc<JobRegistry>,
    scheduler: Arc<CrawlScheduler>,
    admission: Arc<AdmissionController>,
    provider: Arc<dyn SearchProvider>,
    extractor: Arc<dyn LeadExtractor>,
    client: reqwest::Client,
    workers: Option<WorkerPool>,
}

impl Pipeline {
    /// Wires up a pipeline from config and the two collaborator integrations.
    ///
    /// Workers are not running yet; call [`start`](Self::start) to spawn
    /// them.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `provider` - Search integration used by search jobs
    /// * `extractor` - Lead extraction used by lead-processing jobs
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - Ready to start
    /// * `Err(ProspectorError)` - HTTP client construction failed
    pub fn new(
        config: Config,
        provider: Arc<dyn SearchProvider>,
        extractor: Arc<dyn LeadExtractor>,
    ) -> Result<Self> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawl.fetch_timeout_secs),
        )?;
        let admission = Arc::new(AdmissionController::new(
            client.clone(),
            &config.crawl,
            config.user_agent.crawler_name.clone(),
        ));
        let scheduler = Arc::new(CrawlScheduler::new(Arc::clone(&admission), &config.crawl));

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(JobRegistry::new()),
            scheduler,
            admission,
            provider,
            extractor,
            client,
            workers: None,
        })
    }

    /// Spawns one worker per job kind onto the current runtime.
    ///
    /// Poll interval and per-kind job timeouts come from the `[scheduler]`
    /// config section. Calling start twice is a no-op.
    pub fn start(&mut self) {
        if self.workers.is_some() {
            tracing::warn!("Pipeline already started");
            return;
        }

        let scheduler_cfg = &self.config.scheduler;
        let poll_interval = Duration::from_millis(scheduler_cfg.poll_interval_ms);
        let mut pool = WorkerPool::new();

        let search_handler = Arc::new(SearchHandler::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.registry),
            self.config.crawl.max_crawl_fanout,
        ));
        pool.spawn(Worker::new(
            Arc::clone(&self.registry),
            search_handler,
            WorkerConfig {
                kind: JobKind::Search,
                poll_interval,
                job_timeout: Duration::from_secs(scheduler_cfg.search_timeout_secs),
            },
        ));

        let crawl_handler = Arc::new(CrawlHandler::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.scheduler),
            self.client.clone(),
        ));
        pool.spawn(Worker::new(
            Arc::clone(&self.registry),
            crawl_handler,
            WorkerConfig {
                kind: JobKind::Crawl,
                poll_interval,
                job_timeout: Duration::from_secs(scheduler_cfg.crawl_timeout_secs),
            },
        ));

        let lead_handler = Arc::new(LeadHandler::new(Arc::clone(&self.extractor)));
        pool.spawn(Worker::new(
            Arc::clone(&self.registry),
            lead_handler,
            WorkerConfig {
                kind: JobKind::LeadProcessing,
                poll_interval,
                job_timeout: Duration::from_secs(scheduler_cfg.lead_timeout_secs),
            },
        ));

        self.workers = Some(pool);
        tracing::info!("Pipeline started with workers for search, crawl, lead_processing");
    }

    /// Stops the workers and waits for their loops to exit.
    ///
    /// A job mid-execution finishes (or times out) first; see the worker
    /// shutdown semantics.
    pub async fn shutdown(&mut self) {
        if let Some(pool) = self.workers.take() {
            pool.shutdown().await;
            tracing::info!("Pipeline stopped");
        }
    }

    /// Submits a job for execution.
    pub fn submit_job(&self, payload: JobPayload, priority: i32) -> JobId {
        self.registry.submit(payload, priority)
    }

    /// Fetches a job snapshot by id.
    ///
    /// # Returns
    ///
    /// * `Ok(Job)` - Current snapshot
    /// * `Err(ProspectorError::UnknownJob)` - No job with this id
    pub fn get_job(&self, id: &JobId) -> Result<Job> {
        self.registry
            .get(id)
            .ok_or_else(|| ProspectorError::UnknownJob(id.as_str().to_string()))
    }

    /// Lists all jobs in submission order.
    pub fn list_jobs(&self) -> Vec<Job> {
        self.registry.list()
    }

    /// Cancels a job; terminal jobs are returned unchanged.
    ///
    /// # Returns
    ///
    /// * `Ok(Job)` - Snapshot after the cancel took effect (or didn't)
    /// * `Err(ProspectorError::UnknownJob)` - No job with this id
    pub fn cancel_job(&self, id: &JobId) -> Result<Job> {
        self.registry
            .cancel(id)
            .ok_or_else(|| ProspectorError::UnknownJob(id.as_str().to_string()))
    }

    /// Seeds crawl targets straight into the frontier, bypassing the job
    /// queue.
    ///
    /// Invalid URLs are logged and skipped. Returns how many targets were
    /// newly queued. Note the frontier is only drained while crawl jobs run;
    /// submit a crawl job to drive seeded targets.
    pub fn enqueue_crawl_targets<'a>(
        &self,
        urls: impl IntoIterator<Item = &'a str>,
        priority: i32,
    ) -> usize {
        let mut queued = 0;
        for url in urls {
            match self.scheduler.enqueue(url, priority) {
                Ok(outcome) if outcome.is_new() => queued += 1,
                Ok(outcome) => {
                    tracing::debug!("Seed {} not queued ({:?})", url, outcome);
                }
                Err(e) => {
                    tracing::warn!("Skipping invalid seed {}: {}", url, e);
                }
            }
        }
        queued
    }

    /// True once no job is pending or running.
    ///
    /// Frontier leftovers (for example targets abandoned by a timed-out
    /// crawl job) do not count; they are drained by the next crawl job.
    pub fn is_idle(&self) -> bool {
        self.registry.stats().active() == 0
    }

    /// Snapshot of registry and frontier counts.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            jobs: self.registry.stats(),
            crawl: self.scheduler.stats(),
        }
    }

    /// Remaining fetch budget for a domain, if it has been touched yet.
    pub fn remaining_budget(&self, domain: &str) -> Option<u32> {
        self.admission.remaining_budget(domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlConfig, SchedulerConfig, UserAgentConfig};
    use crate::handlers::{Lead, SearchHit};
    use async_trait::async_trait;

    struct EmptyProvider;

    #[async_trait]
    impl SearchProvider for EmptyProvider {
        async fn search(&self, _query: &str, _max: usize) -> anyhow::Result<Vec<SearchHit>> {
            Ok(vec![])
        }
    }

    struct NoopExtractor;

    #[async_trait]
    impl LeadExtractor for NoopExtractor {
        async fn extract(
            &self,
            _text: &str,
            _html: &str,
            _source_url: &str,
        ) -> anyhow::Result<Vec<Lead>> {
            Ok(vec![])
        }
    }

    fn create_test_config() -> Config {
        Config {
            scheduler: SchedulerConfig {
                poll_interval_ms: 50,
                search_timeout_secs: 5,
                crawl_timeout_secs: 5,
                lead_timeout_secs: 5,
            },
            crawl: CrawlConfig {
                politeness_delay_ms: 100,
                crawl_budget_per_domain: 100,
                max_retries: 2,
                max_crawl_fanout: 10,
                fetch_timeout_secs: 5,
            },
            user_agent: UserAgentConfig {
                crawler_name: "TestCrawler".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            seeds: vec![],
        }
    }

    fn build_pipeline() -> Pipeline {
        Pipeline::new(
            create_test_config(),
            Arc::new(EmptyProvider),
            Arc::new(NoopExtractor),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_new_pipeline_is_idle() {
        let pipeline = build_pipeline();
        assert!(pipeline.is_idle());
        assert_eq!(pipeline.stats().jobs.total, 0);
        assert_eq!(pipeline.stats().crawl.queued, 0);
    }

    #[tokio::test]
    async fn test_submit_and_get_job() {
        let pipeline = build_pipeline();
        let id = pipeline.submit_job(
            JobPayload::Crawl {
                url: "https://example.com/".to_string(),
            },
            0,
        );

        let job = pipeline.get_job(&id).unwrap();
        assert_eq!(job.id, id);
        assert!(!pipeline.is_idle());
        assert_eq!(pipeline.list_jobs().len(), 1);
    }

    #[tokio::test]
    async fn test_get_unknown_job_errors() {
        let pipeline = build_pipeline();
        let missing = pipeline.submit_job(
            JobPayload::Crawl {
                url: "https://example.com/".to_string(),
            },
            0,
        );
        pipeline.cancel_job(&missing).unwrap();

        let bogus = JobId::from_parts(0, 12345);
        match pipeline.get_job(&bogus) {
            Err(ProspectorError::UnknownJob(id)) => assert_eq!(id, bogus.as_str()),
            other => panic!("expected UnknownJob, got {:?}", other.map(|j| j.id)),
        }
        match pipeline.cancel_job(&bogus) {
            Err(ProspectorError::UnknownJob(_)) => {}
            other => panic!("expected UnknownJob, got {:?}", other.map(|j| j.id)),
        }
    }

    #[tokio::test]
    async fn test_cancel_makes_pipeline_idle() {
        let pipeline = build_pipeline();
        let id = pipeline.submit_job(
            JobPayload::Search {
                query: "q".to_string(),
                max_results: 3,
                crawl_results: false,
            },
            0,
        );

        let cancelled = pipeline.cancel_job(&id).unwrap();
        assert_eq!(cancelled.status, crate::jobs::JobStatus::Cancelled);
        assert!(pipeline.is_idle());
    }

    #[tokio::test]
    async fn test_enqueue_crawl_targets_counts_new_only() {
        let pipeline = build_pipeline();
        let queued = pipeline.enqueue_crawl_targets(
            [
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/a",
                "not a url",
            ],
            0,
        );

        assert_eq!(queued, 2);
        assert_eq!(pipeline.stats().crawl.queued, 2);
    }

    #[tokio::test]
    async fn test_start_twice_is_noop_and_shutdown_clean() {
        let mut pipeline = build_pipeline();
        pipeline.start();
        pipeline.start();
        pipeline.shutdown().await;
        // Shutdown with no workers is also fine
        pipeline.shutdown().await;
    }
}
