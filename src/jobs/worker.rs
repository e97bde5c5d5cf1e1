//! Per-kind worker loop
//!
//! Each worker polls the registry for pending jobs of its kind and runs them
//! one at a time through its handler:
//! 1. Claim the next pending job (idle workers sleep one poll interval)
//! 2. Execute the handler in its own task, raced against the job timeout
//! 3. Record the outcome back into the registry
//! 4. Loop until the shutdown token fires
//!
//! Handler panics and timeouts fail the job but never kill the loop. On
//! timeout the handler task is abandoned: it keeps whatever it was doing, but
//! the job is already failed so anything it reports later is discarded.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::handler::JobHandler;
use super::job::{Job, JobKind};
use super::registry::JobRegistry;

/// Tuning for one worker loop
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub kind: JobKind,
    /// How long an idle worker sleeps between claim attempts
    pub poll_interval: Duration,
    /// Wall-clock limit for a single handler execution
    pub job_timeout: Duration,
}

/// A single-kind job worker
pub struct Worker {
    registry: Arc<JobRegistry>,
    handler: Arc<dyn JobHandler>,
    config: WorkerConfig,
}

impl Worker {
    pub fn new(
        registry: Arc<JobRegistry>,
        handler: Arc<dyn JobHandler>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            registry,
            handler,
            config,
        }
    }

    /// Runs the claim/execute/record loop until `shutdown` is cancelled.
    ///
    /// A job already being executed finishes (or times out) before the loop
    /// observes the cancellation; only idle waiting is interrupted early.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            "Worker for {} jobs started (poll {}ms, timeout {}s)",
            self.config.kind,
            self.config.poll_interval.as_millis(),
            self.config.job_timeout.as_secs()
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }
            match self.registry.claim_next(self.config.kind) {
                Some(job) => self.run_job(job).await,
                None => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
            }
        }

        tracing::info!("Worker for {} jobs stopped", self.config.kind);
    }

    /// Executes one claimed job and records its outcome.
    async fn run_job(&self, job: Job) {
        let id = job.id.clone();
        let kind = job.kind();
        let started = std::time::Instant::now();
        tracing::info!("Running {} job {}", kind, id);

        // Spawned so a panicking handler surfaces as a JoinError instead of
        // tearing down this loop.
        let handler = Arc::clone(&self.handler);
        let work = tokio::spawn(async move { handler.execute(job).await });

        let recorded = match tokio::time::timeout(self.config.job_timeout, work).await {
            Err(_) => {
                // Dropping the JoinHandle detaches the handler task; it runs
                // to completion on its own but the job is failed now.
                tracing::warn!(
                    "{} job {} timed out after {}s, abandoning handler",
                    kind,
                    id,
                    self.config.job_timeout.as_secs()
                );
                self.registry.fail(
                    &id,
                    format!("job timed out after {}s", self.config.job_timeout.as_secs()),
                )
            }
            Ok(Err(join_err)) => {
                tracing::error!("{} job {} handler panicked: {}", kind, id, join_err);
                self.registry
                    .fail(&id, format!("handler panicked: {}", join_err))
            }
            Ok(Ok(Ok(result))) => {
                tracing::info!(
                    "{} job {} completed in {}ms",
                    kind,
                    id,
                    started.elapsed().as_millis()
                );
                self.registry.complete(&id, result)
            }
            Ok(Ok(Err(err))) => {
                tracing::warn!("{} job {} failed: {:#}", kind, id, err);
                self.registry.fail(&id, format!("{:#}", err))
            }
        };

        if !recorded {
            tracing::debug!("Outcome for {} job {} discarded", kind, id);
        }
    }
}

/// Owns the worker tasks and their shared shutdown token
pub struct WorkerPool {
    shutdown: CancellationToken,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self {
            shutdown: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// Spawns a worker onto the current runtime.
    pub fn spawn(&mut self, worker: Worker) {
        let token = self.shutdown.clone();
        self.handles.push(tokio::spawn(worker.run(token)));
    }

    /// Signals all workers to stop and waits for their loops to exit.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for handle in self.handles {
            // A worker task never panics; run_job fences handler panics
            let _ = handle.await;
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}
