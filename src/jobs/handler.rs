//! Handler seam between the worker loop and job-specific logic

use async_trait::async_trait;

use super::job::Job;

/// Executes jobs of one kind on behalf of a worker.
///
/// The handler receives a snapshot of the claimed job (payload plus priority,
/// so follow-on submissions can inherit it) and returns the value to store as
/// the job result. Errors become the job's failure message; the worker also
/// catches panics and timeouts, so an implementation only has to worry about
/// its own logic.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn execute(&self, job: Job) -> anyhow::Result<serde_json::Value>;
}
