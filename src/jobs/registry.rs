//! In-memory job registry: submission, claiming, and lifecycle transitions
//!
//! The registry is the single source of truth for job state. It keeps:
//! - A map of every job ever submitted (jobs are never evicted)
//! - One pending heap per job kind, ordered by (priority, submission order)
//!
//! All operations take one short lock; nothing async happens under it.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Mutex;

use serde::Serialize;

use super::job::{Job, JobId, JobKind, JobPayload, JobStatus};

/// Heap entry for a pending job
///
/// Ordering is reversed so the max-heap pops the numerically lowest priority
/// first, with the earlier submission winning ties.
#[derive(Debug, Clone, Eq, PartialEq)]
struct PendingJob {
    priority: i32,
    seq: u64,
    id: JobId,
}

impl Ord for PendingJob {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PendingJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-kind status counts for a stats snapshot
#[derive(Debug, Clone, Default, Serialize)]
pub struct KindCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl KindCounts {
    /// Jobs not yet in a terminal state.
    pub fn active(&self) -> usize {
        self.pending + self.in_progress
    }
}

/// Point-in-time view of registry contents
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub by_kind: HashMap<JobKind, KindCounts>,
}

impl RegistryStats {
    /// Jobs not yet in a terminal state, across all kinds.
    pub fn active(&self) -> usize {
        self.by_kind.values().map(|c| c.active()).sum()
    }
}

struct RegistryInner {
    jobs: HashMap<JobId, Job>,
    pending: HashMap<JobKind, BinaryHeap<PendingJob>>,
    next_seq: u64,
}

/// Thread-safe registry shared between submitters and workers
pub struct JobRegistry {
    inner: Mutex<RegistryInner>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                jobs: HashMap::new(),
                pending: HashMap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Submits a new job and returns its id.
    ///
    /// The job starts `Pending` and joins the heap for its kind. Lower
    /// priority values are claimed first; equal priorities are claimed in
    /// submission order.
    pub fn submit(&self, payload: JobPayload, priority: i32) -> JobId {
        let kind = payload.kind();
        let mut guard = self.inner.lock().unwrap();
        let seq = guard.next_seq;
        guard.next_seq += 1;

        let id = JobId::from_parts(chrono::Utc::now().timestamp_millis(), seq);
        let job = Job::new(id.clone(), payload, priority, seq);
        guard.jobs.insert(id.clone(), job);
        guard.pending.entry(kind).or_default().push(PendingJob {
            priority,
            seq,
            id: id.clone(),
        });

        tracing::debug!("Submitted {} job {} (priority {})", kind, id, priority);
        id
    }

    /// Claims the next pending job of the given kind, if any.
    ///
    /// The claimed job flips to `InProgress` and a snapshot is returned for
    /// the worker to execute against. Jobs cancelled while still queued are
    /// skipped here and their stale heap entries dropped.
    pub fn claim_next(&self, kind: JobKind) -> Option<Job> {
        let mut guard = self.inner.lock().unwrap();
        let RegistryInner { jobs, pending, .. } = &mut *guard;
        let heap = pending.get_mut(&kind)?;

        while let Some(entry) = heap.pop() {
            let Some(job) = jobs.get_mut(&entry.id) else {
                continue;
            };
            if job.status != JobStatus::Pending {
                // Cancelled while queued; drop the stale entry
                continue;
            }
            job.status = JobStatus::InProgress;
            job.touch();
            tracing::debug!("Claimed {} job {}", kind, job.id);
            return Some(job.clone());
        }
        None
    }

    /// Returns a snapshot of the job, or None if the id is unknown.
    pub fn get(&self, id: &JobId) -> Option<Job> {
        self.inner.lock().unwrap().jobs.get(id).cloned()
    }

    /// Returns snapshots of all jobs in submission order.
    pub fn list(&self) -> Vec<Job> {
        let guard = self.inner.lock().unwrap();
        let mut jobs: Vec<Job> = guard.jobs.values().cloned().collect();
        jobs.sort_by_key(|job| job.seq);
        jobs
    }

    /// Cancels a job if it has not already finished.
    ///
    /// Terminal jobs (including already-cancelled ones) are left untouched
    /// and their current snapshot returned, so cancellation is idempotent.
    /// Returns None for unknown ids. An `InProgress` job is marked cancelled
    /// immediately; its running handler finishes on its own and whatever it
    /// reports afterwards is discarded.
    pub fn cancel(&self, id: &JobId) -> Option<Job> {
        let mut guard = self.inner.lock().unwrap();
        let job = guard.jobs.get_mut(id)?;
        if job.status.is_terminal() {
            return Some(job.clone());
        }
        job.status = JobStatus::Cancelled;
        job.progress = 1.0;
        job.touch();
        tracing::info!("Cancelled job {}", job.id);
        Some(job.clone())
    }

    /// Records a successful result for an in-flight job.
    ///
    /// Returns false when the job is unknown or already terminal (for
    /// example cancelled mid-run), in which case the result is discarded.
    pub fn complete(&self, id: &JobId, result: serde_json::Value) -> bool {
        let mut guard = self.inner.lock().unwrap();
        let Some(job) = guard.jobs.get_mut(id) else {
            return false;
        };
        if job.status.is_terminal() {
            tracing::debug!(
                "Dropping late result for {} job {} ({})",
                job.kind(),
                job.id,
                job.status
            );
            return false;
        }
        job.status = JobStatus::Completed;
        job.result = Some(result);
        job.error = None;
        job.progress = 1.0;
        job.touch();
        true
    }

    /// Records a failure for an in-flight job.
    ///
    /// Same terminal-state rules as [`complete`](Self::complete).
    pub fn fail(&self, id: &JobId, error: String) -> bool {
        let mut guard = self.inner.lock().unwrap();
        let Some(job) = guard.jobs.get_mut(id) else {
            return false;
        };
        if job.status.is_terminal() {
            tracing::debug!(
                "Dropping late error for {} job {} ({})",
                job.kind(),
                job.id,
                job.status
            );
            return false;
        }
        job.status = JobStatus::Failed;
        job.error = Some(error);
        job.result = None;
        job.progress = 1.0;
        job.touch();
        true
    }

    /// Updates progress for a running job.
    ///
    /// Values are clamped to [0.0, 1.0] and progress never moves backwards.
    /// Terminal jobs ignore updates; returns false in that case.
    pub fn update_progress(&self, id: &JobId, progress: f64) -> bool {
        let mut guard = self.inner.lock().unwrap();
        let Some(job) = guard.jobs.get_mut(id) else {
            return false;
        };
        if job.status.is_terminal() {
            return false;
        }
        let clamped = progress.clamp(0.0, 1.0);
        if clamped > job.progress {
            job.progress = clamped;
        }
        job.touch();
        true
    }

    /// Counts jobs by kind and status.
    pub fn stats(&self) -> RegistryStats {
        let guard = self.inner.lock().unwrap();
        let mut by_kind: HashMap<JobKind, KindCounts> = HashMap::new();
        for kind in JobKind::all() {
            by_kind.insert(kind, KindCounts::default());
        }
        for job in guard.jobs.values() {
            let counts = by_kind.entry(job.kind()).or_default();
            match job.status {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::InProgress => counts.in_progress += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
                JobStatus::Cancelled => counts.cancelled += 1,
            }
        }
        RegistryStats {
            total: guard.jobs.len(),
            by_kind,
        }
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
