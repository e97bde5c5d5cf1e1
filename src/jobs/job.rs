//! Job model: ids, kinds, payloads, statuses, and the job record itself

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a submitted job
///
/// Time-derived plus the registry's submission sequence
/// (`job-{epoch_millis}-{seq}`), so ids stay unique even when many jobs are
/// submitted inside the same millisecond.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Builds an id from a creation timestamp and submission sequence.
    pub(crate) fn from_parts(epoch_millis: i64, seq: u64) -> Self {
        Self(format!("job-{}-{}", epoch_millis, seq))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three job types the scheduler partitions work by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Search,
    Crawl,
    LeadProcessing,
}

impl JobKind {
    /// Returns the snake_case string form used in logs and snapshots.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Crawl => "crawl",
            Self::LeadProcessing => "lead_processing",
        }
    }

    /// All kinds, in worker-spawn order.
    pub fn all() -> [JobKind; 3] {
        [Self::Search, Self::Crawl, Self::LeadProcessing]
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed job payload, tagged by job kind
///
/// Handlers receive exactly this value; there is no untyped parameter map at
/// the scheduler boundary. Results stay open (`serde_json::Value`) because
/// their shape belongs to the handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    /// Run a search query through the configured provider
    Search {
        query: String,
        max_results: usize,
        /// When set, fan out crawl jobs for the returned hit URLs
        #[serde(default)]
        crawl_results: bool,
    },
    /// Fetch one URL through the crawl frontier
    Crawl { url: String },
    /// Extract leads from fetched page content
    LeadProcessing {
        text: String,
        html: String,
        source_url: String,
    },
}

impl JobPayload {
    /// The kind a worker must hold to claim this payload.
    pub fn kind(&self) -> JobKind {
        match self {
            Self::Search { .. } => JobKind::Search,
            Self::Crawl { .. } => JobKind::Crawl,
            Self::LeadProcessing { .. } => JobKind::LeadProcessing,
        }
    }
}

/// Lifecycle status of a job
///
/// `Completed`, `Failed`, and `Cancelled` are terminal: once reached, the job
/// never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Returns true for statuses a job can never leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns the snake_case string form used in logs and snapshots.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A job record as tracked by the registry
///
/// `result` and `error` are mutually exclusive: completion clears the error,
/// failure clears the result. `progress` only ever moves toward 1.0 and is
/// forced there on any terminal transition.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: JobId,
    pub payload: JobPayload,
    /// Lower values are served first
    pub priority: i32,
    pub status: JobStatus,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Submission sequence, the FIFO tie-break within a priority class
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl Job {
    pub(crate) fn new(id: JobId, payload: JobPayload, priority: i32, seq: u64) -> Self {
        let now = Utc::now();
        Self {
            id,
            payload,
            priority,
            status: JobStatus::Pending,
            result: None,
            error: None,
            progress: 0.0,
            created_at: now,
            updated_at: now,
            seq,
        }
    }

    /// The kind this job is claimed under.
    pub fn kind(&self) -> JobKind {
        self.payload.kind()
    }

    /// Refreshes `updated_at`; every registry mutation ends with this.
    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
