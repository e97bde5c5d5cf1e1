//! Jobs module for asynchronous background work
//!
//! This module contains the job scheduling core, including:
//! - Job records with typed payloads and lifecycle statuses
//! - A priority registry partitioned by job kind
//! - The handler trait that job-specific logic plugs into
//! - Per-kind worker loops with timeout and panic fencing

mod handler;
mod job;
mod registry;
mod worker;

pub use handler::JobHandler;
pub use job::{Job, JobId, JobKind, JobPayload, JobStatus};
pub use registry::{JobRegistry, KindCounts, RegistryStats};
pub use worker::{Worker, WorkerConfig, WorkerPool};
