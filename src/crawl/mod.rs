//! Crawl module for polite page fetching
//!
//! This module contains the crawl-side machinery, including:
//! - Per-domain admission control (robots.txt, budget, politeness)
//! - The crawl frontier with priority ordering and retry bookkeeping
//! - HTTP client construction and single-page fetching

mod admission;
mod fetch;
mod scheduler;
mod target;

pub use admission::{AdmissionController, AdmissionDecision};
pub use fetch::{build_http_client, fetch_page, FetchOutcome};
pub use scheduler::{CrawlScheduler, CrawlStats};
pub use target::{CrawlTarget, EnqueueOutcome};
