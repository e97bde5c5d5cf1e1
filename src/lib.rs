//! Prospector: a polite lead-prospecting job scheduler
//!
//! This crate implements an in-process job scheduler with a polite-crawl
//! admission layer: a priority job queue with per-type async workers, and a
//! crawl frontier that enforces robots.txt, per-domain politeness delays, and
//! per-domain fetch budgets. Search providers and lead extractors plug in
//! through narrow traits; all state is in-memory for the process lifetime.

pub mod config;
pub mod crawl;
pub mod handlers;
pub mod jobs;
pub mod pipeline;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for prospector operations
#[derive(Debug, Error)]
pub enum ProspectorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Unknown job id: {0}")]
    UnknownJob(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDenied { url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Robots.txt error: {0}")]
    Robots(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for prospector operations
pub type Result<T> = std::result::Result<T, ProspectorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawl::{AdmissionController, AdmissionDecision, CrawlScheduler, CrawlTarget};
pub use jobs::{Job, JobId, JobKind, JobPayload, JobRegistry, JobStatus};
pub use pipeline::Pipeline;
pub use state::{DomainState, TargetStatus};
pub use url::extract_domain;
