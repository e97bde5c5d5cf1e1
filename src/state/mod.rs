//! State module for per-domain and per-target tracking
//!
//! # Components
//!
//! - `TargetStatus`: Tracks each crawl target from pending through done,
//!   failed, or skipped
//! - `DomainState`: Tracks per-domain politeness timing, fetch budget, and
//!   cached robots.txt policy

mod domain_state;
mod target_state;

// Re-export main types
pub use domain_state::DomainState;
pub use target_state::TargetStatus;
