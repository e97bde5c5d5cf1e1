//! Crawl target status definitions
//!
//! This module defines all possible states a crawl target can be in between
//! submission and settling. Skips are terminal policy outcomes, not errors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Represents the current status of a crawl target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    // ===== Active States =====
    /// Target is queued and waiting for admission
    Pending,

    /// Target has been admitted and its fetch is in flight
    InProgress,

    /// Target failed transiently and is queued for another attempt
    Retrying,

    // ===== Terminal Success State =====
    /// Target was fetched successfully
    Done,

    // ===== Terminal Skip States =====
    /// robots.txt disallows this URL - never fetched
    SkippedRobots,

    /// The domain's fetch budget ran out before this target
    SkippedBudget,

    // ===== Terminal Error State =====
    /// Target failed more times than the retry ceiling allows
    Failed,
}

impl TargetStatus {
    /// Returns true if this is a terminal status (the target never moves again)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::InProgress | Self::Retrying)
    }

    /// Returns true if the target may still be fetched
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the target completed successfully
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if a policy decision (robots or budget) ended this target
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::SkippedRobots | Self::SkippedBudget)
    }

    /// Returns true if the target ended in failure
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns the snake_case string form used in status snapshots and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Retrying => "retrying",
            Self::Done => "done",
            Self::SkippedRobots => "skipped_robots",
            Self::SkippedBudget => "skipped_budget",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!TargetStatus::Pending.is_terminal());
        assert!(!TargetStatus::InProgress.is_terminal());
        assert!(!TargetStatus::Retrying.is_terminal());

        assert!(TargetStatus::Done.is_terminal());
        assert!(TargetStatus::SkippedRobots.is_terminal());
        assert!(TargetStatus::SkippedBudget.is_terminal());
        assert!(TargetStatus::Failed.is_terminal());
    }

    #[test]
    fn test_is_active_mirrors_terminal() {
        assert!(TargetStatus::Pending.is_active());
        assert!(TargetStatus::Retrying.is_active());
        assert!(!TargetStatus::Done.is_active());
        assert!(!TargetStatus::Failed.is_active());
    }

    #[test]
    fn test_is_success() {
        assert!(TargetStatus::Done.is_success());
        assert!(!TargetStatus::Failed.is_success());
        assert!(!TargetStatus::SkippedRobots.is_success());
    }

    #[test]
    fn test_is_skipped() {
        assert!(TargetStatus::SkippedRobots.is_skipped());
        assert!(TargetStatus::SkippedBudget.is_skipped());

        assert!(!TargetStatus::Done.is_skipped());
        assert!(!TargetStatus::Failed.is_skipped());
        assert!(!TargetStatus::Pending.is_skipped());
    }

    #[test]
    fn test_skips_are_not_errors() {
        assert!(!TargetStatus::SkippedRobots.is_error());
        assert!(!TargetStatus::SkippedBudget.is_error());
        assert!(TargetStatus::Failed.is_error());
    }

    #[test]
    fn test_as_str() {
        assert_eq!(TargetStatus::Pending.as_str(), "pending");
        assert_eq!(TargetStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TargetStatus::Retrying.as_str(), "retrying");
        assert_eq!(TargetStatus::Done.as_str(), "done");
        assert_eq!(TargetStatus::SkippedRobots.as_str(), "skipped_robots");
        assert_eq!(TargetStatus::SkippedBudget.as_str(), "skipped_budget");
        assert_eq!(TargetStatus::Failed.as_str(), "failed");
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", TargetStatus::Pending), "pending");
        assert_eq!(format!("{}", TargetStatus::SkippedBudget), "skipped_budget");
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&TargetStatus::SkippedRobots).unwrap();
        assert_eq!(json, "\"skipped_robots\"");
        let back: TargetStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TargetStatus::SkippedRobots);
    }
}
