//! Enumerations for the task board taxonomy.
//!
//! This module defines the status and priority vocabularies shared by the
//! CLI, the TUI and the wire payloads, including the per-status progress
//! weight used for aggregate completion percentages.

use clap::ValueEnum;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Workflow status of a task.
///
/// Declared in canonical workflow order; the board renders the status strip
/// and the quick-pick menu in this order.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum Status {
    #[default]
    Assigned,
    OnHold,
    InProgress,
    RevisionRequired,
    SubmittedForReview,
    Approved,
    Completed,
}

impl Status {
    /// All statuses in canonical workflow order.
    pub const ALL: [Status; 7] = [
        Status::Assigned,
        Status::OnHold,
        Status::InProgress,
        Status::RevisionRequired,
        Status::SubmittedForReview,
        Status::Approved,
        Status::Completed,
    ];

    /// Wire key as the backend stores it.
    pub fn key(self) -> &'static str {
        match self {
            Status::Assigned => "assigned",
            Status::OnHold => "on_hold",
            Status::InProgress => "in_progress",
            Status::RevisionRequired => "revision_required",
            Status::SubmittedForReview => "submitted_for_review",
            Status::Approved => "approved",
            Status::Completed => "completed",
        }
    }

    /// Human label for tables and the TUI.
    pub fn label(self) -> &'static str {
        match self {
            Status::Assigned => "Assigned",
            Status::OnHold => "On Hold",
            Status::InProgress => "In Progress",
            Status::RevisionRequired => "Revision",
            Status::SubmittedForReview => "For Review",
            Status::Approved => "Approved",
            Status::Completed => "Completed",
        }
    }

    /// Progress weight in [0, 1] contributed to the bucket percentage.
    pub fn weight(self) -> f64 {
        match self {
            Status::Assigned | Status::OnHold => 0.0,
            Status::InProgress => 0.3,
            Status::RevisionRequired => 0.5,
            Status::SubmittedForReview => 0.6,
            Status::Approved => 0.9,
            Status::Completed => 1.0,
        }
    }

    /// Look up a wire key. Callers fall back to the default status for
    /// unrecognized keys: the backend owns the vocabulary and may grow
    /// values this client does not know yet.
    pub fn from_key(key: &str) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.key() == key)
    }

    /// A status is terminal once the work is signed off; terminal tasks are
    /// never reported overdue.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Approved | Status::Completed)
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(Status::from_key(&key).unwrap_or_default())
    }
}

/// Priority classification. Display and filtering only; carries no weight.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum Priority {
    Critical,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// All priorities in display order.
    pub const ALL: [Priority; 3] = [Priority::Critical, Priority::Medium, Priority::Low];

    pub fn key(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Critical => "Critical",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Look up a wire key, falling back to the default priority for values
    /// the client does not recognize.
    pub fn from_key(key: &str) -> Option<Priority> {
        Priority::ALL.into_iter().find(|p| p.key() == key)
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(Priority::from_key(&key).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_weights_match_taxonomy() {
        assert_eq!(Status::Assigned.weight(), 0.0);
        assert_eq!(Status::OnHold.weight(), 0.0);
        assert_eq!(Status::InProgress.weight(), 0.3);
        assert_eq!(Status::RevisionRequired.weight(), 0.5);
        assert_eq!(Status::SubmittedForReview.weight(), 0.6);
        assert_eq!(Status::Approved.weight(), 0.9);
        assert_eq!(Status::Completed.weight(), 1.0);
    }

    #[test]
    fn status_keys_round_trip() {
        for s in Status::ALL {
            assert_eq!(Status::from_key(s.key()), Some(s));
        }
    }

    #[test]
    fn unknown_keys_fall_back_to_defaults() {
        assert_eq!(Status::from_key("archived"), None);
        let s: Status = serde_json::from_str("\"archived\"").unwrap();
        assert_eq!(s, Status::Assigned);
        let p: Priority = serde_json::from_str("\"urgent\"").unwrap();
        assert_eq!(p, Priority::Medium);
    }

    #[test]
    fn serializes_as_wire_keys() {
        assert_eq!(
            serde_json::to_string(&Status::SubmittedForReview).unwrap(),
            "\"submitted_for_review\""
        );
        assert_eq!(serde_json::to_string(&Priority::Low).unwrap(), "\"low\"");
    }

    #[test]
    fn terminal_statuses() {
        assert!(Status::Completed.is_terminal());
        assert!(Status::Approved.is_terminal());
        assert!(!Status::SubmittedForReview.is_terminal());
        assert!(!Status::OnHold.is_terminal());
    }
}
