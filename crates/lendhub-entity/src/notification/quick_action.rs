//! One-click administrative decisions attached to action-item notifications.

use serde::{Deserialize, Serialize};

/// The decision a quick action performs on the source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Approve a pending registration, loan, or reservation.
    Approve,
    /// Reject a pending registration, loan, or reservation.
    Reject,
    /// Record that overdue equipment came back.
    MarkReturned,
}

impl ActionKind {
    /// Return the action as a string, as written to history entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::MarkReturned => "mark_returned",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Visual emphasis hint for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionVariant {
    /// The expected, affirmative choice.
    Primary,
    /// A destructive or negative choice.
    Danger,
}

/// A quick action offered on a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickAction {
    /// Button label.
    pub label: String,
    /// What the action does.
    pub kind: ActionKind,
    /// Emphasis hint.
    pub variant: ActionVariant,
}

impl QuickAction {
    /// Create a quick action.
    pub fn new(label: impl Into<String>, kind: ActionKind, variant: ActionVariant) -> Self {
        Self {
            label: label.into(),
            kind,
            variant,
        }
    }
}
