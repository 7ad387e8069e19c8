//! Notification category enumeration.

use serde::{Deserialize, Serialize};

/// Category of a notification for filtering and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// Account registrations.
    Users,
    /// Loan requests.
    Loans,
    /// Overdue loans.
    Overdue,
    /// Equipment reservations.
    Reservations,
    /// Messages and announcements.
    System,
}

impl NotificationCategory {
    /// All categories.
    pub const ALL: [NotificationCategory; 5] = [
        Self::Users,
        Self::Loans,
        Self::Overdue,
        Self::Reservations,
        Self::System,
    ];

    /// Return the category as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Loans => "loans",
            Self::Overdue => "overdue",
            Self::Reservations => "reservations",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
