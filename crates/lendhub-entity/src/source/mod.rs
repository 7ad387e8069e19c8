//! Source feed kinds and the raw records they deliver.

pub mod record;

use serde::{Deserialize, Serialize};

use crate::notification::{NotificationCategory, NotificationPriority};

pub use record::{FeedPredicate, FeedSnapshot, RawRecord};

/// The upstream collection a notification was materialized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// A user account waiting for approval.
    UserRegistration,
    /// A loan request waiting for approval.
    LoanRequest,
    /// A loan past its due date.
    OverdueLoan,
    /// A reservation waiting for approval.
    ReservationRequest,
    /// A message addressed to the administrator.
    Personal,
}

impl SourceType {
    /// All source types, in subscription order.
    pub const ALL: [SourceType; 5] = [
        Self::UserRegistration,
        Self::LoanRequest,
        Self::OverdueLoan,
        Self::ReservationRequest,
        Self::Personal,
    ];

    /// Return the source type as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRegistration => "user_registration",
            Self::LoanRequest => "loan_request",
            Self::OverdueLoan => "overdue_loan",
            Self::ReservationRequest => "reservation_request",
            Self::Personal => "personal",
        }
    }

    /// Parse from string. Returns `None` for unknown names.
    pub fn from_str_value(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "user_registration" => Some(Self::UserRegistration),
            "loan_request" => Some(Self::LoanRequest),
            "overdue_loan" => Some(Self::OverdueLoan),
            "reservation_request" => Some(Self::ReservationRequest),
            "personal" => Some(Self::Personal),
            _ => None,
        }
    }

    /// Whether notifications of this kind require an administrative decision.
    pub fn is_action_item(&self) -> bool {
        !matches!(self, Self::Personal)
    }

    /// Category derived from the source type.
    pub fn category(&self) -> NotificationCategory {
        match self {
            Self::UserRegistration => NotificationCategory::Users,
            Self::LoanRequest => NotificationCategory::Loans,
            Self::OverdueLoan => NotificationCategory::Overdue,
            Self::ReservationRequest => NotificationCategory::Reservations,
            Self::Personal => NotificationCategory::System,
        }
    }

    /// Priority derived from the source type, before any record override.
    pub fn default_priority(&self) -> NotificationPriority {
        match self {
            Self::OverdueLoan => NotificationPriority::Urgent,
            Self::LoanRequest => NotificationPriority::High,
            Self::UserRegistration | Self::ReservationRequest => NotificationPriority::Medium,
            Self::Personal => NotificationPriority::Low,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
