//! Source-specific notification fields as a tagged union.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::SourceType;

/// The source-specific part of a notification.
///
/// Each variant corresponds to exactly one [`SourceType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum NotificationSubject {
    /// A pending account registration.
    UserRegistration {
        /// Applicant's display name.
        user_name: String,
        /// Applicant's email, if provided.
        email: Option<String>,
    },
    /// A pending loan request.
    LoanRequest {
        /// Borrower's display name.
        user_name: String,
        /// Requested equipment.
        equipment_name: String,
        /// Requested pickup date.
        borrow_date: Option<DateTime<Utc>>,
        /// Requested return date.
        due_date: Option<DateTime<Utc>>,
        /// Purpose stated by the borrower.
        purpose: Option<String>,
    },
    /// A loan past its due date.
    OverdueLoan {
        /// Borrower's display name.
        user_name: String,
        /// Borrowed equipment.
        equipment_name: String,
        /// Agreed return date.
        due_date: Option<DateTime<Utc>>,
        /// Whole days past the due date at observation time.
        days_overdue: i64,
    },
    /// A pending reservation.
    ReservationRequest {
        /// Requester's display name.
        user_name: String,
        /// Reserved equipment.
        equipment_name: String,
        /// Reservation start.
        start_date: Option<DateTime<Utc>>,
        /// Reservation end.
        end_date: Option<DateTime<Utc>>,
    },
    /// A message addressed to the administrator.
    Personal {
        /// Classified message type.
        kind: PersonalKind,
    },
}

impl NotificationSubject {
    /// The source type this subject belongs to.
    pub fn source_type(&self) -> SourceType {
        match self {
            Self::UserRegistration { .. } => SourceType::UserRegistration,
            Self::LoanRequest { .. } => SourceType::LoanRequest,
            Self::OverdueLoan { .. } => SourceType::OverdueLoan,
            Self::ReservationRequest { .. } => SourceType::ReservationRequest,
            Self::Personal { .. } => SourceType::Personal,
        }
    }
}

/// Classification of a personal message's upstream `type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PersonalKind {
    /// The administrator's own loan was approved.
    LoanApproved,
    /// The administrator's own loan was rejected.
    LoanRejected,
    /// Equipment is due back soon.
    ReturnReminder,
    /// A reservation was approved.
    ReservationApproved,
    /// A reservation was rejected.
    ReservationRejected,
    /// A system-wide announcement.
    Announcement,
    /// The message reports an event that an action-item feed already surfaces.
    MirrorsActionItem(SourceType),
    /// Any other message type, kept verbatim.
    Other(String),
}

impl PersonalKind {
    /// Whether the message duplicates an action item.
    pub fn mirrors_action_item(&self) -> bool {
        matches!(self, Self::MirrorsActionItem(_))
    }
}
