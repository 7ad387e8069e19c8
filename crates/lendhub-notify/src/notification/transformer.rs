//! Raw record → canonical notification.
//!
//! Transformation is pure and total: absent or malformed fields degrade to
//! placeholder text, and the only records that produce no notification are
//! those without an id and personal messages that mirror an action item.

use chrono::{DateTime, Utc};

use lendhub_core::types::id::NotificationId;
use lendhub_entity::notification::{
    ActionKind, ActionVariant, Notification, NotificationPriority, NotificationSubject,
    PersonalKind, QuickAction,
};
use lendhub_entity::source::{RawRecord, SourceType};

/// Placeholder for a missing user name.
pub const PLACEHOLDER_USER: &str = "ผู้ใช้";
/// Placeholder for a missing equipment name.
pub const PLACEHOLDER_EQUIPMENT: &str = "อุปกรณ์";
/// Placeholder for a missing date.
const PLACEHOLDER_DATE: &str = "-";

const USER_NAME_KEYS: &[&str] = &["userName", "user_name", "displayName", "display_name"];
const EQUIPMENT_KEYS: &[&str] = &["equipmentName", "equipment_name", "itemName"];
const CREATED_AT_KEYS: &[&str] = &["createdAt", "created_at", "requestedAt", "timestamp"];

/// Times a transformation is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformContext {
    /// When the engine first observed the record; the `created_at` fallback.
    pub observed_at: DateTime<Utc>,
    /// When the snapshot holding the record was produced.
    pub snapshot_at: DateTime<Utc>,
}

impl TransformContext {
    /// Context where the record was first seen in this very snapshot.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            observed_at: now,
            snapshot_at: now,
        }
    }
}

/// Result of transforming one record.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutcome {
    /// The record produced a notification.
    Built(Box<Notification>),
    /// A personal message reporting an event an action-item feed already shows.
    Suppressed(PersonalKind),
    /// The record cannot be identified.
    Skipped(&'static str),
}

impl TransformOutcome {
    /// The built notification, if any.
    pub fn into_notification(self) -> Option<Notification> {
        match self {
            Self::Built(notification) => Some(*notification),
            Self::Suppressed(_) | Self::Skipped(_) => None,
        }
    }
}

/// Transform a raw record of `source_type` into a notification.
pub fn transform(
    record: &RawRecord,
    source_type: SourceType,
    ctx: TransformContext,
) -> TransformOutcome {
    if record.id.is_blank() {
        return TransformOutcome::Skipped("record has no id");
    }

    let subject = match build_subject(record, source_type, ctx) {
        Some(subject) => subject,
        None => {
            let kind = classify_personal(record.str_field(&["type", "kind"]));
            return TransformOutcome::Suppressed(kind);
        }
    };

    let created_at = record
        .timestamp_field(CREATED_AT_KEYS)
        .unwrap_or(ctx.observed_at);
    let priority = match source_type {
        SourceType::Personal => record
            .str_field(&["priority"])
            .and_then(NotificationPriority::from_str_value)
            .unwrap_or_else(|| source_type.default_priority()),
        _ => source_type.default_priority(),
    };
    let text = render(record, &subject);
    let link = match source_type {
        SourceType::Personal => record
            .str_field(&["link", "url"])
            .unwrap_or("/notifications")
            .to_string(),
        _ => format!("{}?highlight={}", admin_path(source_type), record.id),
    };

    TransformOutcome::Built(Box::new(Notification {
        id: NotificationId::derive(source_type.as_str(), record.id.as_str()),
        source_type,
        source_id: record.id.clone(),
        category: source_type.category(),
        priority,
        title: text.title,
        description: text.description,
        detail: text.detail,
        link,
        created_at,
        subject,
        quick_actions: quick_actions_for(source_type),
        is_read: false,
        read_at: None,
    }))
}

/// Classify a personal message's upstream `type` string.
///
/// Types that report a new registration, loan request, overdue loan, or
/// reservation are classified as mirrors of the matching action-item feed.
pub fn classify_personal(kind: Option<&str>) -> PersonalKind {
    let Some(raw) = kind else {
        return PersonalKind::Other(String::new());
    };
    let normalized: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect();

    match normalized.as_str() {
        "user_registration" | "new_user" | "new_registration" | "registration_request" => {
            PersonalKind::MirrorsActionItem(SourceType::UserRegistration)
        }
        "loan_request" | "new_loan_request" | "borrow_request" => {
            PersonalKind::MirrorsActionItem(SourceType::LoanRequest)
        }
        "overdue" | "overdue_loan" | "loan_overdue" => {
            PersonalKind::MirrorsActionItem(SourceType::OverdueLoan)
        }
        "reservation_request" | "new_reservation" => {
            PersonalKind::MirrorsActionItem(SourceType::ReservationRequest)
        }
        "loan_approved" => PersonalKind::LoanApproved,
        "loan_rejected" => PersonalKind::LoanRejected,
        "return_reminder" | "due_soon" => PersonalKind::ReturnReminder,
        "reservation_approved" => PersonalKind::ReservationApproved,
        "reservation_rejected" => PersonalKind::ReservationRejected,
        "announcement" | "system" => PersonalKind::Announcement,
        _ => PersonalKind::Other(normalized),
    }
}

/// Quick actions offered for a source type.
pub fn quick_actions_for(source_type: SourceType) -> Vec<QuickAction> {
    match source_type {
        SourceType::UserRegistration | SourceType::LoanRequest | SourceType::ReservationRequest => {
            vec![
                QuickAction::new("อนุมัติ", ActionKind::Approve, ActionVariant::Primary),
                QuickAction::new("ปฏิเสธ", ActionKind::Reject, ActionVariant::Danger),
            ]
        }
        SourceType::OverdueLoan => vec![QuickAction::new(
            "รับคืนแล้ว",
            ActionKind::MarkReturned,
            ActionVariant::Primary,
        )],
        SourceType::Personal => Vec::new(),
    }
}

fn admin_path(source_type: SourceType) -> &'static str {
    match source_type {
        SourceType::UserRegistration => "/admin/users",
        SourceType::LoanRequest => "/admin/loans",
        SourceType::OverdueLoan => "/admin/overdue",
        SourceType::ReservationRequest => "/admin/reservations",
        SourceType::Personal => "/notifications",
    }
}

/// `None` means the record is a personal mirror of an action item.
fn build_subject(
    record: &RawRecord,
    source_type: SourceType,
    ctx: TransformContext,
) -> Option<NotificationSubject> {
    let subject = match source_type {
        SourceType::UserRegistration => NotificationSubject::UserRegistration {
            user_name: user_name(record),
            email: record.str_field(&["email"]).map(str::to_string),
        },
        SourceType::LoanRequest => NotificationSubject::LoanRequest {
            user_name: user_name(record),
            equipment_name: equipment_name(record),
            borrow_date: record.timestamp_field(&["borrowDate", "borrow_date"]),
            due_date: record.timestamp_field(&["dueDate", "due_date", "returnDate"]),
            purpose: record.str_field(&["purpose"]).map(str::to_string),
        },
        SourceType::OverdueLoan => {
            let due_date = record.timestamp_field(&["dueDate", "due_date"]);
            let days_overdue = due_date
                .map(|due| (ctx.snapshot_at - due).num_days().max(0))
                .unwrap_or(0);
            NotificationSubject::OverdueLoan {
                user_name: user_name(record),
                equipment_name: equipment_name(record),
                due_date,
                days_overdue,
            }
        }
        SourceType::ReservationRequest => NotificationSubject::ReservationRequest {
            user_name: user_name(record),
            equipment_name: equipment_name(record),
            start_date: record.timestamp_field(&["startDate", "start_date"]),
            end_date: record.timestamp_field(&["endDate", "end_date"]),
        },
        SourceType::Personal => {
            let kind = classify_personal(record.str_field(&["type", "kind"]));
            if kind.mirrors_action_item() {
                return None;
            }
            NotificationSubject::Personal { kind }
        }
    };
    Some(subject)
}

/// Display name from a name field, or first + last name, or the placeholder.
fn user_name(record: &RawRecord) -> String {
    if let Some(name) = record.str_field(USER_NAME_KEYS) {
        return name.to_string();
    }
    let first = record.str_field(&["firstName", "first_name"]);
    let last = record.str_field(&["lastName", "last_name"]);
    match (first, last) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        (Some(name), None) | (None, Some(name)) => name.to_string(),
        (None, None) => PLACEHOLDER_USER.to_string(),
    }
}

fn equipment_name(record: &RawRecord) -> String {
    record
        .str_field(EQUIPMENT_KEYS)
        .unwrap_or(PLACEHOLDER_EQUIPMENT)
        .to_string()
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| PLACEHOLDER_DATE.to_string())
}

struct RenderedText {
    title: String,
    description: String,
    detail: String,
}

fn render(record: &RawRecord, subject: &NotificationSubject) -> RenderedText {
    match subject {
        NotificationSubject::UserRegistration { user_name, email } => RenderedText {
            title: "คำขอสมัครสมาชิกใหม่".to_string(),
            description: format!("{user_name} ขอสมัครสมาชิก"),
            detail: email.clone().unwrap_or_default(),
        },
        NotificationSubject::LoanRequest {
            user_name,
            equipment_name,
            borrow_date,
            due_date,
            purpose,
        } => {
            let mut detail = format!(
                "ยืม {} - คืน {}",
                format_date(*borrow_date),
                format_date(*due_date)
            );
            if let Some(purpose) = purpose {
                detail.push_str(&format!(" ({purpose})"));
            }
            RenderedText {
                title: "คำขอยืมอุปกรณ์".to_string(),
                description: format!("{user_name} ขอยืม {equipment_name}"),
                detail,
            }
        }
        NotificationSubject::OverdueLoan {
            user_name,
            equipment_name,
            due_date,
            days_overdue,
        } => RenderedText {
            title: "อุปกรณ์เกินกำหนดคืน".to_string(),
            description: format!(
                "{user_name} ยังไม่คืน {equipment_name} (เกินกำหนด {days_overdue} วัน)"
            ),
            detail: format!("กำหนดคืน {}", format_date(*due_date)),
        },
        NotificationSubject::ReservationRequest {
            user_name,
            equipment_name,
            start_date,
            end_date,
        } => RenderedText {
            title: "คำขอจองอุปกรณ์".to_string(),
            description: format!("{user_name} ขอจอง {equipment_name}"),
            detail: format!(
                "{} - {}",
                format_date(*start_date),
                format_date(*end_date)
            ),
        },
        NotificationSubject::Personal { kind } => {
            let title = record
                .str_field(&["title"])
                .map(str::to_string)
                .unwrap_or_else(|| personal_default_title(kind).to_string());
            RenderedText {
                title,
                description: record
                    .str_field(&["message", "body"])
                    .unwrap_or_default()
                    .to_string(),
                detail: record.str_field(&["detail"]).unwrap_or_default().to_string(),
            }
        }
    }
}

fn personal_default_title(kind: &PersonalKind) -> &'static str {
    match kind {
        PersonalKind::LoanApproved => "คำขอยืมได้รับการอนุมัติ",
        PersonalKind::LoanRejected => "คำขอยืมถูกปฏิเสธ",
        PersonalKind::ReturnReminder => "ใกล้ถึงกำหนดคืนอุปกรณ์",
        PersonalKind::ReservationApproved => "การจองได้รับการอนุมัติ",
        PersonalKind::ReservationRejected => "การจองถูกปฏิเสธ",
        PersonalKind::Announcement => "ประกาศจากระบบ",
        PersonalKind::MirrorsActionItem(_) | PersonalKind::Other(_) => "การแจ้งเตือน",
    }
}
