//! Raw records, feed snapshots, and subscription predicates.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use lendhub_core::types::id::{AdminId, SourceId};

use super::SourceType;

/// A record as delivered by a source feed, before normalization.
///
/// Field access is tolerant: every accessor returns `None` on absent,
/// blank, or mistyped values instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Id of the record within its upstream collection.
    pub id: SourceId,
    /// Loosely-typed record fields.
    #[serde(default)]
    pub fields: serde_json::Value,
}

impl RawRecord {
    /// Create a record from an id and a JSON object of fields.
    pub fn new(id: impl Into<SourceId>, fields: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// First non-blank string value among `keys`.
    pub fn str_field(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.fields.get(*key))
            .filter_map(serde_json::Value::as_str)
            .map(str::trim)
            .find(|value| !value.is_empty())
    }

    /// First parseable timestamp among `keys`.
    ///
    /// Accepts RFC 3339 strings, `YYYY-MM-DD` dates (midnight UTC), and
    /// integer epoch milliseconds.
    pub fn timestamp_field(&self, keys: &[&str]) -> Option<DateTime<Utc>> {
        keys.iter()
            .filter_map(|key| self.fields.get(*key))
            .find_map(parse_timestamp)
    }
}

fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|naive| Utc.from_utc_datetime(&naive))
                })
        }
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

/// The complete current set of records of one feed at one instant.
///
/// Each snapshot fully replaces the previous one for the same feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    /// Feed the snapshot belongs to.
    pub source_type: SourceType,
    /// Records currently matching the feed predicate.
    pub records: Vec<RawRecord>,
    /// When the snapshot was produced.
    pub received_at: DateTime<Utc>,
}

impl FeedSnapshot {
    /// Create a snapshot stamped with the current time.
    pub fn new(source_type: SourceType, records: Vec<RawRecord>) -> Self {
        Self {
            source_type,
            records,
            received_at: Utc::now(),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Record predicate a feed subscription is opened with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPredicate {
    /// Required value of the record's `status` field (case-insensitive).
    pub status: Option<String>,
    /// Required recipient of the record (`recipientId` / `recipient_id`).
    pub recipient: Option<AdminId>,
}

impl FeedPredicate {
    /// The predicate an administrator's aggregator subscribes with for `source_type`.
    pub fn for_source(source_type: SourceType, admin_id: AdminId) -> Self {
        match source_type {
            SourceType::UserRegistration
            | SourceType::LoanRequest
            | SourceType::ReservationRequest => Self::with_status("pending"),
            SourceType::OverdueLoan => Self::with_status("overdue"),
            SourceType::Personal => Self {
                status: None,
                recipient: Some(admin_id),
            },
        }
    }

    /// Predicate matching a single status value.
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            recipient: None,
        }
    }

    /// Whether `record` satisfies every configured condition.
    pub fn matches(&self, record: &RawRecord) -> bool {
        if let Some(status) = &self.status {
            match record.str_field(&["status"]) {
                Some(actual) if actual.eq_ignore_ascii_case(status) => {}
                _ => return false,
            }
        }

        if let Some(recipient) = &self.recipient {
            let expected = recipient.to_string();
            match record.str_field(&["recipientId", "recipient_id"]) {
                Some(actual) if actual.eq_ignore_ascii_case(&expected) => {}
                _ => return false,
            }
        }

        true
    }
}
