//! Tab/category/priority/search/date filtering over merged notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lendhub_entity::notification::{Notification, NotificationCategory, NotificationPriority};

/// Top-level split of the notification list.
///
/// `ActionItems` and `Personal` partition every notification; `All` is
/// their union.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTab {
    /// Notifications waiting for an approve/reject decision.
    ActionItems,
    /// Messages addressed to the administrator.
    Personal,
    /// Everything.
    #[default]
    All,
}

impl NotificationTab {
    /// Whether `notification` belongs to this tab.
    pub fn contains(&self, notification: &Notification) -> bool {
        match self {
            Self::ActionItems => notification.is_action_item(),
            Self::Personal => !notification.is_action_item(),
            Self::All => true,
        }
    }
}

/// Inclusive range over `created_at`. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Earliest accepted timestamp.
    pub from: Option<DateTime<Utc>>,
    /// Latest accepted timestamp.
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Range between two instants, inclusive.
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Whether `at` falls inside the range.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }
}

/// Conjunction of independent predicates over notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Tab the list is scoped to.
    #[serde(default)]
    pub tab: NotificationTab,
    /// Required category.
    #[serde(default)]
    pub category: Option<NotificationCategory>,
    /// Required priority.
    #[serde(default)]
    pub priority: Option<NotificationPriority>,
    /// Case-insensitive substring of title or description.
    #[serde(default)]
    pub search: Option<String>,
    /// Accepted `created_at` range.
    #[serde(default)]
    pub date_range: Option<DateRange>,
}

impl FilterSpec {
    /// Spec showing one tab with no further narrowing.
    pub fn tab(tab: NotificationTab) -> Self {
        Self {
            tab,
            ..Self::default()
        }
    }

    /// The same spec scoped to another tab.
    pub fn with_tab(&self, tab: NotificationTab) -> Self {
        Self {
            tab,
            ..self.clone()
        }
    }

    /// Whether `notification` passes every predicate.
    pub fn matches(&self, notification: &Notification) -> bool {
        self.tab.contains(notification)
            && self.category.is_none_or(|c| notification.category == c)
            && self.priority.is_none_or(|p| notification.priority == p)
            && self.matches_search(notification)
            && self
                .date_range
                .is_none_or(|range| range.contains(notification.created_at))
    }

    fn matches_search(&self, notification: &Notification) -> bool {
        let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) else {
            return true;
        };
        let term = term.to_lowercase();
        notification.title.to_lowercase().contains(&term)
            || notification.description.to_lowercase().contains(&term)
    }
}

/// Notifications passing `spec`, in their original order.
pub fn filter(notifications: &[Notification], spec: &FilterSpec) -> Vec<Notification> {
    notifications
        .iter()
        .filter(|n| spec.matches(n))
        .cloned()
        .collect()
}
