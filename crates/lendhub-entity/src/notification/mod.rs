//! Notification domain entities.

pub mod category;
pub mod model;
pub mod priority;
pub mod quick_action;
pub mod subject;

pub use category::NotificationCategory;
pub use model::Notification;
pub use priority::NotificationPriority;
pub use quick_action::{ActionKind, ActionVariant, QuickAction};
pub use subject::{NotificationSubject, PersonalKind};
