//! Notification pipeline stages: transform, detect arrivals, merge, filter.

pub mod arrival;
pub mod filter;
pub mod merge;
pub mod transformer;

pub use arrival::{Arrival, ArrivalDetector, ArrivalSummary};
pub use filter::{DateRange, FilterSpec, NotificationTab, filter};
pub use merge::merge;
pub use transformer::{TransformContext, TransformOutcome, transform};
