//! Collaborator traits the engine consumes and implementations provide.

pub mod feed;
pub mod history;
pub mod lending;
pub mod read_state;

pub use feed::{FeedSubscription, SnapshotStream, SourceFeedProvider};
pub use history::HistorySink;
pub use lending::LendingService;
pub use read_state::ReadStateStore;
