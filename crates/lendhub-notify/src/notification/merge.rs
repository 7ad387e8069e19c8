//! Merge of per-feed notifications into one ordered, de-duplicated list.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use lendhub_core::types::id::NotificationId;
use lendhub_entity::notification::Notification;
use lendhub_entity::read_state::ReadState;

/// Total order of the merged list: priority descending, then `created_at`
/// descending, then id ascending.
pub fn compare(a: &Notification, b: &Notification) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Union the notifications of every feed, overlay read states, drop
/// repeated ids (first occurrence wins), and sort by [`compare`].
///
/// The result depends only on its inputs, so merging the same inputs twice
/// yields the same order.
pub fn merge<'a, I>(feeds: I, read_states: &HashMap<NotificationId, ReadState>) -> Vec<Notification>
where
    I: IntoIterator<Item = &'a [Notification]>,
{
    let mut seen = HashSet::new();
    let mut merged: Vec<Notification> = feeds
        .into_iter()
        .flatten()
        .filter(|n| seen.insert(n.id))
        .map(|n| {
            let mut n = n.clone();
            match read_states.get(&n.id) {
                Some(state) => n.apply_read_state(state),
                None => n.apply_read_state(&ReadState::default()),
            }
            n
        })
        .collect();

    merged.sort_by(compare);
    merged
}
