//! Stable queue ordering for deterministic ranking.

use crate::domain::{MemberId, TimeMs};

/// Stable ordering key for queue ranking.
///
/// Ordering: tenure_start -> member_id. The member id breaks ties between
/// members who share a tenure start, so identical inputs always rank the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueueOrderingKey {
    /// Tenure start (primary sort, earliest first).
    pub tenure_start: TimeMs,
    /// Member id (tie-break, lowest first).
    pub member_id: MemberId,
}

impl QueueOrderingKey {
    pub fn new(tenure_start: TimeMs, member_id: MemberId) -> Self {
        Self {
            tenure_start,
            member_id,
        }
    }
}

/// Sort items by their queue ordering key.
pub fn sort_queue_deterministic<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> QueueOrderingKey,
{
    items.sort_by_key(|item| key(item));
}
