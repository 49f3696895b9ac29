//! Persisted queue position.

use crate::domain::{MemberId, TimeMs};
use serde::{Deserialize, Serialize};

/// A member's persisted place in the payout queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub member_id: MemberId,
    /// 1-based, dense among ranked entries.
    pub queue_position: i64,
    pub subscription_active: bool,
    pub updated_at: TimeMs,
}

impl QueueEntry {
    pub fn new(member_id: MemberId, queue_position: i64, updated_at: TimeMs) -> Self {
        Self {
            member_id,
            queue_position,
            subscription_active: true,
            updated_at,
        }
    }
}
