//! Domain types for the membership queue.
//!
//! This module provides:
//! - Integer-cent money via `Cents`
//! - Domain primitives: TimeMs, MemberId
//! - Member, Payment and QueueEntry records
//! - Stable queue ordering key for deterministic ranking

pub mod member;
pub mod money;
pub mod ordering;
pub mod payment;
pub mod primitives;
pub mod queue;

pub use member::{Member, MemberStatus};
pub use money::{Cents, MoneyParseError};
pub use ordering::{sort_queue_deterministic, QueueOrderingKey};
pub use payment::{FeeSchedule, Payment, PaymentKind, PaymentStatus};
pub use primitives::{MemberId, TimeMs, MS_PER_DAY};
pub use queue::QueueEntry;
