//! Ledger accessor abstraction: members, payments and queue entries.

use crate::domain::{Cents, Member, MemberId, MemberStatus, Payment, QueueEntry};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod mock;

pub use mock::MockLedger;

/// Narrow query contract the engine needs from storage.
///
/// Members and payments are read-only here except for `set_member_status`,
/// which the default enforcer uses to demote members. Queue entries are
/// read/write.
#[async_trait]
pub trait Ledger: Send + Sync + fmt::Debug {
    /// Connectivity probe for readiness checks.
    async fn ping(&self) -> Result<(), LedgerError> {
        Ok(())
    }

    /// List members, optionally only those with the given status.
    async fn list_members(&self, status: Option<&MemberStatus>) -> Result<Vec<Member>, LedgerError>;

    /// All Completed payments, ordered by (payment_date, member_id).
    async fn completed_payments(&self) -> Result<Vec<Payment>, LedgerError>;

    /// Completed payments of one member, ascending by payment_date.
    async fn completed_payments_for(&self, member_id: MemberId) -> Result<Vec<Payment>, LedgerError>;

    /// Sum of all Completed payment amounts.
    async fn total_completed_revenue(&self) -> Result<Cents, LedgerError>;

    /// Queue entries ordered by position.
    async fn list_queue_entries(&self) -> Result<Vec<QueueEntry>, LedgerError>;

    async fn upsert_queue_entry(&self, entry: &QueueEntry) -> Result<(), LedgerError>;

    /// Delete a member's queue entry. Returns whether one existed.
    async fn remove_queue_entry(&self, member_id: MemberId) -> Result<bool, LedgerError>;

    async fn set_member_status(
        &self,
        member_id: MemberId,
        status: &MemberStatus,
    ) -> Result<(), LedgerError>;

    /// Remove a member from the queue and mark them Inactive.
    ///
    /// The queue entry goes first: if the status write then fails, the member
    /// is left un-queued, never queued-but-inactive. Implementations with
    /// transactions should override this to make the pair atomic.
    async fn demote_member(&self, member_id: MemberId) -> Result<Demotion, DemotionError> {
        let queue_entry_removed =
            self.remove_queue_entry(member_id)
                .await
                .map_err(|source| DemotionError {
                    stage: DemotionStage::QueueRemoval,
                    queue_entry_removed: false,
                    source,
                })?;

        self.set_member_status(member_id, &MemberStatus::Inactive)
            .await
            .map_err(|source| DemotionError {
                stage: DemotionStage::StatusUpdate,
                queue_entry_removed,
                source,
            })?;

        Ok(Demotion {
            queue_entry_removed,
        })
    }
}

/// Outcome of a successful demotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Demotion {
    pub queue_entry_removed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemotionStage {
    QueueRemoval,
    StatusUpdate,
}

impl fmt::Display for DemotionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemotionStage::QueueRemoval => write!(f, "queue removal"),
            DemotionStage::StatusUpdate => write!(f, "status update"),
        }
    }
}

/// A demotion that did not fully complete.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct DemotionError {
    pub stage: DemotionStage,
    /// Whether the queue entry was already deleted before the failure.
    pub queue_entry_removed: bool,
    #[source]
    pub source: LedgerError,
}

/// Ledger access failure.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
    #[error("Corrupt ledger row: {0}")]
    Corrupt(String),
}
