//! Repository layer for ledger storage.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by table:
//! - `members.rs` - member rows and status writes
//! - `payments.rs` - append-only payment rows
//! - `queue.rs` - persisted queue positions
//!
//! `Repository` implements [`Ledger`] on top of those methods.

mod members;
mod payments;
mod queue;

use crate::domain::{Cents, Member, MemberId, MemberStatus, Payment, QueueEntry};
use crate::ledger::{Demotion, DemotionError, DemotionStage, Ledger, LedgerError};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Cheap connectivity probe used by readiness checks.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn rolled_back(stage: DemotionStage) -> impl FnOnce(sqlx::Error) -> DemotionError {
    move |err| DemotionError {
        stage,
        queue_entry_removed: false,
        source: LedgerError::Db(err),
    }
}

#[async_trait]
impl Ledger for Repository {
    async fn ping(&self) -> Result<(), LedgerError> {
        Ok(Repository::ping(self).await?)
    }

    async fn list_members(&self, status: Option<&MemberStatus>) -> Result<Vec<Member>, LedgerError> {
        self.query_members(status).await
    }

    async fn completed_payments(&self) -> Result<Vec<Payment>, LedgerError> {
        self.query_completed_payments(None).await
    }

    async fn completed_payments_for(&self, member_id: MemberId) -> Result<Vec<Payment>, LedgerError> {
        self.query_completed_payments(Some(member_id)).await
    }

    async fn total_completed_revenue(&self) -> Result<Cents, LedgerError> {
        Ok(self.sum_completed_payments().await?)
    }

    async fn list_queue_entries(&self) -> Result<Vec<QueueEntry>, LedgerError> {
        self.query_queue_entries().await
    }

    async fn upsert_queue_entry(&self, entry: &QueueEntry) -> Result<(), LedgerError> {
        Ok(self.store_queue_entry(entry).await?)
    }

    async fn remove_queue_entry(&self, member_id: MemberId) -> Result<bool, LedgerError> {
        Ok(self.delete_queue_entry(member_id).await?)
    }

    async fn set_member_status(
        &self,
        member_id: MemberId,
        status: &MemberStatus,
    ) -> Result<(), LedgerError> {
        if self.update_member_status(member_id, status).await? {
            Ok(())
        } else {
            Err(LedgerError::Corrupt(format!("no member {}", member_id)))
        }
    }

    /// Queue deletion and status change in one transaction.
    async fn demote_member(&self, member_id: MemberId) -> Result<Demotion, DemotionError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(rolled_back(DemotionStage::QueueRemoval))?;

        let removed = sqlx::query("DELETE FROM queue WHERE member_id = ?")
            .bind(member_id.as_i64())
            .execute(&mut *tx)
            .await
            .map_err(rolled_back(DemotionStage::QueueRemoval))?;

        let updated = sqlx::query("UPDATE members SET status = ? WHERE id = ?")
            .bind(MemberStatus::Inactive.as_str())
            .bind(member_id.as_i64())
            .execute(&mut *tx)
            .await
            .map_err(rolled_back(DemotionStage::StatusUpdate))?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls back the queue deletion.
            return Err(DemotionError {
                stage: DemotionStage::StatusUpdate,
                queue_entry_removed: false,
                source: LedgerError::Corrupt(format!("no member {}", member_id)),
            });
        }

        tx.commit()
            .await
            .map_err(rolled_back(DemotionStage::StatusUpdate))?;

        Ok(Demotion {
            queue_entry_removed: removed.rows_affected() > 0,
        })
    }
}
