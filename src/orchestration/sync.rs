//! Persists a computed ranking into the queue table.

use crate::domain::{MemberId, QueueEntry, TimeMs};
use crate::engine::RankedMember;
use crate::ledger::{Ledger, LedgerError};
use crate::orchestration::MemberFailure;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info};

/// Result of writing one ranking to storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub upserted: usize,
    pub removed: usize,
    pub failures: Vec<MemberFailure>,
}

impl SyncReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

enum Write {
    Remove(MemberId),
    Upsert(QueueEntry),
}

impl Write {
    fn member_id(&self) -> MemberId {
        match self {
            Write::Remove(id) => *id,
            Write::Upsert(entry) => entry.member_id,
        }
    }

    fn operation(&self) -> &'static str {
        match self {
            Write::Remove(_) => "queue removal",
            Write::Upsert(_) => "queue upsert",
        }
    }
}

/// Replaces the stored queue with a ranking.
#[derive(Clone)]
pub struct QueueSyncer {
    ledger: Arc<dyn Ledger>,
    concurrency: usize,
}

impl QueueSyncer {
    pub fn new(ledger: Arc<dyn Ledger>, concurrency: usize) -> Self {
        Self {
            ledger,
            concurrency: concurrency.max(1),
        }
    }

    /// Make the queue table match `ranked` exactly.
    ///
    /// Entries for members missing from `ranked` are deleted before any
    /// upsert runs, so a removed member never shares a position with a
    /// newly ranked one. Individual write failures are collected and the
    /// rest of the batch still runs.
    ///
    /// # Errors
    /// Returns an error only if the current queue cannot be read.
    pub async fn sync(&self, ranked: &[RankedMember], now: TimeMs) -> Result<SyncReport, LedgerError> {
        let existing = self.ledger.list_queue_entries().await?;
        let keep: HashSet<MemberId> = ranked.iter().map(|m| m.member_id).collect();

        let removals: Vec<Write> = existing
            .iter()
            .filter(|e| !keep.contains(&e.member_id))
            .map(|e| Write::Remove(e.member_id))
            .collect();
        let upserts: Vec<Write> = ranked
            .iter()
            .map(|m| Write::Upsert(QueueEntry::new(m.member_id, m.queue_position, now)))
            .collect();

        let mut report = SyncReport::default();
        for phase in [removals, upserts] {
            let outcomes: Vec<(Write, Result<(), LedgerError>)> = stream::iter(phase)
                .map(|write| {
                    let ledger = Arc::clone(&self.ledger);
                    async move {
                        let result = match &write {
                            Write::Remove(id) => ledger.remove_queue_entry(*id).await.map(|_| ()),
                            Write::Upsert(entry) => ledger.upsert_queue_entry(entry).await,
                        };
                        (write, result)
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

            for (write, result) in outcomes {
                match result {
                    Ok(()) => match write {
                        Write::Remove(_) => report.removed += 1,
                        Write::Upsert(_) => report.upserted += 1,
                    },
                    Err(err) => {
                        error!(
                            member_id = %write.member_id(),
                            operation = write.operation(),
                            error = %err,
                            "Queue write failed"
                        );
                        report.failures.push(MemberFailure {
                            member_id: write.member_id(),
                            operation: write.operation().to_string(),
                            error: err.to_string(),
                        });
                    }
                }
            }
        }
        report.failures.sort_by_key(|f| f.member_id);

        info!(
            upserted = report.upserted,
            removed = report.removed,
            failed = report.failures.len(),
            "Queue sync finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cents, Member, MemberStatus};
    use crate::ledger::MockLedger;

    fn ranked(id: i64, position: i64) -> RankedMember {
        RankedMember {
            member_id: MemberId::new(id),
            queue_position: position,
            tenure_start: TimeMs::new(0),
            total_paid: Cents::ZERO,
            continuous_tenure_months: 0,
            last_payment_date: TimeMs::new(0),
        }
    }

    fn ledger_with_members(ids: &[i64]) -> MockLedger {
        ids.iter().fold(MockLedger::new(), |ledger, id| {
            ledger.with_member(Member::new(MemberId::new(*id), "m", MemberStatus::Active))
        })
    }

    #[tokio::test]
    async fn test_sync_replaces_queue() {
        let ledger = Arc::new(
            ledger_with_members(&[1, 2, 3])
                .with_queue_entry(QueueEntry::new(MemberId::new(3), 1, TimeMs::new(0)))
                .with_queue_entry(QueueEntry::new(MemberId::new(1), 2, TimeMs::new(0))),
        );
        let syncer = QueueSyncer::new(ledger.clone(), 2);

        let report = syncer
            .sync(&[ranked(1, 1), ranked(2, 2)], TimeMs::new(500))
            .await
            .unwrap();
        assert_eq!(report.upserted, 2);
        assert_eq!(report.removed, 1);
        assert!(!report.is_partial());

        let queue = ledger.queue_snapshot();
        let rows: Vec<(i64, i64)> = queue
            .iter()
            .map(|e| (e.member_id.as_i64(), e.queue_position))
            .collect();
        assert_eq!(rows, vec![(1, 1), (2, 2)]);
        assert!(queue.iter().all(|e| e.updated_at == TimeMs::new(500)));
    }

    #[tokio::test]
    async fn test_sync_continues_past_failed_write() {
        let ledger = Arc::new(
            ledger_with_members(&[1, 2, 3]).failing_queue_upsert_for(MemberId::new(2)),
        );
        let syncer = QueueSyncer::new(ledger.clone(), 1);

        let report = syncer
            .sync(&[ranked(1, 1), ranked(2, 2), ranked(3, 3)], TimeMs::new(0))
            .await
            .unwrap();
        assert_eq!(report.upserted, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].member_id, MemberId::new(2));
        assert_eq!(report.failures[0].operation, "queue upsert");
        assert_eq!(ledger.queue_snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_sync_fails_when_queue_unreadable() {
        let ledger = Arc::new(MockLedger::new().failing_reads());
        let syncer = QueueSyncer::new(ledger, 1);
        assert!(syncer.sync(&[ranked(1, 1)], TimeMs::new(0)).await.is_err());
    }
}
