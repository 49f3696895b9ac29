//! In-memory ledger for testing without a database.

use super::{Ledger, LedgerError};
use crate::domain::{Cents, Member, MemberId, MemberStatus, Payment, QueueEntry};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct State {
    members: BTreeMap<MemberId, Member>,
    payments: Vec<Payment>,
    queue: BTreeMap<MemberId, QueueEntry>,
}

#[derive(Debug, Default, Clone)]
struct Failures {
    reads: bool,
    status_updates: HashSet<MemberId>,
    queue_removals: HashSet<MemberId>,
    queue_upserts: HashSet<MemberId>,
}

/// Mock ledger holding predefined members, payments and queue entries,
/// with optional per-member write failures.
#[derive(Debug, Default)]
pub struct MockLedger {
    state: Mutex<State>,
    failures: Failures,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(self, member: Member) -> Self {
        self.lock().members.insert(member.id, member);
        self
    }

    pub fn with_members(self, members: Vec<Member>) -> Self {
        members.into_iter().fold(self, Self::with_member)
    }

    pub fn with_payment(self, payment: Payment) -> Self {
        self.lock().payments.push(payment);
        self
    }

    pub fn with_queue_entry(self, entry: QueueEntry) -> Self {
        self.lock().queue.insert(entry.member_id, entry);
        self
    }

    /// Every read returns `LedgerError::Unavailable`.
    pub fn failing_reads(mut self) -> Self {
        self.failures.reads = true;
        self
    }

    pub fn failing_status_update_for(mut self, member_id: MemberId) -> Self {
        self.failures.status_updates.insert(member_id);
        self
    }

    pub fn failing_queue_removal_for(mut self, member_id: MemberId) -> Self {
        self.failures.queue_removals.insert(member_id);
        self
    }

    pub fn failing_queue_upsert_for(mut self, member_id: MemberId) -> Self {
        self.failures.queue_upserts.insert(member_id);
        self
    }

    /// Current status of a member, for assertions.
    pub fn member_status(&self, member_id: MemberId) -> Option<MemberStatus> {
        self.lock().members.get(&member_id).map(|m| m.status.clone())
    }

    /// Snapshot of the queue ordered by position.
    pub fn queue_snapshot(&self) -> Vec<QueueEntry> {
        let mut entries: Vec<QueueEntry> = self.lock().queue.values().cloned().collect();
        entries.sort_by_key(|e| (e.queue_position, e.member_id));
        entries
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_reads(&self) -> Result<(), LedgerError> {
        if self.failures.reads {
            return Err(LedgerError::Unavailable("mock read failure".to_string()));
        }
        Ok(())
    }

    fn check_write(set: &HashSet<MemberId>, member_id: MemberId, op: &str) -> Result<(), LedgerError> {
        if set.contains(&member_id) {
            return Err(LedgerError::Unavailable(format!(
                "mock {} failure for member {}",
                op, member_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn ping(&self) -> Result<(), LedgerError> {
        self.check_reads()
    }

    async fn list_members(&self, status: Option<&MemberStatus>) -> Result<Vec<Member>, LedgerError> {
        self.check_reads()?;
        Ok(self
            .lock()
            .members
            .values()
            .filter(|m| status.map_or(true, |s| &m.status == s))
            .cloned()
            .collect())
    }

    async fn completed_payments(&self) -> Result<Vec<Payment>, LedgerError> {
        self.check_reads()?;
        let mut payments: Vec<Payment> = self
            .lock()
            .payments
            .iter()
            .filter(|p| p.is_completed())
            .cloned()
            .collect();
        payments.sort_by_key(|p| (p.payment_date, p.member_id));
        Ok(payments)
    }

    async fn completed_payments_for(&self, member_id: MemberId) -> Result<Vec<Payment>, LedgerError> {
        self.check_reads()?;
        let mut payments: Vec<Payment> = self
            .lock()
            .payments
            .iter()
            .filter(|p| p.member_id == member_id && p.is_completed())
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.payment_date);
        Ok(payments)
    }

    async fn total_completed_revenue(&self) -> Result<Cents, LedgerError> {
        self.check_reads()?;
        Ok(self
            .lock()
            .payments
            .iter()
            .filter(|p| p.is_completed())
            .map(|p| p.amount)
            .sum())
    }

    async fn list_queue_entries(&self) -> Result<Vec<QueueEntry>, LedgerError> {
        self.check_reads()?;
        Ok(self.queue_snapshot())
    }

    async fn upsert_queue_entry(&self, entry: &QueueEntry) -> Result<(), LedgerError> {
        Self::check_write(&self.failures.queue_upserts, entry.member_id, "queue upsert")?;
        self.lock().queue.insert(entry.member_id, entry.clone());
        Ok(())
    }

    async fn remove_queue_entry(&self, member_id: MemberId) -> Result<bool, LedgerError> {
        Self::check_write(&self.failures.queue_removals, member_id, "queue removal")?;
        Ok(self.lock().queue.remove(&member_id).is_some())
    }

    async fn set_member_status(
        &self,
        member_id: MemberId,
        status: &MemberStatus,
    ) -> Result<(), LedgerError> {
        Self::check_write(&self.failures.status_updates, member_id, "status update")?;
        match self.lock().members.get_mut(&member_id) {
            Some(member) => {
                member.status = status.clone();
                Ok(())
            }
            None => Err(LedgerError::Corrupt(format!("no member {}", member_id))),
        }
    }
}
