//! Operation surface for admin callers: payout status, queue preview and
//! sync, default enforcement, per-member payment status.

use crate::config::BusinessRules;
use crate::domain::{MemberId, TimeMs};
use crate::engine::{
    ContinuityChecker, MemberPaymentStatus, PaymentIndex, PaymentStatusResolver,
    PayoutEligibilityEvaluator, PayoutStatus, QueueRanker, RankedMember, TenureCalculator,
};
use crate::ledger::{Ledger, LedgerError};
use crate::orchestration::audit::{self, QueueInconsistency};
use crate::orchestration::{
    load_active_roster, DefaultEnforcer, EnforcementReport, QueueSyncer, SyncReport,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// Another batch run holds the single-flight guard.
    #[error("A {0} run is already in progress")]
    BatchInProgress(&'static str),
}

/// Queue and payout service over an injected ledger.
///
/// Batch writes (`sync_queue_positions`, `enforce_payment_defaults`) share one
/// guard, so only one of them runs at a time within this process.
pub struct QueueService {
    ledger: Arc<dyn Ledger>,
    tenure: TenureCalculator,
    continuity: ContinuityChecker,
    ranker: QueueRanker,
    resolver: PaymentStatusResolver,
    payout: PayoutEligibilityEvaluator,
    enforcer: DefaultEnforcer,
    syncer: QueueSyncer,
    batch_lock: Mutex<()>,
}

impl QueueService {
    pub fn new(ledger: Arc<dyn Ledger>, rules: BusinessRules, batch_concurrency: usize) -> Self {
        Self {
            tenure: TenureCalculator::new(&rules),
            continuity: ContinuityChecker::new(&rules),
            ranker: QueueRanker::new(&rules),
            resolver: PaymentStatusResolver::new(&rules),
            enforcer: DefaultEnforcer::new(Arc::clone(&ledger), &rules, batch_concurrency),
            syncer: QueueSyncer::new(Arc::clone(&ledger), batch_concurrency),
            payout: PayoutEligibilityEvaluator::new(rules),
            ledger,
            batch_lock: Mutex::new(()),
        }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    // =========================================================================
    // Read-only surface
    // =========================================================================

    pub async fn compute_payout_status(&self) -> PayoutStatus {
        self.compute_payout_status_at(TimeMs::now()).await
    }

    /// Never fails: a ledger error yields a degraded "not ready" status.
    pub async fn compute_payout_status_at(&self, now: TimeMs) -> PayoutStatus {
        match self.ledger.total_completed_revenue().await {
            Ok(total) => self.payout.evaluate(total, now),
            Err(err) => {
                warn!(error = %err, "Revenue unavailable, reporting degraded payout status");
                self.payout.degraded(now)
            }
        }
    }

    pub async fn compute_winner_order(&self) -> Result<Vec<RankedMember>, ServiceError> {
        self.compute_winner_order_at(TimeMs::now()).await
    }

    /// Current ranking without persisting it.
    pub async fn compute_winner_order_at(
        &self,
        now: TimeMs,
    ) -> Result<Vec<RankedMember>, ServiceError> {
        let (members, index) = load_active_roster(self.ledger.as_ref()).await?;
        Ok(self.ranker.rank(&members, &index, now))
    }

    pub async fn get_member_payment_status(&self, member_id: MemberId) -> MemberPaymentStatus {
        self.get_member_payment_status_at(member_id, TimeMs::now()).await
    }

    /// Never fails: a ledger error yields the degraded never-paid record.
    pub async fn get_member_payment_status_at(
        &self,
        member_id: MemberId,
        now: TimeMs,
    ) -> MemberPaymentStatus {
        match self.ledger.completed_payments_for(member_id).await {
            Ok(payments) => self.resolver.resolve(member_id, &payments, now),
            Err(err) => {
                warn!(
                    member_id = %member_id,
                    error = %err,
                    "Payments unavailable, reporting degraded status"
                );
                MemberPaymentStatus::degraded(member_id)
            }
        }
    }

    /// Start of the member's current tenure, if they have one.
    pub async fn tenure_start(&self, member_id: MemberId) -> Result<Option<TimeMs>, ServiceError> {
        let payments = self.ledger.completed_payments_for(member_id).await?;
        Ok(self.tenure.tenure_start(&payments))
    }

    pub async fn is_tenure_continuous(&self, member_id: MemberId) -> Result<bool, ServiceError> {
        self.is_tenure_continuous_at(member_id, TimeMs::now()).await
    }

    /// False for a member with no tenure.
    pub async fn is_tenure_continuous_at(
        &self,
        member_id: MemberId,
        now: TimeMs,
    ) -> Result<bool, ServiceError> {
        let payments = self.ledger.completed_payments_for(member_id).await?;
        Ok(match self.tenure.tenure_start(&payments) {
            Some(start) => self.continuity.is_continuous(&payments, start, now),
            None => false,
        })
    }

    pub async fn audit_queue(&self) -> Result<Vec<QueueInconsistency>, ServiceError> {
        self.audit_queue_at(TimeMs::now()).await
    }

    /// Compare the stored queue with member rows and a fresh ranking.
    pub async fn audit_queue_at(
        &self,
        now: TimeMs,
    ) -> Result<Vec<QueueInconsistency>, ServiceError> {
        let (all_members, entries, payments) = tokio::try_join!(
            self.ledger.list_members(None),
            self.ledger.list_queue_entries(),
            self.ledger.completed_payments(),
        )?;
        let index = PaymentIndex::build(payments);
        let ranked = self.ranker.rank(&all_members, &index, now);

        let findings = audit::audit_queue(&all_members, &entries, &ranked);
        audit::log_findings(&findings);
        Ok(findings)
    }

    // =========================================================================
    // Batch writes
    // =========================================================================

    pub async fn sync_queue_positions(&self) -> Result<SyncReport, ServiceError> {
        self.sync_queue_positions_at(TimeMs::now()).await
    }

    /// Rank and replace the stored queue.
    ///
    /// # Errors
    /// `BatchInProgress` if another batch holds the guard; `Ledger` if the
    /// initial reads fail. Per-member write failures are in the report.
    pub async fn sync_queue_positions_at(&self, now: TimeMs) -> Result<SyncReport, ServiceError> {
        let _guard = self
            .batch_lock
            .try_lock()
            .map_err(|_| ServiceError::BatchInProgress("queue sync"))?;

        let run_id = Uuid::new_v4();
        async {
            let (members, index) = load_active_roster(self.ledger.as_ref()).await?;
            let ranked = self.ranker.rank(&members, &index, now);
            info!(eligible = ranked.len(), scanned = members.len(), "Queue ranked");

            let report = self.syncer.sync(&ranked, now).await?;
            if report.is_partial() {
                warn!(
                    failed = report.failures.len(),
                    "Queue sync incomplete, positions may have gaps until the next run"
                );
            }
            Ok::<_, ServiceError>(report)
        }
        .instrument(info_span!("sync_queue", %run_id))
        .await
    }

    pub async fn enforce_payment_defaults(&self) -> Result<EnforcementReport, ServiceError> {
        self.enforce_payment_defaults_at(TimeMs::now()).await
    }

    pub async fn enforce_payment_defaults_at(
        &self,
        now: TimeMs,
    ) -> Result<EnforcementReport, ServiceError> {
        let _guard = self
            .batch_lock
            .try_lock()
            .map_err(|_| ServiceError::BatchInProgress("default enforcement"))?;

        Ok(self.enforcer.run(now).await?)
    }
}

impl std::fmt::Debug for QueueService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueService")
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}
