//! Payment-default enforcement.

use crate::config::BusinessRules;
use crate::domain::{MemberId, TimeMs};
use crate::engine::PaymentStatusResolver;
use crate::ledger::{Demotion, DemotionError, Ledger, LedgerError};
use crate::orchestration::{load_active_roster, MemberFailure};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

/// Outcome of one enforcement run. Counts include only writes that succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforcementReport {
    pub run_id: Uuid,
    pub scanned: usize,
    pub in_default: usize,
    /// Members moved to Inactive.
    pub updated: usize,
    /// Queue entries deleted.
    pub removed: usize,
    pub failures: Vec<MemberFailure>,
}

impl EnforcementReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn failed_member_ids(&self) -> Vec<MemberId> {
        self.failures.iter().map(|f| f.member_id).collect()
    }
}

/// Finds Active members in default and demotes them: queue entry removed,
/// status set to Inactive. Never re-activates anyone.
#[derive(Clone)]
pub struct DefaultEnforcer {
    ledger: Arc<dyn Ledger>,
    resolver: PaymentStatusResolver,
    concurrency: usize,
}

impl DefaultEnforcer {
    pub fn new(ledger: Arc<dyn Ledger>, rules: &BusinessRules, concurrency: usize) -> Self {
        Self {
            ledger,
            resolver: PaymentStatusResolver::new(rules),
            concurrency: concurrency.max(1),
        }
    }

    /// Run one enforcement pass.
    ///
    /// A failure on one member does not stop the others; it is logged and
    /// listed in the report.
    ///
    /// # Errors
    /// Returns an error only if the initial member/payment read fails, in
    /// which case nothing has been written.
    pub async fn run(&self, now: TimeMs) -> Result<EnforcementReport, LedgerError> {
        let run_id = Uuid::new_v4();
        self.run_inner(run_id, now)
            .instrument(info_span!("enforce_defaults", %run_id))
            .await
    }

    async fn run_inner(&self, run_id: Uuid, now: TimeMs) -> Result<EnforcementReport, LedgerError> {
        let (members, index) = load_active_roster(self.ledger.as_ref()).await?;

        let defaulted: Vec<MemberId> = members
            .iter()
            .filter_map(|member| {
                let status = self
                    .resolver
                    .resolve(member.id, index.payments_for(member.id), now);
                if status.is_in_default {
                    debug!(
                        member_id = %member.id,
                        days_since_last_payment = status.days_since_last_payment,
                        "Member in default"
                    );
                    Some(member.id)
                } else {
                    None
                }
            })
            .collect();

        let outcomes: Vec<(MemberId, Result<Demotion, DemotionError>)> =
            stream::iter(defaulted.iter().copied())
                .map(|member_id| {
                    let ledger = Arc::clone(&self.ledger);
                    async move { (member_id, ledger.demote_member(member_id).await) }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        let mut report = EnforcementReport {
            run_id,
            scanned: members.len(),
            in_default: defaulted.len(),
            updated: 0,
            removed: 0,
            failures: Vec::new(),
        };

        for (member_id, outcome) in outcomes {
            match outcome {
                Ok(demotion) => {
                    report.updated += 1;
                    if demotion.queue_entry_removed {
                        report.removed += 1;
                    }
                }
                Err(err) => {
                    if err.queue_entry_removed {
                        report.removed += 1;
                    }
                    error!(member_id = %member_id, error = %err, "Failed to demote defaulted member");
                    report.failures.push(MemberFailure {
                        member_id,
                        operation: err.stage.to_string(),
                        error: err.source.to_string(),
                    });
                }
            }
        }
        report.failures.sort_by_key(|f| f.member_id);

        info!(
            scanned = report.scanned,
            in_default = report.in_default,
            updated = report.updated,
            removed = report.removed,
            failed = report.failures.len(),
            "Default enforcement finished"
        );
        Ok(report)
    }
}
