//! Batch operations over the ledger: ranking sync, default enforcement,
//! queue audits, and the service facade that exposes them.

use crate::domain::{Member, MemberId, MemberStatus};
use crate::engine::PaymentIndex;
use crate::ledger::{Ledger, LedgerError};
use serde::Serialize;

pub mod audit;
pub mod enforcer;
pub mod service;
pub mod sync;

pub use audit::{audit_queue, QueueInconsistency};
pub use enforcer::{DefaultEnforcer, EnforcementReport};
pub use service::{QueueService, ServiceError};
pub use sync::{QueueSyncer, SyncReport};

/// One per-member write that did not complete during a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberFailure {
    pub member_id: MemberId,
    pub operation: String,
    pub error: String,
}

/// Active members plus an index of every completed payment, fetched with one
/// query each.
pub async fn load_active_roster(
    ledger: &dyn Ledger,
) -> Result<(Vec<Member>, PaymentIndex), LedgerError> {
    let active = MemberStatus::Active;
    let (members, payments) = tokio::try_join!(
        ledger.list_members(Some(&active)),
        ledger.completed_payments(),
    )?;
    Ok((members, PaymentIndex::build(payments)))
}
