//! Pure computation engines for tenure, queue and payout logic.
//!
//! Nothing here touches the ledger. Callers batch-fetch members and payments,
//! build a [`PaymentIndex`], and hand slices of it to the calculators.

use crate::domain::{MemberId, Payment};
use std::collections::HashMap;

pub mod continuity;
pub mod payment_status;
pub mod payout;
pub mod ranker;
pub mod tenure;

pub use continuity::{ContinuityChecker, GapViolation, HistoryScan};
pub use payment_status::{
    MemberPaymentStatus, PaymentStanding, PaymentStatusResolver, NEVER_PAID_DAYS,
};
pub use payout::{PayoutEligibilityEvaluator, PayoutStatus, DAYS_PER_MONTH};
pub use ranker::{Exclusion, QueueRanker, RankedMember, TenureRecord};
pub use tenure::TenureCalculator;

/// Completed payments grouped by member, each list ascending by date.
#[derive(Debug, Clone, Default)]
pub struct PaymentIndex {
    by_member: HashMap<MemberId, Vec<Payment>>,
}

impl PaymentIndex {
    /// Build the index, dropping anything not Completed.
    pub fn build(payments: impl IntoIterator<Item = Payment>) -> Self {
        let mut by_member: HashMap<MemberId, Vec<Payment>> = HashMap::new();
        for payment in payments.into_iter().filter(Payment::is_completed) {
            by_member.entry(payment.member_id).or_default().push(payment);
        }
        for list in by_member.values_mut() {
            // Stable sort keeps insertion order for same-timestamp payments.
            list.sort_by_key(|p| p.payment_date);
        }
        Self { by_member }
    }

    pub fn payments_for(&self, member_id: MemberId) -> &[Payment] {
        self.by_member
            .get(&member_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
