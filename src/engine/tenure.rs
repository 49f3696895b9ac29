//! Tenure start derivation.

use crate::config::BusinessRules;
use crate::domain::{FeeSchedule, Payment, PaymentKind, TimeMs};

/// Derives when a member's current tenure began.
///
/// The tenure start is the first completed signup-fee payment. A signup-fee
/// payment that follows a lapse longer than the grace period opens a new
/// tenure epoch, and the start moves to it: a member who rejoins after
/// defaulting gets no credit for earlier history.
#[derive(Debug, Clone)]
pub struct TenureCalculator {
    fees: FeeSchedule,
    grace_period_days: i64,
}

impl TenureCalculator {
    pub fn new(rules: &BusinessRules) -> Self {
        Self {
            fees: rules.fees(),
            grace_period_days: rules.grace_period_days,
        }
    }

    /// Tenure start for a member's payments, given ascending by date.
    ///
    /// `None` means the member has no tenure yet. That is a normal state,
    /// not an error.
    pub fn tenure_start(&self, payments: &[Payment]) -> Option<TimeMs> {
        let mut start: Option<TimeMs> = None;
        let mut previous: Option<TimeMs> = None;

        for payment in payments.iter().filter(|p| p.is_completed()) {
            if payment.kind(&self.fees) == PaymentKind::SignupFee {
                let lapsed = previous.is_some_and(|prev| {
                    payment.payment_date.days_since(prev) > self.grace_period_days
                });
                if start.is_none() || lapsed {
                    start = Some(payment.payment_date);
                }
            }
            previous = Some(payment.payment_date);
        }

        start
    }
}
