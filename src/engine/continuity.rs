//! Continuity of tenure: no payment gap longer than the grace period.
//!
//! Two separate checks make up continuity:
//! - a historical scan for a monthly payment that arrived too late
//! - a staleness check of the last payment against the current clock

use crate::config::BusinessRules;
use crate::domain::{FeeSchedule, Payment, PaymentKind, TimeMs};

/// A monthly payment that arrived more than the grace period after the
/// previous payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapViolation {
    pub previous_payment: TimeMs,
    pub late_payment: TimeMs,
    pub gap_days: i64,
}

/// Result of walking a member's payments from their tenure start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryScan {
    /// Last signup or monthly payment seen (tenure start if none).
    pub last_payment_date: TimeMs,
    /// Payments considered, including the tenure-start payment.
    pub payments_seen: usize,
    /// First late monthly payment, if any. The scan stops there.
    pub violation: Option<GapViolation>,
}

#[derive(Debug, Clone)]
pub struct ContinuityChecker {
    fees: FeeSchedule,
    grace_period_days: i64,
}

impl ContinuityChecker {
    pub fn new(rules: &BusinessRules) -> Self {
        Self {
            fees: rules.fees(),
            grace_period_days: rules.grace_period_days,
        }
    }

    /// Walk completed payments dated on or after `tenure_start`.
    ///
    /// A gap equal to the grace period is allowed; only a strictly longer one
    /// is a violation. `last_payment_date` advances on every signup or
    /// monthly payment.
    pub fn scan_history(&self, payments: &[Payment], tenure_start: TimeMs) -> HistoryScan {
        let mut scan = HistoryScan {
            last_payment_date: tenure_start,
            payments_seen: 0,
            violation: None,
        };

        let in_tenure = payments
            .iter()
            .filter(|p| p.is_completed() && p.payment_date >= tenure_start);

        for payment in in_tenure {
            let kind = payment.kind(&self.fees);
            if kind == PaymentKind::Other {
                continue;
            }
            scan.payments_seen += 1;

            if kind == PaymentKind::MonthlyFee {
                let gap_days = payment.payment_date.days_since(scan.last_payment_date);
                if gap_days > self.grace_period_days {
                    scan.violation = Some(GapViolation {
                        previous_payment: scan.last_payment_date,
                        late_payment: payment.payment_date,
                        gap_days,
                    });
                    return scan;
                }
            }
            scan.last_payment_date = payment.payment_date;
        }

        scan
    }

    /// True when more than the grace period has passed since `last_payment_date`.
    pub fn is_stale(&self, last_payment_date: TimeMs, now: TimeMs) -> bool {
        now.days_since(last_payment_date) > self.grace_period_days
    }

    /// Continuous tenure up to `now`. Zero payments is never continuous.
    pub fn is_continuous(&self, payments: &[Payment], tenure_start: TimeMs, now: TimeMs) -> bool {
        self.scan_is_continuous(&self.scan_history(payments, tenure_start), now)
    }

    /// Combine an existing history scan with the staleness check.
    pub fn scan_is_continuous(&self, scan: &HistoryScan, now: TimeMs) -> bool {
        if scan.payments_seen == 0 || scan.violation.is_some() {
            return false;
        }
        !self.is_stale(scan.last_payment_date, now)
    }
}
