//! Per-member payment and default status.

use crate::config::BusinessRules;
use crate::domain::{Cents, FeeSchedule, MemberId, Payment, PaymentKind, TimeMs};
use crate::engine::TenureCalculator;
use serde::{Deserialize, Serialize};

/// Days reported for a member who has never paid.
pub const NEVER_PAID_DAYS: i64 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStanding {
    Current,
    Overdue,
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPaymentStatus {
    pub member_id: MemberId,
    pub status: PaymentStanding,
    pub has_joining_fee: bool,
    pub is_in_default: bool,
    pub days_since_last_payment: i64,
    pub next_payment_due: Option<TimeMs>,
    pub total_paid: Cents,
    pub monthly_payment_count: i64,
    /// Set when the ledger could not be read and this is the fallback record.
    pub degraded: bool,
}

impl MemberPaymentStatus {
    /// The "fully suspended, never paid" record.
    pub fn never_paid(member_id: MemberId) -> Self {
        Self {
            member_id,
            status: PaymentStanding::Suspended,
            has_joining_fee: false,
            is_in_default: true,
            days_since_last_payment: NEVER_PAID_DAYS,
            next_payment_due: None,
            total_paid: Cents::ZERO,
            monthly_payment_count: 0,
            degraded: false,
        }
    }

    pub fn degraded(member_id: MemberId) -> Self {
        Self {
            degraded: true,
            ..Self::never_paid(member_id)
        }
    }
}

/// Resolves a member's payment standing from their payment history.
#[derive(Debug, Clone)]
pub struct PaymentStatusResolver {
    fees: FeeSchedule,
    grace_period_days: i64,
    tenure: TenureCalculator,
}

impl PaymentStatusResolver {
    pub fn new(rules: &BusinessRules) -> Self {
        Self {
            fees: rules.fees(),
            grace_period_days: rules.grace_period_days,
            tenure: TenureCalculator::new(rules),
        }
    }

    /// Resolve from a member's payments, given ascending by date.
    ///
    /// The joining fee is the signup payment that opened the current tenure,
    /// and only monthly payments from that point on count towards standing.
    /// `total_paid` covers the whole history.
    pub fn resolve(&self, member_id: MemberId, payments: &[Payment], now: TimeMs) -> MemberPaymentStatus {
        let completed: Vec<&Payment> = payments.iter().filter(|p| p.is_completed()).collect();
        if completed.is_empty() {
            return MemberPaymentStatus::never_paid(member_id);
        }

        let total_paid: Cents = completed.iter().map(|p| p.amount).sum();
        let joining_fee_date = self.tenure.tenure_start(payments);
        let epoch_start = joining_fee_date.unwrap_or(TimeMs::new(i64::MIN));

        let monthly: Vec<TimeMs> = completed
            .iter()
            .filter(|p| p.payment_date >= epoch_start)
            .filter(|p| p.kind(&self.fees) == PaymentKind::MonthlyFee)
            .map(|p| p.payment_date)
            .collect();
        let last_monthly = monthly.iter().max().copied();

        let reference = last_monthly.or(joining_fee_date);
        let days_since_last_payment = match reference {
            Some(date) => now.days_since(date).max(0),
            None => NEVER_PAID_DAYS,
        };
        let is_in_default = days_since_last_payment > self.grace_period_days;
        let has_joining_fee = joining_fee_date.is_some();

        let status = if is_in_default {
            PaymentStanding::Overdue
        } else if has_joining_fee {
            PaymentStanding::Current
        } else {
            PaymentStanding::Suspended
        };

        MemberPaymentStatus {
            member_id,
            status,
            has_joining_fee,
            is_in_default,
            days_since_last_payment,
            next_payment_due: reference.and_then(|date| date.plus_months(1)),
            total_paid,
            monthly_payment_count: monthly.len() as i64,
            degraded: false,
        }
    }
}
