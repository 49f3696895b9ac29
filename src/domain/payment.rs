//! Payment ledger record and amount-based kind classification.

use crate::domain::{Cents, MemberId, TimeMs};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Settlement status of a payment. Only this field ever changes after insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Completed,
    Pending,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" => Ok(PaymentStatus::Completed),
            "pending" => Ok(PaymentStatus::Pending),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two fixed fee amounts that identify a payment's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub signup_fee: Cents,
    pub monthly_fee: Cents,
}

/// Payment kind, inferred from the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentKind {
    SignupFee,
    MonthlyFee,
    Other,
}

impl PaymentKind {
    /// Classify by exact amount equality. Signup fee wins if the two fees
    /// are ever configured equal, though config loading rejects that.
    pub fn classify(amount: Cents, fees: &FeeSchedule) -> Self {
        if amount == fees.signup_fee {
            PaymentKind::SignupFee
        } else if amount == fees.monthly_fee {
            PaymentKind::MonthlyFee
        } else {
            PaymentKind::Other
        }
    }
}

/// A member payment. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub member_id: MemberId,
    pub amount: Cents,
    pub payment_date: TimeMs,
    pub status: PaymentStatus,
}

impl Payment {
    pub fn new(member_id: MemberId, amount: Cents, payment_date: TimeMs, status: PaymentStatus) -> Self {
        Self {
            member_id,
            amount,
            payment_date,
            status,
        }
    }

    pub fn completed(member_id: MemberId, amount: Cents, payment_date: TimeMs) -> Self {
        Self::new(member_id, amount, payment_date, PaymentStatus::Completed)
    }

    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }

    pub fn kind(&self, fees: &FeeSchedule) -> PaymentKind {
        PaymentKind::classify(self.amount, fees)
    }
}
