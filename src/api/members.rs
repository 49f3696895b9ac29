use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;

use crate::api::{AppState, AsOfQuery};
use crate::domain::MemberId;
use crate::engine::{MemberPaymentStatus, PaymentStanding};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub member_id: i64,
    pub status: PaymentStanding,
    pub has_joining_fee: bool,
    pub is_in_default: bool,
    pub days_since_last_payment: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_payment_due_ms: Option<i64>,
    pub total_paid: String,
    pub monthly_payment_count: i64,
    pub degraded: bool,
}

impl From<MemberPaymentStatus> for PaymentStatusResponse {
    fn from(s: MemberPaymentStatus) -> Self {
        Self {
            member_id: s.member_id.as_i64(),
            status: s.status,
            has_joining_fee: s.has_joining_fee,
            is_in_default: s.is_in_default,
            days_since_last_payment: s.days_since_last_payment,
            next_payment_due_ms: s.next_payment_due.map(|t| t.as_ms()),
            total_paid: s.total_paid.to_major_string(),
            monthly_payment_count: s.monthly_payment_count,
            degraded: s.degraded,
        }
    }
}

pub async fn get_member_payment_status(
    Path(member_id): Path<i64>,
    Query(params): Query<AsOfQuery>,
    State(state): State<AppState>,
) -> Result<Json<PaymentStatusResponse>, AppError> {
    if member_id <= 0 {
        return Err(AppError::BadRequest("memberId must be positive".into()));
    }

    let as_of = params.instant()?;
    let status = state
        .service
        .get_member_payment_status_at(MemberId::new(member_id), as_of)
        .await;
    Ok(Json(status.into()))
}
