use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use crate::api::{AppState, AsOfQuery};
use crate::engine::PayoutStatus;
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutStatusResponse {
    pub fund_ready: bool,
    pub time_ready: bool,
    pub payout_ready: bool,
    pub total_revenue: String,
    pub potential_winners: i64,
    pub days_until_eligible: i64,
    pub months_since_launch: i64,
    pub degraded: bool,
}

impl From<PayoutStatus> for PayoutStatusResponse {
    fn from(status: PayoutStatus) -> Self {
        Self {
            fund_ready: status.fund_ready,
            time_ready: status.time_ready,
            payout_ready: status.payout_ready,
            total_revenue: status.total_revenue.to_major_string(),
            potential_winners: status.potential_winners,
            days_until_eligible: status.days_until_eligible,
            months_since_launch: status.months_since_launch,
            degraded: status.degraded,
        }
    }
}

/// A ledger outage still answers 200 with `degraded: true`.
pub async fn get_payout_status(
    Query(params): Query<AsOfQuery>,
    State(state): State<AppState>,
) -> Result<Json<PayoutStatusResponse>, AppError> {
    let as_of = params.instant()?;
    let status = state.service.compute_payout_status_at(as_of).await;
    Ok(Json(status.into()))
}
