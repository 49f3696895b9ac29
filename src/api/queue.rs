use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use crate::api::{AppState, AsOfQuery};
use crate::engine::RankedMember;
use crate::error::AppError;
use crate::orchestration::{QueueInconsistency, SyncReport};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePreviewResponse {
    pub as_of_ms: i64,
    pub winners: Vec<WinnerDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerDto {
    pub member_id: i64,
    pub queue_position: i64,
    pub tenure_start_ms: i64,
    pub total_paid: String,
    pub continuous_tenure_months: i64,
    pub last_payment_ms: i64,
}

impl From<RankedMember> for WinnerDto {
    fn from(m: RankedMember) -> Self {
        Self {
            member_id: m.member_id.as_i64(),
            queue_position: m.queue_position,
            tenure_start_ms: m.tenure_start.as_ms(),
            total_paid: m.total_paid.to_major_string(),
            continuous_tenure_months: m.continuous_tenure_months,
            last_payment_ms: m.last_payment_date.as_ms(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueAuditResponse {
    pub consistent: bool,
    pub findings: Vec<QueueInconsistency>,
}

/// Ranking preview. Nothing is written.
pub async fn get_queue_preview(
    Query(params): Query<AsOfQuery>,
    State(state): State<AppState>,
) -> Result<Json<QueuePreviewResponse>, AppError> {
    let as_of = params.instant()?;
    let ranked = state.service.compute_winner_order_at(as_of).await?;

    Ok(Json(QueuePreviewResponse {
        as_of_ms: as_of.as_ms(),
        winners: ranked.into_iter().map(WinnerDto::from).collect(),
    }))
}

pub async fn post_queue_sync(State(state): State<AppState>) -> Result<Json<SyncReport>, AppError> {
    let report = state.service.sync_queue_positions().await?;
    Ok(Json(report))
}

pub async fn get_queue_audit(
    Query(params): Query<AsOfQuery>,
    State(state): State<AppState>,
) -> Result<Json<QueueAuditResponse>, AppError> {
    let findings = state.service.audit_queue_at(params.instant()?).await?;
    Ok(Json(QueueAuditResponse {
        consistent: findings.is_empty(),
        findings,
    }))
}
