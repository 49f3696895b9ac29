use axum::extract::State;
use axum::Json;

use crate::api::AppState;
use crate::error::AppError;
use crate::orchestration::EnforcementReport;

/// Run default enforcement. Partial failures still return 200 with the
/// failed members listed in the report.
pub async fn post_enforce_defaults(
    State(state): State<AppState>,
) -> Result<Json<EnforcementReport>, AppError> {
    let report = state.service.enforce_payment_defaults().await?;
    Ok(Json(report))
}
