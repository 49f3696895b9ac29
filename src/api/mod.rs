pub mod defaults;
pub mod health;
pub mod members;
pub mod payout;
pub mod queue;

use crate::domain::TimeMs;
use crate::error::AppError;
use crate::orchestration::QueueService;
use axum::{
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueueService>,
}

impl AppState {
    pub fn new(service: Arc<QueueService>) -> Self {
        Self { service }
    }
}

/// Optional evaluation instant for read-only endpoints. Defaults to now.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsOfQuery {
    pub as_of_ms: Option<i64>,
}

impl AsOfQuery {
    /// The requested instant, or now.
    ///
    /// # Errors
    /// Rejects values outside the representable calendar range.
    pub fn instant(&self) -> Result<TimeMs, AppError> {
        match self.as_of_ms {
            None => Ok(TimeMs::now()),
            Some(ms) => {
                let instant = TimeMs::new(ms);
                if instant.to_datetime().is_none() {
                    return Err(AppError::BadRequest(
                        "asOfMs is outside the supported date range".into(),
                    ));
                }
                Ok(instant)
            }
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/payout/status", get(payout::get_payout_status))
        .route("/v1/queue/preview", get(queue::get_queue_preview))
        .route("/v1/queue/sync", post(queue::post_queue_sync))
        .route("/v1/queue/audit", get(queue::get_queue_audit))
        .route("/v1/defaults/enforce", post(defaults::post_enforce_defaults))
        .route(
            "/v1/members/:member_id/payment-status",
            get(members::get_member_payment_status),
        )
        .layer(cors)
        .with_state(state)
}
