use axum::{
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use ferry_core::booking::Booking;
use ferry_core::payment::PaymentConfirmation;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::JsonBody;
use crate::state::AppState;

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Debug, Deserialize)]
pub struct PaymentWebhook {
    pub booking_id: Uuid,
    #[serde(flatten)]
    pub confirmation: PaymentConfirmation,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/webhooks/payments", post(handle_payment_webhook))
}

/// POST /v1/webhooks/payments
/// Called by the payment provider once a booking's money has cleared.
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<PaymentWebhook>,
) -> Result<Json<Booking>, AppError> {
    let presented = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    if state.webhook_secret.is_empty() || presented != state.webhook_secret {
        return Err(AppError::AuthenticationError("invalid webhook secret".to_string()));
    }

    tracing::info!("Received payment confirmation for booking {}", payload.booking_id);
    let booking = state
        .lifecycle
        .mark_paid(payload.booking_id, &payload.confirmation)
        .await?;
    Ok(Json(booking))
}
