use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use ferry_core::booking::{Booking, NewBooking};
use ferry_core::repository::Page;
use ferry_core::Actor;
use ferry_ops::{BookingFilter, Receipt};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub ferry_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub rating: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub booking_status: String,
    #[serde(default)]
    pub ferry_id: Option<Uuid>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(list_bookings))
        .route("/v1/bookings/mine", get(list_my_bookings))
        .route("/v1/bookings/paid", get(list_paid_bookings))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/receipt", get(get_receipt))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
        .route("/v1/bookings/{id}/approve", post(approve_booking))
        .route("/v1/bookings/{id}/assign", post(assign_booking))
        .route("/v1/bookings/{id}/complete", post(complete_booking))
        .route("/v1/bookings/{id}/rating", post(rate_booking))
        .route("/v1/bookings/{id}/status", put(update_status))
}

/// POST /v1/bookings
async fn create_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    JsonBody(req): JsonBody<NewBooking>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.lifecycle.create(&actor, &req).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /v1/bookings
async fn list_bookings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<Page<Booking>>, AppError> {
    Ok(Json(state.lifecycle.list_all(&actor, &filter).await?))
}

async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<Page<Booking>>, AppError> {
    Ok(Json(state.lifecycle.list_mine(&actor, &filter).await?))
}

async fn list_paid_bookings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<Page<Booking>>, AppError> {
    Ok(Json(state.lifecycle.list_paid(&actor, &filter).await?))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.lifecycle.get(id, &actor).await?))
}

async fn get_receipt(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Receipt>, AppError> {
    Ok(Json(state.lifecycle.receipt(id, &actor).await?))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.lifecycle.cancel(id, &actor).await?))
}

async fn approve_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.lifecycle.approve(id, &actor).await?))
}

/// POST /v1/bookings/{id}/assign
/// Fails with 409 when the ferry is full.
async fn assign_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<AssignRequest>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.lifecycle.assign(id, req.ferry_id, &actor).await?))
}

async fn complete_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.lifecycle.complete(id, &actor).await?))
}

async fn rate_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<RatingRequest>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.lifecycle.rate(id, &actor, req.rating).await?))
}

/// PUT /v1/bookings/{id}/status
async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<StatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .lifecycle
        .update_status(id, &actor, &req.booking_status, req.ferry_id)
        .await?;
    Ok(Json(booking))
}
