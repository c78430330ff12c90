use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, put},
    Extension, Json, Router,
};
use ferry_core::ferry::{Ferry, FerryOccupancy, FerryUpdate, FleetSummary, NewFerry, Occupancy};
use ferry_core::Actor;
use futures_util::{Stream, StreamExt};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::JsonBody;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/ferries", get(list_ferries).post(create_ferry))
        .route("/v1/ferries/occupancy", get(fleet_occupancy))
        .route("/v1/ferries/summary", get(fleet_summary))
        .route("/v1/ferries/{id}", put(update_ferry).delete(delete_ferry))
        .route("/v1/ferries/{id}/occupancy", get(ferry_occupancy))
        .route("/v1/ferries/{id}/stream", get(stream_ferry))
}

async fn list_ferries(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Ferry>>, AppError> {
    Ok(Json(state.fleet.list(&actor).await?))
}

async fn create_ferry(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    JsonBody(req): JsonBody<NewFerry>,
) -> Result<(StatusCode, Json<Ferry>), AppError> {
    let ferry = state.fleet.create(&actor, &req).await?;
    Ok((StatusCode::CREATED, Json(ferry)))
}

async fn update_ferry(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<FerryUpdate>,
) -> Result<Json<Ferry>, AppError> {
    Ok(Json(state.fleet.update(&actor, id, &req).await?))
}

/// DELETE /v1/ferries/{id}
/// 409 while bookings are still assigned to the ferry.
async fn delete_ferry(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.fleet.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn fleet_occupancy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<FerryOccupancy>>, AppError> {
    Ok(Json(state.fleet.fleet_occupancy(&actor).await?))
}

async fn fleet_summary(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<FleetSummary>, AppError> {
    Ok(Json(state.fleet.summary(&actor).await?))
}

async fn ferry_occupancy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Occupancy>, AppError> {
    Ok(Json(state.fleet.occupancy(&actor, id).await?))
}

/// GET /v1/ferries/{id}/stream
/// Server-sent events for every booking or occupancy change on one ferry.
async fn stream_ferry(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    // fails fast for unknown ferries and for callers who cannot see the fleet
    state.fleet.occupancy(&actor, id).await?;

    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(event) if event.ferry_id() == Some(id) => Event::default()
                .event(event.name())
                .json_data(&event)
                .ok()
                .map(Ok::<_, Infallible>),
            Ok(_) => None,
            Err(lagged) => {
                tracing::warn!("SSE subscriber for ferry {} fell behind: {}", id, lagged);
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
