use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use ferry_core::chat::{ChatMessage, InboxEntry, NewChatMessage};
use ferry_core::Actor;
use ferry_ops::{InboxFilter, SentMessage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread: usize,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub marked: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/chat/messages", post(send_message))
        .route("/v1/chat/inbox", get(inbox))
        .route("/v1/chat/unread-count", get(unread_count))
        .route("/v1/chat/conversations/{passenger_id}", get(conversation))
        .route("/v1/chat/conversations/{passenger_id}/replies", post(reply))
        .route("/v1/chat/conversations/{passenger_id}/read", post(mark_read))
}

async fn send_message(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    JsonBody(req): JsonBody<NewChatMessage>,
) -> Result<(StatusCode, Json<SentMessage>), AppError> {
    let sent = state.chat.send_passenger_message(&actor, &req).await?;
    Ok((StatusCode::CREATED, Json(sent)))
}

/// GET /v1/chat/inbox?category=service
async fn inbox(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<InboxFilter>,
) -> Result<Json<Vec<InboxEntry>>, AppError> {
    Ok(Json(state.chat.inbox(&actor, &filter).await?))
}

async fn unread_count(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<InboxFilter>,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let unread = state.chat.unread_count(&actor, &filter).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

async fn conversation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(passenger_id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    Ok(Json(state.chat.conversation(&actor, passenger_id).await?))
}

async fn reply(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(passenger_id): Path<Uuid>,
    JsonBody(req): JsonBody<ReplyRequest>,
) -> Result<(StatusCode, Json<ChatMessage>), AppError> {
    let message = state.chat.staff_reply(&actor, passenger_id, &req.body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn mark_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(passenger_id): Path<Uuid>,
) -> Result<Json<MarkReadResponse>, AppError> {
    let marked = state.chat.mark_read(&actor, passenger_id).await?;
    Ok(Json(MarkReadResponse { marked }))
}
