use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ferry_core::CoreError;
use serde_json::json;

use crate::middleware::auth::AuthError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    Anyhow(anyhow::Error),
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::Validation(_) | CoreError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
        CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
        CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::CapacityExceeded { .. } | CoreError::FerryInUse { .. } => StatusCode::CONFLICT,
        CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Anyhow(err) => {
                if let Some(core) = err.downcast_ref::<CoreError>() {
                    let status = core_status(core);
                    if status == StatusCode::INTERNAL_SERVER_ERROR {
                        tracing::error!("Internal Server Error: {}", core);
                        (status, "Internal Server Error".to_string())
                    } else {
                        (status, core.to_string())
                    }
                } else if let Some(rejection) = err.downcast_ref::<JsonRejection>() {
                    tracing::debug!("Rejected request body: {}", rejection);
                    (StatusCode::BAD_REQUEST, rejection.body_text())
                } else if let Some(auth) = err.downcast_ref::<AuthError>() {
                    tracing::debug!("Rejected credentials: {}", auth);
                    (StatusCode::UNAUTHORIZED, auth.to_string())
                } else {
                    tracing::error!("Internal Server Error: {}", err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
                }
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
